//! PostgreSQL Repository Implementation
//!
//! The credential store behind [`UserRepository`]. The two
//! correctness-critical races live here: duplicate registration is decided
//! by the unique email index, and the failed-login counter is advanced by
//! a single conditional UPDATE, never by read-modify-write in handler code.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, QueryBuilder, Postgres};
use uuid::Uuid;

use crate::domain::entity::user::{
    Address, LockoutUpdate, Preferences, User, UserProfile,
};
use crate::domain::repository::{
    RoleCount, UserListPage, UserListQuery, UserRepository, UserStats,
};
use crate::domain::value_object::{
    email::Email, person_name::PersonName, phone::Phone, user_id::UserId,
    user_password::UserPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Shared SELECT column list; every user query reads the full row
const SELECT_USER: &str = r#"
    SELECT
        user_id,
        email,
        password_hash,
        first_name,
        last_name,
        phone,
        role,
        is_email_verified,
        email_verification_token,
        password_reset_token_hash,
        password_reset_expires,
        last_login,
        is_active,
        login_attempts,
        lock_until,
        avatar,
        birth_date,
        city,
        street,
        zip_code,
        newsletter,
        notifications,
        created_at,
        updated_at
    FROM users
"#;

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                password_hash,
                first_name,
                last_name,
                phone,
                role,
                is_email_verified,
                email_verification_token,
                password_reset_token_hash,
                password_reset_expires,
                last_login,
                is_active,
                login_attempts,
                lock_until,
                avatar,
                birth_date,
                city,
                street,
                zip_code,
                newsletter,
                notifications,
                created_at,
                updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
            )
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.phone.as_ref().map(|p| p.as_str()))
        .bind(user.role.id())
        .bind(user.is_email_verified)
        .bind(&user.email_verification_token)
        .bind(&user.password_reset_token_hash)
        .bind(user.password_reset_expires)
        .bind(user.last_login)
        .bind(user.is_active)
        .bind(user.login_attempts)
        .bind(user.lock_until)
        .bind(&user.profile.avatar)
        .bind(user.profile.birth_date)
        .bind(&user.profile.address.city)
        .bind(&user.profile.address.street)
        .bind(&user.profile.address.zip_code)
        .bind(user.profile.preferences.newsletter)
        .bind(user.profile.preferences.notifications)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthError::EmailTaken,
            e => AuthError::Database(e),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE user_id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn find_by_reset_token_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} WHERE password_reset_token_hash = $1 AND password_reset_expires > $2"
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_verification_token(&self, token: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} WHERE email_verification_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    /// Writes every mutable field except the lockout counters, which are
    /// only ever advanced through [`Self::record_failed_login`] and
    /// [`Self::reset_login_attempts`] so concurrent logins cannot lose
    /// updates through a stale entity.
    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                password_hash = $3,
                first_name = $4,
                last_name = $5,
                phone = $6,
                role = $7,
                is_email_verified = $8,
                email_verification_token = $9,
                password_reset_token_hash = $10,
                password_reset_expires = $11,
                last_login = $12,
                is_active = $13,
                avatar = $14,
                birth_date = $15,
                city = $16,
                street = $17,
                zip_code = $18,
                newsletter = $19,
                notifications = $20,
                updated_at = $21
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.phone.as_ref().map(|p| p.as_str()))
        .bind(user.role.id())
        .bind(user.is_email_verified)
        .bind(&user.email_verification_token)
        .bind(&user.password_reset_token_hash)
        .bind(user.password_reset_expires)
        .bind(user.last_login)
        .bind(user.is_active)
        .bind(&user.profile.avatar)
        .bind(user.profile.birth_date)
        .bind(&user.profile.address.city)
        .bind(&user.profile.address.street)
        .bind(&user.profile.address.zip_code)
        .bind(user.profile.preferences.newsletter)
        .bind(user.profile.preferences.notifications)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_failed_login(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> AuthResult<LockoutUpdate> {
        // One conditional statement; both CASEs read the pre-update row, so
        // concurrent failures serialize on the row lock and none is lost.
        let row = sqlx::query_as::<_, (i32, Option<DateTime<Utc>>)>(
            r#"
            UPDATE users SET
                login_attempts = CASE
                    WHEN lock_until IS NOT NULL AND lock_until <= $2 THEN 1
                    ELSE login_attempts + 1
                END,
                lock_until = CASE
                    WHEN lock_until IS NOT NULL AND lock_until <= $2 THEN NULL
                    WHEN lock_until IS NOT NULL THEN lock_until
                    WHEN login_attempts + 1 >= $3 THEN $2 + make_interval(hours => $4)
                    ELSE NULL
                END,
                updated_at = $2
            WHERE user_id = $1
            RETURNING login_attempts, lock_until
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(now)
        .bind(User::MAX_LOGIN_ATTEMPTS)
        .bind(User::LOCKOUT_HOURS as i32)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::UserNotFound)?;

        Ok(LockoutUpdate {
            login_attempts: row.0,
            lock_until: row.1,
        })
    }

    async fn reset_login_attempts(&self, user_id: &UserId) -> AuthResult<()> {
        sqlx::query(
            "UPDATE users SET login_attempts = 0, lock_until = NULL, updated_at = $2 WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, query: &UserListQuery) -> AuthResult<UserListPage> {
        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_filters(&mut count_qb, query);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let offset = i64::from(query.page.saturating_sub(1)) * i64::from(query.limit);

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("{SELECT_USER} WHERE TRUE"));
        push_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(i64::from(query.limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows: Vec<UserRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let users = rows
            .into_iter()
            .map(|r| r.into_user())
            .collect::<AuthResult<Vec<_>>>()?;

        Ok(UserListPage {
            users,
            total: total as u64,
        })
    }

    async fn stats(&self, now: DateTime<Utc>) -> AuthResult<UserStats> {
        let since = now - Duration::days(30);

        let (total, active, verified, recent) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE is_active),
                COUNT(*) FILTER (WHERE is_email_verified),
                COUNT(*) FILTER (WHERE created_at >= $1)
            FROM users
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let role_rows = sqlx::query_as::<_, (i16, i64, i64)>(
            r#"
            SELECT role, COUNT(*), COUNT(*) FILTER (WHERE is_active)
            FROM users
            GROUP BY role
            ORDER BY role
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let by_role = role_rows
            .into_iter()
            .filter_map(|(role, count, active)| {
                UserRole::from_id(role).map(|role| RoleCount {
                    role,
                    count,
                    active,
                })
            })
            .collect();

        Ok(UserStats {
            total,
            active,
            verified,
            recent,
            by_role,
        })
    }
}

/// Append the shared WHERE filters of listing and counting
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &UserListQuery) {
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        qb.push(" AND (first_name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR last_name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR email ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(role) = query.role {
        qb.push(" AND role = ");
        qb.push_bind(role.id());
    }

    if let Some(is_active) = query.is_active {
        qb.push(" AND is_active = ");
        qb.push_bind(is_active);
    }
}

// ============================================================================
// Row type for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    role: i16,
    is_email_verified: bool,
    email_verification_token: Option<String>,
    password_reset_token_hash: Option<String>,
    password_reset_expires: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
    is_active: bool,
    login_attempts: i32,
    lock_until: Option<DateTime<Utc>>,
    avatar: Option<String>,
    birth_date: Option<DateTime<Utc>>,
    city: Option<String>,
    street: Option<String>,
    zip_code: Option<String>,
    newsletter: bool,
    notifications: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = UserRole::from_id(self.role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid role id in database: {}", self.role)))?;

        let password_hash = UserPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            password_hash,
            first_name: PersonName::from_db(self.first_name),
            last_name: PersonName::from_db(self.last_name),
            phone: self.phone.map(Phone::from_db),
            role,
            is_email_verified: self.is_email_verified,
            email_verification_token: self.email_verification_token,
            password_reset_token_hash: self.password_reset_token_hash,
            password_reset_expires: self.password_reset_expires,
            last_login: self.last_login,
            is_active: self.is_active,
            login_attempts: self.login_attempts,
            lock_until: self.lock_until,
            profile: UserProfile {
                avatar: self.avatar,
                birth_date: self.birth_date,
                address: Address {
                    city: self.city,
                    street: self.street,
                    zip_code: self.zip_code,
                },
                preferences: Preferences {
                    newsletter: self.newsletter,
                    notifications: self.notifications,
                },
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
