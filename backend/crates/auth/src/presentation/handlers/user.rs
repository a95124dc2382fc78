//! User Route Handlers
//!
//! Self-service account operations plus the admin listing/statistics and
//! role/status management. Admin routes sit behind the capability gate in
//! the router.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::{
    AdminUsersUseCase, ChangePasswordUseCase, DeleteAccountUseCase, UpdateProfileUseCase,
};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthResult;
use crate::presentation::dto::{
    ApiResponse, ChangePasswordRequest, DeleteAccountRequest, ListUsersParams, PaginationMeta,
    PublicUser, RoleCountData, SetRoleRequest, SetStatusRequest, StatsData, UpdateProfileRequest,
    UserData, UserListData,
};
use crate::presentation::extract::ApiJson;
use crate::presentation::handlers::{AppState, clear_token_cookies};
use crate::presentation::middleware::CurrentUser;
use crate::presentation::validation;

/// GET /user/profile (requires authentication)
pub async fn get_profile(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AuthResult<Json<ApiResponse<UserData>>> {
    Ok(Json(ApiResponse::success(UserData {
        user: PublicUser::from(&user),
    })))
}

/// PUT /user/profile (requires authentication)
pub async fn update_profile<R>(
    State(state): State<AppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> AuthResult<Json<ApiResponse<UserData>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let changes = validation::validate_profile_update(req)?;

    let use_case = UpdateProfileUseCase::new(state.repo.clone());
    let user = use_case.execute(&user, changes).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Profile updated successfully",
        UserData {
            user: PublicUser::from(&user),
        },
    )))
}

/// PUT /user/change-password (requires authentication)
pub async fn change_password<R>(
    State(state): State<AppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> AuthResult<Json<ApiResponse<()>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let (current_password, new_password) = validation::validate_change_password(req)?;

    let use_case = ChangePasswordUseCase::new(state.repo.clone(), state.config.clone());
    use_case
        .execute(&user, current_password, new_password)
        .await?;

    Ok(Json(ApiResponse::message("Password changed successfully")))
}

/// DELETE /user/account (requires authentication)
pub async fn delete_account<R>(
    State(state): State<AppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Option<ApiJson<DeleteAccountRequest>>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let password = body.and_then(|ApiJson(req)| req.password);

    let use_case = DeleteAccountUseCase::new(state.repo.clone(), state.config.clone());
    use_case.execute(&user, password).await?;

    // The session is gone with the account
    let cookies = clear_token_cookies(&state.config);

    Ok((
        cookies,
        Json(ApiResponse::message("Account deleted successfully")),
    ))
}

/// GET /user/stats (admin)
pub async fn stats<R>(State(state): State<AppState<R>>) -> AuthResult<Json<ApiResponse<StatsData>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = AdminUsersUseCase::new(state.repo.clone());
    let stats = use_case.stats().await?;

    Ok(Json(ApiResponse::success(StatsData {
        total: stats.total,
        active: stats.active,
        verified: stats.verified,
        recent: stats.recent,
        by_role: stats
            .by_role
            .into_iter()
            .map(|r| RoleCountData {
                role: r.role,
                count: r.count,
                active: r.active,
            })
            .collect(),
    })))
}

/// GET /user/list (admin/manager)
pub async fn list<R>(
    State(state): State<AppState<R>>,
    Query(params): Query<ListUsersParams>,
) -> AuthResult<Json<ApiResponse<UserListData>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let query = validation::validate_list_params(params)?;

    let use_case = AdminUsersUseCase::new(state.repo.clone());
    let page = use_case.list(query.clone()).await?;

    // The use case clamps page/limit; recompute the effective values the
    // same way for the meta block
    let current_page = query.page.max(1);
    let limit = match query.limit {
        0 => crate::application::admin::DEFAULT_PAGE_SIZE,
        l => l.min(crate::application::admin::MAX_PAGE_SIZE),
    };
    let total_pages = (page.total as u32).div_ceil(limit);

    Ok(Json(ApiResponse::success(UserListData {
        users: page.users.iter().map(PublicUser::from).collect(),
        pagination: PaginationMeta {
            current_page,
            total_pages,
            total_users: page.total,
            limit,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
        },
    })))
}

/// PUT /user/{user_id}/role (admin)
pub async fn set_role<R>(
    State(state): State<AppState<R>>,
    Path(user_id): Path<Uuid>,
    ApiJson(req): ApiJson<SetRoleRequest>,
) -> AuthResult<Json<ApiResponse<UserData>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let role = validation::validate_set_role(req)?;

    let use_case = AdminUsersUseCase::new(state.repo.clone());
    let user = use_case.set_role(&UserId::from_uuid(user_id), role).await?;

    Ok(Json(ApiResponse::success_with_message(
        "User role updated successfully",
        UserData {
            user: PublicUser::from(&user),
        },
    )))
}

/// PUT /user/{user_id}/status (admin)
pub async fn set_status<R>(
    State(state): State<AppState<R>>,
    Path(user_id): Path<Uuid>,
    ApiJson(req): ApiJson<SetStatusRequest>,
) -> AuthResult<Json<ApiResponse<UserData>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let is_active = validation::validate_set_status(req)?;

    let use_case = AdminUsersUseCase::new(state.repo.clone());
    let user = use_case
        .set_status(&UserId::from_uuid(user_id), is_active)
        .await?;

    let message = if is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };

    Ok(Json(ApiResponse::success_with_message(
        message,
        UserData {
            user: PublicUser::from(&user),
        },
    )))
}
