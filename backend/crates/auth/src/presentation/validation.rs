//! Request Validation
//!
//! Runs before any handler logic, collecting every per-field problem of a
//! request into one 400 response instead of failing on the first. Free-text
//! inputs are sanitized (HTML stripped, trimmed) before validation.
//!
//! Successful validation produces the typed use-case inputs; the value
//! objects carry the individual rules.

use chrono::{DateTime, NaiveDate, Utc};

use kernel::error::app_error::FieldError;

use crate::application::account::ProfileChanges;
use crate::application::login::LoginInput;
use crate::application::register::RegisterInput;
use crate::domain::repository::UserListQuery;
use crate::domain::value_object::{
    email::Email, person_name::PersonName, phone::Phone, user_password::RawPassword,
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ChangePasswordRequest, CheckEmailRequest, ForgotPasswordRequest, ListUsersParams,
    LoginRequest, RegisterRequest, ResetPasswordRequest, SetRoleRequest, SetStatusRequest,
    UpdateProfileRequest, VerifyEmailRequest,
};

/// Maximum city length in a profile address
const CITY_MAX_LENGTH: usize = 100;

/// Maximum street length in a profile address
const STREET_MAX_LENGTH: usize = 200;

/// Zip codes are exactly this many digits
const ZIP_CODE_LENGTH: usize = 6;

// ============================================================================
// Sanitization
// ============================================================================

/// Strip script blocks and HTML tags, then trim
///
/// Free-text inputs (names, address lines) pass through here before any
/// validation so stored values never carry markup.
pub(crate) fn sanitize(input: &str) -> String {
    strip_tags(&strip_script_blocks(input)).trim().to_string()
}

fn strip_script_blocks(input: &str) -> String {
    const OPEN: &[u8] = b"<script";
    const CLOSE: &[u8] = b"</script>";

    // Byte-wise ASCII-case-insensitive search keeps indices valid for the
    // original string regardless of non-ASCII content around the tags.
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(start) = find_ascii_ci(&bytes[pos..], OPEN) {
        let start = pos + start;
        out.push_str(&input[pos..start]);
        match find_ascii_ci(&bytes[start..], CLOSE) {
            Some(end) => pos = start + end + CLOSE.len(),
            None => {
                // Unterminated script block: drop the rest
                return out;
            }
        }
    }
    out.push_str(&input[pos..]);
    out
}

fn find_ascii_ci(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;

    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

// ============================================================================
// Field validator
// ============================================================================

/// Collects per-field errors across a whole request
struct FieldValidator {
    errors: Vec<FieldError>,
}

impl FieldValidator {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn push_with_value(&mut self, field: &str, message: impl Into<String>, value: &str) {
        self.errors
            .push(FieldError::new(field, message).with_value(value));
    }

    fn email(&mut self, field: &str, raw: &str) -> Option<Email> {
        match Email::new(raw) {
            Ok(email) => Some(email),
            Err(e) => {
                self.push_with_value(field, e.message().to_string(), raw);
                None
            }
        }
    }

    fn password(&mut self, field: &str, raw: &str) -> Option<RawPassword> {
        match RawPassword::new(raw.to_string()) {
            Ok(password) => Some(password),
            Err(e) => {
                // Never echo the rejected password back
                self.push(field, e.message().to_string());
                None
            }
        }
    }

    fn person_name(&mut self, field: &str, raw: &str) -> Option<PersonName> {
        let sanitized = sanitize(raw);
        match PersonName::new(sanitized) {
            Ok(name) => Some(name),
            Err(e) => {
                self.push_with_value(field, e.message().to_string(), raw);
                None
            }
        }
    }

    fn phone(&mut self, field: &str, raw: &str) -> Option<Phone> {
        match Phone::new(raw) {
            Ok(phone) => Some(phone),
            Err(e) => {
                self.push_with_value(field, e.message().to_string(), raw);
                None
            }
        }
    }

    fn required(&mut self, field: &str, raw: &str, message: &str) -> Option<String> {
        let value = raw.trim();
        if value.is_empty() {
            self.push(field, message);
            None
        } else {
            Some(value.to_string())
        }
    }

    fn finish(self) -> AuthResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation(self.errors))
        }
    }
}

// ============================================================================
// Auth request validation
// ============================================================================

pub fn validate_register(req: RegisterRequest) -> AuthResult<RegisterInput> {
    let mut v = FieldValidator::new();

    let email = v.email("email", &req.email);
    let password = v.password("password", &req.password);
    if req.confirm_password != req.password {
        v.push("confirmPassword", "Passwords do not match");
    }
    let first_name = v.person_name("firstName", &req.first_name);
    let last_name = v.person_name("lastName", &req.last_name);
    let phone = req
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .and_then(|raw| v.phone("phone", raw));
    if !req.terms {
        v.push("terms", "You must accept the terms of service");
    }

    v.finish()?;

    let (Some(email), Some(password), Some(first_name), Some(last_name)) =
        (email, password, first_name, last_name)
    else {
        return Err(AuthError::Internal("validator invariant violated".into()));
    };

    Ok(RegisterInput {
        email,
        password,
        first_name,
        last_name,
        phone,
    })
}

pub fn validate_login(req: LoginRequest) -> AuthResult<LoginInput> {
    let mut v = FieldValidator::new();

    let email = v.email("email", &req.email);
    if req.password.is_empty() {
        v.push("password", "Password is required");
    }

    v.finish()?;

    let Some(email) = email else {
        return Err(AuthError::Internal("validator invariant violated".into()));
    };

    Ok(LoginInput {
        email,
        password: req.password,
        remember_me: req.remember_me,
    })
}

pub fn validate_forgot_password(req: ForgotPasswordRequest) -> AuthResult<Email> {
    let mut v = FieldValidator::new();
    let email = v.email("email", &req.email);
    v.finish()?;
    email.ok_or_else(|| AuthError::Internal("validator invariant violated".into()))
}

pub fn validate_reset_password(req: ResetPasswordRequest) -> AuthResult<(String, RawPassword)> {
    let mut v = FieldValidator::new();

    let token = v.required("token", &req.token, "Password reset token is required");
    let password = v.password("password", &req.password);
    if req.confirm_password != req.password {
        v.push("confirmPassword", "Passwords do not match");
    }

    v.finish()?;

    let (Some(token), Some(password)) = (token, password) else {
        return Err(AuthError::Internal("validator invariant violated".into()));
    };

    Ok((token, password))
}

pub fn validate_verify_email(req: VerifyEmailRequest) -> AuthResult<String> {
    let mut v = FieldValidator::new();
    let token = v.required("token", &req.token, "Verification token is required");
    v.finish()?;
    token.ok_or_else(|| AuthError::Internal("validator invariant violated".into()))
}

pub fn validate_check_email(req: CheckEmailRequest) -> AuthResult<Email> {
    let mut v = FieldValidator::new();
    let email = v.email("email", &req.email);
    v.finish()?;
    email.ok_or_else(|| AuthError::Internal("validator invariant violated".into()))
}

// ============================================================================
// User request validation
// ============================================================================

pub fn validate_change_password(req: ChangePasswordRequest) -> AuthResult<(String, RawPassword)> {
    let mut v = FieldValidator::new();

    if req.current_password.is_empty() {
        v.push("currentPassword", "Current password is required");
    }
    let new_password = v.password("newPassword", &req.new_password);
    if req.confirm_new_password != req.new_password {
        v.push("confirmNewPassword", "New passwords do not match");
    }

    v.finish()?;

    let Some(new_password) = new_password else {
        return Err(AuthError::Internal("validator invariant violated".into()));
    };

    Ok((req.current_password, new_password))
}

pub fn validate_profile_update(req: UpdateProfileRequest) -> AuthResult<ProfileChanges> {
    let mut v = FieldValidator::new();
    let mut changes = ProfileChanges::default();

    if let Some(raw) = req.first_name.as_deref() {
        changes.first_name = v.person_name("firstName", raw);
    }
    if let Some(raw) = req.last_name.as_deref() {
        changes.last_name = v.person_name("lastName", raw);
    }
    if let Some(raw) = req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        changes.phone = v.phone("phone", raw);
    }

    if let Some(profile) = req.profile {
        if let Some(raw) = profile.birth_date.as_deref() {
            changes.birth_date = parse_birth_date(raw);
            if changes.birth_date.is_none() {
                v.push_with_value("profile.birthDate", "Invalid birth date", raw);
            }
        }

        if let Some(address) = profile.address {
            if let Some(city) = address.city.as_deref() {
                let city = sanitize(city);
                if city.chars().count() > CITY_MAX_LENGTH {
                    v.push(
                        "profile.address.city",
                        format!("City must be at most {} characters", CITY_MAX_LENGTH),
                    );
                } else {
                    changes.city = Some(city);
                }
            }
            if let Some(street) = address.street.as_deref() {
                let street = sanitize(street);
                if street.chars().count() > STREET_MAX_LENGTH {
                    v.push(
                        "profile.address.street",
                        format!("Street must be at most {} characters", STREET_MAX_LENGTH),
                    );
                } else {
                    changes.street = Some(street);
                }
            }
            if let Some(zip) = address.zip_code.as_deref() {
                let zip = zip.trim();
                if zip.len() == ZIP_CODE_LENGTH && zip.chars().all(|c| c.is_ascii_digit()) {
                    changes.zip_code = Some(zip.to_string());
                } else {
                    v.push_with_value(
                        "profile.address.zipCode",
                        format!("Zip code must be exactly {} digits", ZIP_CODE_LENGTH),
                        zip,
                    );
                }
            }
        }

        if let Some(preferences) = profile.preferences {
            changes.newsletter =
                boolean_field(&mut v, "profile.preferences.newsletter", preferences.newsletter);
            changes.notifications = boolean_field(
                &mut v,
                "profile.preferences.notifications",
                preferences.notifications,
            );
        }
    }

    v.finish()?;
    Ok(changes)
}

pub fn validate_set_role(req: SetRoleRequest) -> AuthResult<UserRole> {
    let mut v = FieldValidator::new();
    let role = UserRole::from_code(req.role.trim());
    if role.is_none() {
        v.push_with_value("role", "Invalid role", &req.role);
    }
    v.finish()?;
    role.ok_or_else(|| AuthError::Internal("validator invariant violated".into()))
}

pub fn validate_set_status(req: SetStatusRequest) -> AuthResult<bool> {
    match req.is_active {
        Some(serde_json::Value::Bool(value)) => Ok(value),
        _ => Err(AuthError::Validation(vec![FieldError::new(
            "isActive",
            "Status must be true or false",
        )])),
    }
}

pub fn validate_list_params(params: ListUsersParams) -> AuthResult<UserListQuery> {
    let mut v = FieldValidator::new();

    let role = match params.role.as_deref().filter(|r| !r.is_empty()) {
        Some(raw) => {
            let role = UserRole::from_code(raw);
            if role.is_none() {
                v.push_with_value("role", "Invalid role", raw);
            }
            role
        }
        None => None,
    };

    let is_active = match params.is_active.as_deref().filter(|s| !s.is_empty()) {
        Some("true") => Some(true),
        Some("false") => Some(false),
        Some(other) => {
            v.push_with_value("isActive", "Status filter must be true or false", other);
            None
        }
        None => None,
    };

    v.finish()?;

    Ok(UserListQuery {
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(0),
        search: params
            .search
            .map(|s| sanitize(&s))
            .filter(|s| !s.is_empty()),
        role,
        is_active,
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_birth_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn boolean_field(
    v: &mut FieldValidator,
    field: &str,
    value: Option<serde_json::Value>,
) -> Option<bool> {
    match value {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(_) => {
            v.push(field, "Must be true or false");
            None
        }
        None => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_register() -> RegisterRequest {
        RegisterRequest {
            email: "a@b.com".to_string(),
            password: "Password123".to_string(),
            confirm_password: "Password123".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            phone: None,
            terms: true,
        }
    }

    #[test]
    fn test_sanitize_strips_markup() {
        assert_eq!(sanitize("  Ann  "), "Ann");
        assert_eq!(sanitize("<b>Ann</b>"), "Ann");
        assert_eq!(
            sanitize("Ann<script>alert('x')</script> Lee"),
            "Ann Lee"
        );
        assert_eq!(sanitize("<SCRIPT>alert(1)</SCRIPT>Ann"), "Ann");
        assert_eq!(sanitize("Ann<script>unterminated"), "Ann");
    }

    #[test]
    fn test_valid_registration() {
        let input = validate_register(valid_register()).unwrap();
        assert_eq!(input.email.as_str(), "a@b.com");
        assert_eq!(input.first_name.as_str(), "Ann");
        assert!(input.phone.is_none());
    }

    #[test]
    fn test_registration_collects_all_errors() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "weak".to_string(),
            confirm_password: "different".to_string(),
            first_name: "A".to_string(),
            last_name: String::new(),
            phone: Some("abc".to_string()),
            terms: false,
        };

        let err = validate_register(req).unwrap_err();
        let AuthError::Validation(errors) = err else {
            panic!("expected validation error");
        };

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
        assert!(fields.contains(&"confirmPassword"));
        assert!(fields.contains(&"firstName"));
        assert!(fields.contains(&"lastName"));
        assert!(fields.contains(&"phone"));
        assert!(fields.contains(&"terms"));
    }

    #[test]
    fn test_password_never_echoed() {
        let req = RegisterRequest {
            password: "weak".to_string(),
            confirm_password: "weak".to_string(),
            ..valid_register()
        };

        let err = validate_register(req).unwrap_err();
        let AuthError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let password_error = errors.iter().find(|e| e.field == "password").unwrap();
        assert!(password_error.value.is_none());
    }

    #[test]
    fn test_login_requires_password() {
        let req = LoginRequest {
            email: "a@b.com".to_string(),
            password: String::new(),
            remember_me: false,
        };
        assert!(matches!(
            validate_login(req),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn test_profile_update_rules() {
        let req = UpdateProfileRequest {
            first_name: Some("<i>Ann</i>".to_string()),
            profile: Some(crate::presentation::dto::ProfileSection {
                birth_date: Some("1990-05-04".to_string()),
                address: Some(crate::presentation::dto::AddressSection {
                    city: Some("Moscow".to_string()),
                    street: None,
                    zip_code: Some("101000".to_string()),
                }),
                preferences: Some(crate::presentation::dto::PreferencesSection {
                    newsletter: Some(serde_json::Value::Bool(false)),
                    notifications: None,
                }),
            }),
            ..Default::default()
        };

        let changes = validate_profile_update(req).unwrap();
        assert_eq!(changes.first_name.unwrap().as_str(), "Ann");
        assert!(changes.birth_date.is_some());
        assert_eq!(changes.city.as_deref(), Some("Moscow"));
        assert_eq!(changes.zip_code.as_deref(), Some("101000"));
        assert_eq!(changes.newsletter, Some(false));
        assert_eq!(changes.notifications, None);
    }

    #[test]
    fn test_profile_update_bad_fields() {
        let req = UpdateProfileRequest {
            profile: Some(crate::presentation::dto::ProfileSection {
                birth_date: Some("yesterday".to_string()),
                address: Some(crate::presentation::dto::AddressSection {
                    city: None,
                    street: None,
                    zip_code: Some("12".to_string()),
                }),
                preferences: Some(crate::presentation::dto::PreferencesSection {
                    newsletter: Some(serde_json::json!("yes")),
                    notifications: None,
                }),
            }),
            ..Default::default()
        };

        let err = validate_profile_update(req).unwrap_err();
        let AuthError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"profile.birthDate"));
        assert!(fields.contains(&"profile.address.zipCode"));
        assert!(fields.contains(&"profile.preferences.newsletter"));
    }

    #[test]
    fn test_set_status_requires_boolean() {
        assert!(validate_set_status(SetStatusRequest {
            is_active: Some(serde_json::Value::Bool(false))
        })
        .is_ok());

        assert!(validate_set_status(SetStatusRequest {
            is_active: Some(serde_json::json!("true"))
        })
        .is_err());

        assert!(validate_set_status(SetStatusRequest { is_active: None }).is_err());
    }

    #[test]
    fn test_set_role_rejects_unknown() {
        assert_eq!(
            validate_set_role(SetRoleRequest {
                role: "manager".to_string()
            })
            .unwrap(),
            UserRole::Manager
        );
        assert!(validate_set_role(SetRoleRequest {
            role: "root".to_string()
        })
        .is_err());
    }

    #[test]
    fn test_list_params() {
        let query = validate_list_params(ListUsersParams {
            page: Some(2),
            limit: Some(10),
            search: Some("ann".to_string()),
            role: Some("admin".to_string()),
            is_active: Some("true".to_string()),
        })
        .unwrap();

        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 10);
        assert_eq!(query.search.as_deref(), Some("ann"));
        assert_eq!(query.role, Some(UserRole::Admin));
        assert_eq!(query.is_active, Some(true));

        assert!(validate_list_params(ListUsersParams {
            is_active: Some("maybe".to_string()),
            ..Default::default()
        })
        .is_err());
    }
}
