//! Request and response bodies for the account endpoints.
//!
//! Request models carry `validator` rules so that obviously bad input is
//! rejected before any network call.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request payload
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response. `access_token` may be missing on a malformed success.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub confirm_password: String,

    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
}

/// Six-digit code from a verification or reset email.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct VerificationCodeRequest {
    #[validate(length(min = 1, message = "Verification code is required"))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// User information embedded in login and token checks
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<i64>,
    pub email: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyTokenResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    /// Server timestamp, passed through as sent.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A live email-verification or password-reset session, as held by the
/// server behind the verification cookie.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationSession {
    #[serde(default)]
    pub email_masked: Option<String>,
    /// `"signup"` or `"reset"`.
    #[serde(default)]
    pub purpose: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::validation_failure;

    #[test]
    fn test_sign_up_password_mismatch() {
        let request = SignUpRequest {
            email: "jane@x.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret2".to_string(),
            country: "Nigeria".to_string(),
        };
        let err = validation_failure(request.validate().unwrap_err());
        assert_eq!(err.user_message(""), "Passwords do not match.");
    }

    #[test]
    fn test_login_requires_valid_email_and_password() {
        let request = LoginRequest {
            email: "not-an-email".to_string(),
            password: String::new(),
        };
        let err = validation_failure(request.validate().unwrap_err());
        assert_eq!(
            err.user_message(""),
            "Password is required, Please enter a valid email address."
        );

        let request = LoginRequest {
            email: "jane@x.com".to_string(),
            password: "pw".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_profile_tolerates_naive_timestamp() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"id":7,"email":"jane@x.com","country":"Ghana","is_active":true,"created_at":"2025-03-01T10:00:00"}"#,
        )
        .unwrap();
        assert!(profile.is_active);
        assert_eq!(profile.created_at.as_deref(), Some("2025-03-01T10:00:00"));
    }
}
