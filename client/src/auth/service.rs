//! Account operations against the `/user` endpoints.

use crate::api::client::ApiClient;
use crate::api::common::MessageResponse;
use crate::auth::models::*;
use crate::errors::{ClientError, ClientResult, validation_failure};
use serde_json::Value;
use validator::Validate;

const LOGIN_FALLBACK: &str = "Login failed. Please check your credentials.";
const MISSING_TOKEN_MESSAGE: &str = "Invalid credentials";
const SIGN_UP_FALLBACK: &str = "Signup failed. Please try again.";
const CONFIRM_FALLBACK: &str = "Email verification failed";
const RESEND_FALLBACK: &str = "Failed to resend verification code";
const RESET_START_FALLBACK: &str = "Failed to start password reset";
const RESET_VERIFY_FALLBACK: &str = "Verification failed. Please try again.";
const RESET_RESEND_FALLBACK: &str = "Could not resend.";
const RESET_FALLBACK: &str = "Password reset failed";
const CHANGE_PASSWORD_FALLBACK: &str = "Password change failed";
const PROFILE_FALLBACK: &str = "Failed to load profile";
const VERIFICATION_SESSION_FALLBACK: &str = "Session expired. Please restart.";

fn validate<T: Validate>(request: &T) -> ClientResult<()> {
    request.validate().map_err(validation_failure)
}

/// Authentication service: login, registration, verification and password
/// management. Successful calls return the server's message.
pub struct AuthService<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Logs in and installs the returned token in the session.
    pub async fn login(&self, request: LoginRequest) -> ClientResult<LoginResponse> {
        validate(&request)?;

        let response: LoginResponse = match self.client.post_json("/user/login", &request).await {
            Ok(response) => response,
            // a rejected login is not an expired session
            Err(e) => return Err(self.without_redirect(e, LOGIN_FALLBACK)),
        };

        let token = response
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ClientError::failed(MISSING_TOKEN_MESSAGE))?;
        self.client.session().set_token(token).await?;

        tracing::info!("Logged in as {}", request.email);
        Ok(response)
    }

    /// Registers a new account. The server answers by emailing a code and
    /// setting a verification cookie, which the client keeps for
    /// [`AuthService::confirm_email`].
    pub async fn sign_up(&self, request: SignUpRequest) -> ClientResult<String> {
        validate(&request)?;
        self.post_message("/user/sign-up", &request, SIGN_UP_FALLBACK)
            .await
    }

    pub async fn confirm_email(&self, request: VerificationCodeRequest) -> ClientResult<String> {
        validate(&request)?;
        self.post_message("/user/email-confirmation", &request, CONFIRM_FALLBACK)
            .await
    }

    pub async fn resend_verification(&self) -> ClientResult<String> {
        self.post_empty("/user/resend-verification", RESEND_FALLBACK)
            .await
    }

    pub async fn forgot_password_start(&self, request: EmailRequest) -> ClientResult<String> {
        validate(&request)?;
        self.post_message("/user/forgot-password/start", &request, RESET_START_FALLBACK)
            .await
    }

    pub async fn forgot_password_verify(
        &self,
        request: VerificationCodeRequest,
    ) -> ClientResult<String> {
        validate(&request)?;
        self.post_message(
            "/user/forgot-password/verify",
            &request,
            RESET_VERIFY_FALLBACK,
        )
        .await
    }

    pub async fn forgot_password_resend(&self) -> ClientResult<String> {
        self.post_empty("/user/forgot-password/resend", RESET_RESEND_FALLBACK)
            .await
    }

    pub async fn forgot_password_reset(&self, request: ResetPasswordRequest) -> ClientResult<String> {
        validate(&request)?;
        self.post_message("/user/forgot-password/reset", &request, RESET_FALLBACK)
            .await
    }

    /// Asks the server whether the verification cookie still names a live
    /// session. Used before prompting for an emailed code.
    pub async fn verification_session(&self) -> ClientResult<VerificationSession> {
        self.client
            .get_json("/user/verification/session", &[])
            .await
            .map_err(|e| self.without_redirect(e, VERIFICATION_SESSION_FALLBACK))
    }

    /// Checks the stored token with the server.
    ///
    /// Without a token this answers `None` immediately. A rejected token
    /// surfaces as `Unauthorized` and has already been cleared.
    pub async fn verify_token(&self) -> ClientResult<Option<VerifyTokenResponse>> {
        if !self.client.session().is_authenticated().await {
            return Ok(None);
        }
        let response: VerifyTokenResponse = self
            .client
            .get_json("/user/verify-token", &[])
            .await
            .map_err(|e| e.into_failure(PROFILE_FALLBACK))?;
        Ok(Some(response))
    }

    pub async fn profile(&self) -> ClientResult<UserProfile> {
        self.client
            .get_json("/user/profile", &[])
            .await
            .map_err(|e| e.into_failure(PROFILE_FALLBACK))
    }

    pub async fn change_password(&self, request: ChangePasswordRequest) -> ClientResult<String> {
        validate(&request)?;
        let response: MessageResponse = self
            .client
            .put_json("/user/change-password", &request)
            .await
            .map_err(|e| e.into_failure(CHANGE_PASSWORD_FALLBACK))?;
        Ok(response.message_or("Password changed successfully"))
    }

    /// Tells the server, then forgets the token whatever it answered.
    pub async fn logout(&self) -> ClientResult<()> {
        if self.client.session().is_authenticated().await {
            if let Err(e) = self
                .client
                .post_query::<Value>("/user/logout", &[])
                .await
            {
                tracing::warn!("Server logout failed, clearing token anyway: {}", e);
            }
        }
        // a 401 above also arms the redirect; logging out is not a session expiry
        self.client.session().take_login_redirect();
        self.client.session().clear().await
    }

    /// Settles a failure from an endpoint whose 401 means "not signed in
    /// here" rather than "login expired".
    fn without_redirect(&self, error: ClientError, fallback: &str) -> ClientError {
        if error.is_unauthorized() {
            self.client.session().take_login_redirect();
        }
        match error {
            ClientError::Unauthorized { message } => ClientError::failed(message),
            other => other.into_failure(fallback),
        }
    }

    async fn post_message<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> ClientResult<String> {
        let response: MessageResponse = self
            .client
            .post_json(path, body)
            .await
            .map_err(|e| e.into_failure(fallback))?;
        Ok(response.message_or("OK"))
    }

    async fn post_empty(&self, path: &str, fallback: &str) -> ClientResult<String> {
        let response: MessageResponse = self
            .client
            .post_query(path, &[])
            .await
            .map_err(|e| e.into_failure(fallback))?;
        Ok(response.message_or("OK"))
    }
}
