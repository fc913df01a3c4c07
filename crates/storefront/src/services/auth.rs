//! Sign-in, registration and Google sign-in.
//!
//! Input is validated before any request. A successful response only
//! establishes a session when it carries both a token and a user profile;
//! the returned [`Route`] is where the user goes next.

use tracing::{info, instrument};

use styleaura_core::Email;

use crate::api::{ApiClient, RegisterRequest};
use crate::error::{Result, StorefrontError};
use crate::models::AuthResponse;
use crate::navigation::Route;
use crate::session::SessionStore;

pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const ALL_FIELDS_REQUIRED: &str = "All fields are required.";
pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match.";
pub const INCOMPLETE_AUTH_DATA: &str = "Login successful, but authentication data is incomplete.";
pub const MISSING_GOOGLE_CREDENTIAL: &str = "Google sign-in did not return a valid credential.";

/// Which form an error belongs to; picks the generic fallback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    Login,
    Register,
    Google,
}

impl AuthFlow {
    #[must_use]
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Login => "Login failed",
            Self::Register => "Registration failed",
            Self::Google => "Google sign-in failed.",
        }
    }
}

/// Registration form input.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    /// Check the form, returning the normalized email.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Validation` with the form message.
    pub fn validate(&self) -> Result<Email> {
        let fields = [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.password,
            &self.confirm_password,
        ];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(StorefrontError::Validation(ALL_FIELDS_REQUIRED.to_string()));
        }
        if self.password != self.confirm_password {
            return Err(StorefrontError::Validation(
                PASSWORDS_DO_NOT_MATCH.to_string(),
            ));
        }
        parse_email(&self.email)
    }
}

fn parse_email(input: &str) -> Result<Email> {
    Email::parse(input).map_err(|e| StorefrontError::Validation(e.to_string()))
}

/// Where a user lands after signing in.
///
/// Admins always go to the admin view; everyone else returns to `pending`
/// or the home page.
#[must_use]
pub fn post_login_route(is_admin: bool, pending: Option<Route>) -> Route {
    if is_admin {
        Route::Admin
    } else {
        pending.unwrap_or(Route::Home)
    }
}

// =============================================================================
// AuthService
// =============================================================================

/// Drives the authentication forms against the backend.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
    session: SessionStore,
}

impl AuthService {
    #[must_use]
    pub const fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing input or an incomplete success body,
    /// and the backend error (with its message) otherwise.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        pending: Option<Route>,
    ) -> Result<Route> {
        let email = parse_email(email)?;
        if password.is_empty() {
            return Err(StorefrontError::Validation(PASSWORD_REQUIRED.to_string()));
        }

        let response = self.api.login(email.as_str(), password).await?;
        self.establish(response, pending)
    }

    /// Create an account and sign in. Always lands on the home page.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an invalid form, and the backend error
    /// otherwise.
    #[instrument(skip_all)]
    pub async fn register(&self, form: &Registration) -> Result<Route> {
        let email = form.validate()?;
        let request = RegisterRequest {
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
            email: email.as_str(),
            password: &form.password,
        };

        let response = self.api.register(&request).await?;
        self.establish(response, None)?;
        Ok(Route::Home)
    }

    /// Sign in with a Google ID token.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank token or an incomplete success body,
    /// and the backend error otherwise.
    #[instrument(skip(self, id_token))]
    pub async fn google_login(&self, id_token: &str, pending: Option<Route>) -> Result<Route> {
        let id_token = id_token.trim();
        if id_token.is_empty() {
            return Err(StorefrontError::Validation(
                MISSING_GOOGLE_CREDENTIAL.to_string(),
            ));
        }

        let response = self.api.google_login(id_token).await?;
        self.establish(response, pending)
    }

    /// Sign out.
    pub fn logout(&self) {
        self.session.logout();
    }

    fn establish(&self, response: AuthResponse, pending: Option<Route>) -> Result<Route> {
        match response {
            AuthResponse {
                token: Some(token),
                user: Some(user),
            } if !token.trim().is_empty() => {
                let route = post_login_route(user.is_admin(), pending);
                info!(admin = user.is_admin(), %route, "Signed in");
                self.session.login(token, user);
                Ok(route)
            }
            _ => Err(StorefrontError::Validation(INCOMPLETE_AUTH_DATA.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> Registration {
        Registration {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: "asha@styleaura.in".to_string(),
            password: "secret".to_string(),
            confirm_password: "secret".to_string(),
        }
    }

    fn validation_message(result: Result<Email>) -> String {
        match result {
            Err(StorefrontError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_registration_validation() {
        assert_eq!(form().validate().unwrap().as_str(), "asha@styleaura.in");

        let mut missing = form();
        missing.last_name = " ".to_string();
        assert_eq!(validation_message(missing.validate()), ALL_FIELDS_REQUIRED);

        let mut mismatch = form();
        mismatch.confirm_password = "other".to_string();
        assert_eq!(validation_message(mismatch.validate()), PASSWORDS_DO_NOT_MATCH);

        let mut bad_email = form();
        bad_email.email = "asha".to_string();
        assert!(validation_message(bad_email.validate()).contains("name@domain"));
    }

    #[test]
    fn test_post_login_route() {
        assert_eq!(post_login_route(true, Some(Route::Checkout)), Route::Admin);
        assert_eq!(post_login_route(false, Some(Route::Checkout)), Route::Checkout);
        assert_eq!(post_login_route(false, None), Route::Home);
    }

    #[test]
    fn test_fallback_messages() {
        let err = StorefrontError::Auth(None);
        assert_eq!(err.user_message(AuthFlow::Login.fallback_message()), "Login failed");
        assert_eq!(
            err.user_message(AuthFlow::Register.fallback_message()),
            "Registration failed"
        );
    }
}
