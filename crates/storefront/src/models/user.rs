//! User identity types.

use std::fmt;

use serde::{Deserialize, Serialize};

use styleaura_core::UserId;

/// Role name that grants access to the admin view.
pub const ADMIN_ROLE: &str = "admin";

/// Account key of a signed-in user.
///
/// The commerce backend issues integer keys; identity providers may hand out
/// opaque strings (GUIDs) instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserKey {
    Number(UserId),
    Text(String),
}

impl UserKey {
    /// The integer key, when the backend issued one.
    #[must_use]
    pub fn as_user_id(&self) -> Option<UserId> {
        match self {
            Self::Number(id) => Some(*id),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(key) => f.write_str(key),
        }
    }
}

/// Profile of the signed-in user as returned by the auth endpoints.
///
/// Backends disagree on field names, so the common spellings are accepted on
/// input. `username` and `name` are kept apart because some payloads carry
/// both. The profile is persisted with the canonical names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, alias = "userID", alias = "userId", skip_serializing_if = "Option::is_none")]
    pub id: Option<UserKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, alias = "userName", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Single role (takes precedence over `roles` when present).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl UserProfile {
    /// Whether this user lands on the admin view after signing in.
    ///
    /// A non-empty `role` decides on its own; `roles` is only consulted when
    /// `role` is absent.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        match self.role.as_deref().filter(|r| !r.is_empty()) {
            Some(role) => role.eq_ignore_ascii_case(ADMIN_ROLE),
            None => self
                .roles
                .iter()
                .any(|r| r.eq_ignore_ascii_case(ADMIN_ROLE)),
        }
    }

    /// Name to show for this user: `username`, else `name`. Blank values are
    /// skipped.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        [self.username.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
    }

    /// Short name for greetings: first word of the display name, else the
    /// local part of the email.
    #[must_use]
    pub fn greeting_name(&self) -> Option<&str> {
        self.display_name()
            .and_then(|name| name.split_whitespace().next())
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .filter(|local| !local.is_empty())
            })
    }
}

/// Body returned by login, registration and Google sign-in.
///
/// Both fields are optional on the wire; a success response missing either
/// one does not establish a session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(json: &str) -> UserProfile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_role_string_is_case_insensitive() {
        assert!(profile(r#"{"role":"Admin"}"#).is_admin());
        assert!(!profile(r#"{"role":"user"}"#).is_admin());
    }

    #[test]
    fn test_role_wins_over_roles() {
        assert!(!profile(r#"{"role":"user","roles":["admin"]}"#).is_admin());
        assert!(profile(r#"{"roles":["customer","ADMIN"]}"#).is_admin());
        assert!(!profile("{}").is_admin());
    }

    #[test]
    fn test_aliases() {
        let user = profile(r#"{"userID":3,"userName":"Asha Rao","email":"asha@styleaura.in"}"#);
        assert_eq!(user.id, Some(UserKey::Number(UserId::new(3))));
        assert_eq!(user.greeting_name(), Some("Asha"));
    }

    #[test]
    fn test_username_and_name_together() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"token":"t1","user":{"username":"Asha K","name":"Asha","role":"admin"}}"#,
        )
        .unwrap();
        let user = response.user.unwrap();
        assert!(user.is_admin());
        assert_eq!(user.display_name(), Some("Asha K"));
        assert_eq!(user.greeting_name(), Some("Asha"));
    }

    #[test]
    fn test_blank_username_falls_back_to_name() {
        let user = profile(r#"{"username":"  ","name":"Kim Lee"}"#);
        assert_eq!(user.display_name(), Some("Kim Lee"));
    }

    #[test]
    fn test_string_id() {
        let user = profile(r#"{"id":"3f2a-guid","email":"kim@styleaura.in"}"#);
        let id = user.id.unwrap();
        assert_eq!(id, UserKey::Text("3f2a-guid".to_string()));
        assert_eq!(id.as_user_id(), None);
        assert_eq!(id.to_string(), "3f2a-guid");
    }

    #[test]
    fn test_greeting_falls_back_to_email() {
        let user = profile(r#"{"email":"ravi@styleaura.in"}"#);
        assert_eq!(user.greeting_name(), Some("ravi"));
        assert_eq!(profile("{}").greeting_name(), None);
    }

    #[test]
    fn test_persisted_form_round_trips() {
        let user = profile(r#"{"userId":1,"username":"kim","name":"Kim","roles":["admin"]}"#);
        let stored = serde_json::to_string(&user).unwrap();
        assert_eq!(
            stored,
            r#"{"id":1,"username":"kim","name":"Kim","roles":["admin"]}"#
        );
        assert_eq!(profile(&stored), user);

        let guid = profile(r#"{"userID":"3f2a-guid"}"#);
        let stored = serde_json::to_string(&guid).unwrap();
        assert_eq!(stored, r#"{"id":"3f2a-guid"}"#);
        assert_eq!(profile(&stored), guid);
    }
}
