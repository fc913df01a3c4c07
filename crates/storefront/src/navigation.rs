//! Storefront routes and the session gate for protected ones.

use std::fmt;

use styleaura_core::ProductId;

use crate::session::Session;

/// A storefront location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Products,
    Product(ProductId),
    Cart,
    Login,
    Register,
    Admin,
    Checkout,
}

impl Route {
    /// Path of the route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Products => "/products".to_string(),
            Self::Product(id) => format!("/products/{id}"),
            Self::Cart => "/cart".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::Admin => "/admin".to_string(),
            Self::Checkout => "/checkout".to_string(),
        }
    }

    /// Resolve a path. Unknown paths resolve to [`Route::Home`].
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["products"] => Self::Products,
            ["products", id] => id.parse().map_or(Self::Home, Self::Product),
            ["cart"] => Self::Cart,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["admin", ..] => Self::Admin,
            ["checkout"] => Self::Checkout,
            _ => Self::Home,
        }
    }

    /// Whether visiting the route needs a signed-in user.
    #[must_use]
    pub const fn requires_session(&self) -> bool {
        matches!(self, Self::Checkout)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of [`require_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Send the user to the login page; after signing in they return to
    /// `from`.
    RedirectToLogin { from: Route },
}

/// Gate a navigation to `target` on the session.
#[must_use]
pub fn require_session(session: &Session, target: Route) -> Access {
    if !target.requires_session() || session.is_authenticated() {
        Access::Granted
    } else {
        Access::RedirectToLogin { from: target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use crate::session::{MemoryStorage, SessionStore};

    #[test]
    fn test_parse_round_trips() {
        for route in [
            Route::Home,
            Route::Products,
            Route::Product(ProductId::new(12)),
            Route::Cart,
            Route::Login,
            Route::Register,
            Route::Admin,
            Route::Checkout,
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn test_unknown_paths_fall_back_home() {
        assert_eq!(Route::parse("/nowhere"), Route::Home);
        assert_eq!(Route::parse("/products/abc"), Route::Home);
        assert_eq!(Route::parse("/products?search=kurta"), Route::Products);
    }

    #[test]
    fn test_checkout_requires_session() {
        let store = SessionStore::restore(MemoryStorage::new());
        assert_eq!(
            require_session(&store.snapshot(), Route::Checkout),
            Access::RedirectToLogin {
                from: Route::Checkout
            }
        );
        assert_eq!(
            require_session(&store.snapshot(), Route::Cart),
            Access::Granted
        );

        store.login("tok", UserProfile::default());
        assert_eq!(
            require_session(&store.snapshot(), Route::Checkout),
            Access::Granted
        );
    }
}
