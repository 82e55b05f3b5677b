use std::fmt;

use super::store::{SessionStore, SharedSessionStore};

/// The one authorization predicate. Both the protected-route check and the
/// wildcard fallback go through here.
pub fn is_authenticated(store: &dyn SessionStore) -> bool {
    store.is_present()
}

/// Every screen the client can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Chat,
    MyShelves,
    Shelves,
    ShelfDocuments(String),
    SuperAdmin,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Signup => "/register".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Chat => "/home".to_string(),
            Route::MyShelves => "/admin".to_string(),
            Route::Shelves => "/shelves".to_string(),
            Route::ShelfDocuments(id) => format!("/shelves/{}", id),
            Route::SuperAdmin => "/admin-1".to_string(),
        }
    }

    /// Match a path to a route. Trailing slashes and query strings are ignored;
    /// anything unrecognized returns `None` and falls to the wildcard rule.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').skip(1).collect();

        match segments.as_slice() {
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Signup),
            ["dashboard"] => Some(Route::Dashboard),
            ["home"] => Some(Route::Chat),
            ["admin"] => Some(Route::MyShelves),
            ["shelves"] => Some(Route::Shelves),
            ["shelves", id] if !id.is_empty() => Some(Route::ShelfDocuments(id.to_string())),
            ["admin-1"] => Some(Route::SuperAdmin),
            _ => None,
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Signup)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign In",
            Route::Signup => "Create Account",
            Route::Dashboard => "Dashboard",
            Route::Chat => "Chat",
            Route::MyShelves => "My Shelves",
            Route::Shelves => "Shelves",
            Route::ShelfDocuments(_) => "Documents",
            Route::SuperAdmin => "Super Admin",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of a routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

impl Navigation {
    /// The route that ends up on screen.
    pub fn target(&self) -> &Route {
        match self {
            Navigation::Render(route) | Navigation::Redirect(route) => route,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Navigation::Redirect(_))
    }
}

/// Guards protected routes. Nothing is cached: every call re-reads the store.
#[derive(Clone)]
pub struct AuthGate {
    store: SharedSessionStore,
}

impl AuthGate {
    pub fn new(store: SharedSessionStore) -> Self {
        Self { store }
    }

    pub fn is_authenticated(&self) -> bool {
        is_authenticated(self.store.as_ref())
    }

    /// Resolve a raw path, including the wildcard fallback for unknown paths.
    pub fn resolve(&self, path: &str) -> Navigation {
        match Route::parse(path) {
            Some(route) => self.guard(route),
            None => self.fallback(),
        }
    }

    /// Decide whether `route` may render with the current session.
    pub fn guard(&self, route: Route) -> Navigation {
        let authenticated = self.is_authenticated();
        match route {
            Route::Login if authenticated => Navigation::Redirect(Route::Dashboard),
            route if route.is_protected() && !authenticated => Navigation::Redirect(Route::Login),
            route => Navigation::Render(route),
        }
    }

    /// Where unmatched paths go.
    pub fn fallback(&self) -> Navigation {
        if self.is_authenticated() {
            Navigation::Redirect(Route::Dashboard)
        } else {
            Navigation::Redirect(Route::Login)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::MemorySessionStore;

    fn gate_with(token: Option<&str>) -> (AuthGate, Arc<MemorySessionStore>) {
        let store = Arc::new(match token {
            Some(t) => MemorySessionStore::with_token(t),
            None => MemorySessionStore::new(),
        });
        (AuthGate::new(store.clone()), store)
    }

    #[test]
    fn test_route_parse_round_trip() {
        let routes = [
            Route::Login,
            Route::Signup,
            Route::Dashboard,
            Route::Chat,
            Route::MyShelves,
            Route::Shelves,
            Route::ShelfDocuments("42".into()),
            Route::SuperAdmin,
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route.clone()), "{}", route);
        }
    }

    #[test]
    fn test_route_parse_tolerates_trailing_slash_and_query() {
        assert_eq!(Route::parse("/dashboard/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/shelves?search=q4"), Some(Route::Shelves));
        assert_eq!(Route::parse("/nope"), None);
        assert_eq!(Route::parse(""), None);
        assert_eq!(Route::parse("/shelves/1/extra"), None);
    }

    #[test]
    fn test_unauthenticated_protected_redirects_to_login() {
        let (gate, _) = gate_with(None);
        assert_eq!(gate.resolve("/dashboard"), Navigation::Redirect(Route::Login));
        assert_eq!(gate.resolve("/shelves/7"), Navigation::Redirect(Route::Login));
    }

    #[test]
    fn test_authenticated_protected_renders() {
        let (gate, _) = gate_with(Some("abc123"));
        assert_eq!(gate.resolve("/dashboard"), Navigation::Render(Route::Dashboard));
        assert_eq!(gate.resolve("/home"), Navigation::Render(Route::Chat));
    }

    #[test]
    fn test_public_routes() {
        let (gate, _) = gate_with(None);
        assert_eq!(gate.resolve("/login"), Navigation::Render(Route::Login));
        assert_eq!(gate.resolve("/register"), Navigation::Render(Route::Signup));

        // An existing session skips the login screen
        let (gate, _) = gate_with(Some("abc123"));
        assert_eq!(gate.resolve("/login"), Navigation::Redirect(Route::Dashboard));
        assert_eq!(gate.resolve("/register"), Navigation::Render(Route::Signup));
    }

    #[test]
    fn test_wildcard_follows_session_presence() {
        let (gate, store) = gate_with(None);
        assert_eq!(gate.resolve("/does-not-exist"), Navigation::Redirect(Route::Login));

        store.set("abc123").unwrap();
        assert_eq!(gate.resolve("/does-not-exist"), Navigation::Redirect(Route::Dashboard));
    }

    #[test]
    fn test_gate_is_reevaluated_after_clear() {
        let (gate, store) = gate_with(Some("abc123"));
        assert!(!gate.resolve("/shelves").is_redirect());

        store.clear().unwrap();
        assert_eq!(gate.resolve("/shelves"), Navigation::Redirect(Route::Login));
        assert_eq!(gate.guard(Route::Chat).target(), &Route::Login);
    }
}
