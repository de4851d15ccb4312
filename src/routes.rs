use std::fmt;

/// Client-side routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Properties,
    Rentals,
    Settings,
    Auth,
    NotFound,
}

impl Route {
    /// Route for a URL path; query strings and a trailing slash are ignored
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Dashboard,
            "/properties" => Route::Properties,
            "/rentals" => Route::Rentals,
            "/settings" => Route::Settings,
            "/auth" => Route::Auth,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Properties => "/properties",
            Route::Rentals => "/rentals",
            Route::Settings => "/settings",
            Route::Auth => "/auth",
            Route::NotFound => "*",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Auth | Route::NotFound)
    }

    /// Where a navigation actually lands given the session state
    pub fn resolve(path: &str, authenticated: bool) -> Self {
        let route = Route::parse(path);
        if route.requires_auth() && !authenticated {
            Route::Auth
        } else {
            route
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Route::parse("/"), Route::Dashboard);
        assert_eq!(Route::parse("/rentals/"), Route::Rentals);
        assert_eq!(Route::parse("/auth?reset=true"), Route::Auth);
        assert_eq!(Route::parse("/nope"), Route::NotFound);
    }

    #[test]
    fn test_unauthenticated_redirects_to_auth() {
        assert_eq!(Route::resolve("/properties", false), Route::Auth);
        assert_eq!(Route::resolve("/properties", true), Route::Properties);
        assert_eq!(Route::resolve("/auth", false), Route::Auth);
        assert_eq!(Route::resolve("/missing", false), Route::NotFound);
    }
}
