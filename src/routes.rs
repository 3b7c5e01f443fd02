/// Route guard for the front end: protected pages need an authenticated
/// session, the login and register pages are for anonymous users only.
use crate::session::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Portfolios,
    Properties,
    Stocks,
    Login,
    Register,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Session still bootstrapping
    Loading,
    Render(Route),
    Redirect(Route),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        match path.trim_end_matches('/') {
            "" => Route::Dashboard,
            "/portfolios" => Route::Portfolios,
            "/properties" => Route::Properties,
            "/stocks" => Route::Stocks,
            "/login" => Route::Login,
            "/register" => Route::Register,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Portfolios => "/portfolios",
            Route::Properties => "/properties",
            Route::Stocks => "/stocks",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::NotFound => "/404",
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::Portfolios | Route::Properties | Route::Stocks
        )
    }
}

pub fn resolve(route: Route, state: &AuthState) -> Navigation {
    match state {
        AuthState::Bootstrapping => Navigation::Loading,
        AuthState::Anonymous if route.is_protected() => Navigation::Redirect(Route::Login),
        AuthState::Authenticated(_) if matches!(route, Route::Login | Route::Register) => {
            Navigation::Redirect(Route::Dashboard)
        }
        _ => Navigation::Render(route),
    }
}
