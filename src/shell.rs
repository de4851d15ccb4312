//! Navigation shell: maps paths to views and gates them on the session.

use std::sync::Arc;
use tracing::{debug, info};

use crate::context::AppContext;
use crate::errors::{AppError, Result};
use crate::routes::Route;
use crate::session::{Credentials, Session};
use crate::views::{AuthView, DashboardView, PropertiesView, RentalsView, SettingsView};

/// The view mounted for the current route
pub enum Screen {
    Dashboard(DashboardView),
    Properties(PropertiesView),
    Rentals(RentalsView),
    Settings(SettingsView),
    Auth(AuthView),
    NotFound,
}

impl Screen {
    fn mount(route: Route, ctx: Arc<AppContext>) -> Self {
        match route {
            Route::Dashboard => Screen::Dashboard(DashboardView::new(ctx)),
            Route::Properties => Screen::Properties(PropertiesView::new(ctx)),
            Route::Rentals => Screen::Rentals(RentalsView::new(ctx)),
            Route::Settings => Screen::Settings(SettingsView::new(ctx)),
            Route::Auth => Screen::Auth(AuthView::new(ctx)),
            Route::NotFound => Screen::NotFound,
        }
    }
}

pub struct Shell {
    ctx: Arc<AppContext>,
    route: Route,
    screen: Screen,
}

impl Shell {
    /// Starts on `/auth`; call `navigate` once a session may exist
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let screen = Screen::mount(Route::Auth, ctx.clone());
        Self {
            ctx,
            route: Route::Auth,
            screen,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    /// Go to `path`, remounting its view. Protected routes without a session
    /// land on `/auth`. Any open dialog of the previous view is discarded.
    pub async fn navigate(&mut self, path: &str) -> Route {
        let authenticated = self.ctx.is_authenticated().await;
        let route = Route::resolve(path, authenticated);
        if route != Route::parse(path) {
            info!(requested = path, "No session, redirecting to /auth");
        }
        debug!(%route, "Mounting view");
        self.screen = Screen::mount(route, self.ctx.clone());
        self.route = route;
        route
    }

    /// Sign in from the auth screen and go to the dashboard. On failure the
    /// route stays at `/auth` and the error is returned after being toasted.
    /// Results cached for a previous account are dropped.
    pub async fn sign_in(&mut self, credentials: &Credentials) -> Result<Session> {
        let auth = AuthView::new(self.ctx.clone());
        let session = auth.sign_in(credentials).await?;
        self.ctx.cache().clear().await;
        self.navigate(Route::Dashboard.path()).await;
        Ok(session)
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        AuthView::new(self.ctx.clone()).sign_out().await?;
        self.navigate(Route::Auth.path()).await;
        Ok(())
    }

    /// Send the user back to `/auth` when an error means the session is gone
    pub async fn handle_error(&mut self, err: &AppError) {
        if err.requires_sign_in() {
            self.ctx.cache().clear().await;
            self.navigate(Route::Auth.path()).await;
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn dashboard(&mut self) -> Option<&mut DashboardView> {
        match &mut self.screen {
            Screen::Dashboard(view) => Some(view),
            _ => None,
        }
    }

    pub fn properties(&mut self) -> Option<&mut PropertiesView> {
        match &mut self.screen {
            Screen::Properties(view) => Some(view),
            _ => None,
        }
    }

    pub fn rentals(&mut self) -> Option<&mut RentalsView> {
        match &mut self.screen {
            Screen::Rentals(view) => Some(view),
            _ => None,
        }
    }

    pub fn settings(&mut self) -> Option<&mut SettingsView> {
        match &mut self.screen {
            Screen::Settings(view) => Some(view),
            _ => None,
        }
    }

    pub fn auth(&mut self) -> Option<&mut AuthView> {
        match &mut self.screen {
            Screen::Auth(view) => Some(view),
            _ => None,
        }
    }
}
