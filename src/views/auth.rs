use std::sync::Arc;
use tracing::info;

use crate::context::AppContext;
use crate::errors::Result;
use crate::session::{Credentials, Session};

/// Sign-in, sign-up and password-reset screen
pub struct AuthView {
    ctx: Arc<AppContext>,
}

impl AuthView {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Sign in; a rejection raises the provider's message as an error toast
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        match self.ctx.auth().sign_in(credentials).await {
            Ok(session) => Ok(session),
            Err(err) => {
                self.ctx.notifier().error(err.user_message());
                Err(err)
            }
        }
    }

    pub async fn sign_up(&self, credentials: &Credentials, full_name: &str) -> Result<()> {
        match self.ctx.auth().sign_up(credentials, full_name).await {
            Ok(()) => {
                self.ctx
                    .notifier()
                    .success("Conta criada com sucesso! Verifique seu email.");
                Ok(())
            }
            Err(err) => {
                self.ctx.notifier().error(err.user_message());
                Err(err)
            }
        }
    }

    /// Send the reset email; the link comes back to `/auth?reset=true`
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let redirect = self.ctx.config().reset_redirect_url();
        match self.ctx.auth().reset_password_email(email, &redirect).await {
            Ok(()) => {
                self.ctx.notifier().success(
                    "Email de redefinição de senha enviado! Verifique sua caixa de entrada.",
                );
                Ok(())
            }
            Err(err) => {
                self.ctx.notifier().error(err.user_message());
                Err(err)
            }
        }
    }

    /// End the session and forget every cached result
    pub async fn sign_out(&self) -> Result<()> {
        self.ctx.auth().sign_out().await?;
        self.ctx.cache().clear().await;
        info!("Signed out");
        Ok(())
    }
}
