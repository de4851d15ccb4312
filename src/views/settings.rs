use std::sync::Arc;
use tracing::error;

use crate::cache::{Mutation, QueryKey, QueryName};
use crate::context::AppContext;
use crate::errors::{AppError, Result};
use crate::forms::{PasswordForm, ProfileForm};
use crate::mappers::ProfileView;
use crate::models::ProfilePatch;
use crate::queries;

/// Profile and password settings
pub struct SettingsView {
    ctx: Arc<AppContext>,
}

impl SettingsView {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub async fn profile(&self) -> Result<ProfileView> {
        let user = self.ctx.owner().await?;
        let data = self.ctx.data();
        self.ctx
            .cache()
            .get_or_fetch(&QueryKey::owned(QueryName::Profile, user), || queries::get_profile(data, user))
            .await
    }

    /// Values to pre-fill the profile form with
    pub async fn profile_form(&self) -> Result<ProfileForm> {
        let profile = self.profile().await?;
        Ok(ProfileForm {
            full_name: profile.full_name,
        })
    }

    /// Save the name to the profile row, then mirror it into the account metadata
    pub async fn update_profile(&self, form: &ProfileForm) -> Result<ProfileView> {
        let full_name = form.check()?;
        let user = self.ctx.owner().await?;

        let saved = async {
            let patch = ProfilePatch { full_name: full_name.clone() };
            let profile = queries::update_profile(self.ctx.data(), user, &patch).await?;
            self.ctx.auth().update_full_name(&full_name).await?;
            Ok::<_, AppError>(profile)
        }
        .await;

        match saved {
            Ok(profile) => {
                self.ctx.cache().invalidate(Mutation::UpdateProfile).await;
                self.ctx.notifier().success("Perfil atualizado com sucesso!");
                Ok(profile)
            }
            Err(err) => {
                error!(error = %err, "Profile update failed");
                self.ctx.notifier().error("Erro ao atualizar o perfil");
                Err(err)
            }
        }
    }

    pub async fn change_password(&self, form: &PasswordForm) -> Result<()> {
        let password = form.check()?;
        self.ctx.owner().await?;

        match self.ctx.auth().update_password(&password).await {
            Ok(()) => {
                self.ctx.notifier().success("Senha atualizada com sucesso!");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Password update failed");
                self.ctx.notifier().error("Erro ao atualizar a senha");
                Err(err)
            }
        }
    }
}
