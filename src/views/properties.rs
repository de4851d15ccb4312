use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::cache::{Mutation, QueryKey, QueryName};
use crate::context::AppContext;
use crate::errors::{AppError, Result};
use crate::forms::PropertyForm;
use crate::mappers::PropertyView;
use crate::models::{NewProperty, PropertyPatch, PropertyStatus};
use crate::queries;
use crate::views::dialog::Dialog;

/// Property list with its create/edit dialog
pub struct PropertiesView {
    ctx: Arc<AppContext>,
    dialog: Dialog<PropertyView>,
}

impl PropertiesView {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            dialog: Dialog::Closed,
        }
    }

    pub fn dialog(&self) -> &Dialog<PropertyView> {
        &self.dialog
    }

    pub async fn list(&self) -> Result<Vec<PropertyView>> {
        let owner = self.ctx.owner().await?;
        let data = self.ctx.data();
        self.ctx
            .cache()
            .get_or_fetch(&QueryKey::owned(QueryName::Properties, owner), || {
                queries::list_properties(data, owner)
            })
            .await
    }

    /// Open the empty dialog and return its initial values
    pub fn open_create(&mut self) -> PropertyForm {
        self.dialog.open_create();
        PropertyForm::default()
    }

    /// Open the dialog seeded with a listed property and return its values
    pub async fn open_edit(&mut self, id: Uuid) -> Result<PropertyForm> {
        let property = self
            .list()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound {
                resource: "Propriedade",
                id: id.to_string(),
            })?;
        let form = PropertyForm::from_view(&property);
        self.dialog.open_edit(property);
        Ok(form)
    }

    pub fn cancel(&mut self) {
        self.dialog.close();
    }

    /// Validate and save the dialog's form.
    ///
    /// On success the dialog closes and the property queries are invalidated.
    /// On any failure the dialog stays open.
    pub async fn submit(&mut self, form: &PropertyForm) -> Result<PropertyView> {
        let input = form.check()?;
        let owner = self.ctx.owner().await?;
        let data = self.ctx.data();

        let (saved, mutation, message) = match self.dialog.seed() {
            None => {
                let new = NewProperty {
                    title: input.title,
                    address: input.address,
                    price: input.price,
                    status: PropertyStatus::Available,
                    owner_id: owner,
                };
                (
                    queries::insert_property(data, &new).await,
                    Mutation::CreateProperty,
                    "Propriedade cadastrada com sucesso!",
                )
            }
            Some(existing) => {
                let patch = PropertyPatch {
                    title: input.title,
                    address: input.address,
                    price: input.price,
                };
                (
                    queries::update_property(data, existing.id, &patch).await,
                    Mutation::UpdateProperty,
                    "Propriedade atualizada com sucesso!",
                )
            }
        };

        let saved = match saved {
            Ok(row) => PropertyView::from(row),
            Err(err) => {
                self.ctx.notifier().error(err.user_message());
                return Err(err);
            }
        };

        info!(property = %saved.id, ?mutation, "Property saved");
        self.ctx.cache().invalidate(mutation).await;
        self.dialog.close();
        self.ctx.notifier().success(message);
        Ok(saved)
    }
}
