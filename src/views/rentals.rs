use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{Mutation, QueryKey, QueryName};
use crate::context::AppContext;
use crate::errors::{AppError, FieldErrors, Result};
use crate::forms::{RentalForm, RentalInput};
use crate::mappers::RentalView;
use crate::models::{NewRental, PropertyOption, PropertyStatus, RentalPatch, RentalStatus};
use crate::queries;
use crate::views::dialog::Dialog;

/// Rental list with its create/edit dialog
pub struct RentalsView {
    ctx: Arc<AppContext>,
    dialog: Dialog<RentalView>,
}

impl RentalsView {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            dialog: Dialog::Closed,
        }
    }

    pub fn dialog(&self) -> &Dialog<RentalView> {
        &self.dialog
    }

    pub async fn list(&self) -> Result<Vec<RentalView>> {
        let owner = self.ctx.owner().await?;
        let data = self.ctx.data();
        self.ctx
            .cache()
            .get_or_fetch(&QueryKey::owned(QueryName::Rentals, owner), || {
                queries::list_rentals(data, owner)
            })
            .await
    }

    /// Properties the form may pick: the owner's, still available
    pub async fn available_properties(&self) -> Result<Vec<PropertyOption>> {
        let owner = self.ctx.owner().await?;
        let data = self.ctx.data();
        self.ctx
            .cache()
            .get_or_fetch(&QueryKey::owned(QueryName::AvailableProperties, owner), || {
                queries::list_available_properties(data, owner)
            })
            .await
    }

    pub fn open_create(&mut self) -> RentalForm {
        self.dialog.open_create();
        RentalForm::default()
    }

    pub async fn open_edit(&mut self, id: Uuid) -> Result<RentalForm> {
        let rental = self
            .list()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound {
                resource: "Aluguel",
                id: id.to_string(),
            })?;
        let form = RentalForm::from_view(&rental);
        self.dialog.open_edit(rental);
        Ok(form)
    }

    pub fn cancel(&mut self) {
        self.dialog.close();
    }

    /// A new rental must pick one of the owner's available properties. An
    /// edited rental keeps the property it already points at.
    async fn check_property(&self, input: &RentalInput) -> Result<()> {
        let allowed = match self.dialog.seed() {
            Some(existing) => existing.property_id == input.property_id,
            None => self
                .available_properties()
                .await?
                .iter()
                .any(|p| p.id == input.property_id),
        };
        if allowed {
            Ok(())
        } else {
            let mut errors = FieldErrors::new();
            errors.add("property_id", "Propriedade inválida");
            Err(errors.into())
        }
    }

    /// Validate and save the dialog's form.
    ///
    /// Creating runs two writes in order: insert the rental, then mark its
    /// property as rented. Caches are invalidated only after both succeed. If
    /// the second write fails the rental stays created and nothing undoes it.
    pub async fn submit(&mut self, form: &RentalForm) -> Result<RentalView> {
        let input = form.check()?;
        self.check_property(&input).await?;
        let owner = self.ctx.owner().await?;

        let result = match self.dialog.seed().map(|r| r.id) {
            None => self.create(input, owner).await,
            Some(id) => self.update(id, input).await,
        };

        match result {
            Ok((saved, mutation, message)) => {
                self.ctx.cache().invalidate(mutation).await;
                self.dialog.close();
                self.ctx.notifier().success(message);
                Ok(saved)
            }
            Err(err) => {
                self.ctx.notifier().error(err.user_message());
                Err(err)
            }
        }
    }

    async fn create(&self, input: RentalInput, owner: Uuid) -> Result<(RentalView, Mutation, &'static str)> {
        let data = self.ctx.data();
        let new = NewRental {
            property_id: input.property_id,
            tenant_name: input.tenant_name,
            tenant_cpf: input.tenant_cpf,
            start_date: input.start_date,
            end_date: input.end_date,
            monthly_price: input.monthly_price,
            status: RentalStatus::Active,
            contract_file: input.contract_file,
            owner_id: owner,
        };

        let rental = queries::insert_rental(data, &new).await?;
        info!(rental = %rental.id, property = %rental.property_id, "Rental created");

        if let Err(err) = queries::set_property_status(data, rental.property_id, PropertyStatus::Rented).await {
            warn!(
                rental = %rental.id,
                property = %rental.property_id,
                error = %err,
                "Rental created but property status was not updated"
            );
            return Err(err);
        }

        Ok((rental.into(), Mutation::CreateRental, "Aluguel cadastrado com sucesso!"))
    }

    async fn update(&self, id: Uuid, input: RentalInput) -> Result<(RentalView, Mutation, &'static str)> {
        let patch = RentalPatch {
            property_id: input.property_id,
            tenant_name: input.tenant_name,
            tenant_cpf: input.tenant_cpf,
            start_date: input.start_date,
            end_date: input.end_date,
            monthly_price: input.monthly_price,
            contract_file: input.contract_file,
        };
        let rental = queries::update_rental(self.ctx.data(), id, &patch).await?;
        info!(rental = %rental.id, "Rental updated");
        Ok((rental.into(), Mutation::UpdateRental, "Aluguel atualizado com sucesso!"))
    }

    /// End a rental. The property keeps its Rented status.
    pub async fn deactivate(&mut self, id: Uuid) -> Result<RentalView> {
        self.ctx.owner().await?;
        match queries::set_rental_status(self.ctx.data(), id, RentalStatus::Inactive).await {
            Ok(rental) => {
                self.ctx.cache().invalidate(Mutation::DeactivateRental).await;
                self.ctx.notifier().success("Aluguel encerrado com sucesso!");
                Ok(rental.into())
            }
            Err(err) => {
                self.ctx.notifier().error(err.user_message());
                Err(err)
            }
        }
    }
}
