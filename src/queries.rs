//! Typed reads and writes against the three tables.
//!
//! Every function is one remote round trip; caching and invalidation are the
//! views' concern.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::mappers::{ProfileView, PropertyView, RentalView};
use crate::models::{
    NewProperty, NewRental, ProfilePatch, ProfileRow, PropertyOption, PropertyPatch, PropertyRow,
    PropertyStatus, RentalPatch, RentalRow, RentalStatus,
};
use crate::remote::{DataService, Filter, Query, Table};

pub(crate) fn decode<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(AppError::from))
        .collect()
}

fn first<T: DeserializeOwned>(rows: Vec<Value>, resource: &'static str, id: Uuid) -> Result<T> {
    decode::<T>(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound {
            resource,
            id: id.to_string(),
        })
}

fn to_row<T: Serialize>(payload: &T) -> Result<Value> {
    Ok(serde_json::to_value(payload)?)
}

/// All of the owner's properties, newest first
pub async fn list_properties(data: &dyn DataService, owner: Uuid) -> Result<Vec<PropertyView>> {
    let query = Query::from(Table::Properties)
        .eq("owner_id", owner)
        .order_by("created_at", false);
    let rows: Vec<PropertyRow> = decode(data.select(&query).await?)?;
    Ok(rows.into_iter().map(PropertyView::from).collect())
}

/// The owner's properties that can still be rented, for the rental form's picker
pub async fn list_available_properties(data: &dyn DataService, owner: Uuid) -> Result<Vec<PropertyOption>> {
    let query = Query::from(Table::Properties)
        .select(&["id", "title"])
        .eq("owner_id", owner)
        .eq("status", PropertyStatus::Available.as_str())
        .order_by("title", true);
    decode(data.select(&query).await?)
}

/// All of the owner's rentals with their property titles, newest first
pub async fn list_rentals(data: &dyn DataService, owner: Uuid) -> Result<Vec<RentalView>> {
    let query = Query::from(Table::Rentals)
        .embed(Table::Properties, "property_id", &["title"])
        .eq("owner_id", owner)
        .order_by("created_at", false);
    let rows: Vec<RentalRow> = decode(data.select(&query).await?)?;
    Ok(rows.into_iter().map(RentalView::from).collect())
}

pub async fn get_profile(data: &dyn DataService, user: Uuid) -> Result<ProfileView> {
    let query = Query::from(Table::Profiles).eq("id", user).limit(1);
    let row: ProfileRow = first(data.select(&query).await?, "Perfil", user)?;
    Ok(row.into())
}

pub async fn insert_property(data: &dyn DataService, property: &NewProperty) -> Result<PropertyRow> {
    let row = data.insert(Table::Properties, to_row(property)?).await?;
    Ok(serde_json::from_value(row)?)
}

pub async fn update_property(data: &dyn DataService, id: Uuid, patch: &PropertyPatch) -> Result<PropertyRow> {
    let rows = data
        .update(Table::Properties, &[Filter::eq("id", id)], to_row(patch)?)
        .await?;
    first(rows, "Propriedade", id)
}

pub async fn set_property_status(data: &dyn DataService, id: Uuid, status: PropertyStatus) -> Result<PropertyRow> {
    let rows = data
        .update(
            Table::Properties,
            &[Filter::eq("id", id)],
            serde_json::json!({ "status": status }),
        )
        .await?;
    first(rows, "Propriedade", id)
}

pub async fn insert_rental(data: &dyn DataService, rental: &NewRental) -> Result<RentalRow> {
    let row = data.insert(Table::Rentals, to_row(rental)?).await?;
    Ok(serde_json::from_value(row)?)
}

pub async fn update_rental(data: &dyn DataService, id: Uuid, patch: &RentalPatch) -> Result<RentalRow> {
    let rows = data
        .update(Table::Rentals, &[Filter::eq("id", id)], to_row(patch)?)
        .await?;
    first(rows, "Aluguel", id)
}

pub async fn set_rental_status(data: &dyn DataService, id: Uuid, status: RentalStatus) -> Result<RentalRow> {
    let rows = data
        .update(
            Table::Rentals,
            &[Filter::eq("id", id)],
            serde_json::json!({ "status": status }),
        )
        .await?;
    first(rows, "Aluguel", id)
}

pub async fn update_profile(data: &dyn DataService, user: Uuid, patch: &ProfilePatch) -> Result<ProfileView> {
    let rows = data
        .update(Table::Profiles, &[Filter::eq("id", user)], to_row(patch)?)
        .await?;
    let row: ProfileRow = first(rows, "Perfil", user)?;
    Ok(row.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::{DEMO_EMAIL, DEMO_PASSWORD};
    use crate::remote::{AuthService, MemoryBackend};
    use crate::session::Credentials;

    async fn demo() -> (MemoryBackend, Uuid) {
        let backend = MemoryBackend::with_sample_data().await;
        let session = backend
            .sign_in(&Credentials::new(DEMO_EMAIL, DEMO_PASSWORD))
            .await
            .unwrap();
        (backend, session.user_id())
    }

    #[tokio::test]
    async fn test_available_properties_excludes_rented() {
        let (backend, owner) = demo().await;
        let options = list_available_properties(&backend, owner).await.unwrap();
        let titles: Vec<&str> = options.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["Cobertura Beira Mar", "Sala Comercial Downtown"]);
    }

    #[tokio::test]
    async fn test_rentals_carry_property_titles() {
        let (backend, owner) = demo().await;
        let rentals = list_rentals(&backend, owner).await.unwrap();
        assert_eq!(rentals.len(), 2);
        assert!(rentals.iter().all(|r| !r.property_title.is_empty()));
    }

    #[tokio::test]
    async fn test_other_owners_rows_are_hidden() {
        let (backend, _) = demo().await;
        let stranger = Uuid::new_v4();
        assert!(list_properties(&backend, stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let (backend, _) = demo().await;
        let err = set_property_status(&backend, Uuid::new_v4(), PropertyStatus::Rented)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_profile_round_trip() {
        let (backend, owner) = demo().await;
        assert_eq!(get_profile(&backend, owner).await.unwrap().full_name, "Conta Demo");

        let patch = ProfilePatch { full_name: "Ana Souza".to_string() };
        update_profile(&backend, owner, &patch).await.unwrap();
        assert_eq!(get_profile(&backend, owner).await.unwrap().full_name, "Ana Souza");
    }
}
