use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Occupancy of a property, stored on the row and flipped when a rental is created
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PropertyStatus {
    #[default]
    #[serde(rename = "Disponível")]
    Available,
    #[serde(rename = "Alugado")]
    Rented,
}

impl PropertyStatus {
    /// Label as stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "Disponível",
            PropertyStatus::Rented => "Alugado",
        }
    }
}

/// A row of the `properties` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyRow {
    pub id: Uuid,
    pub title: String,
    pub address: String,
    pub price: Decimal,
    pub status: PropertyStatus,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// `id, title` projection used to fill the rental form's property picker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyOption {
    pub id: Uuid,
    pub title: String,
}

/// Insert payload for `properties`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewProperty {
    pub title: String,
    pub address: String,
    pub price: Decimal,
    pub status: PropertyStatus,
    pub owner_id: Uuid,
}

/// Fields the edit form may change
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PropertyPatch {
    pub title: String,
    pub address: String,
    pub price: Decimal,
}
