use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RentalStatus {
    #[default]
    #[serde(rename = "Ativo")]
    Active,
    #[serde(rename = "Inativo")]
    Inactive,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Active => "Ativo",
            RentalStatus::Inactive => "Inativo",
        }
    }
}

/// Title of the property embedded by a joined select
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyTitle {
    pub title: String,
}

/// A row of the `rentals` table, optionally with `properties(title)` embedded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RentalRow {
    pub id: Uuid,
    pub property_id: Uuid,
    pub tenant_name: String,
    pub tenant_cpf: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_price: Decimal,
    pub status: RentalStatus,
    #[serde(default)]
    pub contract_file: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "properties", default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyTitle>,
}

/// `tenant_cpf` projection used for the distinct-tenant count
#[derive(Debug, Clone, Deserialize)]
pub struct TenantRef {
    pub tenant_cpf: String,
}

/// Insert payload for `rentals`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewRental {
    pub property_id: Uuid,
    pub tenant_name: String,
    pub tenant_cpf: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_price: Decimal,
    pub status: RentalStatus,
    pub contract_file: Option<String>,
    pub owner_id: Uuid,
}

/// Fields the edit form may change. Date ordering is not re-checked.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RentalPatch {
    pub property_id: Uuid,
    pub tenant_name: String,
    pub tenant_cpf: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_file: Option<String>,
}
