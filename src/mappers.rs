//! Row → display-record translation.
//!
//! This is the only place wire rows turn into the records views render:
//! money becomes a `R$` string and rentals get their property title from the
//! joined select.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{ProfileRow, PropertyRow, PropertyStatus, RentalRow, RentalStatus};

/// Format an amount as Brazilian reais: `R$ 1.234,50`
pub fn format_brl(amount: Decimal) -> String {
    let mut value = amount.round_dp(2).abs();
    value.rescale(2);
    let text = value.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let sign = if amount.round_dp(2).is_sign_negative() && !amount.round_dp(2).is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}R$ {grouped},{frac_part}")
}

/// Parse a typed money amount: `1000`, `1200.50`, `2.500`, `1.000,00`, `R$ 2.500`
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        let groups: Vec<&str> = cleaned.split('.').collect();
        let thousands = groups.len() > 1 && groups[1..].iter().all(|g| g.len() == 3);
        if thousands {
            groups.concat()
        } else {
            cleaned
        }
    };

    let value = Decimal::from_str(&normalized).ok()?;
    (!value.is_sign_negative()).then_some(value)
}

/// Property as shown in the list and seeded into the edit dialog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyView {
    pub id: Uuid,
    pub title: String,
    pub address: String,
    pub price: String,
    pub price_value: Decimal,
    pub status: String,
    pub rented: bool,
    pub created_on: NaiveDate,
}

impl From<PropertyRow> for PropertyView {
    fn from(row: PropertyRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            address: row.address,
            price: format_brl(row.price),
            price_value: row.price,
            status: row.status.as_str().to_string(),
            rented: row.status == PropertyStatus::Rented,
            created_on: row.created_at.date_naive(),
        }
    }
}

/// Rental as shown in the list, with the joined property title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RentalView {
    pub id: Uuid,
    pub property_id: Uuid,
    pub property_title: String,
    pub tenant_name: String,
    pub tenant_cpf: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_price: String,
    pub monthly_price_value: Decimal,
    pub status: String,
    pub active: bool,
    pub contract_file: Option<String>,
}

impl From<RentalRow> for RentalView {
    fn from(row: RentalRow) -> Self {
        Self {
            id: row.id,
            property_id: row.property_id,
            property_title: row.property.map(|p| p.title).unwrap_or_default(),
            tenant_name: row.tenant_name,
            tenant_cpf: row.tenant_cpf,
            start_date: row.start_date,
            end_date: row.end_date,
            monthly_price: format_brl(row.monthly_price),
            monthly_price_value: row.monthly_price,
            status: row.status.as_str().to_string(),
            active: row.status == RentalStatus::Active,
            contract_file: row.contract_file,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileView {
    pub id: Uuid,
    pub full_name: String,
}

impl From<ProfileRow> for ProfileView {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name.unwrap_or_default(),
        }
    }
}
