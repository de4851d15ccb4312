//! Form values and their validation rules.
//!
//! Each form's `check()` runs synchronously on submit and yields either the
//! parsed payload or the first failing message per field.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::FieldErrors;
use crate::mappers::{parse_amount, PropertyView, RentalView};

/// Largest accepted signed-contract upload
pub const MAX_CONTRACT_BYTES: u64 = 5 * 1024 * 1024;

fn digits_only(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("digits")
            .with_message(Cow::Borrowed("CPF deve conter apenas números")))
    }
}

/// Flatten validator output into the first message per field
fn collect(errors: ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        if let Some(first) = errs.first() {
            let message = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| first.code.to_string());
            out.add(field.to_string(), message);
        }
    }
    out
}

fn run(form: &impl Validate) -> FieldErrors {
    form.validate().err().map(collect).unwrap_or_default()
}

fn parse_date(errors: &mut FieldErrors, field: &str, value: &str) -> Option<NaiveDate> {
    let parsed = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok();
    if parsed.is_none() {
        errors.add(field, "Data inválida");
    }
    parsed
}

fn parse_price(errors: &mut FieldErrors, field: &str, value: &str) -> Option<Decimal> {
    let parsed = parse_amount(value);
    if parsed.is_none() {
        errors.add(field, "Preço inválido");
    }
    parsed
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct PropertyForm {
    #[validate(length(min = 1, message = "O título é obrigatório"))]
    pub title: String,
    #[validate(length(min = 1, message = "O endereço é obrigatório"))]
    pub address: String,
    #[validate(length(min = 1, message = "O preço é obrigatório"))]
    pub price: String,
}

/// A property form that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInput {
    pub title: String,
    pub address: String,
    pub price: Decimal,
}

impl PropertyForm {
    pub fn new(title: &str, address: &str, price: &str) -> Self {
        Self {
            title: title.to_string(),
            address: address.to_string(),
            price: price.to_string(),
        }
    }

    /// Values to pre-fill when editing an existing property
    pub fn from_view(view: &PropertyView) -> Self {
        Self {
            title: view.title.clone(),
            address: view.address.clone(),
            price: view.price_value.normalize().to_string(),
        }
    }

    pub fn check(&self) -> Result<PropertyInput, FieldErrors> {
        let mut errors = run(self);
        let price = if errors.get("price").is_none() {
            parse_price(&mut errors, "price", &self.price)
        } else {
            None
        };

        errors.into_result()?;
        Ok(PropertyInput {
            title: self.title.trim().to_string(),
            address: self.address.trim().to_string(),
            price: price.unwrap_or_default(),
        })
    }
}

/// Reference to a contract document chosen in the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractFile {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct RentalForm {
    #[validate(length(min = 1, message = "A propriedade é obrigatória"))]
    pub property_id: String,
    #[validate(length(min = 1, message = "O nome do inquilino é obrigatório"))]
    pub tenant_name: String,
    #[validate(
        length(equal = 11, message = "CPF inválido"),
        custom(function = "digits_only")
    )]
    pub tenant_cpf: String,
    #[validate(length(min = 1, message = "A data inicial é obrigatória"))]
    pub start_date: String,
    #[validate(length(min = 1, message = "A data final é obrigatória"))]
    pub end_date: String,
    #[validate(length(min = 1, message = "O valor mensal é obrigatório"))]
    pub monthly_price: String,
    pub contract_file: Option<ContractFile>,
}

/// A rental form that passed validation. No start/end ordering is implied.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalInput {
    pub property_id: Uuid,
    pub tenant_name: String,
    pub tenant_cpf: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_price: Decimal,
    pub contract_file: Option<String>,
}

impl RentalForm {
    /// Values to pre-fill when editing an existing rental
    pub fn from_view(view: &RentalView) -> Self {
        Self {
            property_id: view.property_id.to_string(),
            tenant_name: view.tenant_name.clone(),
            tenant_cpf: view.tenant_cpf.clone(),
            start_date: view.start_date.format("%Y-%m-%d").to_string(),
            end_date: view.end_date.format("%Y-%m-%d").to_string(),
            monthly_price: view.monthly_price_value.normalize().to_string(),
            contract_file: None,
        }
    }

    pub fn check(&self) -> Result<RentalInput, FieldErrors> {
        let mut errors = run(self);

        let property_id = match errors.get("property_id") {
            Some(_) => None,
            None => {
                let parsed = Uuid::parse_str(self.property_id.trim()).ok();
                if parsed.is_none() {
                    errors.add("property_id", "Propriedade inválida");
                }
                parsed
            }
        };
        let start_date = match errors.get("start_date") {
            Some(_) => None,
            None => parse_date(&mut errors, "start_date", &self.start_date),
        };
        let end_date = match errors.get("end_date") {
            Some(_) => None,
            None => parse_date(&mut errors, "end_date", &self.end_date),
        };
        let monthly_price = match errors.get("monthly_price") {
            Some(_) => None,
            None => parse_price(&mut errors, "monthly_price", &self.monthly_price),
        };
        if let Some(file) = &self.contract_file {
            if file.size > MAX_CONTRACT_BYTES {
                errors.add("contract_file", "O arquivo deve ter no máximo 5MB");
            }
        }

        errors.into_result()?;
        match (property_id, start_date, end_date, monthly_price) {
            (Some(property_id), Some(start_date), Some(end_date), Some(monthly_price)) => Ok(RentalInput {
                property_id,
                tenant_name: self.tenant_name.trim().to_string(),
                tenant_cpf: self.tenant_cpf.clone(),
                start_date,
                end_date,
                monthly_price,
                contract_file: self.contract_file.as_ref().map(|f| f.name.clone()),
            }),
            _ => Err(FieldErrors::new()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ProfileForm {
    #[validate(length(min = 1, message = "O nome é obrigatório"))]
    pub full_name: String,
}

impl ProfileForm {
    pub fn check(&self) -> Result<String, FieldErrors> {
        run(self).into_result()?;
        Ok(self.full_name.trim().to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct PasswordForm {
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres"))]
    pub password: String,
    pub confirm_password: String,
}

impl PasswordForm {
    pub fn check(&self) -> Result<String, FieldErrors> {
        let mut errors = run(self);
        if self.password != self.confirm_password {
            errors.add("confirm_password", "As senhas não conferem");
        }
        errors.into_result()?;
        Ok(self.password.clone())
    }
}
