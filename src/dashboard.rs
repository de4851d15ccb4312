//! Monthly dashboard figures.
//!
//! Each figure is its own remote query. The month window runs from
//! `<month>-01` to the month's last day, or to the literal `<month>-31` when
//! `MonthBoundary::Fixed` is configured.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::MonthBoundary;
use crate::errors::{AppError, Result};
use crate::mappers::format_brl;
use crate::models::{RentalStatus, TenantRef};
use crate::queries::decode;
use crate::remote::{DataService, Query, Table};

/// A calendar month selected on the dashboard, written `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|_| Self { year, month })
            .ok_or_else(|| AppError::InvalidMonth {
                value: format!("{year}-{month:02}"),
            })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `<year>-<month>-01`
    pub fn first_day(&self) -> String {
        format!("{:04}-{:02}-01", self.year, self.month)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Inclusive upper bound of the month window, for date columns
    pub fn upper_bound(&self, boundary: MonthBoundary) -> String {
        match boundary {
            MonthBoundary::Fixed => format!("{:04}-{:02}-31", self.year, self.month),
            MonthBoundary::Calendar => {
                let next = self.next();
                NaiveDate::from_ymd_opt(next.year, next.month, 1)
                    .and_then(|first| first.pred_opt())
                    .map(|last| last.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| self.upper_bound(MonthBoundary::Fixed))
            }
        }
    }
}

impl FromStr for Month {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AppError::InvalidMonth { value: s.to_string() };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Month::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Figures shown on the dashboard for one month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub month: String,
    pub property_count: u64,
    pub active_rentals: u64,
    pub tenant_count: usize,
    pub revenue: Decimal,
    pub revenue_display: String,
}

#[derive(Deserialize)]
struct PriceRef {
    monthly_price: Decimal,
}

/// Sum of `monthly_price` over active rentals overlapping the month
pub async fn monthly_revenue(
    data: &dyn DataService,
    owner: Uuid,
    month: Month,
    boundary: MonthBoundary,
) -> Result<Decimal> {
    let query = Query::from(Table::Rentals)
        .select(&["monthly_price"])
        .eq("owner_id", owner)
        .eq("status", RentalStatus::Active.as_str())
        .lte("start_date", month.upper_bound(boundary))
        .gte("end_date", month.first_day());

    let rows: Vec<PriceRef> = decode(data.select(&query).await?)?;
    Ok(rows.iter().map(|r| r.monthly_price).sum())
}

/// `created_at` is a timestamp, so the calendar window ends strictly before
/// the next month starts; the fixed window keeps its literal `-31` bound.
fn created_by(owner: Uuid, month: Month, boundary: MonthBoundary) -> Query {
    let query = Query::from(Table::Properties).eq("owner_id", owner);
    match boundary {
        MonthBoundary::Fixed => query.lte("created_at", month.upper_bound(boundary)),
        MonthBoundary::Calendar => query.lt("created_at", month.next().first_day()),
    }
}

/// Properties created on or before the month
pub async fn property_count(
    data: &dyn DataService,
    owner: Uuid,
    month: Month,
    boundary: MonthBoundary,
) -> Result<u64> {
    data.count(&created_by(owner, month, boundary)).await
}

fn active_started_by(owner: Uuid, month: Month, boundary: MonthBoundary) -> Query {
    Query::from(Table::Rentals)
        .eq("owner_id", owner)
        .eq("status", RentalStatus::Active.as_str())
        .lte("start_date", month.upper_bound(boundary))
}

/// Active rentals that started on or before the month
pub async fn active_rental_count(
    data: &dyn DataService,
    owner: Uuid,
    month: Month,
    boundary: MonthBoundary,
) -> Result<u64> {
    data.count(&active_started_by(owner, month, boundary)).await
}

/// Distinct tenant CPFs among the active rentals started on or before the month
pub async fn tenant_count(
    data: &dyn DataService,
    owner: Uuid,
    month: Month,
    boundary: MonthBoundary,
) -> Result<usize> {
    let query = active_started_by(owner, month, boundary).select(&["tenant_cpf"]);
    let rows: Vec<TenantRef> = decode(data.select(&query).await?)?;
    let tenants: HashSet<String> = rows.into_iter().map(|r| r.tenant_cpf).collect();
    Ok(tenants.len())
}

/// All dashboard figures; the four queries run concurrently
pub async fn compute(
    data: &dyn DataService,
    owner: Uuid,
    month: Month,
    boundary: MonthBoundary,
) -> Result<DashboardStats> {
    let (property_count, active_rentals, tenant_count, revenue) = tokio::try_join!(
        property_count(data, owner, month, boundary),
        active_rental_count(data, owner, month, boundary),
        tenant_count(data, owner, month, boundary),
        monthly_revenue(data, owner, month, boundary),
    )?;

    Ok(DashboardStats {
        month: month.to_string(),
        property_count,
        active_rentals,
        tenant_count,
        revenue,
        revenue_display: format_brl(revenue),
    })
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

    #[test]
    fn test_month_parsing() {
        let month: Month = "2024-03".parse().unwrap();
        assert_eq!(month.first_day(), "2024-03-01");
        assert_eq!(month.to_string(), "2024-03");
        assert!("2024-13".parse::<Month>().is_err());
        assert!("March".parse::<Month>().is_err());
        assert!("2024-3".parse::<Month>().is_err());
    }

    #[test]
    fn test_fixed_upper_bound_ignores_month_length() {
        let february: Month = "2024-02".parse().unwrap();
        assert_eq!(february.upper_bound(MonthBoundary::Fixed), "2024-02-31");
        assert_eq!(february.upper_bound(MonthBoundary::Calendar), "2024-02-29");

        let december: Month = "2023-12".parse().unwrap();
        assert_eq!(december.upper_bound(MonthBoundary::Calendar), "2023-12-31");
        assert_eq!(december.next().first_day(), "2024-01-01");
    }

    #[test]
    fn test_calendar_property_window_ends_before_next_month() {
        let owner = Uuid::new_v4();
        let march: Month = "2024-03".parse().unwrap();

        let calendar = created_by(owner, march, MonthBoundary::Calendar);
        let last = calendar.filters.last().unwrap();
        assert_eq!(last.column, "created_at");
        assert_eq!(last.param_value(), "lt.2024-04-01");

        let fixed = created_by(owner, march, MonthBoundary::Fixed);
        assert_eq!(fixed.filters.last().unwrap().param_value(), "lte.2024-03-31");
    }

    #[tokio::test]
    async fn test_property_created_late_on_last_day_is_counted() {
        let (backend, owner) = demo().await;
        backend
            .seed(
                Table::Properties,
                serde_json::json!({
                    "id": Uuid::new_v4(),
                    "title": "Studio",
                    "address": "Rua C, 3",
                    "price": "900",
                    "status": "Disponível",
                    "owner_id": owner,
                    "created_at": "2024-03-31T22:15:00Z",
                }),
            )
            .await;

        let march: Month = "2024-03".parse().unwrap();
        assert_eq!(property_count(&backend, owner, march, MonthBoundary::Calendar).await.unwrap(), 4);
        let april: Month = "2024-04".parse().unwrap();
        assert_eq!(property_count(&backend, owner, april, MonthBoundary::Calendar).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_revenue_sums_overlapping_active_rentals() {
        let (backend, owner) = demo().await;
        let boundary = MonthBoundary::Fixed;

        let january = monthly_revenue(&backend, owner, "2024-01".parse().unwrap(), boundary).await.unwrap();
        assert_eq!(january, Decimal::from(2500));

        let june = monthly_revenue(&backend, owner, "2024-06".parse().unwrap(), boundary).await.unwrap();
        assert_eq!(june, Decimal::from(5700));

        let empty = monthly_revenue(&backend, owner, "2030-01".parse().unwrap(), boundary).await.unwrap();
        assert_eq!(empty, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_compute_dashboard() {
        let (backend, owner) = demo().await;
        let stats = compute(&backend, owner, "2024-03".parse().unwrap(), MonthBoundary::Fixed)
            .await
            .unwrap();

        assert_eq!(stats.property_count, 3);
        assert_eq!(stats.active_rentals, 2);
        assert_eq!(stats.tenant_count, 2);
        assert_eq!(stats.revenue_display, "R$ 5.700,00");
    }
}
