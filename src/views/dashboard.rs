use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::cache::{QueryKey, QueryName};
use crate::context::AppContext;
use crate::dashboard::{self, DashboardStats, Month};
use crate::errors::Result;

/// Dashboard cards for one selected month
pub struct DashboardView {
    ctx: Arc<AppContext>,
    month: Month,
}

impl DashboardView {
    /// Starts on the current month
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            month: Month::containing(Utc::now().date_naive()),
        }
    }

    pub fn month(&self) -> Month {
        self.month
    }

    /// Switch to a `YYYY-MM` month; an invalid value leaves the selection unchanged
    pub fn select_month(&mut self, month: &str) -> Result<()> {
        self.month = month.parse()?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        let owner = self.ctx.owner().await?;
        let data = self.ctx.data();
        let boundary = self.ctx.config().app.month_boundary;
        let month = self.month;
        let key = QueryKey::owned(QueryName::DashboardStats, owner).with_param(month);
        self.ctx
            .cache()
            .get_or_fetch(&key, || dashboard::compute(data, owner, month, boundary))
            .await
    }

    /// Revenue card on its own, cached as `monthly-revenue:<month>`
    pub async fn revenue(&self) -> Result<Decimal> {
        let owner = self.ctx.owner().await?;
        let data = self.ctx.data();
        let boundary = self.ctx.config().app.month_boundary;
        let month = self.month;
        let key = QueryKey::owned(QueryName::MonthlyRevenue, owner).with_param(month);
        self.ctx
            .cache()
            .get_or_fetch(&key, || dashboard::monthly_revenue(data, owner, month, boundary))
            .await
    }
}
