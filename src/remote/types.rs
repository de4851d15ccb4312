use serde::{Deserialize, Serialize};
use std::fmt;

/// Tables exposed by the data API
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Properties,
    Rentals,
    Profiles,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Properties => "properties",
            Table::Rentals => "rentals",
            Table::Profiles => "profiles",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
    Lt,
}

impl FilterOp {
    /// Operator keyword in the `column=op.value` query syntax
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gte => "gte",
            FilterOp::Lte => "lte",
            FilterOp::Lt => "lt",
        }
    }
}

/// One column condition; all filters of a query are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn new(column: &str, op: FilterOp, value: impl ToString) -> Self {
        Self {
            column: column.to_string(),
            op,
            value: value.to_string(),
        }
    }

    pub fn eq(column: &str, value: impl ToString) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }

    /// Rendered query-string value, e.g. `eq.Ativo`
    pub fn param_value(&self) -> String {
        format!("{}.{}", self.op.as_str(), self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A to-one relation pulled into each row, e.g. `properties(title)` via `property_id`
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub table: Table,
    pub foreign_key: String,
    pub columns: Vec<String>,
}

/// A select against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    /// Empty means every column
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    pub embed: Option<Embed>,
}

impl Query {
    pub fn from(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
            embed: None,
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.filter(Filter::new(column, FilterOp::Eq, value))
    }

    pub fn gte(self, column: &str, value: impl ToString) -> Self {
        self.filter(Filter::new(column, FilterOp::Gte, value))
    }

    pub fn lte(self, column: &str, value: impl ToString) -> Self {
        self.filter(Filter::new(column, FilterOp::Lte, value))
    }

    pub fn lt(self, column: &str, value: impl ToString) -> Self {
        self.filter(Filter::new(column, FilterOp::Lt, value))
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn embed(mut self, table: Table, foreign_key: &str, columns: &[&str]) -> Self {
        self.embed = Some(Embed {
            table,
            foreign_key: foreign_key.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// The `select=` parameter, e.g. `*,properties(title)`
    pub fn select_param(&self) -> String {
        let mut select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        if let Some(embed) = &self.embed {
            select.push_str(&format!(",{}({})", embed.table, embed.columns.join(",")));
        }
        select
    }

    /// Full list of query-string pairs for the table endpoint
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select_param())];
        for filter in &self.filters {
            params.push((filter.column.clone(), filter.param_value()));
        }
        if let Some(order) = &self.order {
            let dir = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, dir)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_rental_select_params() {
        let query = Query::from(Table::Rentals)
            .embed(Table::Properties, "property_id", &["title"])
            .eq("status", "Ativo")
            .order_by("created_at", false);

        let params = query.to_params();
        assert_eq!(params[0], ("select".to_string(), "*,properties(title)".to_string()));
        assert_eq!(params[1], ("status".to_string(), "eq.Ativo".to_string()));
        assert_eq!(params[2], ("order".to_string(), "created_at.desc".to_string()));
    }

    #[test]
    fn test_projection_and_range() {
        let query = Query::from(Table::Rentals)
            .select(&["monthly_price"])
            .lte("start_date", "2024-03-31")
            .gte("end_date", "2024-03-01")
            .limit(10);

        let params = query.to_params();
        assert_eq!(params[0].1, "monthly_price");
        assert_eq!(params[1].1, "lte.2024-03-31");
        assert_eq!(params[2].1, "gte.2024-03-01");
        assert_eq!(params[3], ("limit".to_string(), "10".to_string()));
    }
}
