use crate::errors::{AppError, Result};
use crate::remote::traits::{AuthService, DataService};
use crate::remote::types::{Filter, FilterOp, Query, Table};
use crate::session::{AuthUser, Credentials, Session};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "demo@alugux.app";
pub const DEMO_PASSWORD: &str = "alugux123";

#[derive(Debug, Clone)]
struct Account {
    id: Uuid,
    email: String,
    password: String,
}

/// In-process stand-in for the hosted backend.
///
/// Keeps tables as JSON rows and evaluates the same `Query` values the REST
/// client sends, so views behave identically against either backend.
pub struct MemoryBackend {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    accounts: RwLock<Vec<Account>>,
    session: RwLock<Option<Session>>,
    failing: RwLock<HashSet<Table>>,
    selects: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            accounts: RwLock::new(Vec::new()),
            session: RwLock::new(None),
            failing: RwLock::new(HashSet::new()),
            selects: AtomicUsize::new(0),
        }
    }

    /// Backend with a demo account owning a few properties and rentals
    pub async fn with_sample_data() -> Self {
        let backend = Self::new();
        let owner = backend.add_account(DEMO_EMAIL, DEMO_PASSWORD, "Conta Demo").await;
        info!("📋 Seeding offline backend with sample properties");

        let samples = [
            ("Apartamento Centro", "Rua Principal, 123", "2500", "Alugado", "2023-11-02T12:00:00Z"),
            ("Casa Jardim América", "Av. das Flores, 456", "3200", "Alugado", "2023-12-10T12:00:00Z"),
            ("Sala Comercial Downtown", "Av. Comercial, 789", "1800", "Disponível", "2024-02-20T12:00:00Z"),
            ("Cobertura Beira Mar", "Av. Atlântica, 1000", "7500", "Disponível", "2024-05-05T12:00:00Z"),
        ];
        let mut ids = Vec::new();
        for (title, address, price, status, created_at) in samples {
            let id = Uuid::new_v4();
            ids.push(id);
            backend
                .seed(Table::Properties, json!({
                    "id": id,
                    "title": title,
                    "address": address,
                    "price": price,
                    "status": status,
                    "owner_id": owner,
                    "created_at": created_at,
                }))
                .await;
        }

        let rentals = [
            (ids[0], "João Silva", "12345678900", "2024-01-01", "2024-12-31", "2500"),
            (ids[1], "Maria Santos", "98765432100", "2024-02-01", "2025-01-31", "3200"),
        ];
        for (property_id, tenant, cpf, start, end, price) in rentals {
            backend
                .seed(Table::Rentals, json!({
                    "id": Uuid::new_v4(),
                    "property_id": property_id,
                    "tenant_name": tenant,
                    "tenant_cpf": cpf,
                    "start_date": start,
                    "end_date": end,
                    "monthly_price": price,
                    "status": "Ativo",
                    "contract_file": null,
                    "owner_id": owner,
                    "created_at": format!("{start}T09:00:00Z"),
                }))
                .await;
        }

        backend
    }

    /// Register an account (and its profile row) directly, returning its id
    pub async fn add_account(&self, email: &str, password: &str, full_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.accounts.write().await.push(Account {
            id,
            email: email.to_string(),
            password: password.to_string(),
        });
        self.seed(Table::Profiles, json!({ "id": id, "full_name": full_name })).await;
        id
    }

    /// Store a row as-is, bypassing session checks and failure injection
    pub async fn seed(&self, table: Table, row: Value) {
        self.tables.write().await.entry(table).or_default().push(row);
    }

    /// Make every insert and update on `table` fail until cleared
    pub async fn fail_writes(&self, table: Table) {
        self.failing.write().await.insert(table);
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    /// Number of `select` calls served so far
    pub fn select_calls(&self) -> usize {
        self.selects.load(AtomicOrdering::SeqCst)
    }

    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.tables.read().await.get(&table).cloned().unwrap_or_default()
    }

    async fn require_session(&self) -> Result<Session> {
        self.session.read().await.clone().ok_or(AppError::SessionMissing)
    }

    async fn check_writable(&self, table: Table) -> Result<()> {
        if self.failing.read().await.contains(&table) {
            return Err(AppError::remote(503, format!("{table} is unavailable")));
        }
        Ok(())
    }
}

/// Compare a stored JSON value with a filter operand the way the database would
/// for the column types in use: text and ISO dates lexically, numbers numerically.
fn compare(stored: &Value, operand: &str) -> Option<Ordering> {
    match stored {
        Value::String(s) => Some(s.as_str().cmp(operand)),
        Value::Number(n) => n.as_f64()?.partial_cmp(&operand.parse::<f64>().ok()?),
        Value::Bool(b) => Some(b.cmp(&operand.parse::<bool>().ok()?)),
        _ => None,
    }
}

fn operand(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Sort comparison with the same typing rules as filters. Missing values sort
/// after present ones, so they come first once the order is reversed.
fn sort_order(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.filter(|v| !v.is_null());
    let right = right.filter(|v| !v.is_null());
    match (left, right) {
        (Some(l), Some(r)) => operand(r)
            .and_then(|r| compare(l, &r))
            .unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let Some(ordering) = row.get(&filter.column).and_then(|v| compare(v, &filter.value)) else {
        return false;
    };
    match filter.op {
        FilterOp::Eq => ordering == Ordering::Equal,
        FilterOp::Gte => ordering != Ordering::Less,
        FilterOp::Lte => ordering != Ordering::Greater,
        FilterOp::Lt => ordering == Ordering::Less,
    }
}

fn matches_all(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches(row, f))
}

fn project(row: &Value, columns: &[String]) -> Value {
    if columns.is_empty() {
        return row.clone();
    }
    let mut out = Map::new();
    for column in columns {
        if let Some(value) = row.get(column) {
            out.insert(column.clone(), value.clone());
        }
    }
    Value::Object(out)
}

fn id_of(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

#[async_trait]
impl DataService for MemoryBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        self.require_session().await?;
        self.selects.fetch_add(1, AtomicOrdering::SeqCst);

        let tables = self.tables.read().await;
        let empty = Vec::new();
        let source = tables.get(&query.table).unwrap_or(&empty);

        let mut rows: Vec<&Value> = source.iter().filter(|r| matches_all(r, &query.filters)).collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = sort_order(a.get(&order.column), b.get(&order.column));
                if order.ascending { ordering } else { ordering.reverse() }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut projected = project(row, &query.columns);
            if let Some(embed) = &query.embed {
                let foreign = row.get(&embed.foreign_key).and_then(Value::as_str);
                let related = tables
                    .get(&embed.table)
                    .and_then(|t| t.iter().find(|r| foreign.is_some() && id_of(r) == foreign))
                    .map(|r| project(r, &embed.columns))
                    .unwrap_or(Value::Null);
                if let Value::Object(map) = &mut projected {
                    map.insert(embed.table.as_str().to_string(), related);
                }
            }
            out.push(projected);
        }

        debug!(table = %query.table, rows = out.len(), "Memory select");
        Ok(out)
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        self.require_session().await?;
        let tables = self.tables.read().await;
        let count = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| matches_all(r, &query.filters)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        self.require_session().await?;
        self.check_writable(table).await?;

        let Value::Object(mut map) = row else {
            return Err(AppError::remote(400, "Row must be a JSON object"));
        };
        map.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
        map.entry("created_at").or_insert_with(|| json!(Utc::now()));
        let stored = Value::Object(map);

        self.tables.write().await.entry(table).or_default().push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> Result<Vec<Value>> {
        self.require_session().await?;
        self.check_writable(table).await?;

        let Value::Object(patch) = patch else {
            return Err(AppError::remote(400, "Patch must be a JSON object"));
        };

        let mut tables = self.tables.write().await;
        let mut updated = Vec::new();
        for row in tables.entry(table).or_default().iter_mut() {
            if !matches_all(row, filters) {
                continue;
            }
            if let Value::Object(map) = row {
                for (key, value) in &patch {
                    map.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl AuthService for MemoryBackend {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .iter()
            .find(|a| a.email == credentials.email && a.password == credentials.password)
            .ok_or_else(|| AppError::remote(400, "Invalid login credentials"))?;

        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: None,
            user: AuthUser {
                id: account.id,
                email: Some(account.email.clone()),
            },
        };
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials, full_name: &str) -> Result<()> {
        if self.accounts.read().await.iter().any(|a| a.email == credentials.email) {
            return Err(AppError::remote(422, "User already registered"));
        }
        self.add_account(&credentials.email, &credentials.password, full_name).await;
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        *self.session.write().await = None;
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<()> {
        let session = self.require_session().await?;
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.id == session.user.id)
            .ok_or(AppError::SessionMissing)?;
        account.password = password.to_string();
        Ok(())
    }

    async fn update_full_name(&self, _full_name: &str) -> Result<()> {
        self.require_session().await?;
        Ok(())
    }

    async fn reset_password_email(&self, email: &str, redirect_to: &str) -> Result<()> {
        debug!(%email, %redirect_to, "Password reset requested");
        Ok(())
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn signed_in() -> MemoryBackend {
        let backend = MemoryBackend::with_sample_data().await;
        backend
            .sign_in(&Credentials::new(DEMO_EMAIL, DEMO_PASSWORD))
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_select_requires_session() {
        let backend = MemoryBackend::with_sample_data().await;
        let err = backend.select(&Query::from(Table::Properties)).await.unwrap_err();
        assert!(matches!(err, AppError::SessionMissing));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let backend = MemoryBackend::with_sample_data().await;
        let err = backend
            .sign_in(&Credentials::new(DEMO_EMAIL, "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_filters_and_projection() {
        let backend = signed_in().await;
        let rows = backend
            .select(
                &Query::from(Table::Properties)
                    .select(&["id", "title"])
                    .eq("status", "Disponível")
                    .order_by("title", true),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"], "Cobertura Beira Mar");
        assert!(rows[0].get("address").is_none());
    }

    #[tokio::test]
    async fn test_embed_resolves_property_title() {
        let backend = signed_in().await;
        let rows = backend
            .select(
                &Query::from(Table::Rentals)
                    .embed(Table::Properties, "property_id", &["title"])
                    .eq("tenant_cpf", "12345678900"),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["properties"]["title"], "Apartamento Centro");
    }

    #[tokio::test]
    async fn test_date_range_filters() {
        let backend = signed_in().await;
        let query = Query::from(Table::Rentals)
            .lte("start_date", "2024-01-31")
            .gte("end_date", "2024-01-01");
        assert_eq!(backend.count(&query).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_numeric_columns_sort_numerically() {
        let backend = MemoryBackend::new();
        backend.add_account("ana@alugux.app", "segredo1", "Ana").await;
        backend
            .sign_in(&Credentials::new("ana@alugux.app", "segredo1"))
            .await
            .unwrap();
        for (title, floor) in [("Alto", 10), ("Baixo", 2), ("Meio", 7)] {
            backend
                .seed(Table::Properties, json!({ "title": title, "floor": floor }))
                .await;
        }
        backend.seed(Table::Properties, json!({ "title": "Sem andar" })).await;

        let rows = backend
            .select(&Query::from(Table::Properties).order_by("floor", true))
            .await
            .unwrap();
        let titles: Vec<&str> = rows.iter().filter_map(|r| r["title"].as_str()).collect();
        assert_eq!(titles, ["Baixo", "Meio", "Alto", "Sem andar"]);

        let rows = backend
            .select(&Query::from(Table::Properties).order_by("floor", false))
            .await
            .unwrap();
        let titles: Vec<&str> = rows.iter().filter_map(|r| r["title"].as_str()).collect();
        assert_eq!(titles, ["Sem andar", "Alto", "Meio", "Baixo"]);
    }

    #[tokio::test]
    async fn test_insert_fills_generated_columns() {
        let backend = signed_in().await;
        let row = backend
            .insert(Table::Properties, json!({ "title": "Loft" }))
            .await
            .unwrap();
        assert!(row.get("id").is_some());
        assert!(row.get("created_at").is_some());
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let backend = signed_in().await;
        backend.fail_writes(Table::Properties).await;
        let err = backend
            .update(Table::Properties, &[Filter::eq("title", "Loft")], json!({ "price": "1" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Remote { status: 503, .. }));
    }
}
