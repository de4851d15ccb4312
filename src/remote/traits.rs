use crate::errors::Result;
use crate::remote::types::{Filter, Query, Table};
use crate::session::{Credentials, Session};
use async_trait::async_trait;
use serde_json::Value;

/// Table-style access to the hosted relational store.
///
/// Rows travel as JSON objects keyed by wire column names; the query layer
/// deserializes them into the typed rows in `models`.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Rows matching the query
    async fn select(&self, query: &Query) -> Result<Vec<Value>>;

    /// Number of rows matching the query's filters
    async fn count(&self, query: &Query) -> Result<u64>;

    /// Insert one row, returning it as stored (with generated columns)
    async fn insert(&self, table: Table, row: Value) -> Result<Value>;

    /// Patch every row matching `filters`, returning the updated rows
    async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> Result<Vec<Value>>;

    /// Name of the backend, for logging
    fn backend_name(&self) -> &'static str;
}

/// Account operations of the hosted auth provider.
///
/// Implementations keep the current session so that subsequent data calls
/// run as the signed-in account.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session>;

    /// Register an account; `full_name` goes into the user metadata
    async fn sign_up(&self, credentials: &Credentials, full_name: &str) -> Result<()>;

    async fn sign_out(&self) -> Result<()>;

    async fn update_password(&self, password: &str) -> Result<()>;

    /// Mirror the profile name into the account's metadata
    async fn update_full_name(&self, full_name: &str) -> Result<()>;

    async fn reset_password_email(&self, email: &str, redirect_to: &str) -> Result<()>;

    async fn current_session(&self) -> Option<Session>;
}
