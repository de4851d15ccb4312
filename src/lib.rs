//! Alugux: property-rental management over a hosted auth + table backend.
//!
//! Owners record properties, create rental contracts that link tenants to
//! them, and read monthly revenue and occupancy figures. All state lives in
//! the remote service; this crate maps its rows, validates forms, caches
//! query results and drives the create/edit workflows.

pub mod cache;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod errors;
pub mod forms;
pub mod mappers;
pub mod models;
pub mod notify;
pub mod queries;
pub mod remote;
pub mod routes;
pub mod session;
pub mod shell;
pub mod views;

pub use config::AppConfig;
pub use context::AppContext;
pub use errors::{AppError, Result};
pub use shell::Shell;
