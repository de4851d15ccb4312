pub mod auth;
pub mod dashboard;
pub mod dialog;
pub mod properties;
pub mod rentals;
pub mod settings;

pub use auth::AuthView;
pub use dashboard::DashboardView;
pub use dialog::{Dialog, DialogMode};
pub use properties::PropertiesView;
pub use rentals::RentalsView;
pub use settings::SettingsView;
