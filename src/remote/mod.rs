pub mod memory;
pub mod rest;
pub mod traits;
pub mod types;

pub use memory::MemoryBackend;
pub use rest::RestBackend;
pub use traits::{AuthService, DataService};
pub use types::{Filter, FilterOp, Query, Table};
