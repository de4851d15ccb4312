//! Row shapes exchanged with the remote tables.
//!
//! Field names here are the wire names; serde attributes pin the status
//! labels the backend stores.

pub mod profile;
pub mod property;
pub mod rental;

pub use profile::{ProfilePatch, ProfileRow};
pub use property::{NewProperty, PropertyOption, PropertyPatch, PropertyRow, PropertyStatus};
pub use rental::{NewRental, PropertyTitle, RentalPatch, RentalRow, RentalStatus, TenantRef};
