//! # twintank-adapter-store-rest
//!
//! Device store backed by a mockapi-style JSON resource.
//!
//! ## Responsibilities
//! - Implement [`twintank_app::ports::DeviceStore`] over HTTP with reqwest
//! - Translate between the store's Spanish field names and domain types
//! - Split device rows from history rows and skip malformed records
//!
//! ## Dependency rule
//! Depends on `twintank-domain` and `twintank-app`. Never depended on by
//! the domain or application layers.

pub mod config;
pub mod error;
mod record;
mod store;

pub use config::RestStoreConfig;
pub use error::RestStoreError;
pub use store::RestDeviceStore;
