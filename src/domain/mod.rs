//! Domain layer for the taskboard read model.
//!
//! Core models, errors and the port traits implemented by adapters.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult, StoreError, StoreResult};
