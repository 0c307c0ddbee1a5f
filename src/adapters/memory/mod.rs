//! In-process adapters used when no external store is configured and in tests.

pub mod store;

pub use store::InMemoryStore;
