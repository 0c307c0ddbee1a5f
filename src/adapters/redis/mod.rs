//! Redis adapter for the external cache/counter store.

pub mod store;

pub use store::RedisStore;
