//! Background job dispatch adapters.

pub mod channel;

pub use channel::{ChannelJobDispatcher, TracingJobDispatcher};
