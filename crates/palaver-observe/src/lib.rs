//! Observability for Palaver: the global tracing subscriber.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, shutdown_tracing};
