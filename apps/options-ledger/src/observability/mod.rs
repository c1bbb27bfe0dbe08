//! Observability module for structured logging.
//!
//! Use cases emit `tracing` events; the binary installs the subscriber once
//! at start-up from the `observability.logging` config section.

mod tracing;

pub use self::tracing::{TracingError, env_filter, init_tracing};
