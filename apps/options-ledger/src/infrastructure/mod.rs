//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - `persistence/`: in-memory ledger store and JSON snapshot files
//! - `config/`: dependency container wiring store, clock and use cases

pub mod config;
pub mod persistence;

pub use config::Container;
pub use persistence::{InMemoryLedgerStore, LedgerSnapshot};
