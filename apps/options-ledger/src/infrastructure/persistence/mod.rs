//! Persistence Adapters
//!
//! Implementations of the ledger store port.

pub mod in_memory;
pub mod snapshot;

pub use in_memory::InMemoryLedgerStore;
pub use snapshot::LedgerSnapshot;
