//! Application Ports (Driven)
//!
//! Interfaces the use cases depend on; adapters live in infrastructure.

mod clock_port;
mod ledger_store_port;

#[cfg(test)]
pub use clock_port::MockClock;
pub use clock_port::{Clock, FixedClock, SystemClock};
pub use ledger_store_port::{ChangeSet, LedgerStore, StoreError};
