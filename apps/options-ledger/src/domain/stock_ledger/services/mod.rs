//! Stock Ledger Domain Services

mod share_availability;

pub use share_availability::ShareAvailability;
