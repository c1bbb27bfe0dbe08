// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Options Ledger - Rust Core Library
//!
//! Position and P&L ledger for wheel-style option trading.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects, services)
//!   - `trade_lifecycle`: Trade aggregate, status resolution, close chains, realized P&L
//!   - `stock_ledger`: Share lots and covered call reservations
//!   - `accounts`: Ownership, fee defaults, cash flows
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `LedgerStore` and `Clock`
//!   - `use_cases`: create/update/close/delete/query trades, stock positions,
//!     accounts, reporting
//!   - `dto`: Data transfer objects for API boundaries
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: In-memory ledger store and JSON snapshots
//!   - `config`: Dependency injection container

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Error taxonomy exposed by the use cases.
pub mod error;

/// Logging setup.
pub mod observability;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::accounts::{Account, CashFlow, CashFlowKind};
pub use domain::shared::{AccountId, Money, StockPositionId, Symbol, TradeId, UserId};
pub use domain::stock_ledger::{PositionStatus, StockPosition};
pub use domain::trade_lifecycle::{
    CloseMethod, PositionType, Trade, TradeAction, TradeStatus, TradeType,
};

// Application re-exports
pub use application::dto::{
    AccountReportDto, CloseTradeDto, CreateTradeDto, PortfolioPnlDto, ReportPeriod, TradeDto,
};
pub use application::ports::{Clock, FixedClock, LedgerStore, SystemClock};
pub use application::use_cases::{
    CloseTradeUseCase, CreateTradeUseCase, DeleteTradeUseCase, ManageAccountsUseCase,
    ManageStockPositionsUseCase, QueryTradesUseCase, ReportingUseCase, UpdateTradeUseCase,
};

// Infrastructure re-exports
pub use infrastructure::config::Container;
pub use infrastructure::persistence::{InMemoryLedgerStore, LedgerSnapshot};

pub use error::{ErrorCode, LedgerError};
