//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.
//! Every use case takes the acting user and only touches that user's accounts.

mod close_trade;
mod create_trade;
mod delete_trade;
mod manage_accounts;
mod manage_stock_positions;
mod query_trades;
mod reporting;
mod support;
mod update_trade;

#[cfg(test)]
pub(crate) mod test_support;

pub use close_trade::CloseTradeUseCase;
pub use create_trade::CreateTradeUseCase;
pub use delete_trade::DeleteTradeUseCase;
pub use manage_accounts::ManageAccountsUseCase;
pub use manage_stock_positions::ManageStockPositionsUseCase;
pub use query_trades::QueryTradesUseCase;
pub use reporting::ReportingUseCase;
pub use update_trade::UpdateTradeUseCase;
