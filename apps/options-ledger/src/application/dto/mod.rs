//! Data Transfer Objects (DTOs)
//!
//! DTOs are used for API boundaries and use case inputs/outputs.

mod account_dto;
mod position_dto;
mod report_dto;
mod trade_dto;

pub use account_dto::{CashFlowDto, CreateAccountDto};
pub use position_dto::{CreateStockPositionDto, StockPositionDto};
pub use report_dto::{
    AccountReportDto, AllocationDto, AllocationEntryDto, PortfolioPnlDto, ReportPeriod,
};
pub use trade_dto::{
    CloseTradeDto, CloseTradeResponseDto, CreateTradeDto, TradeChainDto, TradeDto,
    TradeFilterDto, display_realized_pnl,
};
