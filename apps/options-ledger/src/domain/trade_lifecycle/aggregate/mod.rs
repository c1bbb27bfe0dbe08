//! Trade Lifecycle Aggregates

mod trade;

pub use trade::{
    InlineClose, NewTradeCommand, PatchEffects, ReconstitutedTradeParams, Trade, TradePatch,
};
