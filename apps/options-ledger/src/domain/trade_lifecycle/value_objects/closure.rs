//! The two ways a contract lot can be closed.

use crate::domain::shared::{Money, TradeId};

use super::CloseMethod;

/// How an opening trade's contracts have been resolved.
///
/// A lot is either closed on its own record (`ClosedInline`) or through linked
/// child entries (`ViaChildren`); the two are never mixed for one trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Closure {
    /// No contracts resolved yet.
    Open,
    /// Fully resolved on the trade's own record.
    ClosedInline {
        /// Signed cash flow of the closing leg.
        close_premium: Money,
        /// Method recorded with the close, if any.
        close_method: Option<CloseMethod>,
    },
    /// Some or all contracts resolved by child entries.
    ViaChildren {
        /// Closing children in trade-date order.
        child_ids: Vec<TradeId>,
        /// Contracts resolved by those children.
        closed_quantity: u32,
    },
}

impl Closure {
    /// Returns true if the closure accounts for all `contract_quantity` contracts.
    #[must_use]
    pub const fn is_complete(&self, contract_quantity: u32) -> bool {
        match self {
            Self::Open => false,
            Self::ClosedInline { .. } => true,
            Self::ViaChildren {
                closed_quantity, ..
            } => *closed_quantity >= contract_quantity,
        }
    }
}
