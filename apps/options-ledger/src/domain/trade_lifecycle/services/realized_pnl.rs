//! Realized P&L Engine
//!
//! Classifies a trade into one of a fixed, ordered set of scenarios and applies
//! that scenario's formula. The first matching scenario wins.

use rust_decimal::Decimal;

use crate::domain::shared::{Money, contract_notional};
use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::services::TradeGraph;
use crate::domain::trade_lifecycle::value_objects::{CloseMethod, TradeStatus, TradeType};

/// The P&L scenario a trade falls into, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PnlScenario {
    /// Fully closed on its own record: `premium + close_premium`.
    ClosedInline,
    /// Buy/sell-to-close or expired child of an opener.
    ClosingLeg,
    /// Assignment child still holding its shares: the parent keeps the premium.
    AssignmentChild,
    /// Opener whose contracts were resolved by closing children.
    OpenerWithClosingChildren,
    /// Opener that expired worthless without a closing leg.
    ExpiredWorthless,
    /// Cash-secured put that was assigned.
    CspAssigned,
    /// Covered call whose shares were called away.
    CoveredCallExercised,
    /// Assignment entry whose shares have been sold.
    AssignmentClosed,
    /// Still open; nothing realized.
    Unrealized,
}

impl PnlScenario {
    const ORDER: [Self; 8] = [
        Self::ClosedInline,
        Self::ClosingLeg,
        Self::AssignmentChild,
        Self::OpenerWithClosingChildren,
        Self::ExpiredWorthless,
        Self::CspAssigned,
        Self::CoveredCallExercised,
        Self::AssignmentClosed,
    ];

    /// Pick the first scenario whose condition holds.
    #[must_use]
    pub fn classify(trade: &Trade, graph: &TradeGraph) -> Self {
        Self::ORDER
            .into_iter()
            .find(|scenario| scenario.matches(trade, graph))
            .unwrap_or(Self::Unrealized)
    }

    fn matches(self, trade: &Trade, graph: &TradeGraph) -> bool {
        let has_closing_children = || graph.closing_children(trade.id()).next().is_some();
        match self {
            Self::ClosedInline => {
                let settled_in_shares = match trade.trade_type() {
                    TradeType::CoveredCall => matches!(
                        trade.close_method(),
                        Some(CloseMethod::Assigned | CloseMethod::CalledAway)
                    ),
                    TradeType::Csp => trade.close_method() == Some(CloseMethod::Assigned),
                    _ => false,
                };
                trade.is_closed_inline() && !settled_in_shares
            }
            Self::ClosingLeg => {
                trade.parent_trade_id().is_some()
                    && (trade.trade_action().is_some_and(|a| a.is_closing())
                        || trade.status() == TradeStatus::Expired)
            }
            Self::AssignmentChild => {
                trade.parent_trade_id().is_some()
                    && trade.trade_type() == TradeType::Assignment
                    && trade.status() != TradeStatus::Closed
                    && trade.close_date().is_none()
            }
            Self::OpenerWithClosingChildren => trade.is_opener() && has_closing_children(),
            Self::ExpiredWorthless => {
                matches!(trade.status(), TradeStatus::Closed | TradeStatus::Expired)
                    && ((trade.close_method() == Some(CloseMethod::Expired)
                        && trade.close_premium().is_some())
                        || (trade.close_date().is_none()
                            && trade.close_premium().is_none()
                            && !has_closing_children()))
            }
            Self::CspAssigned => {
                trade.trade_type() == TradeType::Csp && trade.status() == TradeStatus::Assigned
            }
            Self::CoveredCallExercised => {
                trade.trade_type() == TradeType::CoveredCall
                    && (matches!(
                        trade.status(),
                        TradeStatus::CalledAway | TradeStatus::Assigned
                    ) || trade.close_method() == Some(CloseMethod::CalledAway))
            }
            Self::AssignmentClosed => {
                trade.trade_type() == TradeType::Assignment
                    && (trade.status() == TradeStatus::Closed || trade.close_date().is_some())
            }
            Self::Unrealized => true,
        }
    }

    /// Apply this scenario's formula (unrounded).
    #[must_use]
    pub fn compute(self, trade: &Trade, graph: &TradeGraph) -> Money {
        match self {
            Self::ClosedInline => trade.premium() + trade.close_premium().unwrap_or_default(),
            Self::ClosingLeg => closing_leg_pnl(trade, graph),
            Self::AssignmentChild | Self::Unrealized => Money::ZERO,
            Self::OpenerWithClosingChildren => graph
                .closing_children(trade.id())
                .map(|child| {
                    if child.trade_action().is_some_and(|a| a.is_closing())
                        || child.status() == TradeStatus::Expired
                    {
                        closing_leg_pnl(child, graph)
                    } else {
                        trade
                            .premium()
                            .pro_rata(child.contract_quantity(), trade.contract_quantity())
                    }
                })
                .sum(),
            Self::ExpiredWorthless => {
                if trade.close_method() == Some(CloseMethod::Expired) {
                    trade.premium() + trade.close_premium().unwrap_or_default()
                } else {
                    trade.premium()
                }
            }
            Self::CspAssigned => trade.premium() - trade.assignment_fee(),
            Self::CoveredCallExercised => covered_call_pnl(trade, graph),
            Self::AssignmentClosed => assignment_sale_pnl(trade, graph),
        }
    }
}

/// Realized P&L of a trade, rounded to cents.
#[must_use]
pub fn calculate_realized_pnl(trade: &Trade, graph: &TradeGraph) -> Money {
    let scenario = PnlScenario::classify(trade, graph);
    tracing::debug!(trade_id = %trade.id(), ?scenario, "Realized P&L scenario selected");
    scenario.compute(trade, graph).round()
}

/// Proportional opening premium plus this leg's own closing premium.
fn closing_leg_pnl(leg: &Trade, graph: &TradeGraph) -> Money {
    let Some(parent) = graph.parent_of(leg) else {
        return Money::ZERO;
    };
    let opening_for_closed = parent
        .premium()
        .pro_rata(leg.contract_quantity(), parent.contract_quantity());
    let closing_premium = if leg.status() == TradeStatus::Expired {
        Money::ZERO
    } else {
        leg.premium()
    };
    opening_for_closed + closing_premium
}

fn covered_call_pnl(trade: &Trade, graph: &TradeGraph) -> Money {
    let base = trade.premium() - trade.assignment_fee();
    let Some(strike) = trade.strike_price() else {
        return base;
    };

    let basis = trade
        .stock_position_id()
        .and_then(|id| graph.cost_basis(id))
        .or_else(|| {
            graph
                .parent_of(trade)
                .filter(|p| p.trade_type() == TradeType::Assignment)
                .and_then(Trade::assignment_price)
        });

    match basis {
        Some(basis) => base + Money::new(contract_notional(strike - basis, trade.contract_quantity())),
        None => base,
    }
}

fn assignment_sale_pnl(trade: &Trade, graph: &TradeGraph) -> Money {
    let assignment_price = trade
        .assignment_price()
        .or(trade.strike_price())
        .unwrap_or(Decimal::ZERO);
    let sale = |price: Option<Decimal>, quantity: u32| {
        Money::new(
            contract_notional(price.unwrap_or(Decimal::ZERO), quantity)
                - contract_notional(assignment_price, quantity),
        )
    };

    let mut children = graph.closing_children(trade.id()).peekable();
    if children.peek().is_some() {
        return children
            .map(|c| sale(c.trade_price(), c.contract_quantity()))
            .sum();
    }
    if trade.trade_price().is_some() {
        return sale(trade.trade_price(), trade.contract_quantity());
    }
    graph
        .parent_of(trade)
        .filter(|p| p.trade_type() == TradeType::Csp)
        .map_or(Money::ZERO, Trade::premium)
}
