//! Trade Relationship Graph
//!
//! Arena of trades keyed by id with a secondary `parent -> children` index.
//! Traversal is read-only; callers rebuild the graph from the store before
//! validating a mutation.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::shared::{StockPositionId, TradeId};
use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::value_objects::Closure;

/// A trade together with its parent and direct children.
#[derive(Debug, Clone, Copy)]
pub struct TradeChain<'a> {
    /// Parent entry, if the trade is a child.
    pub parent: Option<&'a Trade>,
    /// The trade itself.
    pub current: &'a Trade,
    /// Direct children in trade-date order.
    pub children: &'a [TradeId],
}

/// Indexed view over the trades of one or more accounts.
#[derive(Debug, Clone, Default)]
pub struct TradeGraph {
    trades: HashMap<TradeId, Trade>,
    children: HashMap<TradeId, Vec<TradeId>>,
    cost_basis: HashMap<StockPositionId, Decimal>,
}

impl TradeGraph {
    /// Build a graph from a set of trades.
    #[must_use]
    pub fn new(trades: impl IntoIterator<Item = Trade>) -> Self {
        let trades: HashMap<TradeId, Trade> =
            trades.into_iter().map(|t| (t.id().clone(), t)).collect();

        let mut children: HashMap<TradeId, Vec<TradeId>> = HashMap::new();
        for trade in trades.values() {
            if let Some(parent) = trade.parent_trade_id() {
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(trade.id().clone());
            }
        }
        for ids in children.values_mut() {
            ids.sort_by(|a, b| {
                let key = |id: &TradeId| trades.get(id).map(Trade::trade_date);
                key(a).cmp(&key(b)).then_with(|| a.cmp(b))
            });
        }

        Self {
            trades,
            children,
            cost_basis: HashMap::new(),
        }
    }

    /// Attach per-share cost basis of the share lots the trades reference.
    #[must_use]
    pub fn with_cost_basis(
        mut self,
        positions: impl IntoIterator<Item = (StockPositionId, Decimal)>,
    ) -> Self {
        self.cost_basis.extend(positions);
        self
    }

    /// Look up a trade by id.
    #[must_use]
    pub fn get(&self, id: &TradeId) -> Option<&Trade> {
        self.trades.get(id)
    }

    /// All trades in the graph, in no particular order.
    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.values()
    }

    /// Number of trades in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    /// Returns true if the graph holds no trades.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Cost basis per share of a referenced share lot.
    #[must_use]
    pub fn cost_basis(&self, id: &StockPositionId) -> Option<Decimal> {
        self.cost_basis.get(id).copied()
    }

    /// Parent of a trade.
    #[must_use]
    pub fn parent_of(&self, trade: &Trade) -> Option<&Trade> {
        trade.parent_trade_id().and_then(|id| self.trades.get(id))
    }

    /// Direct children of a trade, in trade-date order.
    pub fn children_of(&self, id: &TradeId) -> impl Iterator<Item = &Trade> {
        self.child_ids(id)
            .iter()
            .filter_map(|child| self.trades.get(child))
    }

    fn child_ids(&self, id: &TradeId) -> &[TradeId] {
        self.children.get(id).map_or(&[], Vec::as_slice)
    }

    /// Children recording a close, expiry, assignment, call-away or exercise.
    pub fn closing_children(&self, id: &TradeId) -> impl Iterator<Item = &Trade> {
        self.children_of(id).filter(|c| c.is_closing_entry())
    }

    /// Contracts resolved by closing children.
    #[must_use]
    pub fn closed_quantity(&self, id: &TradeId) -> u32 {
        self.closing_children(id)
            .map(Trade::contract_quantity)
            .sum()
    }

    /// Contracts of an opening trade that are still open.
    ///
    /// Zero for non-opening trades and for trades closed on their own record.
    #[must_use]
    pub fn remaining_open_quantity(&self, trade: &Trade) -> u32 {
        if !trade.is_opener() || trade.is_closed_inline() {
            return 0;
        }
        trade
            .contract_quantity()
            .saturating_sub(self.closed_quantity(trade.id()))
    }

    /// Remaining quantity of an opener, ignoring one of its children.
    ///
    /// Used when a closing entry is edited and must be re-validated against the
    /// contracts the other children leave open.
    #[must_use]
    pub fn remaining_excluding(&self, trade: &Trade, excluded: &TradeId) -> u32 {
        if !trade.is_opener() || trade.is_closed_inline() {
            return 0;
        }
        let closed: u32 = self
            .closing_children(trade.id())
            .filter(|c| c.id() != excluded)
            .map(Trade::contract_quantity)
            .sum();
        trade.contract_quantity().saturating_sub(closed)
    }

    /// How the trade's contracts have been resolved so far.
    #[must_use]
    pub fn closure(&self, trade: &Trade) -> Closure {
        if trade.is_closed_inline() {
            return Closure::ClosedInline {
                close_premium: trade.close_premium().unwrap_or_default(),
                close_method: trade.close_method(),
            };
        }
        let child_ids: Vec<TradeId> = self
            .closing_children(trade.id())
            .map(|c| c.id().clone())
            .collect();
        if child_ids.is_empty() {
            Closure::Open
        } else {
            Closure::ViaChildren {
                closed_quantity: self.closed_quantity(trade.id()),
                child_ids,
            }
        }
    }

    /// Resolve a trade with its parent and direct children.
    #[must_use]
    pub fn trade_chain(&self, id: &TradeId) -> Option<TradeChain<'_>> {
        let current = self.trades.get(id)?;
        Some(TradeChain {
            parent: self.parent_of(current),
            current,
            children: self.child_ids(id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Money;
    use crate::domain::trade_lifecycle::aggregate::ReconstitutedTradeParams;
    use crate::domain::trade_lifecycle::value_objects::{
        CloseMethod, PositionType, TradeAction, TradeStatus, TradeType,
    };
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn opener(id: &str, qty: u32) -> Trade {
        Trade::reconstitute(ReconstitutedTradeParams::opening(
            id,
            "acct",
            "AAPL",
            TradeType::Csp,
            TradeAction::SoldToOpen,
            qty,
            Money::new(dec!(200) * Decimal::from(qty)),
            date(2),
        ))
    }

    fn btc_child(id: &str, parent: &str, qty: u32, day: u32) -> Trade {
        let mut params = ReconstitutedTradeParams::opening(
            id,
            "acct",
            "AAPL",
            TradeType::Csp,
            TradeAction::BoughtToClose,
            qty,
            Money::new(dec!(-51.50)),
            date(day),
        );
        params.position_type = PositionType::Close;
        params.status = TradeStatus::Closed;
        params.close_date = Some(date(day));
        params.parent_trade_id = Some(TradeId::new(parent));
        Trade::reconstitute(params)
    }

    #[test]
    fn remaining_tracks_closing_children() {
        let graph = TradeGraph::new([opener("p", 3), btc_child("c1", "p", 1, 5)]);
        let parent = graph.get(&TradeId::new("p")).unwrap();
        assert_eq!(graph.remaining_open_quantity(parent), 2);
        assert_eq!(
            graph.remaining_excluding(parent, &TradeId::new("c1")),
            3
        );
    }

    #[test]
    fn non_closing_children_do_not_count() {
        let mut params = ReconstitutedTradeParams::opening(
            "cc",
            "acct",
            "AAPL",
            TradeType::CoveredCall,
            TradeAction::SoldToOpen,
            1,
            Money::new(dec!(100)),
            date(6),
        );
        params.parent_trade_id = Some(TradeId::new("p"));
        let graph = TradeGraph::new([opener("p", 1), Trade::reconstitute(params)]);
        let parent = graph.get(&TradeId::new("p")).unwrap();
        assert_eq!(graph.remaining_open_quantity(parent), 1);
        assert_eq!(graph.children_of(parent.id()).count(), 1);
        assert_eq!(graph.closure(parent), Closure::Open);
    }

    #[test]
    fn inline_close_leaves_nothing_open() {
        let mut params = ReconstitutedTradeParams::opening(
            "p",
            "acct",
            "AAPL",
            TradeType::Csp,
            TradeAction::SoldToOpen,
            1,
            Money::new(dec!(200)),
            date(2),
        );
        params.status = TradeStatus::Closed;
        params.close_date = Some(date(9));
        params.close_premium = Some(Money::new(dec!(-51.50)));
        params.close_method = Some(CloseMethod::BuyToClose);
        let graph = TradeGraph::new([Trade::reconstitute(params)]);
        let trade = graph.get(&TradeId::new("p")).unwrap();

        assert_eq!(graph.remaining_open_quantity(trade), 0);
        assert!(matches!(
            graph.closure(trade),
            Closure::ClosedInline {
                close_method: Some(CloseMethod::BuyToClose),
                ..
            }
        ));
    }

    #[test]
    fn closing_entries_have_nothing_open() {
        let graph = TradeGraph::new([opener("p", 2), btc_child("c1", "p", 1, 5)]);
        let child = graph.get(&TradeId::new("c1")).unwrap();
        assert_eq!(graph.remaining_open_quantity(child), 0);
    }

    #[test]
    fn chain_resolves_parent_and_children_in_date_order() {
        let graph = TradeGraph::new([
            opener("p", 3),
            btc_child("c2", "p", 1, 8),
            btc_child("c1", "p", 1, 5),
        ]);
        let chain = graph.trade_chain(&TradeId::new("c1")).unwrap();
        assert_eq!(chain.parent.map(|p| p.id().as_str()), Some("p"));
        assert!(chain.children.is_empty());

        let chain = graph.trade_chain(&TradeId::new("p")).unwrap();
        let ids: Vec<&str> = chain.children.iter().map(TradeId::as_str).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert!(graph.trade_chain(&TradeId::new("missing")).is_none());
    }

    proptest! {
        #[test]
        fn remaining_is_monotone_and_bounded(
            quantity in 1u32..20,
            closes in proptest::collection::vec(1u32..5, 0..8),
        ) {
            let mut trades = vec![opener("p", quantity)];
            let mut previous = quantity;
            for (i, qty) in closes.iter().enumerate() {
                trades.push(btc_child(&format!("c{i}"), "p", *qty, 3));
                let graph = TradeGraph::new(trades.clone());
                let parent = graph.get(&TradeId::new("p")).unwrap();
                let remaining = graph.remaining_open_quantity(parent);
                prop_assert!(remaining <= previous);
                prop_assert!(remaining <= quantity);
                previous = remaining;
            }
        }
    }
}
