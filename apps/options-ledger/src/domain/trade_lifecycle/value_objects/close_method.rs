//! Close methods accepted by the close workflow.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{TradeAction, TradeStatus};

/// How a position was (or is being) closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseMethod {
    /// Buy back a written option.
    BuyToClose,
    /// Sell a held option.
    SellToClose,
    /// Option expired worthless.
    Expired,
    /// Short put assigned; shares delivered.
    Assigned,
    /// Short call exercised; shares removed.
    CalledAway,
    /// Long call exercised; shares acquired at strike.
    Exercise,
}

impl CloseMethod {
    /// Returns true for closes that carry a trade price and fees.
    #[must_use]
    pub const fn is_priced(&self) -> bool {
        matches!(self, Self::BuyToClose | Self::SellToClose)
    }

    /// The directional action of a priced close.
    #[must_use]
    pub const fn closing_action(&self) -> Option<TradeAction> {
        match self {
            Self::BuyToClose => Some(TradeAction::BoughtToClose),
            Self::SellToClose => Some(TradeAction::SoldToClose),
            _ => None,
        }
    }

    /// The opening action a position must have for this close to apply.
    #[must_use]
    pub const fn required_opening_action(&self) -> Option<TradeAction> {
        match self {
            Self::BuyToClose => Some(TradeAction::SoldToOpen),
            Self::SellToClose | Self::Exercise => Some(TradeAction::BoughtToOpen),
            _ => None,
        }
    }

    /// Status recorded on a trade resolved by this method.
    #[must_use]
    pub const fn resolved_status(&self) -> TradeStatus {
        match self {
            Self::BuyToClose | Self::SellToClose | Self::Exercise => TradeStatus::Closed,
            Self::Expired => TradeStatus::Expired,
            Self::Assigned => TradeStatus::Assigned,
            Self::CalledAway => TradeStatus::CalledAway,
        }
    }

    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BuyToClose => "buy_to_close",
            Self::SellToClose => "sell_to_close",
            Self::Expired => "expired",
            Self::Assigned => "assigned",
            Self::CalledAway => "called_away",
            Self::Exercise => "exercise",
        }
    }
}

impl fmt::Display for CloseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priced_methods_have_actions() {
        assert!(CloseMethod::BuyToClose.is_priced());
        assert_eq!(
            CloseMethod::SellToClose.closing_action(),
            Some(TradeAction::SoldToClose)
        );
        assert_eq!(CloseMethod::Expired.closing_action(), None);
    }

    #[test]
    fn resolved_statuses() {
        assert_eq!(CloseMethod::Exercise.resolved_status(), TradeStatus::Closed);
        assert_eq!(
            CloseMethod::CalledAway.resolved_status(),
            TradeStatus::CalledAway
        );
        assert_eq!(CloseMethod::Expired.resolved_status(), TradeStatus::Expired);
    }

    #[test]
    fn close_method_wire_names() {
        let json = serde_json::to_string(&CloseMethod::CalledAway).unwrap();
        assert_eq!(json, "\"called_away\"");
        let back: CloseMethod = serde_json::from_str("\"buy_to_close\"").unwrap();
        assert_eq!(back, CloseMethod::BuyToClose);
    }
}
