//! Trade Aggregate
//!
//! A single option ledger entry. The same record type holds opening trades,
//! closing legs created by partial closes, and Assignment entries; which one a
//! record is follows from its action, type and parent link.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, Money, StockPositionId, Symbol, TradeId, shares_for};
use crate::domain::trade_lifecycle::errors::TradeError;
use crate::domain::trade_lifecycle::services::compute_premium;
use crate::domain::trade_lifecycle::value_objects::{
    CloseMethod, PositionType, TradeAction, TradeStatus, TradeType,
};

/// Command to record a new trade entry.
///
/// Values arrive already resolved by the caller (defaults applied, parent data
/// copied); the command only checks that they are well formed.
#[derive(Debug, Clone)]
pub struct NewTradeCommand {
    /// Owning account.
    pub account_id: AccountId,
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Strategy type.
    pub trade_type: TradeType,
    /// Ledger position type; derived from type and action when absent.
    pub position_type: Option<PositionType>,
    /// Directional action (None for Assignment entries).
    pub trade_action: Option<TradeAction>,
    /// Strike price.
    pub strike_price: Option<Decimal>,
    /// Expiration date.
    pub expiration_date: Option<NaiveDate>,
    /// Number of contracts.
    pub contract_quantity: u32,
    /// Per-share option price.
    pub trade_price: Option<Decimal>,
    /// Per-contract fee.
    pub fees: Decimal,
    /// Premium used when price or action is missing.
    pub premium: Option<Money>,
    /// Date of this entry.
    pub trade_date: NaiveDate,
    /// Date the position opened.
    pub open_date: Option<NaiveDate>,
    /// Date the position closed.
    pub close_date: Option<NaiveDate>,
    /// Price shares were assigned or exercised at.
    pub assignment_price: Option<Decimal>,
    /// Fee charged on assignment or call-away.
    pub assignment_fee: Money,
    /// Initial status.
    pub status: TradeStatus,
    /// Opening trade this entry belongs to.
    pub parent_trade_id: Option<TradeId>,
    /// Share lot a Covered Call is written against.
    pub stock_position_id: Option<StockPositionId>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl NewTradeCommand {
    /// Validate the command parameters.
    ///
    /// # Errors
    ///
    /// Returns error if a field is missing or out of range.
    pub fn validate(&self) -> Result<(), TradeError> {
        self.symbol.validate()?;

        if self.contract_quantity == 0 {
            return Err(TradeError::invalid(
                "contract_quantity",
                "must be at least 1",
            ));
        }
        if self.strike_price.is_some_and(|s| s <= Decimal::ZERO) {
            return Err(TradeError::invalid("strike_price", "must be greater than 0"));
        }
        if self.trade_price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(TradeError::invalid("trade_price", "must not be negative"));
        }
        if self.fees < Decimal::ZERO {
            return Err(TradeError::invalid("fees", "must not be negative"));
        }
        if self.assignment_price.is_some_and(|p| p <= Decimal::ZERO) {
            return Err(TradeError::invalid(
                "assignment_price",
                "must be greater than 0",
            ));
        }
        self.assignment_fee.ensure_non_negative("assignment_fee")?;

        if self.trade_type == TradeType::Assignment && self.trade_action.is_some() {
            return Err(TradeError::invalid(
                "trade_action",
                "Assignment entries carry no trade action",
            ));
        }
        if self.trade_type == TradeType::Assignment && self.parent_trade_id.is_none() {
            return Err(TradeError::invalid(
                "parent_trade_id",
                "Assignment entries must reference the assigned trade",
            ));
        }
        if self.stock_position_id.is_some() && self.trade_type != TradeType::CoveredCall {
            return Err(TradeError::invalid(
                "stock_position_id",
                "only Covered Call trades can reserve shares",
            ));
        }
        if let (Some(open), Some(close)) = (self.open_date, self.close_date)
            && close < open
        {
            return Err(TradeError::invalid(
                "close_date",
                format!("{close} is before open date {open}"),
            ));
        }
        Ok(())
    }
}

/// Parameters for reconstituting a Trade from storage.
///
/// Used by stores and tests to rebuild trades in any state without running
/// creation rules.
#[derive(Debug, Clone)]
pub struct ReconstitutedTradeParams {
    /// Trade identifier.
    pub id: TradeId,
    /// Owning account.
    pub account_id: AccountId,
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Strategy type.
    pub trade_type: TradeType,
    /// Ledger position type.
    pub position_type: PositionType,
    /// Directional action.
    pub trade_action: Option<TradeAction>,
    /// Strike price.
    pub strike_price: Option<Decimal>,
    /// Expiration date.
    pub expiration_date: Option<NaiveDate>,
    /// Number of contracts.
    pub contract_quantity: u32,
    /// Per-share option price.
    pub trade_price: Option<Decimal>,
    /// Per-contract fee.
    pub fees: Decimal,
    /// Signed premium.
    pub premium: Money,
    /// Date of this entry.
    pub trade_date: NaiveDate,
    /// Date the position opened.
    pub open_date: Option<NaiveDate>,
    /// Date the position closed.
    pub close_date: Option<NaiveDate>,
    /// Closing price (single-entry close).
    pub close_price: Option<Decimal>,
    /// Closing fees (single-entry close).
    pub close_fees: Option<Decimal>,
    /// Closing premium (single-entry close).
    pub close_premium: Option<Money>,
    /// Close method.
    pub close_method: Option<CloseMethod>,
    /// Assignment / exercise price.
    pub assignment_price: Option<Decimal>,
    /// Assignment fee.
    pub assignment_fee: Money,
    /// Status.
    pub status: TradeStatus,
    /// Parent trade.
    pub parent_trade_id: Option<TradeId>,
    /// Linked share lot.
    pub stock_position_id: Option<StockPositionId>,
    /// Shares reserved from the linked lot.
    pub shares_used: Option<u32>,
    /// Notes.
    pub notes: Option<String>,
}

impl ReconstitutedTradeParams {
    /// Parameters for an open opening trade with every optional field unset.
    #[must_use]
    pub fn opening(
        id: impl Into<TradeId>,
        account_id: impl Into<AccountId>,
        symbol: &str,
        trade_type: TradeType,
        action: TradeAction,
        contract_quantity: u32,
        premium: Money,
        trade_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            symbol: Symbol::new(symbol),
            trade_type,
            position_type: PositionType::Open,
            trade_action: Some(action),
            strike_price: None,
            expiration_date: None,
            contract_quantity,
            trade_price: None,
            fees: Decimal::ZERO,
            premium,
            trade_date,
            open_date: Some(trade_date),
            close_date: None,
            close_price: None,
            close_fees: None,
            close_premium: None,
            close_method: None,
            assignment_price: None,
            assignment_fee: Money::ZERO,
            status: TradeStatus::Open,
            parent_trade_id: None,
            stock_position_id: None,
            shares_used: None,
            notes: None,
        }
    }
}

/// Resolution of a trade's contracts on its own record.
#[derive(Debug, Clone)]
pub struct InlineClose {
    /// Close method.
    pub method: CloseMethod,
    /// Close date.
    pub date: NaiveDate,
    /// Closing price (priced closes and exercise).
    pub price: Option<Decimal>,
    /// Closing fees.
    pub fees: Decimal,
    /// Closing premium (zero for unpriced closes).
    pub premium: Money,
    /// Assignment / exercise / call-away price.
    pub assignment_price: Option<Decimal>,
    /// Assignment fee to stamp on the trade.
    pub assignment_fee: Option<Money>,
}

/// Partial update of a trade's stored fields.
///
/// `None` leaves a field unchanged; for clearable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradePatch {
    /// New symbol.
    pub symbol: Option<Symbol>,
    /// New strike.
    #[serde(deserialize_with = "double_option")]
    pub strike_price: Option<Option<Decimal>>,
    /// New expiration.
    #[serde(deserialize_with = "double_option")]
    pub expiration_date: Option<Option<NaiveDate>>,
    /// New contract count.
    pub contract_quantity: Option<u32>,
    /// New per-share price.
    #[serde(deserialize_with = "double_option")]
    pub trade_price: Option<Option<Decimal>>,
    /// New action.
    pub trade_action: Option<TradeAction>,
    /// New per-contract fee.
    pub fees: Option<Decimal>,
    /// Premium used when price or action is missing.
    pub premium: Option<Money>,
    /// New entry date.
    pub trade_date: Option<NaiveDate>,
    /// New open date.
    pub open_date: Option<NaiveDate>,
    /// New close date, or clear it.
    #[serde(deserialize_with = "double_option")]
    pub close_date: Option<Option<NaiveDate>>,
    /// New closing price, or clear it.
    #[serde(deserialize_with = "double_option")]
    pub close_price: Option<Option<Decimal>>,
    /// New closing fees.
    pub close_fees: Option<Decimal>,
    /// New close method, or clear it.
    #[serde(deserialize_with = "double_option")]
    pub close_method: Option<Option<CloseMethod>>,
    /// Explicit closing premium.
    pub close_premium: Option<Money>,
    /// New assignment price.
    pub assignment_price: Option<Decimal>,
    /// New assignment fee.
    pub assignment_fee: Option<Money>,
    /// Explicit status.
    pub status: Option<TradeStatus>,
    /// New linked share lot, or unlink.
    #[serde(deserialize_with = "double_option")]
    pub stock_position_id: Option<Option<StockPositionId>>,
    /// Replacement notes.
    pub notes: Option<String>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// What a [`TradePatch`] touched, so callers know what to recompute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchEffects {
    /// Price, action, quantity or fees changed.
    pub pricing_changed: bool,
    /// Closing price or fees changed.
    pub close_pricing_changed: bool,
    /// Contract quantity changed.
    pub quantity_changed: bool,
    /// Linked share lot changed.
    pub position_changed: bool,
}

/// A single option trade entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    id: TradeId,
    account_id: AccountId,
    symbol: Symbol,
    trade_type: TradeType,
    position_type: PositionType,
    trade_action: Option<TradeAction>,
    strike_price: Option<Decimal>,
    expiration_date: Option<NaiveDate>,
    contract_quantity: u32,
    trade_price: Option<Decimal>,
    #[serde(default)]
    fees: Decimal,
    premium: Money,
    trade_date: NaiveDate,
    open_date: Option<NaiveDate>,
    close_date: Option<NaiveDate>,
    close_price: Option<Decimal>,
    close_fees: Option<Decimal>,
    close_premium: Option<Money>,
    close_method: Option<CloseMethod>,
    assignment_price: Option<Decimal>,
    #[serde(default)]
    assignment_fee: Money,
    status: TradeStatus,
    parent_trade_id: Option<TradeId>,
    stock_position_id: Option<StockPositionId>,
    shares_used: Option<u32>,
    notes: Option<String>,
}

impl Trade {
    /// Record a new trade entry.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails validation.
    pub fn new(id: TradeId, command: NewTradeCommand) -> Result<Self, TradeError> {
        command.validate()?;

        let is_assignment = command.trade_type == TradeType::Assignment;
        let fees = if is_assignment {
            Decimal::ZERO
        } else {
            command.fees
        };
        let premium = if is_assignment {
            Money::ZERO
        } else {
            Self::priced_or(
                command.trade_price,
                command.trade_action,
                command.contract_quantity,
                fees,
                command.premium.unwrap_or(Money::ZERO),
            )
        };
        let shares_used = (command.trade_type == TradeType::CoveredCall
            && command.stock_position_id.is_some())
        .then(|| shares_for(command.contract_quantity));

        Ok(Self {
            id,
            account_id: command.account_id,
            symbol: command.symbol,
            trade_type: command.trade_type,
            position_type: command.position_type.unwrap_or_else(|| {
                PositionType::derive(command.trade_type, command.trade_action)
            }),
            trade_action: command.trade_action,
            strike_price: command.strike_price,
            expiration_date: command.expiration_date,
            contract_quantity: command.contract_quantity,
            trade_price: command.trade_price,
            fees,
            premium,
            trade_date: command.trade_date,
            open_date: command.open_date.or(Some(command.trade_date)),
            close_date: command.close_date,
            close_price: None,
            close_fees: None,
            close_premium: None,
            close_method: None,
            assignment_price: command.assignment_price,
            assignment_fee: command.assignment_fee,
            status: command.status,
            parent_trade_id: command.parent_trade_id,
            stock_position_id: command.stock_position_id,
            shares_used,
            notes: command.notes,
        })
    }

    /// Reconstitute a trade from stored state.
    #[must_use]
    pub fn reconstitute(params: ReconstitutedTradeParams) -> Self {
        Self {
            id: params.id,
            account_id: params.account_id,
            symbol: params.symbol,
            trade_type: params.trade_type,
            position_type: params.position_type,
            trade_action: params.trade_action,
            strike_price: params.strike_price,
            expiration_date: params.expiration_date,
            contract_quantity: params.contract_quantity,
            trade_price: params.trade_price,
            fees: params.fees,
            premium: params.premium,
            trade_date: params.trade_date,
            open_date: params.open_date,
            close_date: params.close_date,
            close_price: params.close_price,
            close_fees: params.close_fees,
            close_premium: params.close_premium,
            close_method: params.close_method,
            assignment_price: params.assignment_price,
            assignment_fee: params.assignment_fee,
            status: params.status,
            parent_trade_id: params.parent_trade_id,
            stock_position_id: params.stock_position_id,
            shares_used: params.shares_used,
            notes: params.notes,
        }
    }

    fn priced_or(
        price: Option<Decimal>,
        action: Option<TradeAction>,
        quantity: u32,
        fees: Decimal,
        fallback: Money,
    ) -> Money {
        match (price, action) {
            (Some(p), Some(_)) if !p.is_zero() => compute_premium(price, action, quantity, fees),
            _ => fallback,
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Trade ID.
    #[must_use]
    pub const fn id(&self) -> &TradeId {
        &self.id
    }

    /// Owning account.
    #[must_use]
    pub const fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Underlying symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Strategy type.
    #[must_use]
    pub const fn trade_type(&self) -> TradeType {
        self.trade_type
    }

    /// Ledger position type.
    #[must_use]
    pub const fn position_type(&self) -> PositionType {
        self.position_type
    }

    /// Directional action.
    #[must_use]
    pub const fn trade_action(&self) -> Option<TradeAction> {
        self.trade_action
    }

    /// Strike price.
    #[must_use]
    pub const fn strike_price(&self) -> Option<Decimal> {
        self.strike_price
    }

    /// Expiration date.
    #[must_use]
    pub const fn expiration_date(&self) -> Option<NaiveDate> {
        self.expiration_date
    }

    /// Number of contracts.
    #[must_use]
    pub const fn contract_quantity(&self) -> u32 {
        self.contract_quantity
    }

    /// Per-share option price.
    #[must_use]
    pub const fn trade_price(&self) -> Option<Decimal> {
        self.trade_price
    }

    /// Per-contract fee.
    #[must_use]
    pub const fn fees(&self) -> Decimal {
        self.fees
    }

    /// Signed premium of this entry.
    #[must_use]
    pub const fn premium(&self) -> Money {
        self.premium
    }

    /// Date of this entry.
    #[must_use]
    pub const fn trade_date(&self) -> NaiveDate {
        self.trade_date
    }

    /// Date the position opened.
    #[must_use]
    pub const fn open_date(&self) -> Option<NaiveDate> {
        self.open_date
    }

    /// Date the position closed.
    #[must_use]
    pub const fn close_date(&self) -> Option<NaiveDate> {
        self.close_date
    }

    /// Closing price of a single-entry close.
    #[must_use]
    pub const fn close_price(&self) -> Option<Decimal> {
        self.close_price
    }

    /// Closing fees of a single-entry close.
    #[must_use]
    pub const fn close_fees(&self) -> Option<Decimal> {
        self.close_fees
    }

    /// Closing premium of a single-entry close.
    #[must_use]
    pub const fn close_premium(&self) -> Option<Money> {
        self.close_premium
    }

    /// Close method.
    #[must_use]
    pub const fn close_method(&self) -> Option<CloseMethod> {
        self.close_method
    }

    /// Assignment / exercise price.
    #[must_use]
    pub const fn assignment_price(&self) -> Option<Decimal> {
        self.assignment_price
    }

    /// Fee charged on assignment or call-away.
    #[must_use]
    pub const fn assignment_fee(&self) -> Money {
        self.assignment_fee
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> TradeStatus {
        self.status
    }

    /// Parent trade.
    #[must_use]
    pub const fn parent_trade_id(&self) -> Option<&TradeId> {
        self.parent_trade_id.as_ref()
    }

    /// Linked share lot.
    #[must_use]
    pub const fn stock_position_id(&self) -> Option<&StockPositionId> {
        self.stock_position_id.as_ref()
    }

    /// Shares reserved from the linked lot.
    #[must_use]
    pub const fn shares_used(&self) -> Option<u32> {
        self.shares_used
    }

    /// Notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    // ========================================================================
    // Classification
    // ========================================================================

    /// Returns true for opening trades (SoldToOpen / BoughtToOpen).
    #[must_use]
    pub fn is_opener(&self) -> bool {
        self.trade_action.is_some_and(|a| a.is_opening())
    }

    /// Returns true if this entry records a close, expiry, assignment,
    /// call-away or exercise of (part of) its parent.
    #[must_use]
    pub fn is_closing_entry(&self) -> bool {
        self.trade_action.is_some_and(|a| a.is_closing())
            || self.status.is_terminal_marker()
            || self.close_method.is_some()
            || self.trade_type == TradeType::Assignment
    }

    /// Returns true for a buy/sell-to-close leg linked to a parent.
    ///
    /// These legs are folded into their parent in listings and reports.
    #[must_use]
    pub fn is_priced_closing_leg(&self) -> bool {
        self.parent_trade_id.is_some() && self.trade_action.is_some_and(|a| a.is_closing())
    }

    /// Returns true if the trade was fully closed on its own record.
    #[must_use]
    pub const fn is_closed_inline(&self) -> bool {
        self.close_date.is_some() && self.close_premium.is_some() && self.parent_trade_id.is_none()
    }

    /// Shares this trade currently reserves from its linked lot.
    #[must_use]
    pub fn reserved_shares(&self) -> u32 {
        if self.trade_type == TradeType::CoveredCall
            && self.status.is_open()
            && self.stock_position_id.is_some()
        {
            self.shares_used
                .unwrap_or_else(|| shares_for(self.contract_quantity))
        } else {
            0
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Resolve all remaining contracts on this record.
    pub fn close_inline(&mut self, close: InlineClose) {
        self.status = close.method.resolved_status();
        self.close_date = Some(close.date);
        self.close_price = close.price;
        self.close_fees = Some(close.fees);
        self.close_premium = Some(close.premium);
        self.close_method = Some(close.method);
        if let Some(price) = close.assignment_price {
            self.assignment_price = Some(price);
        }
        if let Some(fee) = close.assignment_fee {
            self.assignment_fee = fee;
        }
        self.ensure_open_date();
    }

    /// Child entry resolving `quantity` of this trade's contracts.
    ///
    /// Priced closes carry their closing premium as the child's premium and
    /// the closing action as its trade action; other methods leave the action
    /// empty and record only the method and terminal status.
    #[must_use]
    pub fn closing_child(&self, id: TradeId, close: &InlineClose, quantity: u32) -> Self {
        let action = close.method.closing_action();
        Self {
            id,
            account_id: self.account_id.clone(),
            symbol: self.symbol.clone(),
            trade_type: self.trade_type,
            position_type: PositionType::Close,
            trade_action: action,
            strike_price: self.strike_price,
            expiration_date: self.expiration_date,
            contract_quantity: quantity,
            trade_price: close.price,
            fees: if action.is_some() {
                close.fees
            } else {
                Decimal::ZERO
            },
            premium: close.premium,
            trade_date: close.date,
            open_date: Some(self.open_date.unwrap_or(self.trade_date)),
            close_date: Some(close.date),
            close_price: None,
            close_fees: None,
            close_premium: None,
            close_method: Some(close.method),
            assignment_price: close.assignment_price,
            assignment_fee: close.assignment_fee.unwrap_or(Money::ZERO),
            status: close.method.resolved_status(),
            parent_trade_id: Some(self.id.clone()),
            stock_position_id: self.stock_position_id.clone(),
            shares_used: None,
            notes: None,
        }
    }

    /// Keep the trade open for its remaining contracts after a partial close.
    pub fn keep_open_for_remainder(&mut self) {
        self.status = TradeStatus::Open;
        self.close_date = None;
        self.ensure_open_date();
    }

    /// Resolve the last open contracts through a child entry.
    ///
    /// The trade takes the method's terminal status; its own close fields stay
    /// empty because the closing legs live on the children.
    pub fn finish_via_children(&mut self, method: CloseMethod, date: NaiveDate) {
        self.status = method.resolved_status();
        self.close_date = Some(date);
        self.ensure_open_date();
    }

    /// Record how a child entry resolved its contracts.
    pub fn set_close_method(&mut self, method: CloseMethod) {
        self.close_method = Some(method);
    }

    /// Mark a put as assigned by a separate Assignment entry.
    pub fn mark_assigned(&mut self, date: NaiveDate, assignment_price: Decimal) {
        self.status = TradeStatus::Assigned;
        self.close_date = Some(date);
        self.assignment_price = Some(assignment_price);
        self.ensure_open_date();
    }

    /// Record the price shares moved at without changing status.
    pub fn record_assignment_price(&mut self, price: Decimal) {
        self.assignment_price = Some(price);
    }

    /// Align status with the contracts closed by priced child legs.
    pub fn sync_with_closed_quantity(&mut self, closed_quantity: u32, last_close: NaiveDate) {
        if closed_quantity >= self.contract_quantity {
            self.status = TradeStatus::Closed;
            if self.close_date.is_none() {
                self.close_date = Some(last_close);
            }
        } else {
            self.status = TradeStatus::Open;
            self.close_date = None;
        }
        self.ensure_open_date();
    }

    /// Overwrite the status.
    pub fn set_status(&mut self, status: TradeStatus) {
        self.status = status;
    }

    /// Reduce the share reservation after contracts left the position.
    pub fn release_shares(&mut self, shares: u32) {
        if let Some(used) = self.shares_used {
            self.shares_used = Some(used.saturating_sub(shares));
        }
    }

    /// Stamp the opening date of a closing leg from its parent.
    pub fn set_open_date(&mut self, date: NaiveDate) {
        self.open_date = Some(date);
    }

    /// Default `close_date` to the entry date when unset.
    pub fn ensure_close_date(&mut self) {
        if self.close_date.is_none() {
            self.close_date = Some(self.trade_date);
        }
    }

    /// Default `open_date` to the entry date when unset.
    pub fn ensure_open_date(&mut self) {
        if self.open_date.is_none() {
            self.open_date = Some(self.trade_date);
        }
    }

    /// Append a line to the notes.
    pub fn append_notes(&mut self, extra: &str) {
        if extra.trim().is_empty() {
            return;
        }
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{extra}"),
            _ => extra.to_string(),
        });
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Apply a partial field update.
    ///
    /// Only stored fields change here; premium, close premium, share
    /// reservation and status are recomputed by the caller using the returned
    /// [`PatchEffects`].
    ///
    /// # Errors
    ///
    /// Returns error if a supplied value is out of range.
    pub fn apply_patch(&mut self, patch: TradePatch) -> Result<PatchEffects, TradeError> {
        let mut effects = PatchEffects::default();

        if let Some(symbol) = patch.symbol {
            symbol.validate()?;
            self.symbol = symbol;
        }
        if let Some(strike) = patch.strike_price {
            if strike.is_some_and(|s| s <= Decimal::ZERO) {
                return Err(TradeError::invalid("strike_price", "must be greater than 0"));
            }
            self.strike_price = strike;
        }
        if let Some(expiration) = patch.expiration_date {
            self.expiration_date = expiration;
        }
        if let Some(quantity) = patch.contract_quantity {
            if quantity == 0 {
                return Err(TradeError::invalid(
                    "contract_quantity",
                    "must be at least 1",
                ));
            }
            effects.quantity_changed = quantity != self.contract_quantity;
            effects.pricing_changed = true;
            self.contract_quantity = quantity;
        }
        if let Some(price) = patch.trade_price {
            if price.is_some_and(|p| p < Decimal::ZERO) {
                return Err(TradeError::invalid("trade_price", "must not be negative"));
            }
            self.trade_price = price;
            effects.pricing_changed = true;
        }
        if let Some(action) = patch.trade_action {
            if self.trade_type == TradeType::Assignment {
                return Err(TradeError::invalid(
                    "trade_action",
                    "Assignment entries carry no trade action",
                ));
            }
            self.trade_action = Some(action);
            effects.pricing_changed = true;
        }
        if let Some(fees) = patch.fees {
            if fees < Decimal::ZERO {
                return Err(TradeError::invalid("fees", "must not be negative"));
            }
            self.fees = fees;
            effects.pricing_changed = true;
        }
        if let Some(premium) = patch.premium {
            if self.trade_price.is_none_or(|p| p.is_zero()) || self.trade_action.is_none() {
                self.premium = premium;
            }
        }
        if let Some(date) = patch.trade_date {
            self.trade_date = date;
        }
        if let Some(date) = patch.open_date {
            self.open_date = Some(date);
        }
        if let Some(close_date) = patch.close_date {
            self.close_date = close_date;
        }
        if let Some(close_price) = patch.close_price {
            self.close_price = close_price;
            effects.close_pricing_changed = true;
        }
        if let Some(close_fees) = patch.close_fees {
            if close_fees < Decimal::ZERO {
                return Err(TradeError::invalid("close_fees", "must not be negative"));
            }
            self.close_fees = Some(close_fees);
            effects.close_pricing_changed = true;
        }
        if let Some(method) = patch.close_method {
            self.close_method = method;
        }
        if let Some(price) = patch.assignment_price {
            if price <= Decimal::ZERO {
                return Err(TradeError::invalid(
                    "assignment_price",
                    "must be greater than 0",
                ));
            }
            self.assignment_price = Some(price);
        }
        if let Some(fee) = patch.assignment_fee {
            fee.ensure_non_negative("assignment_fee")?;
            self.assignment_fee = fee;
        }
        if let Some(position) = patch.stock_position_id {
            if position.is_some() && self.trade_type != TradeType::CoveredCall {
                return Err(TradeError::invalid(
                    "stock_position_id",
                    "only Covered Call trades can reserve shares",
                ));
            }
            effects.position_changed = position != self.stock_position_id;
            self.stock_position_id = position;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let (Some(open), Some(close)) = (self.open_date, self.close_date)
            && close < open
        {
            return Err(TradeError::invalid(
                "close_date",
                format!("{close} is before open date {open}"),
            ));
        }

        Ok(effects)
    }

    /// Recompute the premium after pricing inputs changed.
    ///
    /// Assignment entries always carry zero premium and fees.
    pub fn reprice(&mut self) {
        if self.trade_type == TradeType::Assignment {
            self.premium = Money::ZERO;
            self.fees = Decimal::ZERO;
            return;
        }
        self.premium = Self::priced_or(
            self.trade_price,
            self.trade_action,
            self.contract_quantity,
            self.fees,
            self.premium,
        );
    }

    /// Recompute the closing premium of a priced single-entry close.
    ///
    /// The closing action comes from the close method, or from the opening
    /// action when no method is recorded. Returns false when the method is not
    /// priced or there is no closing price to work from.
    pub fn reprice_close(&mut self) -> bool {
        let action = match self.close_method {
            Some(method) => method.closing_action(),
            None => self.trade_action.and_then(|a| a.closing_counterpart()),
        };
        match (action, self.close_price) {
            (Some(action), Some(price)) => {
                self.close_premium = Some(compute_premium(
                    Some(price),
                    Some(action),
                    self.contract_quantity,
                    self.close_fees.unwrap_or(Decimal::ZERO),
                ));
                true
            }
            _ => false,
        }
    }

    /// Set an explicit closing premium.
    pub fn set_close_premium(&mut self, premium: Money) {
        self.close_premium = Some(premium);
    }

    /// Reserve shares for the current quantity when linked to a lot, or drop
    /// the reservation when unlinked.
    pub fn refresh_share_reservation(&mut self) {
        self.shares_used = (self.trade_type == TradeType::CoveredCall
            && self.stock_position_id.is_some())
        .then(|| shares_for(self.contract_quantity));
    }
}
