//! Canonical domain model shared by every exchange adapter
//!
//! Nothing here knows about a particular exchange: coins and pairs carry
//! process-wide identities, constraints hold the per-exchange view of them,
//! and orders and books are expressed in `Fixed` quantities and rates.

use crate::errors::{ExchangeError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tradegate_core::prelude::*;

/// A currency or token, identified by its upper-case code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub id: u32,
    pub code: String,
}

impl Coin {
    pub fn new(id: u32, code: &str) -> Self {
        Self {
            id,
            code: normalize_code(code),
        }
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Upper-case, whitespace-trimmed coin code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// An ordered (base, target) market
///
/// `base` is the quote side the pair is priced in, `target` the asset being
/// bought or sold, so `BTC|ETH` trades ETH for BTC.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair {
    pub id: u32,
    pub base: Arc<Coin>,
    pub target: Arc<Coin>,
}

impl Pair {
    pub fn key(&self) -> String {
        pair_key(&self.base.code, &self.target.code)
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.base.code, self.target.code)
    }
}

/// `"BASE|TARGET"`
pub fn pair_key(base: &str, target: &str) -> String {
    format!("{}|{}", normalize_code(base), normalize_code(target))
}

/// Network a coin is deposited and withdrawn on
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainType {
    #[default]
    Mainnet,
    Erc20,
    Trc20,
    Bep20,
    Other(String),
}

/// Per-(exchange, coin) trading metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CoinConstraint {
    pub coin: Arc<Coin>,
    pub ex_symbol: String,
    pub chain_type: ChainType,
    pub tx_fee: Fixed,
    pub withdraw: bool,
    pub deposit: bool,
    pub confirmation: u32,
    pub listed: bool,
}

impl CoinConstraint {
    /// Constraint with permissive defaults, used when an exchange lists a
    /// coin without publishing its deposit/withdraw details
    pub fn listed(coin: Arc<Coin>, ex_symbol: &str) -> Self {
        Self {
            coin,
            ex_symbol: ex_symbol.to_string(),
            chain_type: ChainType::Mainnet,
            tx_fee: Fixed::ZERO,
            withdraw: true,
            deposit: true,
            confirmation: 0,
            listed: true,
        }
    }
}

/// Per-(exchange, pair) trading metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PairConstraint {
    pub pair: Arc<Pair>,
    pub ex_symbol: String,
    pub maker_fee: Fixed,
    pub taker_fee: Fixed,
    /// Smallest quantity increment, a power of ten ≤ 1
    pub lot_size: Fixed,
    /// Smallest price increment, a power of ten ≤ 1
    pub price_filter: Fixed,
    pub listed: bool,
}

impl PairConstraint {
    /// Reject granularities that are not a power of ten ≤ 1
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("lot_size", self.lot_size), ("price_filter", self.price_filter)] {
            if !value.is_positive() || value > Fixed::ONE || !value.is_unit_fraction_of_ten() {
                return Err(ExchangeError::Configuration(format!(
                    "{} {name} {value} is not a power of ten <= 1",
                    self.ex_symbol
                )));
            }
        }
        Ok(())
    }

    /// Quantity rounded down to the lot size
    pub fn floor_quantity(&self, quantity: Fixed) -> Result<Fixed> {
        Ok(quantity.floor_to_step(self.lot_size)?)
    }

    /// Rate rounded down to the price filter
    pub fn floor_rate(&self, rate: Fixed) -> Result<Fixed> {
        Ok(rate.floor_to_step(self.price_filter)?)
    }
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Canonical order status
///
/// `Canceling` is client-side: it is set as soon as a cancel request is
/// accepted and stays until the next status query replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    Partial,
    Filled,
    Canceling,
    Cancelled,
    Rejected,
    Expired,
    /// The exchange reported a status outside its known vocabulary
    Other,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::New,
        OrderStatus::Partial,
        OrderStatus::Filled,
        OrderStatus::Canceling,
        OrderStatus::Cancelled,
        OrderStatus::Rejected,
        OrderStatus::Expired,
        OrderStatus::Other,
    ];

    /// No further fills can happen
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStatus::New => "New",
            OrderStatus::Partial => "Partial",
            OrderStatus::Filled => "Filled",
            OrderStatus::Canceling => "Canceling",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Expired => "Expired",
            OrderStatus::Other => "Other",
        };
        write!(f, "{name}")
    }
}

/// A submitted order and what the exchange last said about it
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub pair: Arc<Pair>,
    pub side: OrderSide,
    pub quantity: Fixed,
    pub rate: Fixed,
    pub order_id: String,
    pub status: OrderStatus,
    pub deal_quantity: Fixed,
    pub deal_rate: Fixed,
    /// Raw placement response
    pub json_response: String,
    /// Raw response of the last status query
    pub status_message: String,
    /// Raw response of the cancel request
    pub cancel_status: String,
}

impl Order {
    pub fn new(
        pair: Arc<Pair>,
        side: OrderSide,
        quantity: Fixed,
        rate: Fixed,
        order_id: String,
        json_response: String,
    ) -> Self {
        Self {
            pair,
            side,
            quantity,
            rate,
            order_id,
            status: OrderStatus::New,
            deal_quantity: Fixed::ZERO,
            deal_rate: Fixed::ZERO,
            json_response,
            status_message: String::new(),
            cancel_status: String::new(),
        }
    }

    /// Record a confirmed status query
    pub fn apply_status(&mut self, status: OrderStatus, raw: String) {
        self.status = status;
        self.status_message = raw;
    }

    /// Record an accepted cancel request; confirmation needs a status query
    pub fn mark_canceling(&mut self, raw: String) {
        self.status = OrderStatus::Canceling;
        self.cancel_status = raw;
    }
}

/// One level of a book ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub quantity: Fixed,
    pub rate: Fixed,
}

/// Where catalog and book data came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    #[default]
    ExchangeApi,
    JsonFile,
}

/// Order-book snapshot
///
/// `before` and `after` bracket the network call, so a consumer can bound
/// how stale the book may be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maker {
    pub worker: String,
    pub source: DataSource,
    pub before: Timestamp,
    pub after: Timestamp,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl Maker {
    pub fn best_bid(&self) -> Option<Fixed> {
        self.bids.first().map(|level| level.rate)
    }

    pub fn best_ask(&self) -> Option<Fixed> {
        self.asks.first().map(|level| level.rate)
    }

    pub fn spread(&self) -> Option<Fixed> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => ask.checked_sub(bid).ok(),
            _ => None,
        }
    }

    /// Upper bound on how long the capture took, in milliseconds
    pub fn capture_millis(&self) -> u64 {
        self.before.until(self.after) / 1_000_000
    }
}

/// Kind of account operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    Withdraw,
    Transfer,
    Balance,
    BalanceList,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Balance of one asset, as returned inside a `BalanceList` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub code: String,
    pub available: Fixed,
    pub frozen: Fixed,
}

/// Request/response envelope for withdraw, transfer and balance calls
#[derive(Debug, Clone)]
pub struct AccountOperation {
    pub id: String,
    pub op_type: OperationType,
    pub coin: Option<Arc<Coin>>,
    pub withdraw_amount: Fixed,
    pub withdraw_address: String,
    pub withdraw_tag: String,
    /// Record raw request and response text on the envelope
    pub debug_mode: bool,
    pub request_uri: String,
    pub map_params: String,
    pub call_response: String,
    pub withdraw_id: String,
    pub balances: Vec<AssetBalance>,
    pub error: Option<ExchangeError>,
}

impl AccountOperation {
    pub fn new(op_type: OperationType) -> Self {
        Self {
            id: generate_id_with_prefix("op"),
            op_type,
            coin: None,
            withdraw_amount: Fixed::ZERO,
            withdraw_address: String::new(),
            withdraw_tag: String::new(),
            debug_mode: false,
            request_uri: String::new(),
            map_params: String::new(),
            call_response: String::new(),
            withdraw_id: String::new(),
            balances: Vec::new(),
            error: None,
        }
    }

    pub fn withdraw(coin: Arc<Coin>, amount: Fixed, address: &str, tag: &str) -> Self {
        Self {
            coin: Some(coin),
            withdraw_amount: amount,
            withdraw_address: address.to_string(),
            withdraw_tag: tag.to_string(),
            ..Self::new(OperationType::Withdraw)
        }
    }

    pub fn balance_list() -> Self {
        Self::new(OperationType::BalanceList)
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    /// Store the error on the envelope and hand it back for propagation
    pub fn fail(&mut self, error: ExchangeError) -> ExchangeError {
        self.error = Some(error.clone());
        error
    }
}
