//! The adapter contract
//!
//! Every exchange client exposes the same capabilities over the canonical
//! domain model. Venue wire types never cross this boundary.
//!
//! Futures are not `Send`: adapters run on a monoio thread-per-core runtime.

use crate::errors::{ExchangeError, Result};
use crate::registry::Registry;
use crate::types::{AccountOperation, Coin, Maker, Order, OrderSide, Pair};
use async_trait::async_trait;
use std::sync::Arc;
use tradegate_core::Fixed;

/// Capability set of one exchange adapter
#[async_trait(?Send)]
pub trait Exchange {
    /// Registry namespace and log label
    fn name(&self) -> &str;

    /// Catalog and cache this adapter reads and writes
    fn registry(&self) -> &Arc<Registry>;

    /// Populate or refresh this exchange's coin constraints
    async fn fetch_assets(&self) -> Result<()>;

    /// Populate or refresh this exchange's pair constraints
    async fn fetch_markets(&self) -> Result<()>;

    /// One order-book snapshot; its timestamps bracket the network call
    async fn order_book(&self, pair: &Pair) -> Result<Maker>;

    /// Submit a limit order. Fails before any I/O without credentials.
    async fn place_order(&self, pair: &Arc<Pair>, quantity: Fixed, rate: Fixed, side: OrderSide) -> Result<Order>;

    async fn limit_buy(&self, pair: &Arc<Pair>, quantity: Fixed, rate: Fixed) -> Result<Order> {
        self.place_order(pair, quantity, rate, OrderSide::Buy).await
    }

    async fn limit_sell(&self, pair: &Arc<Pair>, quantity: Fixed, rate: Fixed) -> Result<Order> {
        self.place_order(pair, quantity, rate, OrderSide::Sell).await
    }

    /// Refresh `order` in place from the exchange
    async fn order_status(&self, order: &mut Order) -> Result<()>;

    /// Request cancellation; the order reads `Canceling` until the next
    /// status query
    async fn cancel_order(&self, order: &mut Order) -> Result<()>;

    async fn list_orders(&self) -> Result<Vec<Order>> {
        Err(ExchangeError::unsupported(self.name(), "list_orders"))
    }

    async fn cancel_all_orders(&self) -> Result<()> {
        Err(ExchangeError::unsupported(self.name(), "cancel_all_orders"))
    }

    /// Best-effort balance refresh. Failures are logged, never returned, and
    /// leave the previous cache in place.
    async fn update_balances(&self);

    /// Last fetched available balance, zero if unknown
    fn balance(&self, coin: &Coin) -> Fixed {
        self.registry().balance(self.name(), &coin.code).unwrap_or(Fixed::ZERO)
    }

    /// Withdraw funds; `true` once the exchange accepted the request
    async fn withdraw(&self, coin: &Arc<Coin>, quantity: Fixed, address: &str, tag: &str) -> bool;

    /// Envelope form of withdraw and balance operations. Any error is also
    /// stored on `operation.error`.
    async fn do_account_operation(&self, operation: &mut AccountOperation) -> Result<()>;
}
