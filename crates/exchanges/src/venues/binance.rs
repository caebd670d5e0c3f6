//! Binance spot dialect
//!
//! - Discovery: `/api/v3/exchangeInfo`, tick and lot sizes from the
//!   `PRICE_FILTER` / `LOT_SIZE` filters
//! - Signing: HMAC-SHA256 hex over the query, `X-MBX-APIKEY` header
//! - Errors: `{"code": -1121, "msg": "Invalid symbol."}`

use super::*;
use crate::auth::SigningScheme;
use crate::http::Method;
use crate::precision::{granularity_from_precision, granularity_from_step};
use crate::rest::{AssetListing, BalanceEntry, BookSnapshot, Endpoint, MarketListing, OrderReport, Venue};
use crate::status::{RawStatus, StatusMapping, StatusTable};
use crate::types::{BookLevel, OrderSide, OrderStatus};
use std::collections::HashSet;

const RECV_WINDOW: u32 = 5000;

/// Book depths the depth endpoint accepts
const DEPTH_LIMITS: [u32; 8] = [5, 10, 20, 50, 100, 500, 1000, 5000];

pub struct Binance {
    statuses: StatusMapping,
}

impl Binance {
    pub fn new() -> Self {
        Self {
            statuses: StatusMapping::Tokens(Self::status_table()),
        }
    }

    pub fn status_table() -> StatusTable {
        StatusTable::new()
            .with("NEW", OrderStatus::New)
            .with("PARTIALLY_FILLED", OrderStatus::Partial)
            .with("FILLED", OrderStatus::Filled)
            .with("CANCELED", OrderStatus::Cancelled)
            .with("PENDING_CANCEL", OrderStatus::Canceling)
            .with("REJECTED", OrderStatus::Rejected)
            .with("EXPIRED", OrderStatus::Expired)
            .with("EXPIRED_IN_MATCH", OrderStatus::Expired)
    }

    /// Smallest accepted depth limit covering `depth`
    fn depth_limit(depth: u32) -> u32 {
        DEPTH_LIMITS
            .iter()
            .copied()
            .find(|limit| *limit >= depth)
            .unwrap_or(DEPTH_LIMITS[DEPTH_LIMITS.len() - 1])
    }

    fn filter<'a>(symbol: &'a Value, filter_type: &str) -> Option<&'a Value> {
        symbol
            .get("filters")?
            .as_array()?
            .iter()
            .find(|f| f.get("filterType").and_then(Value::as_str) == Some(filter_type))
    }

    /// Step from a filter, else the declared asset precision
    fn granularity(symbol: &Value, filter_type: &str, step_key: &str, precision_key: &str) -> Result<Fixed> {
        if let Some(filter) = Self::filter(symbol, filter_type) {
            return granularity_from_step(str_field(filter, step_key)?);
        }
        match opt_u32_field(symbol, precision_key)? {
            Some(digits) => granularity_from_precision(digits),
            None => Ok(Fixed::ONE),
        }
    }

    fn parse_market(symbol: &Value) -> Result<MarketListing> {
        Ok(MarketListing {
            symbol: str_field(symbol, "symbol")?.to_string(),
            base: str_field(symbol, "quoteAsset")?.to_string(),
            target: str_field(symbol, "baseAsset")?.to_string(),
            maker_fee: default_fee(),
            taker_fee: default_fee(),
            lot_size: Self::granularity(symbol, "LOT_SIZE", "stepSize", "baseAssetPrecision")?,
            price_filter: Self::granularity(symbol, "PRICE_FILTER", "tickSize", "quotePrecision")?,
            listed: str_field(symbol, "status")? == "TRADING",
        })
    }

    /// `["4.00000000", "431.00000000"]` price first
    fn parse_levels(payload: &Value, key: &str) -> Result<Vec<BookLevel>> {
        array_field(payload, key)?
            .iter()
            .map(|level| match level.as_array().map(Vec::as_slice) {
                Some([rate, quantity, ..]) => Ok(BookLevel {
                    quantity: fixed_value(quantity)?,
                    rate: fixed_value(rate)?,
                }),
                _ => Err(ExchangeError::decode("malformed book level", level.to_string())),
            })
            .collect()
    }
}

impl Default for Binance {
    fn default() -> Self {
        Self::new()
    }
}

impl Venue for Binance {
    fn name(&self) -> &'static str {
        "binance"
    }

    fn base_url(&self) -> &'static str {
        "https://api.binance.com"
    }

    fn signing_scheme(&self) -> SigningScheme {
        SigningScheme::binance_style()
    }

    fn status_mapping(&self) -> &StatusMapping {
        &self.statuses
    }

    fn open_envelope(&self, body: Value) -> Result<Value> {
        if let (Some(code), Some(msg)) = (body.get("code").and_then(Value::as_i64), body.get("msg").and_then(Value::as_str)) {
            if code < 0 {
                return Err(ExchangeError::exchange(self.name(), format!("{code}: {msg}"), ""));
            }
        }
        Ok(body)
    }

    fn assets_endpoint(&self) -> Endpoint {
        Endpoint::public("/api/v3/exchangeInfo")
    }

    fn parse_assets(&self, payload: &Value) -> Result<Vec<Result<AssetListing>>> {
        let mut seen = HashSet::new();
        let mut listings = Vec::new();
        for symbol in array_field(payload, "symbols")? {
            for key in ["baseAsset", "quoteAsset"] {
                match str_field(symbol, key) {
                    Ok(asset) if seen.insert(asset.to_string()) => listings.push(Ok(AssetListing::symbol_only(asset))),
                    Ok(_) => {}
                    Err(e) => listings.push(Err(e)),
                }
            }
        }
        Ok(listings)
    }

    fn markets_endpoint(&self) -> Endpoint {
        Endpoint::public("/api/v3/exchangeInfo")
    }

    fn parse_markets(&self, payload: &Value) -> Result<Vec<Result<MarketListing>>> {
        Ok(array_field(payload, "symbols")?.iter().map(Self::parse_market).collect())
    }

    fn order_book_endpoint(&self, symbol: &str, depth: u32) -> Endpoint {
        Endpoint::public("/api/v3/depth")
            .param("symbol", symbol)
            .param("limit", Self::depth_limit(depth))
    }

    fn parse_order_book(&self, payload: &Value) -> Result<BookSnapshot> {
        Ok(BookSnapshot {
            bids: Self::parse_levels(payload, "bids")?,
            asks: Self::parse_levels(payload, "asks")?,
        })
    }

    fn place_order_endpoint(&self, symbol: &str, side: OrderSide, quantity: Fixed, rate: Fixed) -> Endpoint {
        Endpoint::signed(Method::Post, "/api/v3/order")
            .param("symbol", symbol)
            .param("side", side)
            .param("type", "LIMIT")
            .param("timeInForce", "GTC")
            .param("quantity", quantity)
            .param("price", rate)
            .param("recvWindow", RECV_WINDOW)
    }

    fn parse_order_id(&self, payload: &Value) -> Result<String> {
        id_field(payload, "orderId")
    }

    fn order_status_endpoint(&self, symbol: &str, order_id: &str) -> Endpoint {
        Endpoint::signed(Method::Get, "/api/v3/order")
            .param("symbol", symbol)
            .param("orderId", order_id)
            .param("recvWindow", RECV_WINDOW)
    }

    fn parse_order_report(&self, payload: &Value) -> Result<OrderReport> {
        let executed = fixed_or_zero(payload, "executedQty")?;
        let quote = fixed_or_zero(payload, "cummulativeQuoteQty")?;
        let deal_rate = if executed.is_positive() { quote.checked_div(executed)? } else { Fixed::ZERO };

        Ok(OrderReport {
            status: RawStatus::Token(str_field(payload, "status")?.to_string()),
            deal_quantity: executed,
            deal_rate,
        })
    }

    fn cancel_order_endpoint(&self, symbol: &str, order_id: &str) -> Endpoint {
        Endpoint::signed(Method::Delete, "/api/v3/order")
            .param("symbol", symbol)
            .param("orderId", order_id)
            .param("recvWindow", RECV_WINDOW)
    }

    fn balances_endpoint(&self) -> Endpoint {
        Endpoint::signed(Method::Get, "/api/v3/account").param("recvWindow", RECV_WINDOW)
    }

    fn parse_balances(&self, payload: &Value) -> Result<Vec<Result<BalanceEntry>>> {
        Ok(array_field(payload, "balances")?
            .iter()
            .map(|entry| {
                Ok(BalanceEntry {
                    symbol: str_field(entry, "asset")?.to_string(),
                    available: fixed_field(entry, "free")?,
                    frozen: fixed_or_zero(entry, "locked")?,
                })
            })
            .collect())
    }

    fn withdraw_endpoint(&self, coin_symbol: &str, quantity: Fixed, address: &str, tag: &str) -> Endpoint {
        let endpoint = Endpoint::signed(Method::Post, "/sapi/v1/capital/withdraw/apply")
            .param("coin", coin_symbol)
            .param("address", address);
        let endpoint = if tag.is_empty() { endpoint } else { endpoint.param("addressTag", tag) };
        endpoint.param("amount", quantity).param("recvWindow", RECV_WINDOW)
    }

    fn parse_withdraw_id(&self, payload: &Value) -> Result<String> {
        id_field(payload, "id")
    }
}
