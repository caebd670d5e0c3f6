//! Bgogo dialect
//!
//! Publishes no tick or lot sizes, so both are inferred from ticker samples:
//! the last price for the price filter, 24h quote turnover for the lot size.
//! Markets are keyed `TARGET/BASE`. Private GETs carry the signature in the
//! query; POST and DELETE send parameters and signature as a JSON body.

use super::*;
use crate::auth::{BodyMode, Digest, KeyOrder, NoncePolicy, Placement, SignTarget, SignatureEncoding, SigningScheme};
use crate::http::Method;
use crate::precision::infer_granularity_value;
use crate::rest::{AssetListing, BalanceEntry, BookSnapshot, Endpoint, MarketListing, OrderReport, Venue};
use crate::status::{RawStatus, StatusMapping, StatusTable};
use crate::types::{BookLevel, OrderSide, OrderStatus};
use std::collections::HashSet;

pub struct Bgogo {
    statuses: StatusMapping,
}

impl Bgogo {
    pub fn new() -> Self {
        Self {
            statuses: StatusMapping::Tokens(Self::status_table()),
        }
    }

    /// The API mixes `"Expired"` with upper-case tokens
    pub fn status_table() -> StatusTable {
        StatusTable::new()
            .with("NEW", OrderStatus::New)
            .with("PARTIALLY_FILLED", OrderStatus::Partial)
            .with("FILLED", OrderStatus::Filled)
            .with("CANCELED", OrderStatus::Cancelled)
            .with("REJECTED", OrderStatus::Rejected)
            .with("EXPIRED", OrderStatus::Expired)
            .case_insensitive()
    }

    /// `"ETH/BTC"` into `(base, target)` codes
    fn split_symbol(symbol: &str) -> Result<(&str, &str)> {
        match symbol.split_once('/') {
            Some((target, base)) if !target.is_empty() && !base.is_empty() && !base.contains('/') => Ok((base, target)),
            _ => Err(ExchangeError::decode(format!("malformed market symbol {symbol:?}"), symbol)),
        }
    }

    fn tickers(payload: &Value) -> Result<&serde_json::Map<String, Value>> {
        payload
            .as_object()
            .ok_or_else(|| ExchangeError::decode("tickers are not an object", payload.to_string()))
    }

    fn parse_market(symbol: &str, ticker: &Value) -> Result<MarketListing> {
        let (base, target) = Self::split_symbol(symbol)?;
        Ok(MarketListing {
            symbol: symbol.to_string(),
            base: base.to_string(),
            target: target.to_string(),
            maker_fee: default_fee(),
            taker_fee: default_fee(),
            lot_size: infer_granularity_value(ticker.get("past_24hrs_quote_turnover"))?,
            price_filter: infer_granularity_value(ticker.get("last_price"))?,
            listed: true,
        })
    }

    fn parse_levels(book: &Value, key: &str) -> Result<Vec<BookLevel>> {
        array_field(book, key)?
            .iter()
            .map(|level| {
                Ok(BookLevel {
                    quantity: fixed_field(level, "amount")?,
                    rate: fixed_field(level, "price")?,
                })
            })
            .collect()
    }
}

impl Default for Bgogo {
    fn default() -> Self {
        Self::new()
    }
}

impl Venue for Bgogo {
    fn name(&self) -> &'static str {
        "bgogo"
    }

    fn base_url(&self) -> &'static str {
        "https://bgogo.com"
    }

    fn signing_scheme(&self) -> SigningScheme {
        SigningScheme {
            digest: Digest::Sha256,
            encoding: SignatureEncoding::Hex,
            target: SignTarget::Query,
            signature: Placement::Query("signature".to_string()),
            api_key: Placement::Header("X-MBX-APIKEY".to_string()),
            nonce: NoncePolicy::TimestampMillis("timestamp".to_string()),
            key_order: KeyOrder::Lexicographic,
            body: BodyMode::Json,
        }
    }

    fn status_mapping(&self) -> &StatusMapping {
        &self.statuses
    }

    /// Tickers come bare, snapshots as `{"data": ..}`, private calls as
    /// `{"success": .., "message": .., "data": ..}`
    fn open_envelope(&self, body: Value) -> Result<Value> {
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let message = body.get("message").and_then(Value::as_str).unwrap_or("unknown error");
            return Err(ExchangeError::exchange(self.name(), message, ""));
        }

        match body {
            Value::Object(mut map) if map.contains_key("data") => Ok(map.remove("data").unwrap_or(Value::Null)),
            other => Ok(other),
        }
    }

    fn assets_endpoint(&self) -> Endpoint {
        Endpoint::public("/api/tickers")
    }

    fn parse_assets(&self, payload: &Value) -> Result<Vec<Result<AssetListing>>> {
        let mut seen = HashSet::new();
        let mut listings = Vec::new();
        for symbol in Self::tickers(payload)?.keys() {
            match Self::split_symbol(symbol) {
                Ok((base, target)) => {
                    for code in [base, target] {
                        if seen.insert(code.to_string()) {
                            listings.push(Ok(AssetListing::symbol_only(code)));
                        }
                    }
                }
                Err(e) => listings.push(Err(e)),
            }
        }
        Ok(listings)
    }

    fn markets_endpoint(&self) -> Endpoint {
        Endpoint::public("/api/tickers")
    }

    fn parse_markets(&self, payload: &Value) -> Result<Vec<Result<MarketListing>>> {
        Ok(Self::tickers(payload)?
            .iter()
            .map(|(symbol, ticker)| Self::parse_market(symbol, ticker))
            .collect())
    }

    /// Full snapshot only; `depth` is not supported by the endpoint
    fn order_book_endpoint(&self, symbol: &str, _depth: u32) -> Endpoint {
        Endpoint::public(format!("/api/v2/snapshot/{}", urlencoding::encode(symbol)))
    }

    fn parse_order_book(&self, payload: &Value) -> Result<BookSnapshot> {
        let book = field(payload, "order_books")?;
        Ok(BookSnapshot {
            bids: Self::parse_levels(book, "bids")?,
            asks: Self::parse_levels(book, "asks")?,
        })
    }

    fn place_order_endpoint(&self, symbol: &str, side: OrderSide, quantity: Fixed, rate: Fixed) -> Endpoint {
        Endpoint::signed(Method::Post, "/api/orders")
            .param("symbol", symbol)
            .param("side", side)
            .param("type", "LIMIT")
            .param("price", rate)
            .param("quantity", quantity)
    }

    fn parse_order_id(&self, payload: &Value) -> Result<String> {
        id_field(payload, "order_id")
    }

    fn order_status_endpoint(&self, symbol: &str, order_id: &str) -> Endpoint {
        Endpoint::signed(Method::Get, "/api/orders")
            .param("symbol", symbol)
            .param("orderId", order_id)
    }

    fn parse_order_report(&self, payload: &Value) -> Result<OrderReport> {
        Ok(OrderReport {
            status: RawStatus::Token(str_field(payload, "status")?.to_string()),
            deal_quantity: fixed_or_zero(payload, "executed_qty")?,
            deal_rate: fixed_or_zero(payload, "average_price")?,
        })
    }

    fn cancel_order_endpoint(&self, symbol: &str, order_id: &str) -> Endpoint {
        Endpoint::signed(Method::Delete, "/api/orders")
            .param("symbol", symbol)
            .param("orderId", order_id)
    }

    fn balances_endpoint(&self) -> Endpoint {
        Endpoint::signed(Method::Get, "/api/account/balances")
    }

    fn parse_balances(&self, payload: &Value) -> Result<Vec<Result<BalanceEntry>>> {
        Ok(as_array(payload)?
            .iter()
            .map(|entry| {
                Ok(BalanceEntry {
                    symbol: str_field(entry, "asset")?.to_string(),
                    available: fixed_field(entry, "available")?,
                    frozen: fixed_or_zero(entry, "frozen")?,
                })
            })
            .collect())
    }

    fn withdraw_endpoint(&self, coin_symbol: &str, quantity: Fixed, address: &str, tag: &str) -> Endpoint {
        let endpoint = Endpoint::signed(Method::Post, "/api/withdraw")
            .param("asset", coin_symbol)
            .param("address", address)
            .param("amount", quantity);
        if tag.is_empty() { endpoint } else { endpoint.param("tag", tag) }
    }

    fn parse_withdraw_id(&self, payload: &Value) -> Result<String> {
        id_field(payload, "withdraw_id")
    }
}
