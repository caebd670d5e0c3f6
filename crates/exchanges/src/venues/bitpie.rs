//! Bitpie dialect
//!
//! Bittrex-style v1.1 API. Every response is wrapped in
//! `{"success": bool, "message": str, "result": ...}`. Markets declare their
//! precision as digit counts. Orders report state as flags rather than a
//! status token. Private calls are GETs whose full URL, including `apikey`
//! and a nanosecond `nonce`, is signed with HMAC-SHA512 into the `apisign`
//! header.

use super::*;
use crate::auth::{BodyMode, Digest, KeyOrder, NoncePolicy, Placement, SignTarget, SignatureEncoding, SigningScheme};
use crate::http::Method;
use crate::precision::granularity_from_precision;
use crate::rest::{AssetListing, BalanceEntry, BookSnapshot, Endpoint, MarketListing, OrderReport, Venue};
use crate::status::{OrderFlags, RawStatus, StatusMapping};
use crate::types::{BookLevel, OrderSide};
use std::collections::HashSet;

pub struct Bitpie {
    statuses: StatusMapping,
}

impl Bitpie {
    pub fn new() -> Self {
        Self {
            statuses: StatusMapping::Flags,
        }
    }

    fn parse_market(entry: &Value) -> Result<MarketListing> {
        Ok(MarketListing {
            symbol: str_field(entry, "Name")?.to_string(),
            base: str_field(entry, "Money")?.to_string(),
            target: str_field(entry, "Stock")?.to_string(),
            maker_fee: fixed_field(entry, "MakerFeeRate")?,
            taker_fee: fixed_field(entry, "TakerFeeRate")?,
            lot_size: granularity_from_precision(u32_field(entry, "StockPrecision")?)?,
            price_filter: granularity_from_precision(u32_field(entry, "MoneyPrecision")?)?,
            listed: bool_field(entry, "Enabled")?,
        })
    }

    fn parse_levels(payload: &Value, key: &str) -> Result<Vec<BookLevel>> {
        match payload.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(levels) => as_array(levels)?
                .iter()
                .map(|level| {
                    Ok(BookLevel {
                        quantity: fixed_field(level, "Quantity")?,
                        rate: fixed_field(level, "Rate")?,
                    })
                })
                .collect(),
        }
    }
}

impl Default for Bitpie {
    fn default() -> Self {
        Self::new()
    }
}

impl Venue for Bitpie {
    fn name(&self) -> &'static str {
        "bitpie"
    }

    fn base_url(&self) -> &'static str {
        "https://api.expie.com"
    }

    fn signing_scheme(&self) -> SigningScheme {
        SigningScheme {
            digest: Digest::Sha512,
            encoding: SignatureEncoding::Hex,
            target: SignTarget::FullUrl,
            signature: Placement::Header("apisign".to_string()),
            api_key: Placement::Query("apikey".to_string()),
            nonce: NoncePolicy::NonceNanos("nonce".to_string()),
            key_order: KeyOrder::Lexicographic,
            body: BodyMode::Query,
        }
    }

    fn status_mapping(&self) -> &StatusMapping {
        &self.statuses
    }

    fn open_envelope(&self, body: Value) -> Result<Value> {
        let success = body
            .get("success")
            .and_then(Value::as_bool)
            .ok_or_else(|| ExchangeError::decode("response has no success flag", body.to_string()))?;

        if !success {
            let message = body.get("message").and_then(Value::as_str).unwrap_or("unknown error");
            return Err(ExchangeError::exchange(self.name(), message, ""));
        }

        Ok(match body {
            Value::Object(mut map) => map.remove("result").unwrap_or(Value::Null),
            other => other,
        })
    }

    fn assets_endpoint(&self) -> Endpoint {
        Endpoint::public("/v1/markets")
    }

    /// Coins are the money and stock sides of every listed market
    fn parse_assets(&self, payload: &Value) -> Result<Vec<Result<AssetListing>>> {
        let mut seen = HashSet::new();
        let mut listings = Vec::new();
        for market in as_array(payload)? {
            for key in ["Money", "Stock"] {
                match str_field(market, key) {
                    Ok(symbol) if seen.insert(symbol.to_string()) => listings.push(Ok(AssetListing::symbol_only(symbol))),
                    Ok(_) => {}
                    Err(e) => listings.push(Err(e)),
                }
            }
        }
        Ok(listings)
    }

    fn markets_endpoint(&self) -> Endpoint {
        Endpoint::public("/v1.1/public/getmarkets")
    }

    fn parse_markets(&self, payload: &Value) -> Result<Vec<Result<MarketListing>>> {
        Ok(as_array(payload)?.iter().map(Self::parse_market).collect())
    }

    /// Full book only; `depth` is not supported by the endpoint
    fn order_book_endpoint(&self, symbol: &str, _depth: u32) -> Endpoint {
        Endpoint::public("/v1.1/public/getorderbook")
            .param("market", symbol)
            .param("type", "both")
    }

    fn parse_order_book(&self, payload: &Value) -> Result<BookSnapshot> {
        Ok(BookSnapshot {
            bids: Self::parse_levels(payload, "buy")?,
            asks: Self::parse_levels(payload, "sell")?,
        })
    }

    fn place_order_endpoint(&self, symbol: &str, side: OrderSide, quantity: Fixed, rate: Fixed) -> Endpoint {
        let path = match side {
            OrderSide::Buy => "/v1.1/market/buylimit",
            OrderSide::Sell => "/v1.1/market/selllimit",
        };
        Endpoint::signed(Method::Get, path)
            .param("market", symbol)
            .param("quantity", quantity)
            .param("rate", rate)
    }

    fn parse_order_id(&self, payload: &Value) -> Result<String> {
        id_field(payload, "uuid")
    }

    fn orders_need_symbol(&self) -> bool {
        false
    }

    fn order_status_endpoint(&self, _symbol: &str, order_id: &str) -> Endpoint {
        Endpoint::signed(Method::Get, "/v1.1/account/getorder").param("uuid", order_id)
    }

    fn parse_order_report(&self, payload: &Value) -> Result<OrderReport> {
        let flags = OrderFlags {
            cancel_initiated: bool_field(payload, "CancelInitiated")?,
            is_open: bool_field(payload, "IsOpen")?,
            quantity: fixed_field(payload, "Quantity")?,
            quantity_remaining: fixed_field(payload, "QuantityRemaining")?,
        };

        Ok(OrderReport {
            deal_quantity: flags.quantity.checked_sub(flags.quantity_remaining)?,
            deal_rate: fixed_or_zero(payload, "PricePerUnit")?,
            status: RawStatus::Flags(flags),
        })
    }

    fn cancel_order_endpoint(&self, _symbol: &str, order_id: &str) -> Endpoint {
        Endpoint::signed(Method::Get, "/v1.1/market/cancel").param("uuid", order_id)
    }

    fn balances_endpoint(&self) -> Endpoint {
        Endpoint::signed(Method::Get, "/v1.1/account/getbalances")
    }

    fn parse_balances(&self, payload: &Value) -> Result<Vec<Result<BalanceEntry>>> {
        Ok(as_array(payload)?
            .iter()
            .map(|entry| {
                let available = fixed_field(entry, "Available")?;
                let total = fixed_or_zero(entry, "Balance")?;
                Ok(BalanceEntry {
                    symbol: str_field(entry, "Currency")?.to_string(),
                    available,
                    frozen: if total > available { total.checked_sub(available)? } else { Fixed::ZERO },
                })
            })
            .collect())
    }

    fn withdraw_endpoint(&self, coin_symbol: &str, quantity: Fixed, address: &str, tag: &str) -> Endpoint {
        let endpoint = Endpoint::signed(Method::Get, "/v1.1/account/withdraw")
            .param("currency", coin_symbol)
            .param("quantity", quantity)
            .param("address", address);
        if tag.is_empty() { endpoint } else { endpoint.param("paymentid", tag) }
    }

    fn parse_withdraw_id(&self, payload: &Value) -> Result<String> {
        id_field(payload, "uuid")
    }
}
