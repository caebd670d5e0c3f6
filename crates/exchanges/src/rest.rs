//! Generic REST adapter
//!
//! [`RestExchange`] implements the [`Exchange`] contract once. Everything
//! venue-specific lives behind the [`Venue`] trait: endpoint templates, the
//! signing scheme, the status vocabulary and payload parsing. The driver owns
//! the control flow every adapter shares:
//!
//! - credential precondition before any credentialed I/O
//! - signing, transport and envelope checks
//! - Precision Inference and Status Normalizer wiring
//! - per-entry graceful degradation for discovery and balances
//! - registry and balance-cache updates

use crate::auth::{Params, Signer, SigningScheme, canonical_query};
use crate::config::ExchangeConfig;
use crate::errors::{ExchangeError, Result};
use crate::http::{HttpRequest, Method, MonoioHttpsClient, Transport};
use crate::registry::{Registry, RegistrySnapshot};
use crate::status::{RawStatus, StatusMapping};
use crate::traits::Exchange;
use crate::types::*;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tradegate_core::prelude::*;
use tradegate_core::{log_error, log_latency, log_order};

/// One HTTP call a venue wants made
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub params: Params,
    pub signed: bool,
}

impl Endpoint {
    /// Unsigned GET
    pub fn public(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            params: Params::new(),
            signed: false,
        }
    }

    /// Credentialed call, signed with the venue's scheme
    pub fn signed(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            signed: true,
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key, value);
        self
    }
}

/// A coin as listed by a venue
#[derive(Debug, Clone, PartialEq)]
pub struct AssetListing {
    pub symbol: String,
    pub code: String,
    pub chain_type: ChainType,
    pub tx_fee: Fixed,
    pub withdraw: bool,
    pub deposit: bool,
    pub confirmation: u32,
    pub listed: bool,
}

impl AssetListing {
    /// Listing with no deposit/withdraw details published
    pub fn symbol_only(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            code: normalize_code(symbol),
            chain_type: ChainType::Mainnet,
            tx_fee: Fixed::ZERO,
            withdraw: true,
            deposit: true,
            confirmation: 0,
            listed: true,
        }
    }
}

/// A market as listed by a venue, granularities already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct MarketListing {
    pub symbol: String,
    /// Coin code the market is priced in
    pub base: String,
    /// Coin code being traded
    pub target: String,
    pub maker_fee: Fixed,
    pub taker_fee: Fixed,
    pub lot_size: Fixed,
    pub price_filter: Fixed,
    pub listed: bool,
}

/// Bid and ask ladders of one book payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookSnapshot {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

/// What a status query payload says about an order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReport {
    pub status: RawStatus,
    pub deal_quantity: Fixed,
    pub deal_rate: Fixed,
}

/// A venue's balance entry, keyed by exchange symbol
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceEntry {
    pub symbol: String,
    pub available: Fixed,
    pub frozen: Fixed,
}

/// Venue dialect: configuration data plus payload parsing, no control flow
///
/// Parsers receive the payload after [`Venue::open_envelope`]. List parsers
/// return one result per entry so a single bad entry can be skipped.
pub trait Venue {
    /// Default registry namespace
    fn name(&self) -> &'static str;
    fn base_url(&self) -> &'static str;
    fn signing_scheme(&self) -> SigningScheme;
    fn status_mapping(&self) -> &StatusMapping;

    /// Unwrap the venue's response envelope. A failure reported inside the
    /// envelope is `ExchangeError::Exchange`; the driver attaches the raw
    /// payload.
    fn open_envelope(&self, body: Value) -> Result<Value> {
        Ok(body)
    }

    fn assets_endpoint(&self) -> Endpoint;
    fn parse_assets(&self, payload: &Value) -> Result<Vec<Result<AssetListing>>>;

    fn markets_endpoint(&self) -> Endpoint;
    fn parse_markets(&self, payload: &Value) -> Result<Vec<Result<MarketListing>>>;

    fn order_book_endpoint(&self, symbol: &str, depth: u32) -> Endpoint;
    fn parse_order_book(&self, payload: &Value) -> Result<BookSnapshot>;

    fn place_order_endpoint(&self, symbol: &str, side: OrderSide, quantity: Fixed, rate: Fixed) -> Endpoint;
    fn parse_order_id(&self, payload: &Value) -> Result<String>;

    /// Whether order status and cancel requests carry the pair symbol. Venues
    /// that key orders by id alone can track orders on unregistered pairs.
    fn orders_need_symbol(&self) -> bool {
        true
    }

    fn order_status_endpoint(&self, symbol: &str, order_id: &str) -> Endpoint;
    fn parse_order_report(&self, payload: &Value) -> Result<OrderReport>;

    fn cancel_order_endpoint(&self, symbol: &str, order_id: &str) -> Endpoint;

    fn balances_endpoint(&self) -> Endpoint;
    fn parse_balances(&self, payload: &Value) -> Result<Vec<Result<BalanceEntry>>>;

    fn withdraw_endpoint(&self, coin_symbol: &str, quantity: Fixed, address: &str, tag: &str) -> Endpoint;
    fn parse_withdraw_id(&self, payload: &Value) -> Result<String>;
}

/// Response after envelope checks
#[derive(Debug, Clone)]
struct Reply {
    payload: Value,
    raw: String,
}

/// [`Exchange`] implementation for any [`Venue`] over any [`Transport`]
pub struct RestExchange<V: Venue, T: Transport = MonoioHttpsClient> {
    venue: V,
    transport: T,
    config: ExchangeConfig,
    registry: Arc<Registry>,
    signer: Signer,
    nonces: NonceGenerator,
    clock: Arc<dyn Clock>,
    base_url: String,
}

impl<V: Venue> RestExchange<V, MonoioHttpsClient> {
    /// Adapter talking HTTPS to the live venue
    pub fn connect(venue: V, config: ExchangeConfig, registry: Arc<Registry>) -> Result<Self> {
        let transport = MonoioHttpsClient::new()?;
        Ok(Self::with_transport(venue, config, registry, transport))
    }
}

impl<V: Venue, T: Transport> RestExchange<V, T> {
    pub fn with_transport(venue: V, mut config: ExchangeConfig, registry: Arc<Registry>, transport: T) -> Self {
        if config.name.trim().is_empty() {
            config.name = venue.name().to_string();
        }
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| venue.base_url().to_string());
        let signer = Signer::new(config.credentials.clone(), venue.signing_scheme());

        info!("🔗 {} REST adapter created", config.name);
        info!("   Base URL: {}", base_url);

        Self {
            venue,
            transport,
            config,
            registry,
            signer,
            nonces: NonceGenerator::new(),
            clock: Arc::new(SystemClock),
            base_url,
        }
    }

    /// Replace the clock used for nonces and book timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    fn ensure_credentials(&self) -> Result<()> {
        self.config.credentials.ensure(&self.config.name)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build_request(&self, endpoint: &Endpoint) -> Result<HttpRequest> {
        let url = self.url(&endpoint.path);
        if endpoint.signed {
            self.ensure_credentials()?;
            let signed = self
                .signer
                .sign_now(endpoint.method, &url, &endpoint.params, &self.nonces, self.clock.as_ref())?;
            return Ok(signed.into());
        }

        let query = canonical_query(&endpoint.params, self.signer.scheme().key_order);
        let url = if query.is_empty() { url } else { format!("{url}?{query}") };
        Ok(HttpRequest {
            method: endpoint.method,
            url,
            headers: Vec::new(),
            body: None,
        })
    }

    /// Sign, send, decode and open the envelope
    async fn call(&self, endpoint: &Endpoint) -> Result<Reply> {
        let request = self.build_request(endpoint)?;
        let label = format!("{} {}", self.config.name, endpoint.path);

        let started = Timestamp::now();
        let response = self.transport.execute(request).await?;
        let micros = started.elapsed_micros();
        log_latency!(label, micros);

        let status = response.status;
        let success = response.is_success();
        let raw = response.body;

        let body: Value = match serde_json::from_str(&raw) {
            Ok(body) => body,
            Err(_) if !success => return Err(ExchangeError::Http { status, body: raw }),
            Err(e) => return Err(ExchangeError::from(e).with_payload(&raw)),
        };

        match self.venue.open_envelope(body) {
            Err(e) => Err(e.with_payload(&raw)),
            Ok(_) if !success => Err(ExchangeError::Http { status, body: raw }),
            Ok(payload) => Ok(Reply { payload, raw }),
        }
    }

    fn pair_symbol(&self, pair: &Pair) -> Result<String> {
        self.registry
            .pair_symbol(&self.config.name, pair)
            .ok_or_else(|| ExchangeError::UnknownPair(format!("{} on {}", pair, self.config.name)))
    }

    /// Symbol for an existing order; empty when the venue ignores it
    fn order_symbol(&self, pair: &Pair) -> Result<String> {
        if self.venue.orders_need_symbol() {
            self.pair_symbol(pair)
        } else {
            Ok(String::new())
        }
    }

    fn coin_symbol(&self, coin: &Coin) -> String {
        self.registry
            .coin_symbol(&self.config.name, coin)
            .unwrap_or_else(|| coin.code.clone())
    }

    /// JSON catalog mode: coins and pairs come from the snapshot file, or
    /// from a registry the caller already seeded
    fn seed_from_snapshot(&self) -> Result<()> {
        let Some(path) = &self.config.snapshot_path else {
            if self.registry.pair_constraints(&self.config.name).is_empty() {
                return Err(ExchangeError::Configuration(format!(
                    "{} uses a JSON catalog but none is loaded",
                    self.config.name
                )));
            }
            return Ok(());
        };

        let snapshot = RegistrySnapshot::from_file(path)?;
        if snapshot.exchange != self.config.name {
            return Err(ExchangeError::Configuration(format!(
                "snapshot is for {}, adapter is {}",
                snapshot.exchange, self.config.name
            )));
        }
        self.registry.load_snapshot(&snapshot)
    }

    fn store_asset(&self, listing: AssetListing) -> Result<()> {
        let coin = self.registry.get_or_insert_coin(&listing.code)?;
        self.registry.set_coin_constraint(
            &self.config.name,
            CoinConstraint {
                coin,
                ex_symbol: listing.symbol,
                chain_type: listing.chain_type,
                tx_fee: listing.tx_fee,
                withdraw: listing.withdraw,
                deposit: listing.deposit,
                confirmation: listing.confirmation,
                listed: listing.listed,
            },
        );
        Ok(())
    }

    fn store_market(&self, listing: MarketListing) -> Result<()> {
        let pair = self.registry.pair_as_listed(&listing.base, &listing.target)?;
        self.registry.set_pair_constraint(
            &self.config.name,
            PairConstraint {
                pair,
                ex_symbol: listing.symbol,
                maker_fee: listing.maker_fee,
                taker_fee: listing.taker_fee,
                lot_size: listing.lot_size,
                price_filter: listing.price_filter,
                listed: listing.listed,
            },
        )
    }

    /// Balance entries resolved to coin codes; unknown symbols are skipped
    fn resolve_balances(&self, entries: Vec<Result<BalanceEntry>>) -> Vec<AssetBalance> {
        let mut balances = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("⚠️ {} skipped balance entry: {}", self.config.name, e);
                    continue;
                }
            };

            let coin = self
                .registry
                .coin_by_symbol(&self.config.name, &entry.symbol)
                .or_else(|| self.registry.coin(&entry.symbol));
            match coin {
                Some(coin) => balances.push(AssetBalance {
                    code: coin.code.clone(),
                    available: entry.available,
                    frozen: entry.frozen,
                }),
                None => debug!("{} balance for unlisted symbol {}", self.config.name, entry.symbol),
            }
        }
        balances
    }

    async fn withdraw_operation(&self, operation: &mut AccountOperation) -> Result<()> {
        let coin = operation
            .coin
            .clone()
            .ok_or_else(|| ExchangeError::Configuration("withdraw operation has no coin".to_string()))?;

        let endpoint = self.venue.withdraw_endpoint(
            &self.coin_symbol(&coin),
            operation.withdraw_amount,
            &operation.withdraw_address,
            &operation.withdraw_tag,
        );
        let reply = self.recorded_call(operation, &endpoint).await?;

        operation.withdraw_id = self
            .venue
            .parse_withdraw_id(&reply.payload)
            .map_err(|e| e.with_payload(&reply.raw))?;
        info!("💸 {} withdraw {} {} accepted: {}", self.config.name, operation.withdraw_amount, coin, operation.withdraw_id);
        Ok(())
    }

    async fn balance_list_operation(&self, operation: &mut AccountOperation) -> Result<()> {
        let endpoint = self.venue.balances_endpoint();
        let reply = self.recorded_call(operation, &endpoint).await?;

        let entries = self
            .venue
            .parse_balances(&reply.payload)
            .map_err(|e| e.with_payload(&reply.raw))?;
        operation.balances = self.resolve_balances(entries);
        Ok(())
    }

    /// [`RestExchange::call`] that records request and response on the
    /// operation when either it or the adapter is in debug mode
    async fn recorded_call(&self, operation: &mut AccountOperation, endpoint: &Endpoint) -> Result<Reply> {
        let debug_mode = operation.debug_mode || self.config.debug_mode;
        if debug_mode {
            operation.request_uri = endpoint.path.clone();
            operation.map_params = canonical_query(&endpoint.params, self.signer.scheme().key_order);
        }

        let result = self.call(endpoint).await;
        if debug_mode {
            operation.call_response = match &result {
                Ok(reply) => reply.raw.clone(),
                Err(e) => e.payload().map(str::to_string).unwrap_or_else(|| e.to_string()),
            };
        }
        result
    }
}

#[async_trait(?Send)]
impl<V: Venue, T: Transport> Exchange for RestExchange<V, T> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    async fn fetch_assets(&self) -> Result<()> {
        if self.config.source == DataSource::JsonFile {
            return self.seed_from_snapshot();
        }

        let reply = self.call(&self.venue.assets_endpoint()).await?;
        let listings = self
            .venue
            .parse_assets(&reply.payload)
            .map_err(|e| e.with_payload(&reply.raw))?;

        let (mut stored, mut skipped) = (0usize, 0usize);
        for listing in listings {
            match listing.and_then(|listing| self.store_asset(listing)) {
                Ok(()) => stored += 1,
                Err(e) => {
                    skipped += 1;
                    warn!("⚠️ {} skipped asset entry: {}", self.config.name, e);
                }
            }
        }

        info!("✅ {} assets refreshed: {} stored, {} skipped", self.config.name, stored, skipped);
        Ok(())
    }

    async fn fetch_markets(&self) -> Result<()> {
        if self.config.source == DataSource::JsonFile {
            return self.seed_from_snapshot();
        }

        let reply = self.call(&self.venue.markets_endpoint()).await?;
        let listings = self
            .venue
            .parse_markets(&reply.payload)
            .map_err(|e| e.with_payload(&reply.raw))?;

        let (mut stored, mut skipped) = (0usize, 0usize);
        for listing in listings {
            match listing.and_then(|listing| self.store_market(listing)) {
                Ok(()) => stored += 1,
                Err(e) => {
                    skipped += 1;
                    warn!("⚠️ {} skipped market entry: {}", self.config.name, e);
                }
            }
        }

        info!("✅ {} markets refreshed: {} stored, {} skipped", self.config.name, stored, skipped);
        Ok(())
    }

    async fn order_book(&self, pair: &Pair) -> Result<Maker> {
        let symbol = self.pair_symbol(pair)?;
        let endpoint = self.venue.order_book_endpoint(&symbol, self.config.depth);

        let before = self.clock.now();
        let reply = self.call(&endpoint).await?;
        let after = self.clock.now();

        let book = self
            .venue
            .parse_order_book(&reply.payload)
            .map_err(|e| e.with_payload(&reply.raw))?;

        debug!("📊 {} {} book: {} bids, {} asks", self.config.name, pair, book.bids.len(), book.asks.len());

        Ok(Maker {
            worker: self.config.worker_id.clone(),
            source: DataSource::ExchangeApi,
            before,
            after,
            bids: book.bids,
            asks: book.asks,
        })
    }

    async fn place_order(&self, pair: &Arc<Pair>, quantity: Fixed, rate: Fixed, side: OrderSide) -> Result<Order> {
        self.ensure_credentials()?;
        let symbol = self.pair_symbol(pair)?;

        let endpoint = self.venue.place_order_endpoint(&symbol, side, quantity, rate);
        let reply = self.call(&endpoint).await.inspect_err(|e| {
            log_error!(self.config.name, "place_order", e);
        })?;

        let order_id = self
            .venue
            .parse_order_id(&reply.payload)
            .map_err(|e| e.with_payload(&reply.raw))?;

        log_order!(format!("PLACED {side}"), self.config.name, order_id, pair);
        Ok(Order::new(pair.clone(), side, quantity, rate, order_id, reply.raw))
    }

    async fn order_status(&self, order: &mut Order) -> Result<()> {
        self.ensure_credentials()?;
        let symbol = self.order_symbol(&order.pair)?;

        let endpoint = self.venue.order_status_endpoint(&symbol, &order.order_id);
        let reply = self.call(&endpoint).await?;

        let report = self
            .venue
            .parse_order_report(&reply.payload)
            .map_err(|e| e.with_payload(&reply.raw))?;
        let status = self.venue.status_mapping().normalize(&report.status);
        if status == OrderStatus::Other {
            warn!("⚠️ {} order {} has unrecognized status {:?}", self.config.name, order.order_id, report.status);
        }

        order.deal_quantity = report.deal_quantity;
        order.deal_rate = report.deal_rate;
        order.apply_status(status, reply.raw);
        debug!("📋 {} order {} is {}", self.config.name, order.order_id, status);
        Ok(())
    }

    async fn cancel_order(&self, order: &mut Order) -> Result<()> {
        self.ensure_credentials()?;
        let symbol = self.order_symbol(&order.pair)?;

        let endpoint = self.venue.cancel_order_endpoint(&symbol, &order.order_id);
        let reply = self.call(&endpoint).await.inspect_err(|e| {
            log_error!(self.config.name, "cancel_order", e);
        })?;

        order.mark_canceling(reply.raw);
        log_order!("CANCEL REQUESTED", self.config.name, order.order_id, order.pair);
        Ok(())
    }

    async fn update_balances(&self) {
        if let Err(e) = self.ensure_credentials() {
            warn!("⚠️ {}", e);
            return;
        }

        let reply = match self.call(&self.venue.balances_endpoint()).await {
            Ok(reply) => reply,
            Err(e) => {
                log_error!(self.config.name, "update_balances", e);
                return;
            }
        };

        let entries = match self.venue.parse_balances(&reply.payload) {
            Ok(entries) => entries,
            Err(e) => {
                log_error!(self.config.name, "update_balances", e.with_payload(&reply.raw));
                return;
            }
        };

        let balances: HashMap<String, Fixed> = self
            .resolve_balances(entries)
            .into_iter()
            .map(|balance| (balance.code, balance.available))
            .collect();

        info!("💰 {} balances updated: {} assets", self.config.name, balances.len());
        self.registry.replace_balances(&self.config.name, balances);
    }

    async fn withdraw(&self, coin: &Arc<Coin>, quantity: Fixed, address: &str, tag: &str) -> bool {
        let mut operation = AccountOperation::withdraw(coin.clone(), quantity, address, tag);
        match self.do_account_operation(&mut operation).await {
            Ok(()) => true,
            Err(e) => {
                log_error!(self.config.name, "withdraw", e);
                false
            }
        }
    }

    async fn do_account_operation(&self, operation: &mut AccountOperation) -> Result<()> {
        if let Err(e) = self.ensure_credentials() {
            return Err(operation.fail(e));
        }

        let result = match operation.op_type {
            OperationType::Withdraw => self.withdraw_operation(operation).await,
            OperationType::BalanceList => self.balance_list_operation(operation).await,
            other => Err(ExchangeError::unsupported(&self.config.name, &other.to_string())),
        };

        result.map_err(|e| operation.fail(e))
    }
}
