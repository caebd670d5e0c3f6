//! Coin and pair catalogs, per-exchange constraints and the balance cache
//!
//! One [`Registry`] is built by the caller and shared (`Arc<Registry>`) by
//! every adapter in the process. Catalogs are append-only with
//! insert-if-absent semantics: coins and pairs are fully constructed before
//! they are published behind an `Arc`, so no reader ever sees a partial
//! value. Constraints and balances are last-writer-wins.

use crate::errors::{ExchangeError, Result};
use crate::types::{ChainType, Coin, CoinConstraint, Pair, PairConstraint, normalize_code, pair_key};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};
use tradegate_core::Fixed;

#[derive(Debug, Default)]
struct CoinCatalog {
    by_code: HashMap<String, Arc<Coin>>,
    next_id: u32,
}

#[derive(Debug, Default)]
struct PairCatalog {
    by_key: HashMap<String, Arc<Pair>>,
    next_id: u32,
}

type ConstraintKey = (String, u32);

/// Process-wide catalogs and caches
#[derive(Debug, Default)]
pub struct Registry {
    coins: RwLock<CoinCatalog>,
    pairs: RwLock<PairCatalog>,
    coin_constraints: RwLock<HashMap<ConstraintKey, CoinConstraint>>,
    pair_constraints: RwLock<HashMap<ConstraintKey, PairConstraint>>,
    balances: RwLock<HashMap<String, HashMap<String, Fixed>>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // ----- coins -----

    /// The coin with this code, created on first sighting
    pub fn get_or_insert_coin(&self, code: &str) -> Result<Arc<Coin>> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(ExchangeError::UnknownCoin("empty coin code".to_string()));
        }
        if let Some(coin) = read(&self.coins).by_code.get(&code) {
            return Ok(coin.clone());
        }

        let mut catalog = write(&self.coins);
        if let Some(coin) = catalog.by_code.get(&code) {
            return Ok(coin.clone());
        }
        catalog.next_id += 1;
        let coin = Arc::new(Coin::new(catalog.next_id, &code));
        catalog.by_code.insert(code, coin.clone());
        debug!("🪙 Registered coin {} (#{})", coin.code, coin.id);
        Ok(coin)
    }

    pub fn coin(&self, code: &str) -> Option<Arc<Coin>> {
        read(&self.coins).by_code.get(&normalize_code(code)).cloned()
    }

    pub fn coins(&self) -> Vec<Arc<Coin>> {
        let mut coins: Vec<_> = read(&self.coins).by_code.values().cloned().collect();
        coins.sort_by_key(|coin| coin.id);
        coins
    }

    // ----- pairs -----

    /// The pair for these two coins, created on first sighting
    ///
    /// There is one pair per unordered combination: asking for (ETH, BTC)
    /// after (BTC, ETH) exists returns the existing BTC|ETH pair.
    pub fn get_or_insert_pair(&self, base: &Coin, target: &Coin) -> Result<Arc<Pair>> {
        let base = self.registered(base)?;
        let target = self.registered(target)?;
        if base.id == target.id {
            return Err(ExchangeError::UnknownPair(format!("{}|{}", base.code, target.code)));
        }

        if let Some(pair) = self.pair(&base.code, &target.code) {
            return Ok(pair);
        }

        let mut catalog = write(&self.pairs);
        let key = pair_key(&base.code, &target.code);
        let reversed = pair_key(&target.code, &base.code);
        if let Some(pair) = catalog.by_key.get(&key).or_else(|| catalog.by_key.get(&reversed)) {
            return Ok(pair.clone());
        }
        catalog.next_id += 1;
        let pair = Arc::new(Pair {
            id: catalog.next_id,
            base,
            target,
        });
        catalog.by_key.insert(key, pair.clone());
        debug!("🔗 Registered pair {} (#{})", pair, pair.id);
        Ok(pair)
    }

    /// Same as [`Registry::get_or_insert_pair`] starting from coin codes
    pub fn get_or_insert_pair_by_codes(&self, base: &str, target: &str) -> Result<Arc<Pair>> {
        let base = self.get_or_insert_coin(base)?;
        let target = self.get_or_insert_coin(target)?;
        self.get_or_insert_pair(&base, &target)
    }

    /// Pair for a venue listing quoted in `base`
    ///
    /// Fails when the pair is already registered the other way round: a
    /// constraint's lot size applies to the target and its price filter to
    /// rates quoted in the base, so a reversed listing cannot share it.
    pub fn pair_as_listed(&self, base: &str, target: &str) -> Result<Arc<Pair>> {
        let pair = self.get_or_insert_pair_by_codes(base, target)?;
        if pair.base.code != normalize_code(base) {
            return Err(ExchangeError::Configuration(format!(
                "listing {}|{} is reversed against registered pair {}",
                normalize_code(base),
                normalize_code(target),
                pair
            )));
        }
        Ok(pair)
    }

    /// Pair for two codes in either orientation
    pub fn pair(&self, base: &str, target: &str) -> Option<Arc<Pair>> {
        let catalog = read(&self.pairs);
        catalog
            .by_key
            .get(&pair_key(base, target))
            .or_else(|| catalog.by_key.get(&pair_key(target, base)))
            .cloned()
    }

    pub fn pairs(&self) -> Vec<Arc<Pair>> {
        let mut pairs: Vec<_> = read(&self.pairs).by_key.values().cloned().collect();
        pairs.sort_by_key(|pair| pair.id);
        pairs
    }

    fn registered(&self, coin: &Coin) -> Result<Arc<Coin>> {
        self.coin(&coin.code)
            .filter(|known| known.id == coin.id)
            .ok_or_else(|| ExchangeError::UnknownCoin(coin.code.clone()))
    }

    // ----- constraints -----

    pub fn set_coin_constraint(&self, exchange: &str, constraint: CoinConstraint) {
        let key = (exchange.to_string(), constraint.coin.id);
        write(&self.coin_constraints).insert(key, constraint);
    }

    pub fn coin_constraint(&self, exchange: &str, coin: &Coin) -> Option<CoinConstraint> {
        read(&self.coin_constraints)
            .get(&(exchange.to_string(), coin.id))
            .cloned()
    }

    pub fn coin_constraints(&self, exchange: &str) -> Vec<CoinConstraint> {
        let mut constraints: Vec<_> = read(&self.coin_constraints)
            .iter()
            .filter(|((name, _), _)| name == exchange)
            .map(|(_, constraint)| constraint.clone())
            .collect();
        constraints.sort_by_key(|c| c.coin.id);
        constraints
    }

    /// Store a pair constraint; granularities must be powers of ten <= 1
    pub fn set_pair_constraint(&self, exchange: &str, constraint: PairConstraint) -> Result<()> {
        constraint.validate()?;
        let key = (exchange.to_string(), constraint.pair.id);
        write(&self.pair_constraints).insert(key, constraint);
        Ok(())
    }

    pub fn pair_constraint(&self, exchange: &str, pair: &Pair) -> Option<PairConstraint> {
        read(&self.pair_constraints)
            .get(&(exchange.to_string(), pair.id))
            .cloned()
    }

    pub fn pair_constraints(&self, exchange: &str) -> Vec<PairConstraint> {
        let mut constraints: Vec<_> = read(&self.pair_constraints)
            .iter()
            .filter(|((name, _), _)| name == exchange)
            .map(|(_, constraint)| constraint.clone())
            .collect();
        constraints.sort_by_key(|c| c.pair.id);
        constraints
    }

    /// Coin an exchange lists under `ex_symbol` (case-insensitive)
    pub fn coin_by_symbol(&self, exchange: &str, ex_symbol: &str) -> Option<Arc<Coin>> {
        read(&self.coin_constraints)
            .iter()
            .find(|((name, _), c)| name == exchange && c.ex_symbol.eq_ignore_ascii_case(ex_symbol))
            .map(|(_, c)| c.coin.clone())
    }

    /// Exchange-local symbol for a coin
    pub fn coin_symbol(&self, exchange: &str, coin: &Coin) -> Option<String> {
        self.coin_constraint(exchange, coin).map(|c| c.ex_symbol)
    }

    /// Pair an exchange lists under `ex_symbol` (case-insensitive)
    pub fn pair_by_symbol(&self, exchange: &str, ex_symbol: &str) -> Option<Arc<Pair>> {
        read(&self.pair_constraints)
            .iter()
            .find(|((name, _), c)| name == exchange && c.ex_symbol.eq_ignore_ascii_case(ex_symbol))
            .map(|(_, c)| c.pair.clone())
    }

    /// Exchange-local symbol for a pair
    pub fn pair_symbol(&self, exchange: &str, pair: &Pair) -> Option<String> {
        self.pair_constraint(exchange, pair).map(|c| c.ex_symbol)
    }

    // ----- balances -----

    /// Replace everything cached for `exchange` with a fresh fetch
    pub fn replace_balances(&self, exchange: &str, balances: HashMap<String, Fixed>) {
        let balances = balances
            .into_iter()
            .map(|(code, amount)| (normalize_code(&code), amount))
            .collect();
        write(&self.balances).insert(exchange.to_string(), balances);
    }

    pub fn balance(&self, exchange: &str, code: &str) -> Option<Fixed> {
        read(&self.balances)
            .get(exchange)
            .and_then(|balances| balances.get(&normalize_code(code)).copied())
    }

    pub fn balances(&self, exchange: &str) -> HashMap<String, Fixed> {
        read(&self.balances).get(exchange).cloned().unwrap_or_default()
    }

    // ----- snapshots -----

    /// Seed catalogs and one exchange's constraints from a snapshot
    pub fn load_snapshot(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        let exchange = snapshot.exchange.as_str();

        for record in &snapshot.coins {
            let coin = self.get_or_insert_coin(&record.code)?;
            self.set_coin_constraint(
                exchange,
                CoinConstraint {
                    ex_symbol: record.ex_symbol.clone().unwrap_or_else(|| coin.code.clone()),
                    coin,
                    chain_type: record.chain_type.clone(),
                    tx_fee: record.tx_fee,
                    withdraw: record.withdraw,
                    deposit: record.deposit,
                    confirmation: record.confirmation,
                    listed: record.listed,
                },
            );
        }

        for record in &snapshot.pairs {
            let pair = self.pair_as_listed(&record.base, &record.target)?;
            self.set_pair_constraint(
                exchange,
                PairConstraint {
                    pair,
                    ex_symbol: record.ex_symbol.clone(),
                    maker_fee: record.maker_fee,
                    taker_fee: record.taker_fee,
                    lot_size: record.lot_size,
                    price_filter: record.price_filter,
                    listed: record.listed,
                },
            )?;
        }

        info!(
            "📦 Loaded {} snapshot: {} coins, {} pairs",
            exchange,
            snapshot.coins.len(),
            snapshot.pairs.len()
        );
        Ok(())
    }
}

/// Static catalog for one exchange, used instead of live discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub exchange: String,
    #[serde(default)]
    pub coins: Vec<CoinRecord>,
    #[serde(default)]
    pub pairs: Vec<PairRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub code: String,
    #[serde(default)]
    pub ex_symbol: Option<String>,
    #[serde(default)]
    pub chain_type: ChainType,
    #[serde(default)]
    pub tx_fee: Fixed,
    #[serde(default = "yes")]
    pub withdraw: bool,
    #[serde(default = "yes")]
    pub deposit: bool,
    #[serde(default)]
    pub confirmation: u32,
    #[serde(default = "yes")]
    pub listed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub base: String,
    pub target: String,
    pub ex_symbol: String,
    #[serde(default)]
    pub maker_fee: Fixed,
    #[serde(default)]
    pub taker_fee: Fixed,
    pub lot_size: Fixed,
    pub price_filter: Fixed,
    #[serde(default = "yes")]
    pub listed: bool,
}

fn yes() -> bool {
    true
}

impl RegistrySnapshot {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| ExchangeError::from(e).with_payload(raw))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ExchangeError::Configuration(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }
}
