//! Live market snapshot through the TradeGate adapters
//!
//! Demonstrates:
//! - Market discovery into a shared registry
//! - Inferred and declared trading granularity
//! - Order-book capture with before/after timestamps
//!
//! Usage: `cargo run --example market_snapshot -- [binance|bitpie|bgogo] [BASE] [TARGET]`

use anyhow::{Context, bail};
use tracing::{info, warn};
use tradegate_exchanges::prelude::*;

async fn snapshot<V: Venue>(venue: V, base: &str, target: &str) -> anyhow::Result<()> {
    let registry = Registry::shared();
    let config = ExchangeConfig::new(venue.name()).with_depth(10);
    let exchange = RestExchange::connect(venue, config, registry.clone())?;

    let timer = PerfTimer::start("fetch_markets");
    exchange.fetch_markets().await?;
    timer.log_elapsed();

    let constraints = registry.pair_constraints(exchange.name());
    info!("📋 {} lists {} markets", exchange.name(), constraints.len());

    let pair = registry
        .pair(base, target)
        .with_context(|| format!("{base}|{target} is not listed on {}", exchange.name()))?;
    if let Some(constraint) = registry.pair_constraint(exchange.name(), &pair) {
        info!("   {} as {}: lot {} tick {}", pair, constraint.ex_symbol, constraint.lot_size, constraint.price_filter);
    }

    let maker = exchange.order_book(&pair).await?;
    info!("📊 {} book captured in {}ms", pair, maker.capture_millis());
    for level in maker.bids.iter().take(5) {
        info!("   BID {} @ {}", level.quantity, level.rate);
    }
    for level in maker.asks.iter().take(5) {
        info!("   ASK {} @ {}", level.quantity, level.rate);
    }
    match maker.spread() {
        Some(spread) => info!("   Spread: {}", spread),
        None => warn!("   One side of the book is empty"),
    }
    Ok(())
}

#[monoio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let venue = args.get(1).map(String::as_str).unwrap_or("binance");
    let base = args.get(2).map(String::as_str).unwrap_or("BTC");
    let target = args.get(3).map(String::as_str).unwrap_or("ETH");

    info!("🚀 TradeGate market snapshot: {} {}|{}", venue, base, target);

    match venue {
        "binance" => snapshot(Binance::new(), base, target).await,
        "bitpie" => snapshot(Bitpie::new(), base, target).await,
        "bgogo" => snapshot(Bgogo::new(), base, target).await,
        other => bail!("unknown venue {other}"),
    }
}
