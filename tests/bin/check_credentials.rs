//! Check exchange API credentials end to end
//!
//! Loads `<VENUE>_API_KEY` / `<VENUE>_SECRET_KEY` from `.env`, then:
//! 1. Discovers coins so balances can be resolved
//! 2. Runs a signed balance listing
//! 3. Prints the non-zero balances
//!
//! Usage: `cargo run --bin check_credentials -- [binance|bitpie|bgogo]`

use anyhow::bail;
use tracing::{error, info};
use tradegate_exchanges::prelude::*;

async fn check<V: Venue>(venue: V) -> anyhow::Result<()> {
    let name = venue.name();
    let config = ExchangeConfig::new(name).with_env_credentials(name)?.with_debug(true);

    let api_key = &config.credentials.api_key;
    if api_key.starts_with("your_") {
        bail!("{} credentials are still the .env.example placeholders", name.to_uppercase());
    }
    info!("✅ Credentials loaded for {}: {:?}", name, config.credentials);

    let exchange = RestExchange::connect(venue, config, Registry::shared())?;
    exchange.fetch_assets().await?;

    let mut operation = AccountOperation::balance_list();
    if let Err(e) = exchange.do_account_operation(&mut operation).await {
        error!("❌ Signed request rejected: {}", e);
        error!("   Request: {} {}", operation.request_uri, operation.map_params);
        error!("   Response: {}", operation.call_response);
        return Err(e.into());
    }

    info!("🔐 Signed request accepted");
    for balance in operation.balances.iter().filter(|b| !b.available.is_zero() || !b.frozen.is_zero()) {
        info!("   {}: {} available, {} frozen", balance.code, balance.available, balance.frozen);
    }
    Ok(())
}

#[monoio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    info!("🚀 TradeGate credentials check");
    match std::env::args().nth(1).as_deref().unwrap_or("binance") {
        "binance" => check(Binance::new()).await,
        "bitpie" => check(Bitpie::new()).await,
        "bgogo" => check(Bgogo::new()).await,
        other => bail!("unknown venue {other}"),
    }
}
