//! End-to-end adapter scenarios over replayed exchange responses

use rstest::*;
use serial_test::serial;
use std::sync::Arc;
use tradegate_exchanges::prelude::*;

const BGOGO_TICKERS: &str = r#"{
    "ETH/BTC": {"last_price": "123.45", "past_24hrs_quote_turnover": "1000"},
    "BGG/ETH": {"last_price": "0.000210", "past_24hrs_quote_turnover": "88.125"}
}"#;

const BINANCE_INFO: &str = r#"{
    "symbols": [{
        "symbol": "ETHBTC", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "BTC",
        "filters": [
            {"filterType": "PRICE_FILTER", "tickSize": "0.00000100"},
            {"filterType": "LOT_SIZE", "stepSize": "0.00100000"}
        ]
    }]
}"#;

fn fx(raw: &str) -> Fixed {
    Fixed::from_str_exact(raw).unwrap()
}

fn adapter<V: Venue>(venue: V, registry: &Arc<Registry>, credentials: bool) -> RestExchange<V, ReplayTransport> {
    let name = venue.name();
    let config = ExchangeConfig::new(name);
    let config = if credentials { config.with_credentials("api-key", "api-secret") } else { config };
    RestExchange::with_transport(venue, config, registry.clone(), ReplayTransport::new())
}

#[fixture]
fn registry() -> Arc<Registry> {
    crate::init_test_logging();
    Registry::shared()
}

#[rstest]
#[monoio::test]
async fn test_inferred_constraints(registry: Arc<Registry>) {
    let bgogo = adapter(Bgogo::new(), &registry, false);
    bgogo.transport().respond(BGOGO_TICKERS);
    bgogo.fetch_markets().await.unwrap();

    let eth_btc = registry.pair("BTC", "ETH").unwrap();
    let constraint = registry.pair_constraint("bgogo", &eth_btc).unwrap();
    assert_eq!(constraint.price_filter, fx("0.01"));
    assert_eq!(constraint.lot_size, Fixed::ONE);

    let bgg_eth = registry.pair("ETH", "BGG").unwrap();
    let constraint = registry.pair_constraint("bgogo", &bgg_eth).unwrap();
    assert_eq!(constraint.price_filter, fx("0.000001"));
    assert_eq!(constraint.lot_size, fx("0.001"));
    assert_eq!(constraint.floor_quantity(fx("3.14159")).unwrap(), fx("3.141"));
}

#[rstest]
#[monoio::test]
async fn test_pairs_shared_across_exchanges(registry: Arc<Registry>) {
    let bgogo = adapter(Bgogo::new(), &registry, false);
    bgogo.transport().respond(BGOGO_TICKERS);
    bgogo.fetch_markets().await.unwrap();

    let binance = adapter(Binance::new(), &registry, false);
    binance.transport().respond(BINANCE_INFO);
    binance.fetch_markets().await.unwrap();

    let btc = registry.coin("BTC").unwrap();
    let eth = registry.coin("ETH").unwrap();
    let pair = registry.get_or_insert_pair(&btc, &eth).unwrap();
    assert!(Arc::ptr_eq(&pair, &registry.pair("BTC", "ETH").unwrap()));

    assert_eq!(registry.pair_symbol("bgogo", &pair).as_deref(), Some("ETH/BTC"));
    assert_eq!(registry.pair_symbol("binance", &pair).as_deref(), Some("ETHBTC"));
    assert_eq!(registry.pair_constraint("binance", &pair).unwrap().price_filter, fx("0.000001"));
}

#[rstest]
#[case::binance(Binance::new())]
#[case::bgogo(Bgogo::new())]
#[monoio::test]
async fn test_token_statuses<V: Venue>(registry: Arc<Registry>, #[case] venue: V) {
    let exchange = adapter(venue, &registry, true);
    let pair = registry.get_or_insert_pair_by_codes("BTC", "ETH").unwrap();
    registry
        .set_pair_constraint(
            exchange.name(),
            PairConstraint {
                pair: pair.clone(),
                ex_symbol: "ETHBTC".into(),
                maker_fee: Fixed::ZERO,
                taker_fee: Fixed::ZERO,
                lot_size: fx("0.001"),
                price_filter: fx("0.000001"),
                listed: true,
            },
        )
        .unwrap();

    let mut order = Order::new(pair, OrderSide::Buy, fx("2"), fx("0.03"), "28".into(), String::new());

    exchange.transport().respond(
        r#"{"success": true, "data": {"status": "PARTIALLY_FILLED", "executed_qty": "1", "average_price": "0.03"},
            "status": "PARTIALLY_FILLED", "executedQty": "1", "cummulativeQuoteQty": "0.03"}"#,
    );
    exchange.order_status(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Partial);
    assert_eq!(order.deal_quantity, Fixed::ONE);

    exchange.transport().respond(r#"{"success": true, "data": {}}"#);
    exchange.cancel_order(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Canceling);

    exchange.transport().respond(
        r#"{"success": true, "data": {"status": "WEIRD_STATE"}, "status": "WEIRD_STATE"}"#,
    );
    exchange.order_status(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Other);
}

#[rstest]
#[case::binance(Binance::new())]
#[case::bitpie(Bitpie::new())]
#[case::bgogo(Bgogo::new())]
#[monoio::test]
async fn test_missing_credentials_never_reach_the_network<V: Venue>(registry: Arc<Registry>, #[case] venue: V) {
    let exchange = adapter(venue, &registry, false);
    let pair = registry.get_or_insert_pair_by_codes("BTC", "ETH").unwrap();

    let err = exchange.limit_buy(&pair, Fixed::ONE, Fixed::ONE).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);

    let mut order = Order::new(pair.clone(), OrderSide::Sell, Fixed::ONE, Fixed::ONE, "1".into(), String::new());
    assert_eq!(exchange.cancel_order(&mut order).await.unwrap_err().kind(), ErrorKind::Authentication);
    assert_eq!(order.status, OrderStatus::New);

    exchange.update_balances().await;
    assert!(!exchange.withdraw(&pair.target, Fixed::ONE, "addr", "").await);

    let mut operation = AccountOperation::balance_list();
    assert!(exchange.do_account_operation(&mut operation).await.is_err());
    assert_eq!(operation.error.map(|e| e.kind()), Some(ErrorKind::Authentication));

    assert_eq!(exchange.transport().request_count(), 0);
}

#[rstest]
#[monoio::test]
async fn test_unsupported_operations(registry: Arc<Registry>) {
    let exchange = adapter(Bitpie::new(), &registry, true);
    assert_eq!(exchange.list_orders().await.unwrap_err().kind(), ErrorKind::Unsupported);
    assert_eq!(exchange.cancel_all_orders().await.unwrap_err().kind(), ErrorKind::Unsupported);
    assert_eq!(exchange.transport().request_count(), 0);
}

#[rstest]
fn test_concurrent_registry_access(registry: Arc<Registry>) {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                let exchange = format!("venue-{}", i % 2);
                let pair = registry.get_or_insert_pair_by_codes("USDT", "BTC").unwrap();
                let mut balances = std::collections::HashMap::new();
                balances.insert("BTC".to_string(), Fixed::from_i64(i));
                registry.replace_balances(&exchange, balances);
                pair.id
            })
        })
        .collect();

    let ids: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(registry.pairs().len(), 1);
    assert!(registry.balance("venue-0", "BTC").is_some());
    assert!(registry.balance("venue-1", "BTC").is_some());
}

#[test]
#[serial]
fn test_logging_init_is_idempotent() {
    crate::init_test_logging();
    init_logging();
    init_logging();
    crate::init_test_logging();
    tracing::info!("logging initialised twice without panicking");
}
