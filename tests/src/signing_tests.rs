//! Signing properties across every venue scheme

use proptest::prelude::*;
use rstest::*;
use tradegate_exchanges::auth::{Nonce, Params, canonical_query};
use tradegate_exchanges::prelude::*;
use tradegate_exchanges::{HttpRequest, Method};

const URL: &str = "https://api.example.com/api/v3/order";

fn signer_for(venue: &dyn Venue) -> Signer {
    Signer::new(Credentials::new("public-key", "secret-key"), venue.signing_scheme())
}

#[fixture]
fn params() -> Params {
    Params::new()
        .with("symbol", "ETHBTC")
        .with("side", "BUY")
        .with("quantity", "1.5")
        .with("price", "0.031")
}

#[rstest]
#[case::binance(Box::new(Binance::new()) as Box<dyn Venue>)]
#[case::bitpie(Box::new(Bitpie::new()) as Box<dyn Venue>)]
#[case::bgogo(Box::new(Bgogo::new()) as Box<dyn Venue>)]
fn test_signing_is_deterministic(params: Params, #[case] venue: Box<dyn Venue>) {
    let signer = signer_for(venue.as_ref());
    let first = signer.sign(Method::Post, URL, &params, Nonce(1_700_000_000_000)).unwrap();
    let second = signer.sign(Method::Post, URL, &params, Nonce(1_700_000_000_000)).unwrap();

    assert_eq!(first, second);
    assert!(signer.verify(&first.signed_payload, &first.signature));
    assert_eq!(first.nonce, Some(1_700_000_000_000));
}

#[rstest]
#[case::binance(Box::new(Binance::new()) as Box<dyn Venue>)]
#[case::bitpie(Box::new(Bitpie::new()) as Box<dyn Venue>)]
#[case::bgogo(Box::new(Bgogo::new()) as Box<dyn Venue>)]
fn test_nonce_changes_signature(params: Params, #[case] venue: Box<dyn Venue>) {
    let signer = signer_for(venue.as_ref());
    let a = signer.sign(Method::Get, URL, &params, Nonce(1)).unwrap();
    let b = signer.sign(Method::Get, URL, &params, Nonce(2)).unwrap();
    assert_ne!(a.signature, b.signature);
}

#[rstest]
fn test_bitpie_signs_full_url(params: Params) {
    let signer = signer_for(&Bitpie::new());
    let signed = signer.sign(Method::Get, URL, &params, Nonce(42)).unwrap();

    assert_eq!(
        signed.signed_payload,
        format!("{URL}?apikey=public-key&nonce=42&price=0.031&quantity=1.5&side=BUY&symbol=ETHBTC")
    );
    assert_eq!(signed.url, signed.signed_payload);
    assert_eq!(signed.signature.len(), 128);

    let request: HttpRequest = signed.clone().into();
    assert_eq!(request.header_value("apisign"), Some(signed.signature.as_str()));
}

#[rstest]
fn test_bgogo_json_body_carries_signature(params: Params) {
    let signer = signer_for(&Bgogo::new());
    let signed = signer.sign(Method::Post, URL, &params, Nonce(1_565_000_000_000)).unwrap();

    assert_eq!(signed.url, URL);
    let body: serde_json::Value = serde_json::from_str(signed.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["signature"], signed.signature.as_str());
    assert_eq!(body["timestamp"], "1565000000000");
    assert!(signed.signed_payload.starts_with("price=0.031&quantity=1.5&side=BUY"));

    let query = signer.sign(Method::Get, URL, &params, Nonce(1_565_000_000_000)).unwrap();
    assert!(query.body.is_none());
    assert_eq!(query.signature, signed.signature);
}

#[monoio::test]
async fn test_bgogo_cancel_sends_signed_json_body() {
    let registry = Registry::shared();
    let pair = registry.get_or_insert_pair_by_codes("BTC", "ETH").unwrap();
    registry
        .set_pair_constraint(
            "bgogo",
            PairConstraint {
                pair: pair.clone(),
                ex_symbol: "ETH/BTC".into(),
                maker_fee: Fixed::ZERO,
                taker_fee: Fixed::ZERO,
                lot_size: Fixed::ONE,
                price_filter: Fixed::ONE,
                listed: true,
            },
        )
        .unwrap();

    let config = ExchangeConfig::new("bgogo").with_credentials("public-key", "secret-key");
    let exchange = RestExchange::with_transport(Bgogo::new(), config, registry, ReplayTransport::new());
    let mut order = Order::new(pair, OrderSide::Buy, Fixed::ONE, Fixed::ONE, "77".into(), String::new());

    exchange.transport().respond(r#"{"success": true, "data": {}}"#);
    exchange.cancel_order(&mut order).await.unwrap();

    let request = exchange.transport().last_request().unwrap();
    assert_eq!(request.method, Method::Delete);
    assert!(!request.url.contains('?'), "parameters leaked into {}", request.url);

    let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["symbol"], "ETH/BTC");
    assert_eq!(body["orderId"], "77");
    assert!(body["timestamp"].as_str().is_some());
    assert!(body["signature"].as_str().is_some_and(|s| s.len() == 64));
    assert_eq!(request.header_value("X-MBX-APIKEY"), Some("public-key"));
}

#[test]
fn test_credentials_never_printed() {
    let credentials = Credentials::new("public-key-123456", "top-secret");
    let printed = format!("{credentials:?}");
    assert!(!printed.contains("top-secret"));
    assert!(!printed.contains("public-key-123456"));
}

proptest! {
    #[test]
    fn prop_same_inputs_same_signature(
        pairs in prop::collection::vec(("[a-z]{1,8}", "[A-Za-z0-9.]{0,12}"), 0..8),
        nonce in any::<u64>(),
    ) {
        let params = pairs.iter().fold(Params::new(), |p, (k, v)| p.with(k, v));
        let signer = signer_for(&Binance::new());
        let a = signer.sign(Method::Get, URL, &params, Nonce(nonce)).unwrap();
        let b = signer.sign(Method::Get, URL, &params, Nonce(nonce)).unwrap();
        prop_assert_eq!(a.signature, b.signature);
    }

    #[test]
    fn prop_lexicographic_order_ignores_insertion(
        pairs in prop::collection::btree_map("[a-z]{1,8}", "[A-Za-z0-9]{1,8}", 1..8),
    ) {
        let forward = pairs.iter().fold(Params::new(), |p, (k, v)| p.with(k, v));
        let backward = pairs.iter().rev().fold(Params::new(), |p, (k, v)| p.with(k, v));

        let scheme = Bitpie::new().signing_scheme();
        prop_assert_eq!(
            canonical_query(&forward, scheme.key_order),
            canonical_query(&backward, scheme.key_order)
        );

        let signer = signer_for(&Bitpie::new());
        let a = signer.sign(Method::Get, URL, &forward, Nonce(7)).unwrap();
        let b = signer.sign(Method::Get, URL, &backward, Nonce(7)).unwrap();
        prop_assert_eq!(a.signature, b.signature);
    }
}
