//! Precision inference and status normalization across venues

use proptest::prelude::*;
use rstest::*;
use tradegate_core::prelude::*;
use tradegate_exchanges::precision::{fraction_digits, infer_granularity, resolve_granularity};
use tradegate_exchanges::prelude::*;
use tradegate_exchanges::status::{OrderFlags, RawStatus, StatusMapping, StatusTable, normalize_flags};

fn fx(raw: &str) -> Fixed {
    Fixed::from_str_exact(raw).unwrap()
}

// ============================================================================
// PRECISION INFERENCE
// ============================================================================

mod precision {
    use super::*;

    #[rstest]
    #[case("123.45", "0.01")]
    #[case("1000", "1")]
    #[case("0.00012300", "0.00000001")]
    #[case("7.", "1")]
    #[case(".5", "0.1")]
    #[case("", "1")]
    #[case("-3.250", "0.001")]
    fn test_inferred_granularity(#[case] sample: &str, #[case] expected: &str) {
        assert_eq!(infer_granularity(sample).unwrap(), fx(expected));
    }

    #[rstest]
    #[case("1e-5")]
    #[case("1.2.3")]
    #[case("12,5")]
    #[case("NaN")]
    fn test_malformed_samples_are_decode_errors(#[case] sample: &str) {
        let err = infer_granularity(sample).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.payload(), Some(sample));
    }

    #[rstest]
    #[case(Some(4), Some("0.5"), "0.0001")]
    #[case(None, Some("0.5"), "0.1")]
    #[case(Some(0), Some("123.45"), "1")]
    #[case(None, None, "1")]
    fn test_declared_precision_wins(#[case] declared: Option<u32>, #[case] sample: Option<&str>, #[case] expected: &str) {
        assert_eq!(resolve_granularity(declared, sample).unwrap(), fx(expected));
    }

    proptest! {
        #[test]
        fn prop_fraction_length_sets_granularity(int in "[0-9]{1,8}", frac in "[0-9]{1,18}") {
            let sample = format!("{int}.{frac}");
            let granularity = infer_granularity(&sample).unwrap();
            prop_assert_eq!(granularity, Fixed::pow10_neg(frac.len() as u32).unwrap());
            prop_assert_eq!(fraction_digits(&sample).unwrap() as usize, frac.len());
        }

        #[test]
        fn prop_integers_have_unit_granularity(int in "[0-9]{1,12}") {
            prop_assert_eq!(infer_granularity(&int).unwrap(), Fixed::ONE);
        }

        #[test]
        fn prop_granularity_is_a_valid_constraint(frac in "[0-9]{0,12}") {
            let granularity = infer_granularity(&format!("1.{frac}")).unwrap();
            prop_assert!(granularity.is_positive());
            prop_assert!(granularity <= Fixed::ONE);
            prop_assert!(granularity.is_unit_fraction_of_ten());
        }
    }
}

// ============================================================================
// STATUS NORMALIZATION
// ============================================================================

mod status {
    use super::*;

    fn token_tables() -> Vec<(&'static str, StatusTable)> {
        vec![("binance", Binance::status_table()), ("bgogo", Bgogo::status_table())]
    }

    #[rstest]
    #[case("PARTIALLY_FILLED", OrderStatus::Partial)]
    #[case("FILLED", OrderStatus::Filled)]
    #[case("CANCELED", OrderStatus::Cancelled)]
    #[case("NEW", OrderStatus::New)]
    #[case("REJECTED", OrderStatus::Rejected)]
    #[case("WEIRD_STATE", OrderStatus::Other)]
    fn test_token_venues_agree(#[case] token: &str, #[case] expected: OrderStatus) {
        for (venue, table) in token_tables() {
            assert_eq!(table.lookup(token), expected, "{venue} mapped {token}");
        }
    }

    #[rstest]
    #[case(Binance::new().status_mapping().clone())]
    #[case(Bgogo::new().status_mapping().clone())]
    #[case(Bitpie::new().status_mapping().clone())]
    fn test_every_mapping_is_total(#[case] mapping: StatusMapping) {
        let raws = [
            RawStatus::Token(String::new()),
            RawStatus::Token("🙃".into()),
            RawStatus::Flags(OrderFlags {
                cancel_initiated: false,
                is_open: true,
                quantity: Fixed::ONE,
                quantity_remaining: Fixed::ONE,
            }),
        ];
        for raw in raws {
            assert!(OrderStatus::ALL.contains(&mapping.normalize(&raw)));
        }
    }

    proptest! {
        #[test]
        fn prop_unknown_tokens_are_other(token in "[A-Za-z_]{1,24}") {
            for (_, table) in token_tables() {
                prop_assume!(!table.is_known(&token));
                prop_assert_eq!(table.lookup(&token), OrderStatus::Other);
            }
        }

        #[test]
        fn prop_cancel_initiated_always_wins(is_open in any::<bool>(), quantity in 0u32..1000, remaining in 0u32..1000) {
            let flags = OrderFlags {
                cancel_initiated: true,
                is_open,
                quantity: Fixed::from_i64(quantity as i64),
                quantity_remaining: Fixed::from_i64(remaining as i64),
            };
            prop_assert_eq!(normalize_flags(&flags), OrderStatus::Canceling);
        }

        #[test]
        fn prop_open_orders_never_read_cancelled(quantity in 1u32..1000, filled in 0u32..1000) {
            let remaining = quantity.saturating_sub(filled);
            let flags = OrderFlags {
                cancel_initiated: false,
                is_open: true,
                quantity: Fixed::from_i64(quantity as i64),
                quantity_remaining: Fixed::from_i64(remaining as i64),
            };
            let status = normalize_flags(&flags);
            prop_assert!(matches!(status, OrderStatus::New | OrderStatus::Partial | OrderStatus::Filled));
        }
    }
}
