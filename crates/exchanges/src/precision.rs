//! Trading granularity from raw exchange numbers
//!
//! Many exchanges never publish tick or lot sizes. For those the granularity
//! is inferred from a sample value: an exchange reporting a last price of
//! `"123.45"` is assumed to trade that pair to hundredths. This is a
//! best-effort heuristic, not an exchange guarantee: a sample that happens to
//! be round (`"0.5"` on a pair that trades to `0.001`) under-reports
//! precision. Declared precision always wins when an exchange provides one,
//! see [`resolve_granularity`].

use crate::errors::{ExchangeError, Result};
use serde_json::Value;
use tradegate_core::Fixed;

/// Number of digits after the decimal separator of `raw`
///
/// Empty input counts as zero digits. Anything that is not a plain decimal
/// (exponents, stray characters, two separators) is a decode error.
pub fn fraction_digits(raw: &str) -> Result<u32> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(0);
    }

    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let well_formed = !(integer.is_empty() && fraction.is_empty())
        && integer.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit());

    if !well_formed {
        return Err(ExchangeError::decode(format!("malformed number {text:?}"), raw));
    }

    Ok(fraction.len() as u32)
}

/// `10^-digits` for the fractional digits of `raw`; `1` when there are none
pub fn infer_granularity(raw: &str) -> Result<Fixed> {
    let digits = fraction_digits(raw)?;
    granularity_from_precision(digits).map_err(|e| e.with_payload(raw))
}

/// Same as [`infer_granularity`] for a JSON field that may be a string, a
/// number, null or missing
pub fn infer_granularity_value(value: Option<&Value>) -> Result<Fixed> {
    match value {
        None | Some(Value::Null) => Ok(Fixed::ONE),
        Some(Value::String(s)) => infer_granularity(s),
        Some(Value::Number(n)) => {
            // serde_json renders small floats with an exponent
            let text = n.to_string();
            let sample = Fixed::from_float_text(&text).map_err(|e| ExchangeError::from(e).with_payload(&text))?;
            granularity_from_precision(sample.normalize().scale())
        }
        Some(other) => Err(ExchangeError::decode(
            "expected a numeric value",
            other.to_string(),
        )),
    }
}

/// Granularity from an exchange-declared number of decimal places
pub fn granularity_from_precision(digits: u32) -> Result<Fixed> {
    Ok(Fixed::pow10_neg(digits)?)
}

/// Granularity from an exchange-declared step such as `"0.01000000"`
pub fn granularity_from_step(step: &str) -> Result<Fixed> {
    let value = Fixed::from_str_exact(step).map_err(|e| ExchangeError::from(e).with_payload(step))?;
    let normalized = value.normalize();

    if !normalized.is_positive() || normalized > Fixed::ONE || !normalized.is_unit_fraction_of_ten() {
        return Err(ExchangeError::decode(
            format!("step {step} is not a power of ten <= 1"),
            step,
        ));
    }

    Ok(normalized)
}

/// Declared precision when the exchange supplies one, otherwise inferred
/// from a sample value
pub fn resolve_granularity(declared: Option<u32>, sample: Option<&str>) -> Result<Fixed> {
    match (declared, sample) {
        (Some(digits), _) => granularity_from_precision(digits),
        (None, Some(raw)) => infer_granularity(raw),
        (None, None) => Ok(Fixed::ONE),
    }
}
