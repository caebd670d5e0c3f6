//! Venue dialects
//!
//! Each venue is a [`Venue`](crate::rest::Venue) implementation: endpoint
//! templates, signing scheme, status vocabulary and payload parsers. The
//! helpers below read loosely typed JSON the way every dialect needs to:
//! numbers may arrive quoted or bare, and ids may be strings or integers.

#[cfg(feature = "bgogo")]
pub mod bgogo;
#[cfg(feature = "binance")]
pub mod binance;
#[cfg(feature = "bitpie")]
pub mod bitpie;

use crate::errors::{ExchangeError, Result};
use serde_json::Value;
use tradegate_core::Fixed;

/// Maker and taker fee assumed when a venue publishes none
pub const DEFAULT_FEE: &str = "0.001";

pub(crate) fn default_fee() -> Fixed {
    Fixed::from_str_exact(DEFAULT_FEE).unwrap_or(Fixed::ZERO)
}

pub(crate) fn field<'a>(value: &'a Value, key: &str) -> Result<&'a Value> {
    match value.get(key) {
        Some(Value::Null) | None => Err(ExchangeError::decode(format!("missing field {key:?}"), value.to_string())),
        Some(found) => Ok(found),
    }
}

pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Result<&'a str> {
    field(value, key)?
        .as_str()
        .ok_or_else(|| ExchangeError::decode(format!("field {key:?} is not a string"), value.to_string()))
}

pub(crate) fn bool_field(value: &Value, key: &str) -> Result<bool> {
    field(value, key)?
        .as_bool()
        .ok_or_else(|| ExchangeError::decode(format!("field {key:?} is not a bool"), value.to_string()))
}

pub(crate) fn u32_field(value: &Value, key: &str) -> Result<u32> {
    field(value, key)?
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ExchangeError::decode(format!("field {key:?} is not a small integer"), value.to_string()))
}

pub(crate) fn opt_u32_field(value: &Value, key: &str) -> Result<Option<u32>> {
    match value.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(_) => u32_field(value, key).map(Some),
    }
}

pub(crate) fn array_field<'a>(value: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    field(value, key)?
        .as_array()
        .ok_or_else(|| ExchangeError::decode(format!("field {key:?} is not an array"), value.to_string()))
}

pub(crate) fn as_array<'a>(value: &'a Value) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| ExchangeError::decode("expected an array", value.to_string()))
}

/// Decimal from a quoted or bare JSON number
pub(crate) fn fixed_value(value: &Value) -> Result<Fixed> {
    let parsed = match value {
        Value::String(s) => Fixed::from_str_exact(s),
        Value::Number(n) => Fixed::from_float_text(&n.to_string()),
        other => return Err(ExchangeError::decode("expected a decimal", other.to_string())),
    };
    parsed.map_err(|e| ExchangeError::from(e).with_payload(&value.to_string()))
}

pub(crate) fn fixed_field(value: &Value, key: &str) -> Result<Fixed> {
    fixed_value(field(value, key)?).map_err(|e| match e {
        ExchangeError::Decode { message, .. } => {
            ExchangeError::decode(format!("field {key:?}: {message}"), value.to_string())
        }
        other => other,
    })
}

/// Zero when the field is absent or null
pub(crate) fn fixed_or_zero(value: &Value, key: &str) -> Result<Fixed> {
    match value.get(key) {
        Some(Value::Null) | None => Ok(Fixed::ZERO),
        Some(_) => fixed_field(value, key),
    }
}

/// Identifier sent as a string or an integer
pub(crate) fn id_field(value: &Value, key: &str) -> Result<String> {
    match field(value, key)? {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ExchangeError::decode(format!("field {key:?} is not an id"), value.to_string())),
    }
}
