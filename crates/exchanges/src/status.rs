//! Order status normalization
//!
//! Each venue describes order state in its own vocabulary: a status token
//! (`"PARTIALLY_FILLED"`), or a handful of flags to be combined. A
//! [`StatusMapping`] is the venue's total function from that raw form onto
//! [`OrderStatus`]. Anything it does not recognize becomes
//! [`OrderStatus::Other`]; a status query never fails because of an
//! unexpected token.

use crate::types::OrderStatus;
use std::collections::HashMap;
use tradegate_core::Fixed;

/// Order state flags for venues that report booleans instead of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFlags {
    pub cancel_initiated: bool,
    pub is_open: bool,
    pub quantity: Fixed,
    pub quantity_remaining: Fixed,
}

/// Raw status as read from a venue payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawStatus {
    Token(String),
    Flags(OrderFlags),
}

/// Token to status lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    entries: HashMap<String, OrderStatus>,
    case_insensitive: bool,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match tokens regardless of case
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self.entries = self
            .entries
            .into_iter()
            .map(|(token, status)| (token.to_uppercase(), status))
            .collect();
        self
    }

    pub fn with(mut self, token: &str, status: OrderStatus) -> Self {
        let key = self.key(token);
        self.entries.insert(key, status);
        self
    }

    fn key(&self, token: &str) -> String {
        let token = token.trim();
        if self.case_insensitive {
            token.to_uppercase()
        } else {
            token.to_string()
        }
    }

    pub fn lookup(&self, token: &str) -> OrderStatus {
        self.entries.get(&self.key(token)).copied().unwrap_or(OrderStatus::Other)
    }

    pub fn is_known(&self, token: &str) -> bool {
        self.entries.contains_key(&self.key(token))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A venue's status vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMapping {
    Tokens(StatusTable),
    Flags,
}

impl StatusMapping {
    /// Total: every input maps to exactly one canonical status
    pub fn normalize(&self, raw: &RawStatus) -> OrderStatus {
        match (self, raw) {
            (StatusMapping::Tokens(table), RawStatus::Token(token)) => table.lookup(token),
            (StatusMapping::Flags, RawStatus::Flags(flags)) => normalize_flags(flags),
            _ => OrderStatus::Other,
        }
    }
}

/// Flag rule: cancel pending, then closed-with-remainder, then fill level
pub fn normalize_flags(flags: &OrderFlags) -> OrderStatus {
    if flags.cancel_initiated {
        OrderStatus::Canceling
    } else if !flags.is_open && flags.quantity_remaining.is_positive() {
        OrderStatus::Cancelled
    } else if flags.quantity_remaining.is_zero() {
        OrderStatus::Filled
    } else if flags.quantity_remaining != flags.quantity {
        OrderStatus::Partial
    } else {
        OrderStatus::New
    }
}
