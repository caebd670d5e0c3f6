//! Identifier and nonce generation
//!
//! Exchanges that demand replay protection reject a nonce that is not
//! strictly greater than the previous one, even when two requests are signed
//! within the same clock tick. [`NonceGenerator`] guarantees that.

use crate::timing::Clock;
use nanoid::nanoid;
use std::sync::atomic::{AtomicU64, Ordering};

/// `<prefix>-<millis>-<8 random chars>`
pub fn generate_id_with_prefix(prefix: &str) -> String {
    let short_id = nanoid!(8);
    format!("{prefix}-{}-{short_id}", crate::timing::millis())
}

/// Strictly increasing nanosecond nonces
#[derive(Debug, Default)]
pub struct NonceGenerator {
    last: AtomicU64,
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next nonce: the clock reading, or last + 1 if the clock has not moved.
    pub fn next(&self, clock: &dyn Clock) -> u64 {
        let now = clock.now().nanos;
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(current) => last = current,
            }
        }
    }
}
