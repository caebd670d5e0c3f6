//! # TradeGate Core
//!
//! Primitives shared by every exchange adapter:
//!
//! 1. **Exact decimals** - `Fixed` keeps exchange numbers digit-for-digit
//! 2. **Timing** - nanosecond timestamps behind a swappable `Clock`
//! 3. **Nonces and ids** - strictly increasing nonces for replay protection
//! 4. **Unified logging** - one `tracing` subscriber for the workspace

pub mod fixed;
pub mod id_gen;
pub mod logging;
pub mod timing;

pub use fixed::{Fixed, FixedError};
pub use id_gen::{NonceGenerator, generate_id_with_prefix};
pub use logging::init_logging;
pub use timing::{Clock, ManualClock, PerfTimer, SystemClock, Timestamp, millis, nanos};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixed::Fixed;
    pub use crate::id_gen::{NonceGenerator, generate_id_with_prefix};
    pub use crate::logging::init_logging;
    pub use crate::timing::{Clock, ManualClock, PerfTimer, SystemClock, Timestamp, millis, nanos};

    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
}
