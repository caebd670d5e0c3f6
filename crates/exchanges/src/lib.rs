//! # TradeGate Exchange Integrations
//!
//! One canonical trading model over many exchange APIs.
//!
//! ## Architecture
//!
//! - **Domain model** - coins, pairs, constraints, orders and books in
//!   exact decimals, independent of any venue's wire format
//! - **Registry** - shared catalog of coins and pairs plus per-exchange
//!   constraints and balance caches
//! - **Signing** - one parameterized HMAC signer covering each venue's scheme
//! - **Normalization** - venue status vocabularies and inferred precision
//!   mapped onto the canonical model
//! - **Adapters** - a generic REST driver over monoio; venues supply data
//!   and parsers only

pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod precision;
pub mod registry;
pub mod rest;
pub mod status;
pub mod traits;
pub mod types;
pub mod venues;

pub use auth::{Credentials, Signer, SigningScheme};
pub use config::ExchangeConfig;
pub use errors::{ErrorKind, ExchangeError, Result};
pub use http::{HttpRequest, HttpResponse, Method, MonoioHttpsClient, ReplayTransport, Transport};
pub use registry::{Registry, RegistrySnapshot};
pub use rest::{Endpoint, RestExchange, Venue};
pub use status::{OrderFlags, RawStatus, StatusMapping, StatusTable};
pub use traits::Exchange;
pub use types::*;

#[cfg(feature = "bgogo")]
pub use venues::bgogo::Bgogo;
#[cfg(feature = "binance")]
pub use venues::binance::Binance;
#[cfg(feature = "bitpie")]
pub use venues::bitpie::Bitpie;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::auth::{Credentials, Signer, SigningScheme};
    pub use crate::config::ExchangeConfig;
    pub use crate::errors::{ErrorKind, ExchangeError, Result};
    pub use crate::http::{MonoioHttpsClient, ReplayTransport, Transport};
    pub use crate::registry::Registry;
    pub use crate::rest::{RestExchange, Venue};
    pub use crate::traits::Exchange;
    pub use crate::types::*;
    #[cfg(feature = "bgogo")]
    pub use crate::venues::bgogo::Bgogo;
    #[cfg(feature = "binance")]
    pub use crate::venues::binance::Binance;
    #[cfg(feature = "bitpie")]
    pub use crate::venues::bitpie::Bitpie;
    pub use tradegate_core::prelude::*;
}
