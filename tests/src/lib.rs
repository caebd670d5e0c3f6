//! Workspace-level tests for TradeGate
//!
//! Cross-venue properties and scenarios that exercise the public API only.
//! Nothing here touches the network: adapters run over `ReplayTransport`.

#[cfg(test)]
mod adapter_tests;
#[cfg(test)]
mod normalization_tests;
#[cfg(test)]
mod signing_tests;

/// Route test logs through the libtest capture. `RUST_LOG` overrides the
/// default `debug` filter.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .try_init();
}
