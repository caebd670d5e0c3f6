//! Unified logging
//!
//! `tracing` is the logging facade for every crate in the workspace.
//! `init_logging` installs the fmt subscriber (filtered by `RUST_LOG`,
//! default `info`), or ftlog when the `ftlog` feature is enabled.

use std::sync::Once;
#[cfg(not(feature = "ftlog"))]
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging() {
    INIT.call_once(|| {
        #[cfg(feature = "ftlog")]
        {
            init_ftlog();
        }

        #[cfg(not(feature = "ftlog"))]
        {
            init_tracing();
        }
    });
}

#[cfg(feature = "ftlog")]
fn init_ftlog() {
    let built = ftlog::builder()
        .max_log_level(ftlog::LevelFilter::Debug)
        .bounded(100_000, false)
        .utc()
        .try_init();

    match built {
        // The guard flushes on drop; the logger lives for the whole process
        Ok(guard) => std::mem::forget(guard),
        Err(e) => {
            eprintln!("ftlog init failed: {e}");
            return;
        }
    }
    tracing::info!("📝 Initialized ftlog logging");
}

#[cfg(not(feature = "ftlog"))]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    // Another subscriber (e.g. a test harness) may already be installed
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::info!("📝 Initialized tracing logging");
    }
}

/// Logs how long an exchange call took, escalating slow calls to info
#[macro_export]
macro_rules! log_latency {
    ($operation:expr, $duration_micros:expr) => {
        if $duration_micros < 1000 {
            tracing::debug!("⚡ {} completed in {}μs", $operation, $duration_micros);
        } else {
            tracing::info!("⚡ {} completed in {:.3}ms", $operation, $duration_micros as f64 / 1000.0);
        }
    };
}

/// `📋 ORDER <action>: <order id> (<exchange> <pair>)`
#[macro_export]
macro_rules! log_order {
    ($action:expr, $exchange:expr, $order_id:expr, $pair:expr) => {
        tracing::info!("📋 ORDER {}: {} ({} {})", $action, $order_id, $exchange, $pair);
    };
}

/// `❌ <exchange> <operation> failed: <error>`
#[macro_export]
macro_rules! log_error {
    ($exchange:expr, $operation:expr, $error:expr) => {
        tracing::error!("❌ {} {} failed: {}", $exchange, $operation, $error);
    };
}
