//! Runtime startup: memory configuration, descriptor bootstrap, tracing.

use std::sync::Once;

use mu_mem::{MemConfig, MemStats};

use crate::error::{preload_descriptors, Error};

static TRACING_INIT: Once = Once::new();

/// Initialize the tracing subscriber for runtime diagnostics.
///
/// Only installs a subscriber when `RUST_LOG` is set, so embedding hosts
/// that configure their own subscriber are left alone. Safe to call more
/// than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            use tracing_subscriber::prelude::*;
            use tracing_subscriber::{fmt, EnvFilter};

            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .try_init();
        }
    });
}

/// A started runtime on the current thread.
///
/// Starting applies the memory configuration and builds the error
/// descriptors, so that reporting an error later never needs to allocate.
#[derive(Debug)]
pub struct Runtime {
    config: MemConfig,
}

impl Runtime {
    pub fn new(config: MemConfig) -> Result<Self, Error> {
        mu_mem::configure(config);
        preload_descriptors()?;
        tracing::debug!(limit = ?config.limit, "runtime started");
        Ok(Runtime { config })
    }

    /// Start from the environment: `RUST_LOG` for tracing and
    /// [`mu_mem::LIMIT_ENV`] for the memory limit.
    pub fn from_env() -> Result<Self, Error> {
        init_tracing();
        Runtime::new(MemConfig::from_env())
    }

    #[inline]
    pub fn config(&self) -> MemConfig {
        self.config
    }

    /// Allocator counters for this thread.
    #[inline]
    pub fn stats(&self) -> MemStats {
        mu_mem::stats()
    }
}

#[cfg(test)]
mod tests;
