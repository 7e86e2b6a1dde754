//! Memory configuration.
//!
//! The only knob is a live-byte limit for the current thread. It exists so
//! embedders can bound a script's heap and so tests can drive the runtime
//! into out-of-memory conditions deterministically.

use std::cell::Cell;

/// Environment variable read by [`MemConfig::from_env`].
pub const LIMIT_ENV: &str = "MU_MEM_LIMIT";

/// Memory settings applied with [`configure`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemConfig {
    /// Maximum number of live bytes, or `None` for no limit beyond the host.
    pub limit: Option<usize>,
}

impl MemConfig {
    /// Configuration with a live-byte limit.
    #[inline]
    pub fn with_limit(limit: usize) -> Self {
        MemConfig { limit: Some(limit) }
    }

    /// Read the configuration from the environment.
    ///
    /// `MU_MEM_LIMIT` holds a decimal byte count. A missing or malformed
    /// value means no limit; a malformed one is reported as a warning.
    pub fn from_env() -> Self {
        let Ok(raw) = std::env::var(LIMIT_ENV) else {
            return MemConfig::default();
        };

        match raw.trim().parse::<usize>() {
            Ok(limit) => MemConfig::with_limit(limit),
            Err(err) => {
                tracing::warn!(value = %raw, %err, "ignoring malformed {LIMIT_ENV}");
                MemConfig::default()
            }
        }
    }
}

thread_local! {
    static LIMIT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Install `config` for the current thread.
///
/// Blocks already allocated are unaffected; a limit below the current live
/// byte count only refuses further growth.
pub fn configure(config: MemConfig) {
    tracing::debug!(limit = ?config.limit, "memory configured");
    LIMIT.with(|limit| limit.set(config.limit));
}

/// The configuration currently in effect for this thread.
pub fn current_config() -> MemConfig {
    MemConfig { limit: limit() }
}

#[inline]
pub(crate) fn limit() -> Option<usize> {
    LIMIT.with(Cell::get)
}

#[cfg(test)]
mod tests;
