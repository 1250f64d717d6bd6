//! Glucose manager configuration.

use crate::error::{GlpmError, GlpmResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default bound on one request/response round trip.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 5_000;

/// Default number of entries each registry reserves up front.
pub const DEFAULT_INITIAL_REGISTRY_CAPACITY: usize = 8;

/// Configuration for the glucose manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlpmConfig {
    /// Timeout for every server round trip, in milliseconds
    pub response_timeout_ms: u64,

    /// Entries reserved in each registry when the module initializes
    pub initial_registry_capacity: usize,
}

impl Default for GlpmConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            initial_registry_capacity: DEFAULT_INITIAL_REGISTRY_CAPACITY,
        }
    }
}

impl GlpmConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GLPM_RESPONSE_TIMEOUT_MS`: Round-trip timeout (default: 5000)
    /// - `GLPM_INITIAL_REGISTRY_CAPACITY`: Reserved registry entries (default: 8)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self {
            response_timeout_ms: env::var("GLPM_RESPONSE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RESPONSE_TIMEOUT_MS),

            initial_registry_capacity: env::var("GLPM_INITIAL_REGISTRY_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_INITIAL_REGISTRY_CAPACITY),
        }
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_initial_registry_capacity(mut self, capacity: usize) -> Self {
        self.initial_registry_capacity = capacity;
        self
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn validate(&self) -> GlpmResult<()> {
        if self.response_timeout_ms == 0 {
            return Err(GlpmError::invalid("response timeout must be nonzero"));
        }
        Ok(())
    }
}
