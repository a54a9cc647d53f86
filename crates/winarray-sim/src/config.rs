//! Simulator configuration
//!
//! Loaded from TOML; every field has a default so partial files work.

use crate::error::SimError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of simulated user actions
    pub steps: u64,
    /// Items in the virtual remote collection
    pub collection_size: u64,
    /// Visible rows
    pub window_len: usize,
    /// Prefetch margin on each side of the window
    pub index_margin: usize,
    /// Delay of every fetch response
    pub latency_ms: u64,
    /// Probability that a step's fetches start with an injected failure
    pub failure_rate: f64,
    /// Stop conditions
    pub stop_on_first_violation: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 200,
            collection_size: 1000,
            window_len: 10,
            index_margin: 0,
            latency_ms: 0,
            failure_rate: 0.05,
            stop_on_first_violation: false,
        }
    }
}

impl SimulatorConfig {
    /// Parse from TOML text
    ///
    /// # Errors
    /// - `SimError::Parse` on malformed TOML
    /// - `SimError::InvalidConfig` if a value is out of range
    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// - `SimError::Io` if the file can't be read
    /// - see [`from_toml_str`](Self::from_toml_str)
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// - `SimError::Serialize` if rendering fails
    pub fn to_toml(&self) -> Result<String, SimError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// - `SimError::InvalidConfig` naming the offending field
    pub fn validate(&self) -> Result<(), SimError> {
        if self.window_len == 0 {
            return Err(SimError::InvalidConfig("window_len must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(SimError::InvalidConfig(format!(
                "failure_rate must be within 0..=1, got {}",
                self.failure_rate
            )));
        }
        Ok(())
    }

    /// With seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// With step count
    #[inline]
    #[must_use]
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    /// With collection size
    #[inline]
    #[must_use]
    pub fn with_collection_size(mut self, collection_size: u64) -> Self {
        self.collection_size = collection_size;
        self
    }

    /// With window length and margin
    #[inline]
    #[must_use]
    pub fn with_window(mut self, window_len: usize, index_margin: usize) -> Self {
        self.window_len = window_len;
        self.index_margin = index_margin;
        self
    }

    /// With response latency
    #[inline]
    #[must_use]
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// With failure probability
    #[inline]
    #[must_use]
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate;
        self
    }

    /// Stop at the first violation
    #[inline]
    #[must_use]
    pub fn stop_on_first_violation(mut self, stop: bool) -> Self {
        self.stop_on_first_violation = stop;
        self
    }
}
