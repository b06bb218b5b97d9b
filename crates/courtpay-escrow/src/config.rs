//! # Orchestrator Configuration
//!
//! Configuration for the escrow workflow orchestrator, validated once
//! at startup.

use crate::domain::{EscrowError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Escrow policy limits.
    pub escrow: EscrowPolicyConfig,
    /// Signing gateway client settings.
    pub signing: SigningConfig,
}

impl OrchestratorConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.escrow.max_amount_major == 0 {
            return Err(EscrowError::Config(
                "escrow.max_amount_major cannot be 0".to_string(),
            ));
        }
        if self.signing.base_url.trim().is_empty() {
            return Err(EscrowError::Config(
                "signing.base_url cannot be empty".to_string(),
            ));
        }
        if self.signing.poll_interval_secs == 0 {
            return Err(EscrowError::Config(
                "signing.poll_interval_secs cannot be 0".to_string(),
            ));
        }
        if self.signing.resolution_timeout_secs < self.signing.poll_interval_secs {
            return Err(EscrowError::Config(
                "signing.resolution_timeout_secs must be at least one poll interval".to_string(),
            ));
        }
        if self.signing.request_timeout_secs == 0 {
            return Err(EscrowError::Config(
                "signing.request_timeout_secs cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Escrow policy limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscrowPolicyConfig {
    /// Largest escrow amount accepted, in whole currency units.
    pub max_amount_major: u64,
    /// How long after creation the escrow stays claimable before the
    /// owner may reclaim it.
    pub release_window_hours: u32,
}

impl Default for EscrowPolicyConfig {
    fn default() -> Self {
        Self {
            max_amount_major: 100_000,
            release_window_hours: 24,
        }
    }
}

/// Signing gateway client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Gateway base URL.
    pub base_url: String,
    /// Bearer token for the gateway, if it requires one.
    pub api_key: Option<String>,
    /// Per-request HTTP timeout (seconds).
    pub request_timeout_secs: u64,
    /// TCP connect timeout (seconds).
    pub connect_timeout_secs: u64,
    /// Total time to wait for a signature before giving up (seconds).
    pub resolution_timeout_secs: u64,
    /// Gap between result polls (seconds).
    pub poll_interval_secs: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sign.courtpay.test/api/v1".to_string(),
            api_key: None,
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            resolution_timeout_secs: 300,
            poll_interval_secs: 2,
        }
    }
}

impl SigningConfig {
    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// TCP connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Total signature wait deadline.
    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_secs(self.resolution_timeout_secs)
    }

    /// Gap between result polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
