//! Configuration schema.

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub relay: RelaySettings,
    pub agent: AgentSettings,
    pub panel: PanelSettings,
    pub store: StoreSettings,
}

/// External verification service endpoint. The one user-facing knob of the
/// options surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base: DEFAULT_API_BASE.to_string() }
    }
}

/// Delivery retry/backoff and gating knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelaySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub ack_timeout_ms: u64,
    pub debounce_ms: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 5000,
            ack_timeout_ms: 1000,
            debounce_ms: 50,
        }
    }
}

/// Page agent monitoring cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentSettings {
    /// Initial capability-probe interval.
    pub monitor_start_ms: u64,
    /// Probe interval ceiling; each healthy tick stretches toward it.
    pub monitor_max_ms: u64,
    /// Round-trip ping cadence.
    pub ping_interval_ms: u64,
    /// Fallback selection poll cadence.
    pub poll_interval_ms: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            monitor_start_ms: 1000,
            monitor_max_ms: 5000,
            ping_interval_ms: 10_000,
            poll_interval_ms: 3000,
        }
    }
}

/// Panel orchestration knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PanelSettings {
    /// Pause between a new selection and its automatic verification.
    pub auto_verify_delay_ms: u64,
    /// Fallback poll of the page agent for the current selection.
    pub poll_interval_ms: u64,
    /// Stagger between tabs opened by the coordinator.
    pub source_stagger_ms: u64,
    /// Stagger for the panel's direct fallback opener.
    pub fallback_stagger_ms: u64,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            auto_verify_delay_ms: 1000,
            poll_interval_ms: 2000,
            source_stagger_ms: 300,
            fallback_stagger_ms: 200,
        }
    }
}

/// Saved report log location and bound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreSettings {
    pub max_reports: usize,
    /// Report log path; empty means the platform-local default.
    pub path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { max_reports: 50, path: String::new() }
    }
}
