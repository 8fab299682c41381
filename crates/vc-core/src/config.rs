//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML and carries the
//! backend API, content-type probe, playback environment and adaptive-engine
//! settings. Every section defaults sensibly so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub probe: ProbeConfig,
    pub playback: PlaybackConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Serialize back to TOML, e.g. to print the effective configuration.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            warnings.push(format!(
                "api.base_url '{}' is not an http(s) URL",
                self.api.base_url
            ));
        }

        if self.api.timeout_secs == 0 {
            warnings.push("api.timeout_secs is 0; requests will fail immediately".into());
        }

        if self.probe.enabled && self.probe.timeout_secs == 0 {
            warnings.push("probe is enabled but probe.timeout_secs is 0".into());
        }

        let engine_usable = self.playback.engine_available && self.playback.engine_supported;
        if !engine_usable && !self.playback.native_adaptive {
            warnings.push(
                "no usable adaptive engine and no native adaptive support; HLS/DASH will only \
                 get a single native attempt"
                    .into(),
            );
        }

        if self.engine.max_max_buffer_length_secs < self.engine.max_buffer_length_secs {
            warnings.push(format!(
                "engine.max_max_buffer_length_secs ({}) is below engine.max_buffer_length_secs ({})",
                self.engine.max_max_buffer_length_secs, self.engine.max_buffer_length_secs
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Backend REST API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            timeout_secs: 10,
        }
    }
}

/// Header-only content-type probe settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Probe `.mp4` locators for a transport-stream content type.
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 5,
        }
    }
}

/// Capabilities of the playback environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// An adaptive-streaming engine implementation is loaded.
    pub engine_available: bool,
    /// The loaded engine reports support for this environment.
    pub engine_supported: bool,
    /// The native media element can play HLS manifests itself.
    pub native_adaptive: bool,
    /// Populate webm/ogg alternate sources for plain containers.
    pub speculative_alternates: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            engine_available: true,
            engine_supported: true,
            native_adaptive: false,
            speculative_alternates: true,
        }
    }
}

/// Adaptive-engine tuning passed to the host when an engine is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_buffer_length_secs: u32,
    pub max_max_buffer_length_secs: u32,
    pub back_buffer_length_secs: u32,
    pub enable_worker: bool,
    pub low_latency_mode: bool,
    pub enable_software_aes: bool,
    /// `-1` lets the engine pick the start level.
    pub start_level: i32,
    pub abr_default_estimate_bps: u64,
    pub manifest_loading_timeout_ms: u64,
    pub manifest_loading_max_retry: u32,
    pub manifest_loading_retry_delay_ms: u64,
    pub level_loading_timeout_ms: u64,
    pub level_loading_max_retry: u32,
    pub level_loading_retry_delay_ms: u64,
    pub frag_loading_timeout_ms: u64,
    pub frag_loading_max_retry: u32,
    pub frag_loading_retry_delay_ms: u64,
    pub start_frag_prefetch: bool,
    pub test_bandwidth: bool,
    pub progressive: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_buffer_length_secs: 30,
            max_max_buffer_length_secs: 60,
            back_buffer_length_secs: 90,
            enable_worker: true,
            low_latency_mode: false,
            enable_software_aes: true,
            start_level: -1,
            abr_default_estimate_bps: 500_000,
            manifest_loading_timeout_ms: 10_000,
            manifest_loading_max_retry: 3,
            manifest_loading_retry_delay_ms: 1_000,
            level_loading_timeout_ms: 10_000,
            level_loading_max_retry: 3,
            level_loading_retry_delay_ms: 1_000,
            frag_loading_timeout_ms: 20_000,
            frag_loading_max_retry: 3,
            frag_loading_retry_delay_ms: 1_000,
            start_frag_prefetch: true,
            test_bandwidth: true,
            progressive: true,
        }
    }
}
