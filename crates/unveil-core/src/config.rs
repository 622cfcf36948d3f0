use serde::Deserialize;
use std::path::Path;

use crate::events::KeyType;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub vault: VaultConfig,
}

/// Reveal gate settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RevealConfig {
    /// How long the reveal button must be held, in milliseconds.
    #[serde(default = "default_hold_duration_ms")]
    pub hold_duration_ms: u64,
    #[serde(default)]
    pub key_type: KeyType,
}

fn default_hold_duration_ms() -> u64 {
    2000
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            hold_duration_ms: default_hold_duration_ms(),
            key_type: KeyType::default(),
        }
    }
}

impl RevealConfig {
    pub fn hold_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.hold_duration_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// When disabled, events only go to the tracing log.
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,
    #[serde(default = "default_telemetry_dir")]
    pub dir: String,
    /// Log size that triggers rotation at open time.
    #[serde(default = "default_max_log_bytes")]
    pub max_log_bytes: u64,
    /// Rotated files to keep.
    #[serde(default = "default_max_rotated")]
    pub max_rotated: usize,
}

fn default_telemetry_enabled() -> bool {
    true
}
fn default_telemetry_dir() -> String {
    "data/telemetry".into()
}
fn default_max_log_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_max_rotated() -> usize {
    3
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            dir: default_telemetry_dir(),
            max_log_bytes: default_max_log_bytes(),
            max_rotated: default_max_rotated(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    #[serde(default = "default_vault_path")]
    pub path: String,
    /// Argon2id memory cost for new vaults, in KiB.
    #[serde(default = "default_kdf_memory_kib")]
    pub kdf_memory_kib: u32,
    /// Argon2id passes for new vaults.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

fn default_vault_path() -> String {
    "data/seed.vault".into()
}

fn default_kdf_memory_kib() -> u32 {
    19 * 1024
}

fn default_kdf_iterations() -> u32 {
    2
}

fn default_kdf_parallelism() -> u32 {
    1
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: default_vault_path(),
            kdf_memory_kib: default_kdf_memory_kib(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback chain: explicit path → ./config/default.toml → hardcoded defaults.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Self {
        if let Some(path) = explicit_path {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {e}", path.display());
                }
            }
        }

        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            match Self::load(default_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load default config: {e}");
                }
            }
        }

        tracing::info!("Using hardcoded default configuration");
        Self::default()
    }
}
