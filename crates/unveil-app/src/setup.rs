use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use unveil_core::config::AppConfig;
use unveil_core::telemetry::{JsonlTelemetry, TracingTelemetry};
use unveil_core::{AuthVerifier, DisclosureAuditor, RevealGate, TelemetrySink};
use unveil_crypto::SeedVault;

use crate::clipboard::Osc52Clipboard;

/// Env var consulted before prompting for the vault password.
pub const PASSWORD_ENV: &str = "UNVEIL_PASSWORD";

pub fn load_vault(config: &AppConfig) -> Result<SeedVault> {
    let path = Path::new(&config.vault.path);
    SeedVault::load(path)
        .with_context(|| format!("No usable vault at {} (run `unveil init`)", path.display()))
}

pub fn telemetry_sink(config: &AppConfig) -> Arc<dyn TelemetrySink> {
    if !config.telemetry.enabled {
        tracing::info!("Telemetry log disabled in config");
        return Arc::new(TracingTelemetry);
    }
    match JsonlTelemetry::open(&config.telemetry) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            tracing::warn!("Telemetry log unavailable, falling back to tracing: {e}");
            Arc::new(TracingTelemetry)
        }
    }
}

pub fn build_gate(config: &AppConfig, verifier: Arc<dyn AuthVerifier>) -> RevealGate {
    let auditor = DisclosureAuditor::new(telemetry_sink(config), config.reveal.key_type);
    RevealGate::new(&config.reveal, verifier, Arc::new(Osc52Clipboard), auditor)
}

/// Password from the environment, or an interactive hidden prompt.
pub fn read_password(prompt: &str) -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    Ok(rpassword::prompt_password(prompt)?)
}

pub fn password_from_env() -> bool {
    std::env::var_os(PASSWORD_ENV).is_some()
}
