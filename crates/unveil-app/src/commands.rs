use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use unveil_core::config::AppConfig;
use unveil_core::telemetry::JsonlTelemetry;
use unveil_core::{HoldOutcome, RevealError, RevealGate, ViewMode};
use unveil_crypto::{KdfParams, PasswordPolicy, SeedVault};
use zeroize::Zeroizing;

use crate::setup::{build_gate, load_vault, password_from_env, read_password};

pub fn init(config: &AppConfig, phrase_file: Option<PathBuf>, force: bool) -> Result<()> {
    let path = Path::new(&config.vault.path);
    if path.exists() && !force {
        bail!("Vault already exists at {} (use --force to replace it)", path.display());
    }

    let phrase = match phrase_file {
        Some(file) => Zeroizing::new(
            std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?,
        ),
        None => Zeroizing::new(rpassword::prompt_password("Recovery phrase: ")?),
    };
    let phrase = Zeroizing::new(normalize_phrase(&phrase));

    let password = Zeroizing::new(read_password("New vault password: ")?);
    if !password_from_env() {
        let confirm = Zeroizing::new(rpassword::prompt_password("Confirm password: ")?);
        if *confirm != *password {
            bail!("Passwords do not match");
        }
    }

    let vault = SeedVault::create(
        &password,
        phrase.as_bytes(),
        config.reveal.key_type,
        &PasswordPolicy::default_policy(),
        KdfParams {
            memory_kib: config.vault.kdf_memory_kib,
            iterations: config.vault.kdf_iterations,
            parallelism: config.vault.kdf_parallelism,
        },
    )?;
    vault.save(path)?;
    tracing::info!("Vault written to {}", path.display());
    println!("Vault created at {}", path.display());
    Ok(())
}

pub async fn check(config: &AppConfig) -> Result<()> {
    let gate = build_gate(config, Arc::new(load_vault(config)?));
    let password = prompt_password("Vault password: ").await?;
    let result = gate.submit_password(&password).await;
    gate.cancel();
    match result {
        Ok(()) => {
            println!("Password accepted");
            Ok(())
        }
        Err(e) => bail!("{e}"),
    }
}

pub async fn reveal(config: &AppConfig) -> Result<()> {
    let gate = Arc::new(build_gate(config, Arc::new(load_vault(config)?)));
    if !unlock(&gate).await? {
        return Ok(());
    }
    tokio::task::spawn_blocking(move || interact(&gate)).await?
}

/// Hold gesture and the revealed-phrase command loop. Blocks on stdin.
fn interact(gate: &RevealGate) -> Result<()> {
    let mut lines = io::stdin().lock().lines();

    if !hold_to_reveal(gate, &mut lines)? {
        return Ok(());
    }

    print_text(gate);
    println!("Commands: text, qr, copy, close, cancel");
    loop {
        prompt("> ")?;
        let Some(line) = lines.next().transpose()? else {
            gate.cancel();
            return Ok(());
        };
        match line.trim() {
            "text" => {
                gate.set_view_mode(ViewMode::Text);
                print_text(gate);
            }
            "qr" => {
                gate.set_view_mode(ViewMode::Qr);
                println!("QR view is not rendered in the terminal.");
            }
            "copy" => match gate.copy_to_clipboard() {
                Ok(()) => println!("\nCopied to clipboard"),
                Err(e) => eprintln!("Copy failed: {e}"),
            },
            "close" | "done" => {
                gate.close();
                println!("Closed");
                return Ok(());
            }
            "cancel" => {
                gate.cancel();
                println!("Cancelled");
                return Ok(());
            }
            "" => {}
            other => eprintln!("Unknown command: {other}"),
        }
    }
}

pub fn events(config: &AppConfig, limit: usize) -> Result<()> {
    let entries = JsonlTelemetry::load_recent(Path::new(&config.telemetry.dir), limit);
    for entry in &entries {
        println!(
            "{}\t{}\t{}",
            entry.ts,
            entry.event,
            serde_json::Value::Object(entry.properties.clone())
        );
    }
    println!("({} events)", entries.len());
    Ok(())
}

/// Prompt until the gate is armed. Returns `false` if the user gave up.
async fn unlock(gate: &RevealGate) -> Result<bool> {
    loop {
        let password = prompt_password("Vault password (empty to cancel): ").await?;
        if password.is_empty() {
            gate.cancel();
            println!("Cancelled");
            return Ok(false);
        }
        match gate.submit_password(&password).await {
            Ok(()) => return Ok(true),
            Err(RevealError::Auth(e)) => {
                eprintln!("{e}");
                if password_from_env() {
                    gate.cancel();
                    bail!("{e}");
                }
                gate.clear_failure();
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Enter starts the press, the next Enter releases it.
/// Returns `false` if input ended before the hold completed.
fn hold_to_reveal(
    gate: &RevealGate,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<bool> {
    let secs = gate.hold_duration().as_secs_f32();
    println!("Keep your recovery phrase safe. Anyone with it controls your funds.");
    loop {
        prompt(&format!("Press Enter to start holding ({secs:.1}s)... "))?;
        if lines.next().transpose()?.is_none() {
            gate.cancel();
            return Ok(false);
        }
        gate.on_press_start();

        prompt("Holding. Press Enter to release... ")?;
        if lines.next().transpose()?.is_none() {
            gate.interrupt();
            gate.cancel();
            return Ok(false);
        }
        match gate.release() {
            Some(HoldOutcome::Completed) => return Ok(true),
            Some(HoldOutcome::TooShort { elapsed }) => {
                println!("Released after {:.1}s, keep holding longer.", elapsed.as_secs_f32());
            }
            None => bail!("Reveal gate is not armed"),
        }
    }
}

fn print_text(gate: &RevealGate) {
    let Some(text) = gate.secret_text() else {
        return;
    };
    for (i, word) in text.split_whitespace().enumerate() {
        println!("{:>2}. {word}", i + 1);
    }
}

/// Password prompt run off the async workers; the terminal read blocks.
async fn prompt_password(text: &'static str) -> Result<Zeroizing<String>> {
    let password = tokio::task::spawn_blocking(move || read_password(text)).await??;
    Ok(Zeroizing::new(password))
}

fn prompt(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{text}")?;
    stdout.flush()?;
    Ok(())
}

/// Collapse whitespace so the stored phrase is single-spaced.
fn normalize_phrase(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
