use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::audit::{TelemetryError, TelemetrySink};
use crate::config::TelemetryConfig;
use crate::events::TelemetryEvent;

const LOG_FILENAME: &str = "disclosure_events.jsonl";

/// One persisted telemetry line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEntry {
    pub ts: String,
    pub category: String,
    pub event: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Append-only JSONL telemetry log.
///
/// Rotated on open once the file grows past `max_log_bytes`.
pub struct JsonlTelemetry {
    writer: Mutex<BufWriter<fs::File>>,
    path: PathBuf,
}

impl JsonlTelemetry {
    /// Open or create the log under `config.dir`.
    pub fn open(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let dir = Path::new(&config.dir);
        fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILENAME);

        if let Ok(meta) = fs::metadata(&path) {
            if meta.len() > config.max_log_bytes {
                Self::rotate(&path, config.max_rotated);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!("Telemetry log: {}", path.display());
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    /// Rotate: .jsonl -> .1.jsonl -> ... -> .N.jsonl (oldest deleted).
    fn rotate(path: &Path, max_rotated: usize) {
        let stem = path.with_extension("");
        if max_rotated == 0 {
            let _ = fs::remove_file(path);
            return;
        }
        let oldest = format!("{}.{max_rotated}.jsonl", stem.display());
        let _ = fs::remove_file(&oldest);
        for i in (1..max_rotated).rev() {
            let from = format!("{}.{i}.jsonl", stem.display());
            let to = format!("{}.{}.jsonl", stem.display(), i + 1);
            let _ = fs::rename(&from, &to);
        }
        let first = format!("{}.1.jsonl", stem.display());
        let _ = fs::rename(path, &first);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last `max_entries` entries of the log in `dir`.
    /// Unreadable files and malformed lines are skipped.
    pub fn load_recent(dir: &Path, max_entries: usize) -> Vec<TelemetryEntry> {
        let path = dir.join(LOG_FILENAME);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        let mut entries: Vec<TelemetryEntry> = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();

        if entries.len() > max_entries {
            entries.drain(..entries.len() - max_entries);
        }
        entries
    }
}

impl TelemetrySink for JsonlTelemetry {
    fn track(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        let entry = TelemetryEntry {
            ts: Utc::now().to_rfc3339(),
            category: event.category.clone(),
            event: event.event.clone(),
            properties: event.properties.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        // Flush after each entry for durability
        writer.flush()?;
        Ok(())
    }
}

/// Sink that only writes to the tracing log.
#[derive(Debug, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn track(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        let properties = Value::Object(event.properties.clone());
        tracing::info!(
            category = %event.category,
            properties = %properties,
            "{}",
            event.event
        );
        Ok(())
    }
}
