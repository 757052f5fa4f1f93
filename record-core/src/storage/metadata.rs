use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::config::RecordConfig;
use crate::models::error::RecordError;

/// Metadata describing a finished recording.
///
/// Written as a JSON sidecar (`<recording>.metadata.json`) next to the
/// output file on every successful stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub file_path: String,
    /// File extension without the leading dot, e.g. `wav` or `mp4`.
    pub format: String,
    pub sample_rate: u32,
    pub duration_secs: f64,
    /// Raw PCM payload size in bytes. Zero for compressed recordings,
    /// where the container is opaque to this crate.
    pub data_bytes: u64,
    pub created_at: String,
}

impl RecordingMetadata {
    pub fn new(config: &RecordConfig, path: &Path, duration_secs: f64, data_bytes: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: path.to_string_lossy().into_owned(),
            format: config
                .output_format
                .extension()
                .trim_start_matches('.')
                .to_string(),
            sample_rate: config.sample_rate,
            duration_secs,
            data_bytes,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Write `metadata` as a JSON sidecar next to `recording_path`.
pub fn write_sidecar(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), RecordError> {
    let sidecar = recording_path.with_extension("metadata.json");
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| RecordError::RecordFail(format!("failed to serialize metadata: {e}")))?;
    fs::write(&sidecar, json)
        .map_err(|e| RecordError::RecordFail(format!("failed to write metadata: {e}")))?;
    Ok(())
}

/// Read the JSON sidecar for `recording_path`.
pub fn read_sidecar(recording_path: &Path) -> Result<RecordingMetadata, RecordError> {
    let sidecar = recording_path.with_extension("metadata.json");
    let json = fs::read_to_string(&sidecar)
        .map_err(|e| RecordError::RecordFail(format!("failed to read metadata: {e}")))?;
    serde_json::from_str(&json)
        .map_err(|e| RecordError::RecordFail(format!("failed to parse metadata: {e}")))
}
