use std::env;
use std::path::PathBuf;
use std::sync::Arc;

/// Sink for real-time loudness updates.
///
/// Invoked synchronously on the capture-loop thread with values in the
/// `0.0..=100.0` range (see `processing::volume`). Implementations must
/// not block or do UI work; they run inside a single buffer-read period.
pub type VolumeCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Container format of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Backend-native compressed container (encoding delegated to the
    /// capture backend).
    Mpeg4,
    /// Raw PCM in a canonical RIFF/WAVE container, written by this crate.
    Wav,
}

impl OutputFormat {
    /// File extension, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mpeg4 => ".mp4",
            Self::Wav => ".wav",
        }
    }
}

/// Audio encoder selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoder {
    /// Backend-native AAC encoding (compressed path only).
    Aac,
    /// Signed 16-bit little-endian PCM.
    Pcm16Bit,
}

/// Base directory for the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLocation {
    /// The platform temporary directory.
    Cache,
    /// The user's home directory.
    Internal,
    /// A caller-supplied directory, taken as-is. An invalid path is not
    /// rejected here; it fails at file-open time inside the session.
    Custom(PathBuf),
}

/// Configuration for an audio recording session.
///
/// `volume_callback` is only honored for `OutputFormat::Wav` with
/// `AudioEncoder::Pcm16Bit`. Combining it with a compressed format is
/// accepted but the callback is never invoked, because compressed
/// encoding gives no access to the raw samples.
#[derive(Clone)]
pub struct RecordConfig {
    pub output_location: OutputLocation,
    pub output_format: OutputFormat,
    pub audio_encoder: AudioEncoder,
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    pub volume_callback: Option<VolumeCallback>,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            output_location: OutputLocation::Cache,
            output_format: OutputFormat::Mpeg4,
            audio_encoder: AudioEncoder::Aac,
            sample_rate: 44100,
            volume_callback: None,
        }
    }
}

impl RecordConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        Ok(())
    }

    /// Resolve the concrete output file path for a session starting now.
    ///
    /// `<base-dir>/<millis><extension>`, where the wall-clock timestamp
    /// gives practical uniqueness across sessions. Pure with respect to
    /// the filesystem: nothing is created or checked here.
    pub fn resolve_output_path(&self) -> PathBuf {
        let file_name = format!(
            "{}{}",
            chrono::Utc::now().timestamp_millis(),
            self.output_format.extension()
        );
        self.base_dir().join(file_name)
    }

    fn base_dir(&self) -> PathBuf {
        match &self.output_location {
            OutputLocation::Cache => env::temp_dir(),
            OutputLocation::Internal => dirs::home_dir().unwrap_or_else(env::temp_dir),
            OutputLocation::Custom(path) => path.clone(),
        }
    }
}
