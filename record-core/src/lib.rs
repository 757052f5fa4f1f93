//! # record-core
//!
//! Platform-agnostic audio recording engine.
//!
//! Given a declarative [`RecordConfig`], a [`Recorder`] starts and stops
//! microphone capture, writes the result to a container file (raw PCM in
//! a WAV container, or a backend-native compressed format), and can
//! report real-time loudness to the caller while capturing.
//!
//! Platform audio APIs live behind the [`CaptureBackend`] trait; a
//! backend crate (e.g. `record-cpal`) is injected at construction and
//! the core never touches a device directly.
//!
//! ## Architecture
//!
//! ```text
//! record-core (this crate)
//! ├── traits/       ← CaptureBackend, PcmCapture, EncodedRecorder, PermissionProvider
//! ├── models/       ← RecordConfig, RecordError, RecordingState
//! ├── processing/   ← WAV header encoding, volume metering, byte ring buffer
//! ├── session/      ← Recorder (state machine + raw-PCM capture loop)
//! └── storage/      ← WAV file writer, metadata sidecars
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{AudioEncoder, OutputFormat, OutputLocation, RecordConfig, VolumeCallback};
pub use models::error::RecordError;
pub use models::state::RecordingState;
pub use processing::ring_buffer::ByteRing;
pub use processing::volume::compute_volume;
pub use processing::wav_format::{pcm_wav_header, WAV_HEADER_SIZE};
pub use session::recorder::Recorder;
pub use storage::metadata::RecordingMetadata;
pub use storage::wav_writer::WavFileWriter;
pub use traits::backend::{BackendErrorCallback, CaptureBackend, EncodedRecorder, PcmCapture};
pub use traits::permission::PermissionProvider;
