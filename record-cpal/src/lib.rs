//! # record-cpal
//!
//! Desktop microphone backend for `record-core`, built on cpal.
//!
//! Provides:
//! - `CpalBackend` — `CaptureBackend` implementation for the default
//!   host's input device (raw-PCM path; no system encoder on desktop)
//! - `CpalMicCapture` — blocking `PcmCapture` line bridging cpal's
//!   push-style callbacks through a byte ring
//! - `DesktopPermissions` — permission provider for hosts without a
//!   per-process consent model
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use record_core::{OutputFormat, AudioEncoder, RecordConfig, Recorder};
//! use record_cpal::{CpalBackend, DesktopPermissions};
//!
//! let mut recorder = Recorder::new(CpalBackend::new(), Arc::new(DesktopPermissions::new()));
//! recorder.set_config(RecordConfig {
//!     output_format: OutputFormat::Wav,
//!     audio_encoder: AudioEncoder::Pcm16Bit,
//!     ..Default::default()
//! });
//! recorder.start_recording()?;
//! let path = recorder.stop_recording()?;
//! ```

pub mod backend;
pub mod mic;
pub mod permissions;

pub use backend::CpalBackend;
pub use mic::CpalMicCapture;
pub use permissions::DesktopPermissions;
