use std::path::Path;

use record_core::{CaptureBackend, EncodedRecorder, PcmCapture, RecordConfig, RecordError};

use crate::mic::CpalMicCapture;

/// Desktop capture backend for the default cpal host.
///
/// Covers the raw-PCM path only: desktop hosts ship no system encoder,
/// so the compressed path reports `RecordFail` and callers should use
/// `OutputFormat::Wav` here.
#[derive(Debug, Default)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for CpalBackend {
    fn min_buffer_size(&self, sample_rate: u32) -> usize {
        // 100 ms of mono 16-bit audio, floored so tiny rates still get a
        // workable buffer.
        ((sample_rate as usize / 10) * 2).max(4096)
    }

    fn open_pcm(&self, sample_rate: u32) -> Result<Box<dyn PcmCapture>, RecordError> {
        Ok(Box::new(CpalMicCapture::new(sample_rate)))
    }

    fn open_encoded(
        &self,
        _config: &RecordConfig,
        _output: &Path,
    ) -> Result<Box<dyn EncodedRecorder>, RecordError> {
        Err(RecordError::RecordFail(
            "compressed encoding is not available on the cpal backend; use the WAV format".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_size_scales_with_sample_rate() {
        let backend = CpalBackend::new();
        assert_eq!(backend.min_buffer_size(44100), 8820);
        assert_eq!(backend.min_buffer_size(48000), 9600);
        // Floor kicks in for low rates.
        assert_eq!(backend.min_buffer_size(8000), 4096);
    }

    #[test]
    fn encoded_path_is_unsupported() {
        let backend = CpalBackend::new();
        let config = RecordConfig::default();
        let err = backend
            .open_encoded(&config, Path::new("/tmp/out.mp4"))
            .err()
            .expect("must fail");
        assert!(matches!(err, RecordError::RecordFail(_)));
    }
}
