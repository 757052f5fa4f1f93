use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::models::error::RecordError;
use crate::processing::wav_format::{pcm_wav_header, WAV_HEADER_SIZE};

/// Streaming writer for the raw-PCM recording path.
///
/// The final data length is unknown while capturing, so `create` writes
/// a 44-byte zero placeholder and `finalize` rewrites it in place once
/// every sample has been appended. The file handle is closed only after
/// the header rewrite, so a finalized file is always a valid WAV.
pub struct WavFileWriter {
    path: PathBuf,
    file: File,
    sample_rate: u32,
    data_len: u64,
}

impl WavFileWriter {
    /// Create the output file and write the header placeholder.
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self, RecordError> {
        let mut file = File::create(path)
            .map_err(|e| RecordError::RecordFail(format!("failed to open output file: {e}")))?;
        file.write_all(&[0u8; WAV_HEADER_SIZE])
            .map_err(|e| RecordError::RecordFail(format!("failed to write header placeholder: {e}")))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sample_rate,
            data_len: 0,
        })
    }

    /// Append raw PCM bytes after the header area.
    pub fn append(&mut self, data: &[u8]) -> Result<(), RecordError> {
        self.file
            .write_all(data)
            .map_err(|e| RecordError::RecordFail(format!("failed to write audio data: {e}")))?;
        self.data_len += data.len() as u64;
        Ok(())
    }

    /// PCM bytes appended so far (header excluded).
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the placeholder with the real header and close the file.
    /// Returns the final data length in bytes.
    pub fn finalize(mut self) -> Result<u64, RecordError> {
        let header = pcm_wav_header(self.sample_rate, self.data_len as u32);
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| RecordError::RecordFail(format!("failed to rewind output file: {e}")))?;
        self.file
            .write_all(&header)
            .map_err(|e| RecordError::RecordFail(format!("failed to rewrite header: {e}")))?;
        self.file
            .flush()
            .map_err(|e| RecordError::RecordFail(format!("failed to flush output file: {e}")))?;
        Ok(self.data_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_wav_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("record_core_writer_{name}.wav"))
    }

    #[test]
    fn finalize_patches_header_and_length() {
        let path = temp_wav_path("patch");
        let mut writer = WavFileWriter::create(&path, 44100).unwrap();

        let samples = vec![0x42u8; 1000];
        writer.append(&samples).unwrap();
        writer.append(&samples).unwrap();
        assert_eq!(writer.data_len(), 2000);

        let written = writer.finalize().unwrap();
        assert_eq!(written, 2000);

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_SIZE + 2000);
        assert_eq!(&bytes[0..4], b"RIFF");
        let data_len = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
        assert_eq!(data_len, 2000);
        let riff_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(riff_len, 36 + 2000);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_recording_is_still_a_valid_wav() {
        let path = temp_wav_path("empty");
        let writer = WavFileWriter::create(&path, 22050).unwrap();
        writer.finalize().unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_SIZE);
        let sample_rate = u32::from_le_bytes(bytes[24..28].try_into().unwrap());
        assert_eq!(sample_rate, 22050);
        let data_len = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
        assert_eq!(data_len, 0);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn create_fails_for_missing_directory() {
        let path = PathBuf::from("/definitely/not/a/real/dir/out.wav");
        let err = WavFileWriter::create(&path, 44100)
            .err()
            .expect("creating under a missing directory must fail");
        assert!(matches!(err, RecordError::RecordFail(_)));
    }
}
