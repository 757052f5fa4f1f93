//! Canonical RIFF/WAVE header for the raw-PCM recording path.
//!
//! The capture loop writes a 44-byte zero placeholder at file creation
//! and rewrites it in place once the total data length is known, so the
//! header is always generated for mono 16-bit PCM with a known size.

/// Size of the RIFF/WAVE PCM header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const PCM_FORMAT_TAG: u16 = 1;
const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = 2;

/// Build the 44-byte header for a mono, 16-bit, little-endian PCM file
/// with `data_len` bytes of sample data.
///
/// Byte layout (all integers little-endian):
/// `"RIFF"`, 36 + data_len, `"WAVE"`, `"fmt "`, 16, format tag 1,
/// 1 channel, sample rate, byte rate (rate * 2), block align 2,
/// 16 bits per sample, `"data"`, data_len.
pub fn pcm_wav_header(sample_rate: u32, data_len: u32) -> [u8; WAV_HEADER_SIZE] {
    let mut header = [0u8; WAV_HEADER_SIZE];
    let byte_rate = sample_rate * 2;

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_len).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());

    header
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(header: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(header[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(header: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(header[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn header_is_44_bytes_with_riff_magic() {
        let header = pcm_wav_header(44100, 88200);
        assert_eq!(header.len(), 44);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32_at(&header, 4), 36 + 88200);
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_is_mono_16_bit_pcm() {
        let header = pcm_wav_header(44100, 0);
        assert_eq!(u32_at(&header, 16), 16); // fmt chunk size
        assert_eq!(u16_at(&header, 20), 1); // PCM format tag
        assert_eq!(u16_at(&header, 22), 1); // mono
        assert_eq!(u16_at(&header, 32), 2); // block align
        assert_eq!(u16_at(&header, 34), 16); // bits per sample
    }

    #[test]
    fn rate_fields_derive_from_sample_rate() {
        let header = pcm_wav_header(16000, 320000);
        assert_eq!(u32_at(&header, 24), 16000);
        assert_eq!(u32_at(&header, 28), 32000); // 16-bit mono byte rate
        assert_eq!(u32_at(&header, 40), 320000);
    }
}
