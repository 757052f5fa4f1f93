//! Real-time loudness estimation for the raw-PCM capture loop.

/// Compute a normalized loudness value for `buffer[0..len)`.
///
/// The bytes are interpreted as consecutive little-endian signed 16-bit
/// samples; a dangling final odd byte is ignored. The result is the RMS
/// amplitude scaled to `0.0..=100.0`, where 0 is silence and 100 is a
/// sustained full-scale signal.
///
/// Normalization divides by 32767, the positive 16-bit maximum, so a
/// buffer of full-scale negative samples (-32768) lands marginally
/// above 100. The value is deliberately not clamped.
///
/// Runs in a single pass without allocating, so it is safe to call from
/// the capture thread between buffer reads.
pub fn compute_volume(buffer: &[u8], len: usize) -> f64 {
    let len = len.min(buffer.len());
    let mut sum = 0.0f64;
    let mut sample_count = 0u64;

    let mut i = 0;
    while i + 1 < len {
        let sample = i16::from_le_bytes([buffer[i], buffer[i + 1]]) as f64;
        sum += sample * sample;
        sample_count += 1;
        i += 2;
    }

    if sample_count == 0 {
        return 0.0;
    }

    let rms = (sum / sample_count as f64).sqrt();
    (rms / 32767.0) * 100.0
}
