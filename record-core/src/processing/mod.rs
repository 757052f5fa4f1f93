pub mod ring_buffer;
pub mod volume;
pub mod wav_format;
