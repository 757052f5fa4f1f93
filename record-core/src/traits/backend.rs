use std::path::Path;
use std::sync::Arc;

use crate::models::config::RecordConfig;
use crate::models::error::RecordError;

/// Notification for asynchronous failures reported by an encoded
/// recorder during capture.
///
/// Invoked from a backend thread. The session registers a callback that
/// flips the state flag back to idle, ending the session quietly; no
/// error travels back through the original `start_recording` call.
pub type BackendErrorCallback = Arc<dyn Fn(RecordError) + Send + Sync>;

/// A raw capture line delivering signed 16-bit little-endian mono PCM.
///
/// The handle is owned by the capture loop for the whole session and is
/// released when dropped.
pub trait PcmCapture: Send {
    /// Begin delivering audio.
    fn start(&mut self) -> Result<(), RecordError>;

    /// Blocking read of up to `buf.len()` bytes into `buf`, returning
    /// the number of bytes delivered.
    ///
    /// Implementations must return within a bounded period even when no
    /// audio is available (returning 0 is fine) — the capture loop polls
    /// its cancellation flag between reads, and stopping a session
    /// blocks until the loop observes the flag.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, RecordError>;

    /// Stop the line. Called by the capture loop after the output file
    /// is finalized; failures are logged and swallowed by the caller.
    fn stop(&mut self) -> Result<(), RecordError>;
}

/// A backend-native compressed recorder (e.g. MPEG-4/AAC).
///
/// The backend owns the whole encode-and-write pipeline; the session
/// only drives the lifecycle. Resources are released on drop.
pub trait EncodedRecorder: Send {
    /// Configure the native encoder. A failure here is fatal to the
    /// attempted session and surfaces as `RecordFail`.
    fn prepare(&mut self) -> Result<(), RecordError>;

    /// Register the asynchronous failure notification. Registered after
    /// a successful `prepare` and before `start`. An implementation
    /// reporting a fatal error must cease capture on its own after
    /// invoking the callback.
    fn set_error_callback(&mut self, callback: BackendErrorCallback);

    /// Begin encoding to the output file.
    fn start(&mut self) -> Result<(), RecordError>;

    /// Stop encoding and flush the container. Failures are logged and
    /// swallowed by the session, since the file is usually still usable.
    fn stop(&mut self) -> Result<(), RecordError>;
}

/// Platform audio device and encoder access.
///
/// Implementations are selected by the caller and injected into the
/// `Recorder`; the core never references a concrete platform API.
pub trait CaptureBackend: Send + Sync {
    /// Minimum capture buffer size in bytes for mono 16-bit PCM at
    /// `sample_rate`. Sizes the reusable buffer owned by the capture loop.
    fn min_buffer_size(&self, sample_rate: u32) -> usize;

    /// Open a raw PCM capture line at `sample_rate`.
    fn open_pcm(&self, sample_rate: u32) -> Result<Box<dyn PcmCapture>, RecordError>;

    /// Open a compressed recorder writing to `output`. Backends without
    /// a native encoder return `RecordFail`.
    fn open_encoded(
        &self,
        config: &RecordConfig,
        output: &Path,
    ) -> Result<Box<dyn EncodedRecorder>, RecordError>;
}
