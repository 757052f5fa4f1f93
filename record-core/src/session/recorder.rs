use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;

use crate::models::config::{OutputFormat, RecordConfig, VolumeCallback};
use crate::models::error::RecordError;
use crate::models::state::RecordingState;
use crate::processing::volume::compute_volume;
use crate::storage::metadata::{self, RecordingMetadata};
use crate::storage::wav_writer::WavFileWriter;
use crate::traits::backend::{CaptureBackend, EncodedRecorder, PcmCapture};
use crate::traits::permission::PermissionProvider;

/// Mutable session state shared with the capture loop.
///
/// The `state` flag is the loop's cancellation signal: the loop reads it
/// every iteration and exits once it flips back to `Idle`.
struct SessionState {
    state: RecordingState,
    output_path: Option<PathBuf>,
    capture_start: Option<Instant>,
    data_bytes: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            output_path: None,
            capture_start: None,
            data_bytes: 0,
        }
    }
}

/// Resources owned by the active session, torn down on stop.
enum ActiveCapture {
    /// Raw-PCM path: the capture loop thread. Joining it guarantees the
    /// output file is finalized and the capture line released.
    Pcm(thread::JoinHandle<()>),
    /// Compressed path: the backend-native recorder.
    Encoded(Box<dyn EncodedRecorder>),
}

/// Recording session controller.
///
/// One `Recorder` owns at most one active session at a time; the
/// platform backend and permission provider are injected, so multiple
/// independent controllers can coexist (each with its own state).
///
/// ```text
/// caller → RecordConfig → Recorder → (CaptureBackend ⇄ volume meter ⇄ WAV writer)
/// ```
///
/// `start_recording`/`is_recording` never block on audio work.
/// `stop_recording` blocks on the raw-PCM path until the capture loop
/// has exited, so the returned file is never still being written.
pub struct Recorder<B: CaptureBackend> {
    backend: B,
    permissions: Arc<dyn PermissionProvider>,
    config: RecordConfig,
    shared: Arc<Mutex<SessionState>>,
    active: Option<ActiveCapture>,
    /// Config snapshot taken at start, so a `set_config` during capture
    /// does not skew the stop-time metadata.
    active_config: Option<RecordConfig>,
}

impl<B: CaptureBackend> Recorder<B> {
    pub fn new(backend: B, permissions: Arc<dyn PermissionProvider>) -> Self {
        Self {
            backend,
            permissions,
            config: RecordConfig::default(),
            shared: Arc::new(Mutex::new(SessionState::new())),
            active: None,
            active_config: None,
        }
    }

    /// Replace the configuration used by the next `start_recording`.
    /// The active session, if any, keeps the config it started with.
    pub fn set_config(&mut self, config: RecordConfig) {
        self.config = config;
    }

    pub fn is_recording(&self) -> bool {
        self.shared.lock().state.is_recording()
    }

    /// Start a recording session with the current configuration.
    ///
    /// Fails with `AlreadyRecording` if a session is active,
    /// `PermissionMissing` if capture permission is not granted, and
    /// `RecordFail` if the backend or the output file cannot be set up.
    /// On any failure the state stays idle.
    pub fn start_recording(&mut self) -> Result<(), RecordError> {
        if self.shared.lock().state.is_recording() {
            return Err(RecordError::AlreadyRecording);
        }
        if !self.permissions.is_granted() {
            return Err(RecordError::PermissionMissing);
        }
        self.config.validate().map_err(RecordError::RecordFail)?;

        let path = self.config.resolve_output_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RecordError::RecordFail(format!("failed to create output directory: {e}"))
            })?;
        }

        match self.config.output_format {
            OutputFormat::Mpeg4 => self.start_encoded(path)?,
            OutputFormat::Wav => self.start_pcm(path)?,
        }

        self.active_config = Some(self.config.clone());
        Ok(())
    }

    /// Stop the active session and return the output file path.
    ///
    /// Flips the state flag first so the capture loop exits its read
    /// loop, then joins the loop (raw-PCM) or stops the native recorder
    /// (compressed). Backend teardown errors are logged and swallowed:
    /// the captured file is still usable, so the path is returned
    /// regardless. Calling stop without an active session returns the
    /// previous session's path, or `NoOutputFile` if there is none.
    pub fn stop_recording(&mut self) -> Result<String, RecordError> {
        self.shared.lock().state = RecordingState::Idle;

        let stopped = self.active.take();
        let had_session = stopped.is_some();
        match stopped {
            Some(ActiveCapture::Pcm(handle)) => {
                if handle.join().is_err() {
                    log::error!("capture loop thread panicked");
                }
            }
            Some(ActiveCapture::Encoded(mut recorder)) => {
                if let Err(err) = recorder.stop() {
                    log::warn!("error stopping encoded recorder: {err}");
                }
            }
            None => {}
        }

        let (path, data_bytes, capture_start) = {
            let state = self.shared.lock();
            match &state.output_path {
                Some(path) => (path.clone(), state.data_bytes, state.capture_start),
                None => return Err(RecordError::NoOutputFile),
            }
        };

        if had_session {
            // A session actually ended here; describe it in a sidecar.
            if let Some(config) = self.active_config.take() {
                let duration = if data_bytes > 0 {
                    data_bytes as f64 / (config.sample_rate as f64 * 2.0)
                } else {
                    capture_start.map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0)
                };
                let meta = RecordingMetadata::new(&config, &path, duration, data_bytes);
                if let Err(err) = metadata::write_sidecar(&meta, &path) {
                    log::warn!("failed to write metadata sidecar: {err}");
                }
            }
        }

        Ok(path.to_string_lossy().into_owned())
    }

    fn start_encoded(&mut self, path: PathBuf) -> Result<(), RecordError> {
        let mut recorder = self.backend.open_encoded(&self.config, &path)?;
        recorder.prepare()?;

        // Asynchronous backend failures end the session quietly: the
        // state flips back to idle and the recorder ceases on its own.
        let shared = Arc::clone(&self.shared);
        recorder.set_error_callback(Arc::new(move |err| {
            log::error!("backend reported capture failure: {err}");
            shared.lock().state = RecordingState::Idle;
        }));

        recorder.start()?;

        self.begin_session(path);
        self.active = Some(ActiveCapture::Encoded(recorder));
        Ok(())
    }

    fn start_pcm(&mut self, path: PathBuf) -> Result<(), RecordError> {
        let buffer_size = self.backend.min_buffer_size(self.config.sample_rate);
        let mut capture = self.backend.open_pcm(self.config.sample_rate)?;
        capture.start()?;

        // The loop checks the flag before its first read, so the state
        // must be flipped before the thread exists.
        self.begin_session(path.clone());

        let shared = Arc::clone(&self.shared);
        let volume_callback = self.config.volume_callback.clone();
        let sample_rate = self.config.sample_rate;

        let spawned = thread::Builder::new()
            .name("pcm-capture".into())
            .spawn(move || {
                if let Err(err) = run_capture_loop(
                    capture.as_mut(),
                    &path,
                    sample_rate,
                    buffer_size,
                    &shared,
                    volume_callback,
                ) {
                    log::error!("recording failed: {err}");
                }
                // The line is released only after the file is finalized.
                if let Err(err) = capture.stop() {
                    log::warn!("error stopping capture line: {err}");
                }
            });

        match spawned {
            Ok(handle) => {
                self.active = Some(ActiveCapture::Pcm(handle));
                Ok(())
            }
            Err(err) => {
                self.shared.lock().state = RecordingState::Idle;
                Err(RecordError::RecordFail(format!(
                    "failed to spawn capture thread: {err}"
                )))
            }
        }
    }

    fn begin_session(&mut self, path: PathBuf) {
        let mut state = self.shared.lock();
        state.state = RecordingState::Recording;
        state.output_path = Some(path);
        state.capture_start = Some(Instant::now());
        state.data_bytes = 0;
    }
}

/// Raw-PCM capture loop. Runs on its own thread for the whole session.
///
/// Writes the header placeholder, then appends each buffer read from
/// the backend until the shared state flips to idle, feeding the volume
/// meter along the way. On exit the WAV header is rewritten in place
/// before the file handle closes.
fn run_capture_loop(
    capture: &mut dyn PcmCapture,
    path: &Path,
    sample_rate: u32,
    buffer_size: usize,
    shared: &Mutex<SessionState>,
    volume_callback: Option<VolumeCallback>,
) -> Result<(), RecordError> {
    let mut writer = WavFileWriter::create(path, sample_rate)?;
    let mut buffer = vec![0u8; buffer_size];

    while shared.lock().state.is_recording() {
        let read = capture.read(&mut buffer)?;
        if read == 0 {
            continue;
        }
        writer.append(&buffer[..read])?;
        if let Some(callback) = &volume_callback {
            // Synchronous, on this thread, over exactly the bytes read.
            callback(compute_volume(&buffer, read));
        }
    }

    let data_bytes = writer.finalize()?;
    shared.lock().data_bytes = data_bytes;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::{AudioEncoder, OutputLocation};
    use crate::storage::metadata::read_sidecar;
    use crate::traits::backend::BackendErrorCallback;
    use std::sync::Arc;
    use std::time::Duration;

    struct StaticPermissions(bool);

    impl PermissionProvider for StaticPermissions {
        fn is_granted(&self) -> bool {
            self.0
        }

        fn request(&self) -> bool {
            self.0
        }
    }

    fn granted() -> Arc<dyn PermissionProvider> {
        Arc::new(StaticPermissions(true))
    }

    /// Serves a fixed script of buffers, then idles with empty reads
    /// until the loop observes the stop flag.
    struct ScriptedCapture {
        frames: Vec<Vec<u8>>,
        next: usize,
    }

    impl PcmCapture for ScriptedCapture {
        fn start(&mut self) -> Result<(), RecordError> {
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, RecordError> {
            if self.next < self.frames.len() {
                let frame = &self.frames[self.next];
                let count = frame.len().min(buf.len());
                buf[..count].copy_from_slice(&frame[..count]);
                self.next += 1;
                Ok(count)
            } else {
                thread::sleep(Duration::from_millis(2));
                Ok(0)
            }
        }

        fn stop(&mut self) -> Result<(), RecordError> {
            Ok(())
        }
    }

    struct ScriptedBackend {
        frames: Vec<Vec<u8>>,
    }

    impl CaptureBackend for ScriptedBackend {
        fn min_buffer_size(&self, _sample_rate: u32) -> usize {
            4096
        }

        fn open_pcm(&self, _sample_rate: u32) -> Result<Box<dyn PcmCapture>, RecordError> {
            Ok(Box::new(ScriptedCapture {
                frames: self.frames.clone(),
                next: 0,
            }))
        }

        fn open_encoded(
            &self,
            _config: &RecordConfig,
            _output: &Path,
        ) -> Result<Box<dyn EncodedRecorder>, RecordError> {
            Err(RecordError::RecordFail("no encoder in scripted backend".into()))
        }
    }

    /// Observation point shared between a mock encoded recorder and the
    /// test body.
    #[derive(Default)]
    struct EncodedProbe {
        calls: Mutex<Vec<&'static str>>,
        error_callback: Mutex<Option<BackendErrorCallback>>,
    }

    struct MockEncodedRecorder {
        probe: Arc<EncodedProbe>,
        fail_prepare: bool,
    }

    impl EncodedRecorder for MockEncodedRecorder {
        fn prepare(&mut self) -> Result<(), RecordError> {
            if self.fail_prepare {
                return Err(RecordError::RecordFail("encoder prepare failed".into()));
            }
            self.probe.calls.lock().push("prepare");
            Ok(())
        }

        fn set_error_callback(&mut self, callback: BackendErrorCallback) {
            *self.probe.error_callback.lock() = Some(callback);
        }

        fn start(&mut self) -> Result<(), RecordError> {
            self.probe.calls.lock().push("start");
            Ok(())
        }

        fn stop(&mut self) -> Result<(), RecordError> {
            self.probe.calls.lock().push("stop");
            Ok(())
        }
    }

    struct EncodedBackend {
        probe: Arc<EncodedProbe>,
        fail_prepare: bool,
    }

    impl CaptureBackend for EncodedBackend {
        fn min_buffer_size(&self, _sample_rate: u32) -> usize {
            4096
        }

        fn open_pcm(&self, _sample_rate: u32) -> Result<Box<dyn PcmCapture>, RecordError> {
            Err(RecordError::RecordFail("pcm not supported here".into()))
        }

        fn open_encoded(
            &self,
            _config: &RecordConfig,
            _output: &Path,
        ) -> Result<Box<dyn EncodedRecorder>, RecordError> {
            Ok(Box::new(MockEncodedRecorder {
                probe: Arc::clone(&self.probe),
                fail_prepare: self.fail_prepare,
            }))
        }
    }

    fn wav_config(dir: &Path) -> RecordConfig {
        RecordConfig {
            output_location: OutputLocation::Custom(dir.to_path_buf()),
            output_format: OutputFormat::Wav,
            audio_encoder: AudioEncoder::Pcm16Bit,
            sample_rate: 44100,
            volume_callback: None,
        }
    }

    fn test_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("record_core_session_{name}"))
    }

    #[test]
    fn stop_without_start_is_no_output_file() {
        let mut recorder = Recorder::new(ScriptedBackend { frames: vec![] }, granted());
        assert_eq!(recorder.stop_recording(), Err(RecordError::NoOutputFile));
    }

    #[test]
    fn missing_permission_keeps_session_idle() {
        let mut recorder = Recorder::new(
            ScriptedBackend { frames: vec![] },
            Arc::new(StaticPermissions(false)),
        );
        recorder.set_config(wav_config(&test_dir("denied")));

        assert_eq!(recorder.start_recording(), Err(RecordError::PermissionMissing));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn invalid_sample_rate_is_record_fail() {
        let mut recorder = Recorder::new(ScriptedBackend { frames: vec![] }, granted());
        let mut config = wav_config(&test_dir("bad_rate"));
        config.sample_rate = 0;
        recorder.set_config(config);

        assert!(matches!(
            recorder.start_recording(),
            Err(RecordError::RecordFail(_))
        ));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn state_machine_full_cycle() {
        let dir = test_dir("cycle");
        let mut recorder = Recorder::new(ScriptedBackend { frames: vec![] }, granted());
        recorder.set_config(wav_config(&dir));

        assert!(!recorder.is_recording());
        recorder.start_recording().unwrap();
        assert!(recorder.is_recording());

        let path = recorder.stop_recording().unwrap();
        assert!(!recorder.is_recording());
        assert!(path.ends_with(".wav"));
        assert!(path.starts_with(dir.to_string_lossy().as_ref()));

        // A redundant stop must not crash; it hands back the same path.
        assert_eq!(recorder.stop_recording().unwrap(), path);
    }

    #[test]
    fn second_start_is_rejected_and_leaves_session_alone() {
        let dir = test_dir("double_start");
        let mut recorder = Recorder::new(ScriptedBackend { frames: vec![] }, granted());
        recorder.set_config(wav_config(&dir));

        recorder.start_recording().unwrap();
        assert_eq!(recorder.start_recording(), Err(RecordError::AlreadyRecording));
        assert!(recorder.is_recording());

        let path = recorder.stop_recording().unwrap();
        assert!(path.ends_with(".wav"));
    }

    #[test]
    fn pcm_end_to_end_with_volume_metering() {
        let dir = test_dir("e2e");
        let silence = vec![0u8; 4096];
        let mut tone = Vec::with_capacity(4096);
        for _ in 0..2048 {
            tone.extend_from_slice(&0x7FFFi16.to_le_bytes());
        }
        let backend = ScriptedBackend {
            frames: vec![silence.clone(), silence.clone(), silence, tone],
        };

        let values: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&values);

        let mut config = wav_config(&dir);
        config.volume_callback = Some(Arc::new(move |v| sink.lock().push(v)));

        let mut recorder = Recorder::new(backend, granted());
        recorder.set_config(config);
        recorder.start_recording().unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while values.lock().len() < 4 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        let path = PathBuf::from(recorder.stop_recording().unwrap());

        // All four buffers must be in the file, behind a correct header.
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 44 + 4 * 4096);
        assert_eq!(&bytes[0..4], b"RIFF");
        let data_len = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
        assert_eq!(data_len, 4 * 4096);
        let sample_rate = u32::from_le_bytes(bytes[24..28].try_into().unwrap());
        assert_eq!(sample_rate, 44100);

        // One meter reading per buffer: three silent, then a loud one.
        let readings = values.lock().clone();
        assert!(readings.len() >= 4, "got {} readings", readings.len());
        assert_eq!(readings[0], 0.0);
        assert_eq!(readings[1], 0.0);
        assert_eq!(readings[2], 0.0);
        assert!(readings[3] > 90.0, "got {}", readings[3]);

        // The stop also leaves a metadata sidecar describing the take.
        let meta = read_sidecar(&path).unwrap();
        assert_eq!(meta.data_bytes, 4 * 4096);
        assert_eq!(meta.format, "wav");

        fs::remove_file(&path).ok();
        fs::remove_file(path.with_extension("metadata.json")).ok();
    }

    #[test]
    fn encoded_prepare_failure_reverts_to_idle() {
        let probe = Arc::new(EncodedProbe::default());
        let mut recorder = Recorder::new(
            EncodedBackend {
                probe: Arc::clone(&probe),
                fail_prepare: true,
            },
            granted(),
        );
        recorder.set_config(RecordConfig {
            output_location: OutputLocation::Custom(test_dir("prepare_fail")),
            ..Default::default()
        });

        assert!(matches!(
            recorder.start_recording(),
            Err(RecordError::RecordFail(_))
        ));
        assert!(!recorder.is_recording());
        assert!(probe.calls.lock().is_empty());
    }

    #[test]
    fn encoded_lifecycle_drives_backend_in_order() {
        let probe = Arc::new(EncodedProbe::default());
        let mut recorder = Recorder::new(
            EncodedBackend {
                probe: Arc::clone(&probe),
                fail_prepare: false,
            },
            granted(),
        );
        recorder.set_config(RecordConfig {
            output_location: OutputLocation::Custom(test_dir("encoded")),
            ..Default::default()
        });

        recorder.start_recording().unwrap();
        assert!(recorder.is_recording());
        assert!(probe.error_callback.lock().is_some());

        let path = recorder.stop_recording().unwrap();
        assert!(path.ends_with(".mp4"));
        assert_eq!(*probe.calls.lock(), vec!["prepare", "start", "stop"]);
    }

    #[test]
    fn async_backend_error_stops_session_quietly() {
        let probe = Arc::new(EncodedProbe::default());
        let mut recorder = Recorder::new(
            EncodedBackend {
                probe: Arc::clone(&probe),
                fail_prepare: false,
            },
            granted(),
        );
        recorder.set_config(RecordConfig {
            output_location: OutputLocation::Custom(test_dir("async_err")),
            ..Default::default()
        });

        recorder.start_recording().unwrap();

        let callback = probe.error_callback.lock().clone().unwrap();
        callback(RecordError::RecordFail("device lost".into()));
        assert!(!recorder.is_recording());

        // The file that exists so far is still handed back.
        let path = recorder.stop_recording().unwrap();
        assert!(path.ends_with(".mp4"));
    }
}
