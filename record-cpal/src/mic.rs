//! Microphone capture line built on a cpal input stream.
//!
//! cpal delivers audio by pushing buffers on a device thread, while the
//! core's capture loop pulls with a blocking `read`. The bridge is a
//! shared byte ring: the stream callback downmixes device frames to
//! mono i16 and pushes bytes; `read` pops them, parking on a condvar
//! with a 100 ms timeout so a stop request is observed within one read
//! period even when the device goes quiet.
//!
//! cpal streams are not `Send`, so the stream lives on a dedicated
//! thread owned by this handle and is dropped there when the line stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, SizedSample, StreamConfig};
use parking_lot::{Condvar, Mutex};

use record_core::{ByteRing, PcmCapture, RecordError};

/// One second of buffered mono 16-bit audio before the ring drops data.
fn ring_capacity(sample_rate: u32) -> usize {
    (sample_rate as usize) * 2
}

struct StreamShared {
    ring: Mutex<ByteRing>,
    data_ready: Condvar,
    running: AtomicBool,
    /// Asynchronous stream failure, surfaced on the next `read`.
    failure: Mutex<Option<String>>,
}

pub struct CpalMicCapture {
    sample_rate: u32,
    shared: Arc<StreamShared>,
    stream_thread: Option<thread::JoinHandle<()>>,
}

impl CpalMicCapture {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            shared: Arc::new(StreamShared {
                ring: Mutex::new(ByteRing::new(ring_capacity(sample_rate))),
                data_ready: Condvar::new(),
                running: AtomicBool::new(false),
                failure: Mutex::new(None),
            }),
            stream_thread: None,
        }
    }

    fn teardown(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.stream_thread.take() {
            if handle.join().is_err() {
                log::error!("cpal stream thread panicked");
            }
        }
    }
}

impl PcmCapture for CpalMicCapture {
    fn start(&mut self) -> Result<(), RecordError> {
        if self.stream_thread.is_some() {
            return Err(RecordError::RecordFail("capture line already started".into()));
        }

        self.shared.running.store(true, Ordering::SeqCst);

        let (init_tx, init_rx) = mpsc::channel::<Result<(), String>>();
        let shared = Arc::clone(&self.shared);
        let sample_rate = self.sample_rate;

        let handle = thread::Builder::new()
            .name("cpal-stream".into())
            .spawn(move || run_stream(shared, sample_rate, init_tx))
            .map_err(|e| RecordError::RecordFail(format!("failed to spawn stream thread: {e}")))?;
        self.stream_thread = Some(handle);

        // The stream is built on its own thread; wait for the verdict so
        // device failures surface synchronously from start.
        match init_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => {
                self.teardown();
                Err(RecordError::RecordFail(message))
            }
            Err(_) => {
                self.teardown();
                Err(RecordError::RecordFail(
                    "timed out waiting for the input stream to start".into(),
                ))
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, RecordError> {
        if let Some(message) = self.shared.failure.lock().take() {
            return Err(RecordError::RecordFail(message));
        }

        let mut ring = self.shared.ring.lock();
        if ring.is_empty() {
            if !self.shared.running.load(Ordering::SeqCst) {
                return Ok(0);
            }
            // Bounded wait keeps the caller's cancellation latency at
            // one read period.
            let _ = self
                .shared
                .data_ready
                .wait_for(&mut ring, Duration::from_millis(100));
        }
        Ok(ring.pop_into(buf))
    }

    fn stop(&mut self) -> Result<(), RecordError> {
        self.teardown();
        Ok(())
    }
}

impl Drop for CpalMicCapture {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Body of the stream thread: build and play the input stream, report
/// the outcome, then park until the line is stopped.
fn run_stream(shared: Arc<StreamShared>, sample_rate: u32, init_tx: mpsc::Sender<Result<(), String>>) {
    let built = (|| -> Result<cpal::Stream, String> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| "no audio input device available".to_string())?;
        let supported = device
            .default_input_config()
            .map_err(|e| format!("failed to query input config: {e}"))?;

        let channels = supported.channels() as usize;
        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };

        let stream = match supported.sample_format() {
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, Arc::clone(&shared), channels, |s| s)
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, Arc::clone(&shared), channels, |s| {
                    (s as i32 - 32768) as i16
                })
            }
            SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, Arc::clone(&shared), channels, |s| {
                    (s.clamp(-1.0, 1.0) * 32767.0) as i16
                })
            }
            other => return Err(format!("unsupported device sample format: {other:?}")),
        }
        .map_err(|e| format!("failed to build input stream: {e}"))?;

        stream
            .play()
            .map_err(|e| format!("failed to start input stream: {e}"))?;
        Ok(stream)
    })();

    match built {
        Ok(stream) => {
            let _ = init_tx.send(Ok(()));
            while shared.running.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(50));
            }
            drop(stream);
        }
        Err(message) => {
            let _ = init_tx.send(Err(message));
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    shared: Arc<StreamShared>,
    channels: usize,
    convert: impl Fn(T) -> i16 + Send + 'static,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
{
    let failure_shared = Arc::clone(&shared);
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            deliver(&shared, data, channels, &convert);
        },
        move |err| {
            log::error!("input stream error: {err}");
            *failure_shared.failure.lock() = Some(err.to_string());
        },
        None,
    )
}

/// Downmix interleaved device frames to mono i16 by averaging channels,
/// then hand the bytes to the ring and wake any blocked reader.
fn deliver<T: Copy>(shared: &StreamShared, data: &[T], channels: usize, convert: &impl Fn(T) -> i16) {
    if data.is_empty() || channels == 0 {
        return;
    }

    let mut bytes = Vec::with_capacity((data.len() / channels) * 2);
    for frame in data.chunks_exact(channels) {
        let mut sum = 0i32;
        for &sample in frame {
            sum += convert(sample) as i32;
        }
        let mono = (sum / channels as i32) as i16;
        bytes.extend_from_slice(&mono.to_le_bytes());
    }

    shared.ring.lock().push(&bytes);
    shared.data_ready.notify_one();
}
