/// Recording session lifecycle.
///
/// ```text
/// idle → recording → idle
/// ```
///
/// The flag doubles as the cancellation signal: the capture loop polls
/// it every iteration and a transition back to `Idle` is the only way
/// to stop the loop. Cancellation is cooperative, so its latency is
/// bounded by one backend read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

impl RecordingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }
}
