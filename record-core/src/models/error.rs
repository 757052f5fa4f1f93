use thiserror::Error;

/// Errors reported to callers of the recording API.
///
/// These four kinds are the entire caller-visible failure surface.
/// Everything else (file I/O inside the capture loop, backend teardown
/// failures, sidecar writes) is logged and absorbed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The capture permission is not granted. Recoverable: request the
    /// permission via the `PermissionProvider` and retry.
    #[error("the required record permission is missing")]
    PermissionMissing,

    /// The backend failed to prepare or start, or the output file could
    /// not be opened. Fatal to the attempted session; state reverts to idle.
    #[error("could not record audio: {0}")]
    RecordFail(String),

    /// `stop_recording` was called but no session ever produced an
    /// output path. Indicates misuse.
    #[error("no output file")]
    NoOutputFile,

    /// `start_recording` was called while a session is active. The
    /// active session is left untouched.
    #[error("a recording session is already active")]
    AlreadyRecording,
}
