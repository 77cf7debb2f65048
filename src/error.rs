use thiserror::Error;

/// Failure kinds for the retiming engine.
///
/// Recovery policy is "none" — every variant aborts the run. Callers that
/// need partial-output cleanup should do so on the `Err` path; the engine
/// itself never leaves a half-written output file on disk (see
/// `engine::run`).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid audio: {reason} (at frame {offset})")]
    InvalidAudio { reason: String, offset: u64 },

    #[error("video underrun: expected {expected} bytes for frame {frame_index}, got {got}")]
    VideoUnderrun {
        frame_index: u64,
        expected: usize,
        got: usize,
    },

    #[error("video overrun: decoder produced more than {expected} frames")]
    VideoOverrun { expected: u64 },

    #[error("audio overrun: requested {requested} frames but only {available} available at offset {offset}")]
    AudioOverrun {
        requested: u64,
        available: u64,
        offset: u64,
    },

    #[error("decoder process failed: {0}")]
    DecoderFailed(String),

    #[error("encoder process failed: {0}")]
    EncoderFailed(String),

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
