use serde::{Deserialize, Serialize};

/// Silence detection tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Silence threshold in dB relative to full scale.
    pub threshold_level_db: f64,
    /// Minimum region length, in seconds, to count as silence.
    pub threshold_duration_s: f64,
    /// Width of the centered blend window, in seconds.
    pub blend_duration_s: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            threshold_level_db: -40.0,
            threshold_duration_s: 0.2,
            blend_duration_s: 0.005,
        }
    }
}

/// Duration transform coefficients: `T(d) = constant + sublinear*ln(d+1) +
/// linear*d`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub constant: f64,
    pub sublinear: f64,
    pub linear: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            constant: 0.0,
            sublinear: 0.0,
            linear: 0.1,
        }
    }
}

/// Top-level configuration recognized by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub detector: DetectorConfig,
    pub transform: TransformConfig,
    /// Path to write the raw silent audio ranges to, if set.
    pub save_silence: Option<String>,
    /// Path to a UTF-8 text file whose `H:MM:SS` tokens should be retimed.
    pub recalculate_time_in_description: Option<String>,
}
