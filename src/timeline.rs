//! C3 — Timeline Planner, wired to C7's Drift Accountant.
//!
//! Turns silence regions into an ordered, fully-resolved segment list: each
//! entry already carries the video/audio frame ranges to read and the
//! frame counts to emit, so C4/C5 don't need to re-derive any of this.

use crate::config::TransformConfig;
use crate::detector::SilenceRegion;
use crate::drift::DriftAccountant;
use crate::error::{EngineError, Result};
use crate::transform;

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSegment {
    pub t0: f64,
    pub t1: f64,
    pub is_silence: bool,
    pub dur: f64,
    pub new_dur: f64,
    /// Input video frame range `[v0, v1)`.
    pub v0: u64,
    pub v1: u64,
    /// Input audio frame range `[a0, a1)`.
    pub a0: u64,
    pub a1: u64,
    /// Output video frame count for this segment.
    pub k_v: u64,
    /// Output audio frame count for this segment.
    pub k_a: u64,
}

/// `round(d * f + 0.5)` truncated toward zero — the "nearest frame count"
/// rule.
fn closest_frames(d: f64, f: f64) -> u64 {
    ((d * f) + 0.5).floor().max(0.0) as u64
}

/// Build the ordered segment list for a whole file, computing
/// video/audio frame counts and threading the drift accountant through.
#[allow(clippy::too_many_arguments)]
pub fn plan(
    regions: &[SilenceRegion],
    duration: f64,
    including_end: bool,
    transform_cfg: &TransformConfig,
    f_v: f64,
    n_v: u64,
    f_a: f64,
    n_a: u64,
) -> Result<Vec<PlannedSegment>> {
    for r in regions {
        let dur = r.end_s - r.start_s;
        if transform::exceeds_duration(dur, transform_cfg) {
            return Err(EngineError::ConfigInvalid(format!(
                "transform yields new_dur > dur for silence [{:.3}, {:.3})",
                r.start_s, r.end_s
            )));
        }
    }

    let raw_segments = build_raw_segments(regions, duration, including_end);

    let mut accountant = DriftAccountant::new();
    let mut planned = Vec::with_capacity(raw_segments.len());

    for (t0, t1, is_silence) in raw_segments {
        let dur = t1 - t0;
        let new_dur = if is_silence { transform::transform_duration(dur, transform_cfg) } else { dur };

        let v0 = (t0 * f_v).floor() as u64;
        let v1 = ((t1 * f_v).floor() as u64).min(n_v).max(v0);
        let a0 = ((t0 * f_a).floor() as u64).min(n_a);
        let a1 = ((t1 * f_a).floor() as u64).min(n_a).max(a0);

        let (k_v, k_a) = if is_silence {
            let k_v = closest_frames(new_dur, f_v).min(v1 - v0);
            let k_a = accountant.account_silence(dur, k_v, f_v, f_a, a1 - a0);
            if k_a > a1 - a0 {
                return Err(EngineError::AudioOverrun {
                    requested: k_a,
                    available: a1 - a0,
                    offset: a0,
                });
            }
            (k_v, k_a)
        } else {
            (v1 - v0, accountant.account_passthrough(a1 - a0))
        };

        planned.push(PlannedSegment { t0, t1, is_silence, dur, new_dur, v0, v1, a0, a1, k_v, k_a });
    }

    Ok(planned)
}

fn build_raw_segments(regions: &[SilenceRegion], duration: f64, including_end: bool) -> Vec<(f64, f64, bool)> {
    let mut segments = Vec::new();
    if regions.is_empty() {
        segments.push((0.0, duration, false));
        return segments;
    }

    if regions[0].start_s > 0.0 {
        segments.push((0.0, regions[0].start_s, false));
    }

    for pair in regions.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        segments.push((a.start_s, a.end_s, true));
        segments.push((a.end_s, b.start_s, false));
    }

    let last = *regions.last().unwrap();
    if including_end {
        segments.push((last.start_s, duration, true));
    } else {
        segments.push((last.start_s, last.end_s, true));
        segments.push((last.end_s, duration, false));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_silence_single_passthrough_segment() {
        let segs = plan(&[], 5.0, false, &TransformConfig::default(), 30.0, 150, 16_000, 80_000).unwrap();
        assert_eq!(segs.len(), 1);
        assert!(!segs[0].is_silence);
        assert_eq!(segs[0].k_v, 150);
        assert_eq!(segs[0].k_a, 80_000);
    }

    #[test]
    fn split_silence_four_segments() {
        // 2s speech, 3s silence, 2s speech, 1s silence(end). Four segments:
        // [speech][silence][speech][silence] — the trailing silence reaches
        // the file end, so `including_end` folds it into one entry rather
        // than adding a fifth trailing non-silence segment.
        let regions = vec![
            SilenceRegion { start_s: 2.0, end_s: 5.0 },
            SilenceRegion { start_s: 7.0, end_s: 8.0 },
        ];
        let transform_cfg = TransformConfig { constant: 0.0, sublinear: 0.0, linear: 0.1 };
        let segs = plan(&regions, 8.0, true, &transform_cfg, 25.0, 200, 16_000, 128_000).unwrap();
        assert_eq!(segs.len(), 4);
        assert!((segs[1].new_dur - 0.3).abs() < 1e-9);
        assert!((segs[3].new_dur - 0.1).abs() < 1e-9);
    }

    #[test]
    fn sum_new_dur_never_exceeds_sum_dur() {
        let regions = vec![
            SilenceRegion { start_s: 1.0, end_s: 4.0 },
            SilenceRegion { start_s: 6.0, end_s: 6.5 },
        ];
        let cfg = TransformConfig::default();
        let segs = plan(&regions, 10.0, false, &cfg, 30.0, 300, 16_000, 160_000).unwrap();
        let sum_dur: f64 = segs.iter().map(|s| s.dur).sum();
        let sum_new: f64 = segs.iter().map(|s| s.new_dur).sum();
        assert!(sum_new <= sum_dur + 1e-9);
    }

    #[test]
    fn config_invalid_when_transform_exceeds_duration() {
        let regions = vec![SilenceRegion { start_s: 1.0, end_s: 2.0 }];
        let cfg = TransformConfig { constant: 100.0, sublinear: 0.0, linear: 0.0 };
        let err = plan(&regions, 5.0, false, &cfg, 30.0, 150, 16_000, 80_000).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid(_)));
    }

    #[test]
    fn audio_frame_total_within_one_of_target() {
        let regions = vec![
            SilenceRegion { start_s: 1.0, end_s: 3.3 },
            SilenceRegion { start_s: 5.0, end_s: 5.6 },
        ];
        let cfg = TransformConfig::default();
        let f_a = 16_000.0;
        let n_a = (10.0 * f_a) as u64;
        let segs = plan(&regions, 10.0, false, &cfg, 30.0, 300, f_a, n_a).unwrap();
        let total_new_dur: f64 = segs.iter().map(|s| s.new_dur).sum();
        let total_k_a: u64 = segs.iter().map(|s| s.k_a).sum();
        let target = (total_new_dur * f_a).round() as i64;
        assert!((total_k_a as i64 - target).abs() <= 1);
    }
}
