//! C1 — Silence Detector.
//!
//! Streams a PCM audio source through a centered sliding-window RMS gate
//! and returns the silence regions it finds. The window at frame `i` is
//! simply `[i-H, i+H+1)` clamped to `[0, N)` — the separate warm-up,
//! steady-state, and cool-down divisor cases all fall out of that one
//! clamp, so this implementation doesn't special-case them.

use std::collections::VecDeque;
use std::io::{Read, Seek};

use crate::config::DetectorConfig;
use crate::error::{EngineError, Result};
use crate::pcm::{self, AudioSpec, PcmSource};

/// A silence region, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceRegion {
    pub start_s: f64,
    pub end_s: f64,
}

/// Detect silence regions in `source`, optionally mirroring the raw silent
/// frame ranges to `save_silence`.
///
/// Returns `(regions, including_end)`. Fails with `InvalidAudio` if the
/// stream is too short for even one blend window.
pub fn detect_silences<R: Read + Seek>(
    source: &mut PcmSource<R>,
    config: &DetectorConfig,
    mut save_silence: Option<&mut dyn FnMut(&[u8]) -> Result<()>>,
) -> Result<(Vec<SilenceRegion>, bool)> {
    let spec: AudioSpec = source.spec;
    let n = spec.frame_count;
    let half_blend_frames = (config.blend_duration_s * spec.frame_rate as f64 / 2.0).round() as u64;
    let blend_frames = half_blend_frames * 2;

    if n <= blend_frames {
        return Err(EngineError::InvalidAudio {
            reason: format!(
                "audio has {n} frames, need more than {blend_frames} (2*half_blend_frames) for a blend window"
            ),
            offset: 0,
        });
    }

    let max_val = crate::sample::max_value(spec.sample_width) as f64;
    let threshold_mean = max_val * max_val * 10f64.powf(config.threshold_level_db / 10.0);
    let channels = spec.channels as i128;

    // Stream frame-by-frame: the window deque never holds more than
    // `blend_frames + 1` squares, so peak memory is O(blend window), not
    // O(whole file). Runs are collected as a state machine over the stream
    // rather than materializing a per-frame silence flag array.
    let mut window: VecDeque<i64> = VecDeque::new();
    let mut window_sum: i128 = 0;
    let mut next_push: u64 = 0;
    let mut next_pop: u64 = 0;
    let mut raw_runs: Vec<(u64, u64)> = Vec::new();
    let mut run_start: Option<u64> = None;

    for i in 0..n {
        let hi = (i + half_blend_frames + 1).min(n);
        while next_push < hi {
            let frame = source.read_frames(next_push, 1)?;
            let sq = pcm::squared_sum(&frame, spec.channels, spec.sample_width);
            window.push_back(sq);
            window_sum += sq as i128;
            next_push += 1;
        }
        let lo = i.saturating_sub(half_blend_frames);
        while next_pop < lo {
            let sq = window.pop_front().expect("window non-empty while next_pop < next_push");
            window_sum -= sq as i128;
            next_pop += 1;
        }
        let divisor = channels * (hi - lo) as i128;
        let silent = (window_sum as f64) < threshold_mean * divisor as f64;

        match (silent, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(s)) => {
                raw_runs.push((s, i));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = run_start {
        raw_runs.push((s, n));
    }

    // Drop runs shorter than `blend_frames` (frames), not `blend_duration`
    // (seconds) — comparing against a duration here would silently keep
    // runs that are too short once frame rate enters the picture.
    let runs: Vec<(u64, u64)> = raw_runs.into_iter().filter(|(s, e)| e - s >= blend_frames).collect();

    // Inset by H on any edge not touching a file boundary, so the
    // crossfade tails feeding into this silence aren't themselves counted.
    let insetted: Vec<(u64, u64)> = runs
        .into_iter()
        .map(|(s, e)| {
            let s = if s > 0 { s + half_blend_frames } else { s };
            let e = if e < n { e.saturating_sub(half_blend_frames) } else { e };
            (s, e)
        })
        .filter(|(s, e)| e > s)
        .collect();

    let threshold_frames = (config.threshold_duration_s * spec.frame_rate as f64).round() as u64;
    let final_regions: Vec<(u64, u64)> = insetted
        .into_iter()
        .filter(|(s, e)| e - s >= threshold_frames)
        .collect();

    let including_end = final_regions.is_empty() || final_regions.last().unwrap().1 == n;

    if let Some(sink) = save_silence.as_mut() {
        for &(s, e) in &final_regions {
            let bytes = source.read_frames(s, e - s)?;
            sink(&bytes)?;
        }
    }

    let regions = final_regions
        .into_iter()
        .map(|(s, e)| SilenceRegion {
            start_s: s as f64 / spec.frame_rate as f64,
            end_s: e as f64 / spec.frame_rate as f64,
        })
        .collect();

    Ok((regions, including_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_source(samples: &[i16], frame_rate: u32) -> PcmSource<Cursor<Vec<u8>>> {
        let mut raw = Vec::with_capacity(samples.len() * 2);
        for &s in samples {
            raw.extend_from_slice(&s.to_le_bytes());
        }
        let spec = AudioSpec {
            frame_rate,
            channels: 1,
            sample_width: 2,
            frame_count: samples.len() as u64,
        };
        PcmSource::new(Cursor::new(raw), spec, 0)
    }

    #[test]
    fn all_silence_10s_at_16khz() {
        let n = 160_000;
        let samples = vec![0i16; n];
        let mut src = make_source(&samples, 16_000);
        let cfg = DetectorConfig::default();
        let (regions, including_end) = detect_silences(&mut src, &cfg, None).unwrap();
        assert_eq!(regions.len(), 1);
        assert!((regions[0].start_s - 0.0).abs() < 1e-9);
        assert!((regions[0].end_s - 10.0).abs() < 1e-6);
        assert!(including_end);
    }

    #[test]
    fn loud_sine_has_no_silence() {
        let n = 16_000 * 5;
        let samples: Vec<i16> = (0..n)
            .map(|i| {
                let t = i as f64 / 16_000.0;
                (8000.0 * (2.0 * std::f64::consts::PI * 1000.0 * t).sin()) as i16
            })
            .collect();
        let mut src = make_source(&samples, 16_000);
        let cfg = DetectorConfig::default();
        let (regions, _) = detect_silences(&mut src, &cfg, None).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn too_short_is_invalid_audio() {
        let samples = vec![0i16; 4];
        let mut src = make_source(&samples, 16_000);
        let cfg = DetectorConfig::default();
        assert!(detect_silences(&mut src, &cfg, None).is_err());
    }

    #[test]
    fn determinism() {
        let n = 16_000 * 3;
        let samples = vec![0i16; n];
        let cfg = DetectorConfig::default();
        let mut src1 = make_source(&samples, 16_000);
        let mut src2 = make_source(&samples, 16_000);
        let (r1, e1) = detect_silences(&mut src1, &cfg, None).unwrap();
        let (r2, e2) = detect_silences(&mut src2, &cfg, None).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(e1, e2);
    }

    #[test]
    fn transient_splits_silence() {
        // 3s silence, with a loud 0.3s burst in the middle.
        let mut samples = vec![0i16; 16_000 * 3];
        for s in samples.iter_mut().skip(16_000).take(16_000 / 3) {
            *s = 20_000;
        }
        let mut src = make_source(&samples, 16_000);
        let cfg = DetectorConfig::default();
        let (regions, _) = detect_silences(&mut src, &cfg, None).unwrap();
        // The transient should break one silence region into (at least) two.
        assert!(regions.len() >= 2, "expected split, got {regions:?}");
    }
}
