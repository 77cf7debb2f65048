//! C5 — Audio Resampler/Splicer: emits exactly `k_a` audio frames for a
//! segment, crossfading when the segment must shrink.

use std::io::{Read, Seek};

use crate::error::{EngineError, Result};
use crate::pcm::{AudioSpec, PcmSource};
use crate::sample;

/// Emit exactly `k_a` frames covering input span `[a0, a1)`. `k_a > a1-a0`
/// is a programmer error and fails with `AudioOverrun` rather than
/// panicking.
pub fn splice<R: Read + Seek>(source: &mut PcmSource<R>, a0: u64, a1: u64, k_a: u64) -> Result<Vec<u8>> {
    let span = a1 - a0;
    if k_a > span {
        return Err(EngineError::AudioOverrun { requested: k_a, available: span, offset: a0 });
    }
    if k_a == 0 {
        return Ok(Vec::new());
    }
    if k_a == span {
        return source.read_frames(a0, span).map_err(EngineError::from);
    }
    crossfade_splice(source, a0, span, k_a)
}

fn crossfade_splice<R: Read + Seek>(source: &mut PcmSource<R>, a0: u64, span: u64, k_a: u64) -> Result<Vec<u8>> {
    let spec: AudioSpec = source.spec;
    let frame_bytes = spec.frame_bytes();

    let (left_len, right_len) = if 2 * k_a <= span {
        (k_a, k_a)
    } else {
        let left_len = span.div_ceil(2);
        (left_len, span - left_len)
    };
    let crossfade_len = left_len + right_len - k_a;

    let left = source.read_frames(a0, left_len)?;
    let right = source.read_frames(a0 + span - right_len, right_len)?;

    let mut out = vec![0u8; k_a as usize * frame_bytes];

    let head_len = left_len - crossfade_len;
    out[..head_len as usize * frame_bytes].copy_from_slice(&left[..head_len as usize * frame_bytes]);

    let tail_len = right_len - crossfade_len;
    out[(head_len as usize + crossfade_len as usize) * frame_bytes..]
        .copy_from_slice(&right[crossfade_len as usize * frame_bytes..]);

    for i in 0..crossfade_len {
        let (w_left, w_right) = if crossfade_len == 1 {
            (0.5, 0.5)
        } else {
            let r = i as f64 / (crossfade_len - 1) as f64;
            (1.0 - r, r)
        };
        let left_frame = &left[(head_len + i) as usize * frame_bytes..(head_len + i) as usize * frame_bytes + frame_bytes];
        let right_frame = &right[i as usize * frame_bytes..i as usize * frame_bytes + frame_bytes];
        let out_frame = &mut out[(head_len + i) as usize * frame_bytes..(head_len + i) as usize * frame_bytes + frame_bytes];

        let w = spec.sample_width as usize;
        for c in 0..spec.channels as usize {
            let l = sample::read_sample(&left_frame[c * w..(c + 1) * w], spec.sample_width);
            let r = sample::read_sample(&right_frame[c * w..(c + 1) * w], spec.sample_width);
            let mixed = (l as f64 * w_left + r as f64 * w_right) as i64; // truncates toward zero
            sample::write_sample(&mut out_frame[c * w..(c + 1) * w], mixed, spec.sample_width);
        }
    }

    Ok(out)
}
