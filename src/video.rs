//! C4 — Video Frame Selector: picks which decoded frames of a
//! silence segment survive into the output, forwarding a non-silence
//! segment untouched.

use std::collections::BTreeSet;
use std::io::{Read, Write};

use crate::error::{EngineError, Result};

/// Shape of a raw RGB24 video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSpec {
    pub frame_rate: f64,
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
}

impl VideoSpec {
    pub fn new(frame_rate: f64, frame_count: u64, width: u32, height: u32) -> Self {
        VideoSpec { frame_rate, frame_count, width, height }
    }

    /// Build a spec from `duration_s` plus whichever of `frame_count` or
    /// `probed_frame_rate` the caller could actually determine. When a
    /// frame count is known, the frame rate is derived from it
    /// (`frame_count / duration_s`); a directly-probed frame rate is used
    /// only as a fallback, with the frame count derived from it instead.
    /// Fails if neither is available.
    pub fn from_duration(
        duration_s: f64,
        frame_count: Option<u64>,
        probed_frame_rate: Option<f64>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        match (frame_count, probed_frame_rate) {
            (Some(frame_count), _) => Ok(VideoSpec { frame_rate: frame_count as f64 / duration_s, frame_count, width, height }),
            (None, Some(frame_rate)) => {
                let frame_count = (duration_s * frame_rate).round() as u64;
                Ok(VideoSpec { frame_rate, frame_count, width, height })
            }
            (None, None) => Err(EngineError::ConfigInvalid(
                "need either a known frame count or a probed frame rate to build a VideoSpec".to_string(),
            )),
        }
    }

    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Evenly-spaced, centered frame indices to keep out of `[start_frame,
/// end_frame)` so that exactly `k` frames survive. `k` must be
/// `<= end_frame - start_frame`.
pub fn select_frame_indices(start_frame: u64, end_frame: u64, k: u64) -> Vec<u64> {
    if k == 0 {
        return Vec::new();
    }
    let span = end_frame - start_frame;
    debug_assert!(k <= span, "k={k} must not exceed span={span}");
    (0..k)
        .map(|j| start_frame + ((j as f64 + 0.5) * span as f64 / k as f64).floor() as u64)
        .collect()
}

/// Read one segment's worth of raw RGB24 frames from `reader` (the
/// decoder's byte stream, positioned at `start_frame`) and forward only the
/// frames at `keep` indices to `writer` (the encoder's stdin).
///
/// Every frame in `[start_frame, end_frame)` is read from the decoder
/// regardless of whether it's kept — the decoder is a serial byte stream
/// and can't be skipped over.
pub fn forward_segment<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    frame_bytes: usize,
    start_frame: u64,
    end_frame: u64,
    keep: &BTreeSet<u64>,
) -> Result<()> {
    let mut buf = vec![0u8; frame_bytes];
    for frame_index in start_frame..end_frame {
        let got = read_frame(reader, &mut buf)?;
        if got != frame_bytes {
            return Err(EngineError::VideoUnderrun { frame_index, expected: frame_bytes, got });
        }
        if keep.contains(&frame_index) {
            writer.write_all(&buf)?;
        }
    }
    Ok(())
}

/// Confirm the decoder stream has nothing left after the last planned
/// segment. A full extra frame means the decoder produced more than
/// `expected` frames for this file.
pub fn expect_exhausted<R: Read>(reader: &mut R, frame_bytes: usize, expected: u64) -> Result<()> {
    let mut buf = vec![0u8; frame_bytes];
    let got = read_frame(reader, &mut buf)?;
    if got == frame_bytes {
        return Err(EngineError::VideoOverrun { expected });
    }
    Ok(())
}

/// Read up to `buf.len()` bytes, returning how many were actually read
/// (short of a full frame at EOF is the caller's problem, not an I/O
/// error).
fn read_frame<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}
