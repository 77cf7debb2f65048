//! C7 — Drift Accountant: keeps audio in sync with video by carrying a
//! fractional-frame residue across segments.

/// Tracks `audio_residue ∈ [0, 1)` frames across the whole run. One
/// instance threads through the entire timeline; it is not reset per
/// segment.
#[derive(Debug, Default, Clone, Copy)]
pub struct DriftAccountant {
    audio_residue: f64,
}

impl DriftAccountant {
    pub fn new() -> Self {
        DriftAccountant { audio_residue: 0.0 }
    }

    pub fn residue(&self) -> f64 {
        self.audio_residue
    }

    /// Non-silence segments pass audio through untouched; residue is
    /// unchanged.
    pub fn account_passthrough(&self, available_a_frames: u64) -> u64 {
        available_a_frames
    }

    /// For a silence segment of original duration `dur` whose video side
    /// emitted `k_v` frames at rate `f_v`, compute how many of the
    /// `available_a_frames` audio frames to emit, updating the residue.
    ///
    /// `audio_delta = residue + (dur - k_v/f_v) * f_a`. The integer part is
    /// subtracted from the available span; the fractional part becomes the
    /// new residue. If the integer part would exceed the available span,
    /// `K_a` clamps to 0 and the overflow is folded into the residue
    /// instead of being dropped (dropping it would double-count on the
    /// next segment).
    pub fn account_silence(&mut self, dur: f64, k_v: u64, f_v: f64, f_a: f64, available_a_frames: u64) -> u64 {
        let audio_delta = self.audio_residue + (dur - k_v as f64 / f_v) * f_a;
        let delta_floor = audio_delta.floor();

        if delta_floor > available_a_frames as f64 {
            self.audio_residue = audio_delta - available_a_frames as f64;
            0
        } else {
            self.audio_residue = audio_delta - delta_floor;
            (available_a_frames as f64 - delta_floor).round() as u64
        }
    }
}
