//! C6 — Time-code Rewriter: retimes `H:MM:SS` tokens in an
//! external text against the planned segment list.

use regex::Regex;
use std::sync::OnceLock;

use crate::timeline::PlannedSegment;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+):(\d\d):(\d\d)").unwrap())
}

/// Rewrite every `H:MM:SS` token in `text` to reference the re-timed
/// timeline described by `segments`. Tokens outside every segment are left
/// unchanged — best effort only.
pub fn rewrite(text: &str, segments: &[PlannedSegment]) -> String {
    let re = token_re();

    // current_position(s) for each segment: running sum of new_dur up to
    // (not including) that segment.
    let mut positions = Vec::with_capacity(segments.len());
    let mut running = 0.0;
    for s in segments {
        positions.push(running);
        running += s.new_dur;
    }

    // Collect (old_token, new_value_seconds) pairs, deduplicated by token.
    let mut mapped: Vec<(String, i64)> = Vec::new();
    for cap in re.captures_iter(text) {
        let token = cap[0].to_string();
        if mapped.iter().any(|(t, _)| *t == token) {
            continue;
        }
        let h: f64 = cap[1].parse().unwrap_or(0.0);
        let m: f64 = cap[2].parse().unwrap_or(0.0);
        let s: f64 = cap[3].parse().unwrap_or(0.0);
        let t_value = h * 3600.0 + m * 60.0 + s;

        if let Some((idx, seg)) = segments.iter().enumerate().find(|(_, seg)| seg.t0 <= t_value && t_value < seg.t1) {
            if seg.dur > 0.0 {
                let new_value = positions[idx] + (t_value - seg.t0) / seg.dur * seg.new_dur;
                mapped.push((token, new_value.round() as i64));
            }
        }
    }

    // Apply in descending order of new value to avoid collisions between
    // tokens that map to the same replacement string.
    mapped.sort_by(|a, b| b.1.cmp(&a.1));

    let mut out = text.to_string();
    for (token, value) in mapped {
        let h = value / 3600;
        let m = (value / 60) % 60;
        let s = value % 60;
        let replacement = format!("{h}:{m:02}:{s:02}");
        out = out.replace(&token, &replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(t0: f64, t1: f64, new_dur: f64) -> PlannedSegment {
        PlannedSegment {
            t0,
            t1,
            is_silence: true,
            dur: t1 - t0,
            new_dur,
            v0: 0,
            v1: 0,
            a0: 0,
            a1: 0,
            k_v: 0,
            k_a: 0,
        }
    }

    #[test]
    fn rewrites_tokens_inside_a_compressed_segment() {
        // [0,10) speech, (10,40) silence compressed to 3s, [40,70) speech.
        let segments = vec![seg(0.0, 10.0, 10.0), seg(10.0, 40.0, 3.0), seg(40.0, 70.0, 30.0)];
        let text = "agenda: 0:00:30, 0:01:00";
        let result = rewrite(text, &segments);
        // 30s is 20s into the 30s silence -> 2s into its compressed 3s,
        // offset by the unchanged 10s that precede it: 12s.
        // 60s is past the silence entirely: offset by the 27s the silence
        // saved, landing at 33s.
        assert_eq!(result, "agenda: 0:00:12, 0:00:33");
    }

    #[test]
    fn tokens_outside_any_segment_are_untouched() {
        let segments = vec![seg(10.0, 40.0, 3.0)];
        let text = "see 0:05:00 for details";
        let result = rewrite(text, &segments);
        assert_eq!(result, text);
    }

    #[test]
    fn preserves_surrounding_bytes() {
        let segments = vec![seg(0.0, 10.0, 1.0)];
        let text = "  [0:00:05]  — main point\n";
        let result = rewrite(text, &segments);
        assert!(result.starts_with("  ["));
        assert!(result.ends_with("main point\n"));
    }
}
