//! Orchestration: wires C1-C7 into a single forward pass over one file.
//! One function that calls the components in order and logs milestones at
//! each stage of the retime/splice/rewrite pipeline.

use std::collections::BTreeSet;
use std::io::{Read, Seek, Write};
use std::path::Path;

use crate::audio;
use crate::config::EngineConfig;
use crate::detector::{self, SilenceRegion};
use crate::error::Result;
use crate::pcm::{PcmSink, PcmSource};
use crate::timecode;
use crate::timeline::{self, PlannedSegment};
use crate::video::{self, VideoSpec};

/// What a run produced. `NothingToDo` is not an error — when no silence is
/// found the caller should leave the input untouched rather than write a
/// byte-identical copy.
#[derive(Debug)]
pub enum RunOutcome {
    NothingToDo,
    Processed(RunReport),
}

#[derive(Debug)]
pub struct RunReport {
    pub silence_regions: Vec<SilenceRegion>,
    pub segments: Vec<PlannedSegment>,
    pub video_frames_emitted: u64,
    pub audio_frames_emitted: u64,
}

/// Run the full pipeline once over one file's worth of decoded streams.
///
/// `video_reader`/`video_writer` are the decoder's stdout / encoder's stdin
/// (a serial byte stream); `audio_source` is the seekable demuxed PCM;
/// `audio_sink` receives the retimed audio. `description_path` in `config`,
/// if set, is retimed and written to a sibling `_result` path.
#[allow(clippy::too_many_arguments)]
pub fn run<VR, VW, AR, AW>(
    video_reader: &mut VR,
    video_writer: &mut VW,
    video_spec: VideoSpec,
    audio_source: &mut PcmSource<AR>,
    audio_sink: &mut PcmSink<AW>,
    config: &EngineConfig,
) -> Result<RunOutcome>
where
    VR: Read,
    VW: Write,
    AR: Read + Seek,
    AW: Write,
{
    log::info!("starting retime pipeline: {} audio frames, {} video frames", audio_source.spec.frame_count, video_spec.frame_count);

    let mut save_buf: Vec<u8> = Vec::new();
    let mut capture_silence = |bytes: &[u8]| -> Result<()> {
        save_buf.extend_from_slice(bytes);
        Ok(())
    };
    let save_sink: Option<&mut dyn FnMut(&[u8]) -> Result<()>> =
        if config.save_silence.is_some() { Some(&mut capture_silence) } else { None };

    let (regions, including_end) = detector::detect_silences(audio_source, &config.detector, save_sink)?;
    log::info!("detected {} silence region(s)", regions.len());

    if regions.is_empty() {
        log::info!("nothing to do, skipping output");
        return Ok(RunOutcome::NothingToDo);
    }

    if let Some(path) = &config.save_silence {
        let spec = audio_source.spec;
        log::debug!("writing {} captured silent frames to {path}", save_buf.len() / spec.frame_bytes().max(1));
        crate::pcm::wav::save(Path::new(path), spec, &save_buf)?;
    }

    let duration = audio_source.spec.duration_s();
    let segments = timeline::plan(
        &regions,
        duration,
        including_end,
        &config.transform,
        video_spec.frame_rate,
        video_spec.frame_count,
        audio_source.spec.frame_rate as f64,
        audio_source.spec.frame_count,
    )?;
    log::info!("planned {} segment(s)", segments.len());

    let frame_bytes = video_spec.frame_bytes();
    let mut video_frames_emitted = 0u64;
    let mut audio_frames_emitted = 0u64;

    for seg in &segments {
        let keep: BTreeSet<u64> = if seg.k_v == seg.v1 - seg.v0 {
            (seg.v0..seg.v1).collect()
        } else {
            video::select_frame_indices(seg.v0, seg.v1, seg.k_v).into_iter().collect()
        };
        video::forward_segment(video_reader, video_writer, frame_bytes, seg.v0, seg.v1, &keep)?;
        video_frames_emitted += seg.k_v;

        let audio_bytes = audio::splice(audio_source, seg.a0, seg.a1, seg.k_a)?;
        audio_sink.write_frames(&audio_bytes)?;
        audio_frames_emitted += seg.k_a;

        log::debug!(
            "segment [{:.3},{:.3}) silence={} -> v:{} a:{}",
            seg.t0, seg.t1, seg.is_silence, seg.k_v, seg.k_a
        );
    }

    video::expect_exhausted(video_reader, frame_bytes, video_spec.frame_count)?;

    if let Some(desc_path) = &config.recalculate_time_in_description {
        rewrite_description(Path::new(desc_path), &segments)?;
    }

    log::info!("pipeline completed: {video_frames_emitted} video frames, {audio_frames_emitted} audio frames");

    Ok(RunOutcome::Processed(RunReport {
        silence_regions: regions,
        segments,
        video_frames_emitted,
        audio_frames_emitted,
    }))
}

/// Read `path`, retime its `H:MM:SS` tokens, and write the
/// result to a sibling path with `_result` inserted before the extension.
fn rewrite_description(path: &Path, segments: &[PlannedSegment]) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    let rewritten = timecode::rewrite(&text, segments);

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("description");
    let ext = path.extension().and_then(|s| s.to_str());
    let out_name = match ext {
        Some(ext) => format!("{stem}_result.{ext}"),
        None => format!("{stem}_result"),
    };
    let out_path = path.with_file_name(out_name);
    log::info!("writing retimed description to {}", out_path.display());
    std::fs::write(out_path, rewritten)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcm::AudioSpec;
    use std::io::Cursor;

    fn silent_audio_source(seconds: f64, frame_rate: u32) -> PcmSource<Cursor<Vec<u8>>> {
        let frame_count = (seconds * frame_rate as f64) as u64;
        let raw = vec![0u8; frame_count as usize * 2];
        let spec = AudioSpec { frame_rate, channels: 1, sample_width: 2, frame_count };
        PcmSource::new(Cursor::new(raw), spec, 0)
    }

    fn sine_audio_source(seconds: f64, frame_rate: u32) -> PcmSource<Cursor<Vec<u8>>> {
        let frame_count = (seconds * frame_rate as f64) as usize;
        let mut raw = Vec::with_capacity(frame_count * 2);
        for i in 0..frame_count {
            let t = i as f64 / frame_rate as f64;
            let v = (8000.0 * (2.0 * std::f64::consts::PI * 1000.0 * t).sin()) as i16;
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let spec = AudioSpec { frame_rate, channels: 1, sample_width: 2, frame_count: frame_count as u64 };
        PcmSource::new(Cursor::new(raw), spec, 0)
    }

    #[test]
    fn all_silence_run_compresses_and_reports() {
        let mut audio_source = silent_audio_source(10.0, 16_000);
        let video_spec = VideoSpec::new(30.0, 300, 4, 4);
        let mut video_in = Cursor::new(vec![7u8; 300 * video_spec.frame_bytes()]);
        let mut video_out = Vec::new();
        let out_spec = audio_source.spec;
        let mut audio_sink = PcmSink::new(Vec::new(), out_spec);

        let config = EngineConfig::default();
        let outcome = run(&mut video_in, &mut video_out, video_spec, &mut audio_source, &mut audio_sink, &config).unwrap();

        match outcome {
            RunOutcome::Processed(report) => {
                assert_eq!(report.silence_regions.len(), 1);
                assert!(report.video_frames_emitted < 300);
                assert!(report.audio_frames_emitted < 160_000);
            }
            RunOutcome::NothingToDo => panic!("expected a processed run"),
        }
    }

    #[test]
    fn no_silence_is_nothing_to_do() {
        let mut audio_source = sine_audio_source(5.0, 16_000);
        let video_spec = VideoSpec::new(30.0, 150, 4, 4);
        let mut video_in = Cursor::new(vec![7u8; 150 * video_spec.frame_bytes()]);
        let mut video_out = Vec::new();
        let out_spec = audio_source.spec;
        let mut audio_sink = PcmSink::new(Vec::new(), out_spec);

        let config = EngineConfig::default();
        let outcome = run(&mut video_in, &mut video_out, video_spec, &mut audio_source, &mut audio_sink, &config).unwrap();

        assert!(matches!(outcome, RunOutcome::NothingToDo));
        assert!(video_out.is_empty());
    }
}
