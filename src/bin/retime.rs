//! CLI front end: wires `retime_engine` to real `ffmpeg`/`ffprobe`
//! subprocesses. This is glue, not engine code — container demuxing/muxing
//! and temp-file housekeeping are explicitly out of scope for the library.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use clap::Parser;
use retime_engine::{engine, pcm, EngineConfig, EngineError, PcmSink, VideoSpec};

#[derive(Parser)]
#[command(name = "retime", about = "Silence-aware audio/video retiming engine")]
struct Args {
    /// Input video file.
    video_path: String,
    /// Output video file.
    output_path: String,
    /// JSON config file. CLI flags below override it.
    #[arg(long)]
    config: Option<String>,
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,
    #[arg(long, default_value = "ffprobe")]
    ffprobe: String,
    /// Path to write silent audio ranges as a WAV file.
    #[arg(long)]
    save_silence: Option<String>,
    /// Text file whose `H:MM:SS` tokens should be retimed.
    #[arg(long)]
    description: Option<String>,
}

/// Best-effort cleanup of scratch files on every exit path, success or
/// failure.
struct TempFiles(Vec<PathBuf>);

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.0 {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("failed to remove temp file {}: {e}", path.display());
                }
            }
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("retime: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str::<EngineConfig>(&text)?
        }
        None => EngineConfig::default(),
    };
    if args.save_silence.is_some() {
        config.save_silence = args.save_silence.clone();
    }
    if args.description.is_some() {
        config.recalculate_time_in_description = args.description.clone();
    }

    let ffmpeg = Path::new(&args.ffmpeg);
    let ffprobe = Path::new(&args.ffprobe);

    let duration = get_video_duration(&args.video_path, ffprobe)?;
    let (width, height, probed_fps, probed_frame_count) = get_video_geometry(&args.video_path, ffprobe)?;
    log::info!(
        "video duration {:.2}s, {width}x{height}, probed rate {probed_fps:.3} fps, probed frame count {probed_frame_count:?}"
    );
    let video_spec = VideoSpec::from_duration(duration, probed_frame_count, Some(probed_fps), width, height)?;
    log::info!("using {:.3} fps, {} frames", video_spec.frame_rate, video_spec.frame_count);

    let temp_dir = std::env::temp_dir().join("retime-engine");
    std::fs::create_dir_all(&temp_dir)?;
    let extracted_audio = temp_dir.join("extracted_audio.wav");
    let retimed_audio = temp_dir.join("retimed_audio.wav");
    let temp_video = temp_dir.join("retimed_video.mp4");
    let temps = TempFiles(vec![extracted_audio.clone(), retimed_audio.clone(), temp_video.clone()]);

    extract_audio_to_wav(&args.video_path, &extracted_audio, ffmpeg)?;
    let mut audio_source = pcm::wav::load(&extracted_audio)?;
    let out_audio_spec = audio_source.spec;

    let mut decoder = Command::new(ffmpeg)
        .args(["-v", "quiet", "-i", args.video_path.as_str(), "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to start ffmpeg decoder: {e}"))?;
    let mut decoder_stdout = decoder.stdout.take().expect("decoder stdout piped");

    let size_arg = format!("{width}x{height}");
    let rate_arg = format!("{}", video_spec.frame_rate);
    let mut encoder = Command::new(ffmpeg)
        .args([
            "-v",
            "quiet",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            size_arg.as_str(),
            "-r",
            rate_arg.as_str(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-crf",
            "23",
            "-y",
            temp_video.to_str().expect("temp path is utf8"),
        ])
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to start ffmpeg encoder: {e}"))?;
    let mut encoder_stdin = encoder.stdin.take().expect("encoder stdin piped");

    let mut audio_sink = PcmSink::new(Vec::<u8>::new(), out_audio_spec);

    let outcome = engine::run(&mut decoder_stdout, &mut encoder_stdin, video_spec, &mut audio_source, &mut audio_sink, &config);

    // Drop the encoder's stdin before waiting, or ffmpeg blocks forever.
    drop(encoder_stdin);
    let decoder_status = decoder.wait()?;
    let encoder_status = encoder.wait()?;

    let outcome = outcome?;

    if !decoder_status.success() {
        return Err(EngineError::DecoderFailed("ffmpeg decoder exited with a failure status".to_string()).into());
    }

    let report = match outcome {
        engine::RunOutcome::NothingToDo => {
            log::info!("no silence found, copying input through unchanged");
            std::fs::copy(&args.video_path, &args.output_path)?;
            return Ok(());
        }
        engine::RunOutcome::Processed(report) => report,
    };

    if !encoder_status.success() {
        return Err(EngineError::EncoderFailed("ffmpeg encoder exited with a failure status".to_string()).into());
    }

    let audio_bytes = audio_sink.into_inner();
    pcm::wav::save(&retimed_audio, out_audio_spec, &audio_bytes)?;

    mux(&temp_video, &retimed_audio, &args.output_path, ffmpeg)?;

    log::info!(
        "done: {} silence region(s), {} video frames, {} audio frames",
        report.silence_regions.len(),
        report.video_frames_emitted,
        report.audio_frames_emitted
    );

    drop(temps);
    Ok(())
}

/// Extracts audio from a video file to WAV using FFmpeg.
fn extract_audio_to_wav(video_path: &str, out_path: &Path, ffmpeg_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("extracting audio from: {video_path}");

    let output = Command::new(ffmpeg_path)
        .args(["-v", "quiet", "-i", video_path, "-vn", "-acodec", "pcm_s16le", "-y", out_path.to_str().unwrap()])
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                "ffmpeg not found; ensure it is installed and on PATH".to_string()
            } else {
                format!("failed to execute ffmpeg: {e}")
            }
        })?;

    if !output.status.success() {
        return Err(format!("ffmpeg audio extraction failed: {}", String::from_utf8_lossy(&output.stderr)).into());
    }
    Ok(())
}

/// Gets the duration of a video file in seconds using ffprobe.
fn get_video_duration(video_path: &str, ffprobe_path: &Path) -> Result<f64, Box<dyn std::error::Error>> {
    let output = Command::new(ffprobe_path)
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1", video_path])
        .output()
        .map_err(|e| format!("failed to execute ffprobe: {e}"))?;

    if !output.status.success() {
        return Err(format!("ffprobe failed: {}", String::from_utf8_lossy(&output.stderr)).into());
    }
    let duration = String::from_utf8_lossy(&output.stdout).trim().parse::<f64>()?;
    Ok(duration)
}

/// Gets width, height, probed frame rate, and (if ffprobe can tell) the
/// frame count from the video's first stream. `nb_frames` is frequently
/// `"N/A"` for streams without an indexed frame count, in which case the
/// caller falls back to deriving it from the probed rate and duration.
fn get_video_geometry(video_path: &str, ffprobe_path: &Path) -> Result<(u32, u32, f64, Option<u64>), Box<dyn std::error::Error>> {
    let output = Command::new(ffprobe_path)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,nb_frames",
            "-of",
            "csv=p=0",
            video_path,
        ])
        .output()
        .map_err(|e| format!("failed to execute ffprobe: {e}"))?;

    if !output.status.success() {
        return Err(format!("ffprobe failed: {}", String::from_utf8_lossy(&output.stderr)).into());
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let mut fields = text.trim().split(',');
    let width: u32 = fields.next().ok_or("ffprobe: missing width")?.parse()?;
    let height: u32 = fields.next().ok_or("ffprobe: missing height")?.parse()?;
    let rate_str = fields.next().ok_or("ffprobe: missing frame rate")?;
    let fps = parse_frame_rate(rate_str)?;
    let frame_count = fields.next().and_then(|s| s.trim().parse::<u64>().ok());
    Ok((width, height, fps, frame_count))
}

/// `r_frame_rate` comes back as `"num/den"`.
fn parse_frame_rate(s: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let mut parts = s.trim().split('/');
    let num: f64 = parts.next().ok_or("malformed frame rate")?.parse()?;
    let den: f64 = parts.next().unwrap_or("1").parse()?;
    if den == 0.0 {
        return Err("frame rate denominator is zero".into());
    }
    Ok(num / den)
}

/// Combine the re-encoded, silence-free video track with the retimed audio
/// WAV into the final container. Container muxing is outside the engine
/// library's job, this is the CLI's.
fn mux(video_path: &Path, audio_path: &Path, output_path: &str, ffmpeg_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("muxing final output to {output_path}");
    let output = Command::new(ffmpeg_path)
        .args([
            "-v",
            "quiet",
            "-i",
            video_path.to_str().unwrap(),
            "-i",
            audio_path.to_str().unwrap(),
            "-c:v",
            "copy",
            "-c:a",
            "aac",
            "-shortest",
            "-y",
            output_path,
        ])
        .output()
        .map_err(|e| format!("failed to execute ffmpeg mux: {e}"))?;

    if !output.status.success() {
        return Err(format!("ffmpeg mux failed: {}", String::from_utf8_lossy(&output.stderr)).into());
    }
    Ok(())
}
