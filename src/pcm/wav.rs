//! WAV container adapter: load a `.wav` into an in-memory [`PcmSource`],
//! and write a [`PcmSource`]'s bytes back out as a `.wav`. The engine
//! itself only ever deals in raw frame bytes; container demuxing is
//! external, this is just a convenience for tests and the CLI.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{EngineError, Result};
use crate::pcm::{AudioSpec, PcmSource};
use crate::sample;

/// Load a PCM WAV file fully into memory as a seekable [`PcmSource`].
pub fn load(path: &Path) -> Result<PcmSource<Cursor<Vec<u8>>>> {
    let mut reader = WavReader::open(path)
        .map_err(|e| EngineError::InvalidAudio { reason: e.to_string(), offset: 0 })?;
    let wav_spec = reader.spec();
    let sample_width = (wav_spec.bits_per_sample / 8).max(1) as u8;
    let frame_count = reader.duration() as u64;

    let spec = AudioSpec {
        frame_rate: wav_spec.sample_rate,
        channels: wav_spec.channels,
        sample_width,
        frame_count,
    };

    let mut raw = Vec::with_capacity(frame_count as usize * spec.frame_bytes());
    let mut scratch = vec![0u8; spec.sample_width as usize];
    match wav_spec.sample_format {
        SampleFormat::Int => {
            for s in reader.samples::<i32>() {
                let s = s.map_err(|e| EngineError::InvalidAudio { reason: e.to_string(), offset: raw.len() as u64 })?;
                sample::write_sample(&mut scratch, s as i64, spec.sample_width);
                raw.extend_from_slice(&scratch);
            }
        }
        SampleFormat::Float => {
            for s in reader.samples::<f32>() {
                let s = s.map_err(|e| EngineError::InvalidAudio { reason: e.to_string(), offset: raw.len() as u64 })?;
                let v = (s as f64 * sample::max_value(spec.sample_width) as f64) as i64;
                sample::write_sample(&mut scratch, v, spec.sample_width);
                raw.extend_from_slice(&scratch);
            }
        }
    }

    Ok(PcmSource::new(Cursor::new(raw), spec, 0))
}

/// Write raw interleaved PCM frames out as a 16-bit-or-narrower integer
/// WAV file (the format hound can always losslessly represent for our
/// supported widths).
pub fn save(path: &Path, spec: AudioSpec, raw: &[u8]) -> Result<()> {
    let wav_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.frame_rate,
        bits_per_sample: spec.sample_width as u16 * 8,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, wav_spec)
        .map_err(|e| EngineError::EncoderFailed(e.to_string()))?;
    let w = spec.sample_width as usize;
    for frame in raw.chunks(spec.frame_bytes()) {
        for c in 0..spec.channels as usize {
            let v = sample::read_sample(&frame[c * w..(c + 1) * w], spec.sample_width);
            writer
                .write_sample(v as i32)
                .map_err(|e| EngineError::EncoderFailed(e.to_string()))?;
        }
    }
    writer
        .finalize()
        .map_err(|e| EngineError::EncoderFailed(e.to_string()))?;
    Ok(())
}
