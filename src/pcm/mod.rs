//! Frame-indexed PCM audio: interleaved signed little-endian
//! samples, any channel count, `sample_width` in `{1, 2, 3, 4}` bytes.
//!
//! The detector streams forward over a `PcmSource`; the splicer seeks it
//! freely to random-access the PCM stream. Both needs are met by requiring
//! `Read + Seek`, which in practice is either a temp file the demuxer wrote
//! or an in-memory `Cursor<Vec<u8>>` (what `pcm::wav` hands back).

pub mod wav;

use std::io::{self, Read, Seek, SeekFrom};

use crate::sample;

/// Format of a PCM audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    pub frame_rate: u32,
    pub channels: u16,
    pub sample_width: u8,
    pub frame_count: u64,
}

impl AudioSpec {
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.sample_width as usize
    }

    pub fn duration_s(&self) -> f64 {
        self.frame_count as f64 / self.frame_rate as f64
    }
}

/// A seekable, frame-addressable PCM source.
pub struct PcmSource<R> {
    pub spec: AudioSpec,
    reader: R,
    /// Byte offset of frame 0 within `reader` (lets the backing store carry
    /// a header, e.g. when reading straight off a WAV file handle).
    data_offset: u64,
}

impl<R: Read + Seek> PcmSource<R> {
    pub fn new(reader: R, spec: AudioSpec, data_offset: u64) -> Self {
        PcmSource {
            spec,
            reader,
            data_offset,
        }
    }

    fn seek_frame(&mut self, frame_idx: u64) -> io::Result<()> {
        let byte_off = self.data_offset + frame_idx * self.spec.frame_bytes() as u64;
        self.reader.seek(SeekFrom::Start(byte_off))?;
        Ok(())
    }

    /// Read `count` consecutive frames starting at `start`, as raw
    /// interleaved bytes (`count * frame_bytes()` long).
    pub fn read_frames(&mut self, start: u64, count: u64) -> io::Result<Vec<u8>> {
        self.seek_frame(start)?;
        let mut buf = vec![0u8; count as usize * self.spec.frame_bytes()];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// `Σ_c s_{i,c}²` for the frame at byte offset `frame_bytes[frame*fb..]`.
    pub fn squared_sum(&self, frame: &[u8]) -> i64 {
        squared_sum(frame, self.spec.channels, self.spec.sample_width)
    }
}

/// `Σ_c s_{i,c}²` over one interleaved frame.
pub fn squared_sum(frame: &[u8], channels: u16, sample_width: u8) -> i64 {
    let w = sample_width as usize;
    (0..channels as usize)
        .map(|c| {
            let v = sample::read_sample(&frame[c * w..(c + 1) * w], sample_width);
            v * v
        })
        .sum()
}

/// A frame-at-a-time PCM sink (output audio stream).
pub struct PcmSink<W> {
    pub spec: AudioSpec,
    writer: W,
}

impl<W: io::Write> PcmSink<W> {
    pub fn new(writer: W, spec: AudioSpec) -> Self {
        PcmSink { spec, writer }
    }

    pub fn write_frames(&mut self, bytes: &[u8]) -> io::Result<()> {
        debug_assert_eq!(bytes.len() % self.spec.frame_bytes(), 0);
        self.writer.write_all(bytes)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
