//! Signed little-endian PCM sample packing for arbitrary bit depths
//! (`sample_width ∈ {1, 2, 3, 4}`).

use byteorder::{ByteOrder, LittleEndian};

/// Largest representable magnitude for a signed sample of `width` bytes,
/// i.e. `2^(8*width - 1)`.
pub fn max_value(width: u8) -> i64 {
    1i64 << (8 * width as u32 - 1)
}

/// Decode one signed little-endian sample from `bytes` (exactly `width`
/// bytes long).
pub fn read_sample(bytes: &[u8], width: u8) -> i64 {
    debug_assert_eq!(bytes.len(), width as usize);
    LittleEndian::read_int(bytes, width as usize)
}

/// Encode `value` as a signed little-endian sample of `width` bytes,
/// saturating to the representable range `[-max_value, max_value-1]` first.
pub fn write_sample(out: &mut [u8], value: i64, width: u8) {
    debug_assert_eq!(out.len(), width as usize);
    let clamped = clamp(value, width);
    LittleEndian::write_int(out, clamped, width as usize);
}

/// Saturate `value` to `[-max_value, max_value-1]` for the given width.
pub fn clamp(value: i64, width: u8) -> i64 {
    let max = max_value(width);
    value.clamp(-max, max - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_value_widths() {
        assert_eq!(max_value(1), 128);
        assert_eq!(max_value(2), 32768);
        assert_eq!(max_value(3), 8_388_608);
        assert_eq!(max_value(4), 2_147_483_648);
    }

    #[test]
    fn roundtrip_16bit() {
        let mut buf = [0u8; 2];
        write_sample(&mut buf, -1234, 2);
        assert_eq!(read_sample(&buf, 2), -1234);
    }

    #[test]
    fn roundtrip_24bit() {
        let mut buf = [0u8; 3];
        write_sample(&mut buf, -8_000_000, 3);
        assert_eq!(read_sample(&buf, 3), -8_000_000);
    }

    #[test]
    fn clamp_saturates() {
        assert_eq!(clamp(100_000, 2), 32767);
        assert_eq!(clamp(-100_000, 2), -32768);
    }
}
