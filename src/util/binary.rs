//! Endian-aware primitive readers.
//!
//! Container headers are big-endian while most payloads are little-endian,
//! so every reader takes the byte order per call instead of baking it in.
//! All readers are bounds-checked and report [`Error::UnexpectedEof`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use glam::Vec3;

use crate::util::{Error, Result};

/// Byte order of a single read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Borrow `len` bytes at `offset`, or fail with `UnexpectedEof`.
#[inline]
pub fn slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(Error::UnexpectedEof { offset, len })
}

/// Read a single byte.
#[inline]
pub fn read_u8(bytes: &[u8], offset: usize) -> Result<u8> {
    bytes
        .get(offset)
        .copied()
        .ok_or(Error::UnexpectedEof { offset, len: 1 })
}

macro_rules! endian_reader {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $size:expr, $read:ident) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(bytes: &[u8], offset: usize, endian: Endian) -> Result<$ty> {
            let b = slice(bytes, offset, $size)?;
            Ok(match endian {
                Endian::Little => LittleEndian::$read(b),
                Endian::Big => BigEndian::$read(b),
            })
        }
    };
}

endian_reader!(/// Read a `u16`.
    read_u16, u16, 2, read_u16);
endian_reader!(/// Read an `i16`.
    read_i16, i16, 2, read_i16);
endian_reader!(/// Read a `u32`.
    read_u32, u32, 4, read_u32);
endian_reader!(/// Read an `i32`.
    read_i32, i32, 4, read_i32);
endian_reader!(/// Read a `u64`.
    read_u64, u64, 8, read_u64);
endian_reader!(/// Read an `i64`.
    read_i64, i64, 8, read_i64);
endian_reader!(/// Read an IEEE-754 `f32`.
    read_f32, f32, 4, read_f32);
endian_reader!(/// Read an IEEE-754 `f64`.
    read_f64, f64, 8, read_f64);

/// Read three consecutive `f32` values as a vector.
pub fn read_vec3(bytes: &[u8], offset: usize, endian: Endian) -> Result<Vec3> {
    Ok(Vec3::new(
        read_f32(bytes, offset, endian)?,
        read_f32(bytes, offset + 4, endian)?,
        read_f32(bytes, offset + 8, endian)?,
    ))
}

/// Exponent field value reserved for infinities and NaN.
const HALF_SPECIAL_EXPONENT: u32 = 0b0011_1111;

/// Decode the format's 16-bit float.
///
/// This is not IEEE binary16: bit 15 is the sign, bits 9..=14 hold a 6-bit
/// exponent biased by 31 and bits 0..=8 a 9-bit mantissa. Exponent 63 encodes
/// infinity (zero mantissa) or NaN. Every other exponent goes through the
/// normal path, including zero; asset data relies on that.
pub fn decode_half(bits: u16) -> f32 {
    let hi = (bits >> 8) as u32;
    let exponent = (hi & 0b0111_1110) >> 1;
    let mantissa = (bits as u32) & 0x01FF;
    let negative = hi & 0x80 != 0;

    if exponent == HALF_SPECIAL_EXPONENT {
        return match (mantissa, negative) {
            (0, false) => f32::INFINITY,
            (0, true) => f32::NEG_INFINITY,
            _ => f32::NAN,
        };
    }

    let exponent = exponent.wrapping_sub(31).wrapping_add(127);
    let sign = (hi & 0x80) << 24;
    f32::from_bits(sign | (exponent << 23) | (mantissa << 14))
}

/// Read a little-endian 16-bit format float.
#[inline]
pub fn read_half(bytes: &[u8], offset: usize) -> Result<f32> {
    read_u16(bytes, offset, Endian::Little).map(decode_half)
}

/// Unpack three 10-bit unsigned-normalized fields from a 32-bit word.
///
/// Bits 0..=9 are X, 10..=19 Y and 20..=29 Z; each maps to `[0, 1]`.
#[inline]
pub fn unpack_unorm10(word: u32) -> Vec3 {
    const MASK: u32 = 0x3FF;
    Vec3::new(
        (word & MASK) as f32 / 1023.0,
        ((word >> 10) & MASK) as f32 / 1023.0,
        ((word >> 20) & MASK) as f32 / 1023.0,
    )
}

/// Read a NUL-terminated single-byte string starting at `offset`.
///
/// Bytes map to chars one-to-one; a missing terminator reads to the end.
pub fn read_cstring(bytes: &[u8], offset: usize) -> Result<String> {
    let tail = bytes
        .get(offset..)
        .ok_or(Error::UnexpectedEof { offset, len: 1 })?;
    Ok(tail
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect())
}
