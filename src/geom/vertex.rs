//! Packed vertex record layouts.
//!
//! All known layouts share a common prefix and differ only in what sits
//! between the normal and the texture coordinate:
//!
//! ```text
//! 0   position   3 x half
//! 6   pad        2 bytes
//! 8   normal     3 x f32 LE
//! 20  ...        skin indices/weights, reserved words
//! uv  texcoord   2 x half
//! ```

use crate::util::binary::{read_half, read_vec3};
use crate::util::{Endian, Result, Vec2, Vec3};

const POSITION_OFFSET: usize = 0;
const NORMAL_OFFSET: usize = 8;

/// Strides with a known field layout.
pub const KNOWN_STRIDES: [usize; 7] = [24, 28, 32, 36, 40, 44, 48];

/// One decoded vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    /// Unit length, or zero if the stored normal was degenerate.
    pub normal: Vec3,
    /// V already flipped to a top-left image origin.
    pub texcoord: Vec2,
}

/// Field layout selected by record stride.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: usize,
    pub texcoord_offset: usize,
}

impl VertexLayout {
    /// Layout for a stride, or `None` if the stride is not understood.
    pub fn for_stride(stride: usize) -> Option<Self> {
        let texcoord_offset = match stride {
            24 | 28 => 20,
            // skin indices and weights
            32 => 28,
            // three reserved words
            36 | 40 => 32,
            // reserved words and skin
            44 => 40,
            48 => 44,
            _ => return None,
        };
        Some(Self {
            stride,
            texcoord_offset,
        })
    }

    /// Decode the record starting at `offset`.
    pub fn decode(&self, bytes: &[u8], offset: usize) -> Result<Vertex> {
        let p = offset + POSITION_OFFSET;
        let position = Vec3::new(
            read_half(bytes, p)?,
            read_half(bytes, p + 2)?,
            read_half(bytes, p + 4)?,
        );
        let normal = read_vec3(bytes, offset + NORMAL_OFFSET, Endian::Little)?;
        let t = offset + self.texcoord_offset;
        let u = read_half(bytes, t)?;
        let v = read_half(bytes, t + 2)?;

        Ok(Vertex {
            position,
            normal: normal.normalize_or_zero(),
            texcoord: Vec2::new(u, 1.0 - v),
        })
    }
}

/// Decode one vertex of the given stride.
///
/// Returns `Ok(None)` for an unrecognized stride so callers can drop the
/// vertex and keep going.
pub fn decode_vertex(bytes: &[u8], offset: usize, stride: usize) -> Result<Option<Vertex>> {
    match VertexLayout::for_stride(stride) {
        Some(layout) => layout.decode(bytes, offset).map(Some),
        None => Ok(None),
    }
}
