//! Block-compressed texture decoding.

use image::RgbaImage;

use crate::util::{Error, Result};

/// Block compression codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockCodec {
    /// 8 bytes per 4x4 block, colour only (DXT1).
    Bc1,
    /// 16 bytes per 4x4 block, interpolated alpha plus colour (DXT5).
    Bc3,
}

impl BlockCodec {
    /// Bytes per 4x4 block.
    pub fn block_size(self) -> usize {
        match self {
            Self::Bc1 => 8,
            Self::Bc3 => 16,
        }
    }

    /// Bytes needed for a `width x height` image, or `None` on overflow.
    pub fn compressed_size(self, width: u32, height: u32) -> Option<usize> {
        let blocks_x = usize::try_from(width.div_ceil(4)).ok()?;
        let blocks_y = usize::try_from(height.div_ceil(4)).ok()?;
        blocks_x.checked_mul(blocks_y)?.checked_mul(self.block_size())
    }
}

/// Expands block-compressed data into RGBA8 pixels.
pub trait BlockDecoder: Send + Sync {
    /// Decode `data` as a `width x height` image.
    fn decode(&self, codec: BlockCodec, data: &[u8], width: u32, height: u32) -> Result<RgbaImage>;
}

/// [`BlockDecoder`] backed by the `texture2ddecoder` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Texture2dDecoder;

impl BlockDecoder for Texture2dDecoder {
    fn decode(&self, codec: BlockCodec, data: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
        let needed = codec
            .compressed_size(width, height)
            .filter(|&n| n <= data.len())
            .ok_or_else(|| {
                Error::Decompress(format!("{:?} {}x{}: {} bytes is too short", codec, width, height, data.len()))
            })?;
        let (w, h) = (width as usize, height as usize);
        let data = &data[..needed];
        let mut pixels = vec![0u32; w * h];
        let decoded = match codec {
            BlockCodec::Bc1 => texture2ddecoder::decode_bc1(data, w, h, &mut pixels),
            BlockCodec::Bc3 => texture2ddecoder::decode_bc3(data, w, h, &mut pixels),
        };
        decoded.map_err(|e| Error::Decompress(format!("{:?} {}x{}: {}", codec, width, height, e)))?;

        // packed as b | g << 8 | r << 16 | a << 24
        let rgba: Vec<u8> = pixels
            .iter()
            .flat_map(|&p| {
                let [b, g, r, a] = p.to_le_bytes();
                [r, g, b, a]
            })
            .collect();
        RgbaImage::from_raw(width, height, rgba)
            .ok_or_else(|| Error::Decompress(format!("pixel buffer does not fit {}x{}", width, height)))
    }
}
