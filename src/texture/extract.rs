//! Embedded texture extraction.
//!
//! Terrain textures live inside container chunks in two framings:
//!
//! - albedo (`.xtt`): a 16-byte header (size, width, height as i32 BE) in
//!   front of a BC1 payload
//! - ambient occlusion and opacity (`.xtd`): bare single-channel blocks of
//!   4 bytes each, widened to BC3 and denoised on the way out

use image::{imageops, Rgba, RgbaImage};
use tracing::debug;

use super::block::{BlockCodec, BlockDecoder};
use crate::container::{ChunkDirectory, ChunkRecord, ChunkType};
use crate::util::binary::{read_i32, slice};
use crate::util::{to_channel, Endian, Error, Result};

/// Samples further than this from the block mean are ignored.
pub const DENOISE_THRESHOLD: f32 = 100.0;

const ALBEDO_HEADER_SIZE: usize = 16;

/// Location and framing of one compressed texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressedTextureRef {
    pub offset: usize,
    pub size: usize,
    pub width: u32,
    pub height: u32,
    pub codec: BlockCodec,
}

impl CompressedTextureRef {
    /// Albedo atlas framed by its size/width/height header.
    pub fn albedo(bytes: &[u8], chunk: &ChunkRecord) -> Result<Self> {
        let at = chunk.offset as usize;
        let dimension = |offset: usize, what: &str| -> Result<usize> {
            let v = read_i32(bytes, at + offset, Endian::Big)?;
            usize::try_from(v).map_err(|_| Error::malformed(format!("negative texture {}: {}", what, v)))
        };
        Ok(Self {
            offset: at + ALBEDO_HEADER_SIZE,
            size: dimension(0, "size")?,
            width: dimension(4, "width")? as u32,
            height: dimension(8, "height")? as u32,
            codec: BlockCodec::Bc1,
        })
    }

    /// Single-channel map spanning the whole chunk.
    ///
    /// The map is square and its side follows from the widened payload:
    /// `sqrt(size * 2)`.
    pub fn alpha(chunk: &ChunkRecord) -> Self {
        let size = chunk.size as usize;
        let side = ((size * 2) as f64).sqrt() as u32;
        Self {
            offset: chunk.offset as usize,
            size,
            width: side,
            height: side,
            codec: BlockCodec::Bc3,
        }
    }

    /// Check the dimensions against `available` compressed bytes.
    pub fn check_dimensions(&self, available: usize) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::malformed(format!("empty {}x{} texture", self.width, self.height)));
        }
        match self.codec.compressed_size(self.width, self.height) {
            Some(needed) if needed <= available => Ok(()),
            needed => Err(Error::malformed(format!(
                "{:?} texture {}x{} needs {} bytes, chunk holds {}",
                self.codec,
                self.width,
                self.height,
                needed.map_or_else(|| "too many".to_string(), |n| n.to_string()),
                available
            ))),
        }
    }

    /// Borrow the compressed payload.
    pub fn payload<'a>(&self, bytes: &'a [u8]) -> Result<&'a [u8]> {
        slice(bytes, self.offset, self.size)
    }
}

/// Widen every 4-byte group to 8 bytes by appending zeros.
///
/// A trailing partial group is zero padded.
pub fn reinterleave_alpha(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() * 2 + 8);
    for group in payload.chunks(4) {
        out.extend_from_slice(group);
        out.resize(out.len() + 8 - group.len(), 0);
    }
    out
}

/// Downsample each 4x4 block to one grey pixel.
///
/// The pixel is the mean alpha of the samples within [`DENOISE_THRESHOLD`]
/// of the block's plain mean, or the plain mean if none are.
pub fn denoise_alpha(image: &RgbaImage) -> RgbaImage {
    let (w, h) = (image.width() / 4, image.height() / 4);
    RgbaImage::from_fn(w, h, |bx, by| {
        let samples: Vec<f32> = (0..16)
            .map(|k| image.get_pixel(bx * 4 + k % 4, by * 4 + k / 4).0[3] as f32)
            .collect();
        let mean = samples.iter().sum::<f32>() / 16.0;

        let kept: Vec<f32> = samples
            .into_iter()
            .filter(|s| (s - mean).abs() < DENOISE_THRESHOLD)
            .collect();
        let value = if kept.is_empty() {
            mean
        } else {
            kept.iter().sum::<f32>() / kept.len() as f32
        };

        let v = to_channel(value);
        Rgba([v, v, v, 255])
    })
}

/// Rotate 90 degrees clockwise, then mirror horizontally.
///
/// Lines single-channel maps up with the albedo atlas.
pub fn rotate90_flip_x(image: &RgbaImage) -> RgbaImage {
    imageops::flip_horizontal(&imageops::rotate90(image))
}

/// Decode the albedo atlas of a `.xtt` file.
pub fn extract_albedo(bytes: &[u8], dir: &ChunkDirectory, decoder: &dyn BlockDecoder) -> Result<RgbaImage> {
    let chunk = dir.first_of(ChunkType::XttAtlasAlbedo)?;
    let tex = CompressedTextureRef::albedo(bytes, chunk)?;
    let payload = tex.payload(bytes)?;
    tex.check_dimensions(payload.len())?;
    let image = decoder.decode(tex.codec, payload, tex.width, tex.height)?;
    debug!(width = tex.width, height = tex.height, "decoded albedo");
    Ok(image)
}

/// Decode an ambient occlusion or opacity map of a `.xtd` file.
pub fn extract_alpha(
    bytes: &[u8],
    dir: &ChunkDirectory,
    kind: ChunkType,
    decoder: &dyn BlockDecoder,
) -> Result<RgbaImage> {
    let chunk = dir.first_of(kind)?;
    let tex = CompressedTextureRef::alpha(chunk);
    let widened = reinterleave_alpha(tex.payload(bytes)?);
    tex.check_dimensions(widened.len())?;
    let raw = decoder.decode(tex.codec, &widened, tex.width, tex.height)?;
    let image = rotate90_flip_x(&denoise_alpha(&raw));
    debug!(%kind, width = image.width(), height = image.height(), "decoded alpha map");
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{build_container, ContainerFamily};
    use crate::texture::Texture2dDecoder;

    /// Decoder that spreads the first payload byte as alpha.
    struct Fill;

    impl BlockDecoder for Fill {
        fn decode(&self, _codec: BlockCodec, data: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
            let a = data.first().copied().unwrap_or(0);
            Ok(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, a])))
        }
    }

    fn alpha_image(values: &[u8], w: u32) -> RgbaImage {
        RgbaImage::from_fn(w, values.len() as u32 / w, |x, y| Rgba([0, 0, 0, values[(y * w + x) as usize]]))
    }

    #[test]
    fn test_reinterleave() {
        assert_eq!(
            reinterleave_alpha(&[1, 2, 3, 4, 5, 6, 7, 8]),
            vec![1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0]
        );
        assert_eq!(reinterleave_alpha(&[9, 9]), vec![9, 9, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_alpha_dimensions() {
        let record = ChunkRecord {
            tag: 0xCCCC,
            kind: ChunkType::XtdAmbientOcclusion,
            offset: 0,
            size: 512,
        };
        let tex = CompressedTextureRef::alpha(&record);
        assert_eq!((tex.width, tex.height), (32, 32));
        assert_eq!(tex.codec, BlockCodec::Bc3);
    }

    #[test]
    fn test_denoise_drops_outliers() {
        let mut values = [80u8; 16];
        values[5] = 255;
        let out = denoise_alpha(&alpha_image(&values, 4));

        // mean is ~91, the 255 sample is out of range
        assert_eq!(out.dimensions(), (1, 1));
        assert_eq!(out.get_pixel(0, 0).0, [80, 80, 80, 255]);
    }

    #[test]
    fn test_denoise_falls_back_to_mean() {
        let values: Vec<u8> = (0..16).map(|i| if i % 2 == 0 { 0 } else { 255 }).collect();
        let out = denoise_alpha(&alpha_image(&values, 4));
        // 127.5 rounds to even
        assert_eq!(out.get_pixel(0, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn test_rotate_flip_is_transpose() {
        let img = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let out = rotate90_flip_x(&img);
        assert_eq!(out.dimensions(), (2, 3));
        for (x, y, p) in out.enumerate_pixels() {
            assert_eq!(p.0, [y as u8, x as u8, 0, 255]);
        }
    }

    #[test]
    fn test_extract_alpha_pipeline() {
        // 32 bytes widen to 64 bytes, an 8x8 map, denoised to 2x2
        let bytes = build_container(&[(0xDDDD, vec![42u8; 32])]);
        let dir = ChunkDirectory::parse(&bytes, ContainerFamily::TerrainData).unwrap();
        let img = extract_alpha(&bytes, &dir, ChunkType::XtdAlpha, &Fill).unwrap();

        assert_eq!(img.dimensions(), (2, 2));
        assert!(img.pixels().all(|p| p.0 == [42, 42, 42, 255]));
    }

    #[test]
    fn test_extract_albedo_header() {
        let mut chunk = Vec::new();
        for v in [8i32, 4, 4, 0] {
            chunk.extend_from_slice(&v.to_be_bytes());
        }
        chunk.extend_from_slice(&[7, 0, 0, 0, 0, 0, 0, 0]);
        let bytes = build_container(&[(0x6666, chunk)]);
        let dir = ChunkDirectory::parse(&bytes, ContainerFamily::TerrainTexture).unwrap();

        let img = extract_albedo(&bytes, &dir, &Fill).unwrap();
        assert_eq!(img.dimensions(), (4, 4));
        assert_eq!(img.get_pixel(0, 0).0[3], 7);
    }

    fn albedo_chunk(header: [i32; 4], payload: &[u8]) -> Vec<u8> {
        let mut chunk = Vec::new();
        for v in header {
            chunk.extend_from_slice(&v.to_be_bytes());
        }
        chunk.extend_from_slice(payload);
        build_container(&[(0x6666, chunk)])
    }

    #[test]
    fn test_albedo_corrupt_dimensions() {
        for header in [[8, i32::MAX, i32::MAX, 0], [8, 0, 4, 0], [8, 8, 8, 0]] {
            let bytes = albedo_chunk(header, &[0u8; 8]);
            let dir = ChunkDirectory::parse(&bytes, ContainerFamily::TerrainTexture).unwrap();
            let result = extract_albedo(&bytes, &dir, &Texture2dDecoder);
            assert!(matches!(result, Err(Error::MalformedContainer(_))), "{:?}", header);
        }
    }

    #[test]
    fn test_empty_alpha_chunk() {
        let bytes = build_container(&[(0xCCCC, Vec::new())]);
        let dir = ChunkDirectory::parse(&bytes, ContainerFamily::TerrainData).unwrap();
        let result = extract_alpha(&bytes, &dir, ChunkType::XtdAmbientOcclusion, &Fill);
        assert!(matches!(result, Err(Error::MalformedContainer(_))));
    }
}
