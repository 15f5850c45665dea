//! Chunk container constants and type tags.

use std::fmt;

/// Offset of the big-endian u32 header size (start of the chunk table).
pub const HEADER_SIZE_OFFSET: usize = 4;

/// Offset of the big-endian u16 chunk count.
pub const CHUNK_COUNT_OFFSET: usize = 16;

/// Size of one chunk table record.
pub const CHUNK_RECORD_SIZE: usize = 24;

/// Offset of the big-endian u64 type tag within a record.
pub const RECORD_TAG_OFFSET: usize = 0;

/// Offset of the big-endian u32 payload offset within a record.
pub const RECORD_OFFSET_OFFSET: usize = 8;

/// Offset of the big-endian u32 payload size within a record.
pub const RECORD_SIZE_OFFSET: usize = 12;

/// Container family a chunk table belongs to.
///
/// Tag values are reused between families, so a raw tag only means
/// something together with the family of the file it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFamily {
    /// Terrain mesh, ambient occlusion and opacity (`.xtd`).
    TerrainData,
    /// Terrain albedo atlas (`.xtt`).
    TerrainTexture,
    /// Generic mesh (`.ugx`).
    Mesh,
}

/// Family-relative chunk type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkType {
    /// Tag not mapped for this family.
    Unknown,

    XtdHeader,
    XtdTerrain,
    XtdAtlas,
    XtdTess,
    XtdLighting,
    XtdAmbientOcclusion,
    XtdAlpha,

    XttTerrainAtlasLink,
    XttAtlasAlbedo,
    XttRoad,
    XttFoliageHeader,
    XttFoliageQn,

    UgxCachedData,
    UgxIndexBuffer,
    UgxVertexBuffer,
    UgxGrx,
    UgxMaterial,
    UgxTree,
}

impl ChunkType {
    /// Map a raw tag for the given family, falling back to `Unknown`.
    pub fn from_tag(family: ContainerFamily, tag: u64) -> Self {
        match family {
            ContainerFamily::TerrainData => match tag {
                0x1111 => Self::XtdHeader,
                0x2222 => Self::XtdTerrain,
                0x8888 => Self::XtdAtlas,
                0xAAAA => Self::XtdTess,
                0xBBBB => Self::XtdLighting,
                0xCCCC => Self::XtdAmbientOcclusion,
                0xDDDD => Self::XtdAlpha,
                _ => Self::Unknown,
            },
            ContainerFamily::TerrainTexture => match tag {
                0x2222 => Self::XttTerrainAtlasLink,
                0x6666 => Self::XttAtlasAlbedo,
                0x8888 => Self::XttRoad,
                0xAAAA => Self::XttFoliageHeader,
                0xBBBB => Self::XttFoliageQn,
                _ => Self::Unknown,
            },
            ContainerFamily::Mesh => match tag {
                0x0700 => Self::UgxCachedData,
                0x0701 => Self::UgxIndexBuffer,
                0x0702 => Self::UgxVertexBuffer,
                0x0703 => Self::UgxGrx,
                0x0704 => Self::UgxMaterial,
                0x0705 => Self::UgxTree,
                _ => Self::Unknown,
            },
        }
    }

    /// Raw tag for this type, if it has one.
    pub fn tag(self) -> Option<u64> {
        Some(match self {
            Self::Unknown => return None,
            Self::XtdHeader => 0x1111,
            Self::XtdTerrain | Self::XttTerrainAtlasLink => 0x2222,
            Self::XtdAtlas | Self::XttRoad => 0x8888,
            Self::XtdTess | Self::XttFoliageHeader => 0xAAAA,
            Self::XtdLighting | Self::XttFoliageQn => 0xBBBB,
            Self::XtdAmbientOcclusion => 0xCCCC,
            Self::XtdAlpha => 0xDDDD,
            Self::XttAtlasAlbedo => 0x6666,
            Self::UgxCachedData => 0x0700,
            Self::UgxIndexBuffer => 0x0701,
            Self::UgxVertexBuffer => 0x0702,
            Self::UgxGrx => 0x0703,
            Self::UgxMaterial => 0x0704,
            Self::UgxTree => 0x0705,
        })
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            Some(tag) => write!(f, "{:?} (0x{:04X})", self, tag),
            None => write!(f, "{:?}", self),
        }
    }
}
