//! Chunk directory parsing.

use tracing::debug;

use super::format::*;
use crate::util::binary::{read_u16, read_u32, read_u64};
use crate::util::{Endian, Error, Result};

/// One entry of a container's chunk table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Raw big-endian tag as stored.
    pub tag: u64,
    /// Tag interpreted for the owning family.
    pub kind: ChunkType,
    /// Payload offset from the start of the file.
    pub offset: u32,
    /// Payload size in bytes.
    pub size: u32,
}

impl ChunkRecord {
    /// Byte range of the payload within the file.
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..self.offset as usize + self.size as usize
    }
}

/// Ordered chunk table of one container file.
#[derive(Debug, Clone)]
pub struct ChunkDirectory {
    family: ContainerFamily,
    records: Vec<ChunkRecord>,
}

impl ChunkDirectory {
    /// Parse the chunk table of `bytes`.
    ///
    /// Unmapped tags become [`ChunkType::Unknown`] rather than errors. A record
    /// whose payload runs past the end of the file is a malformed container.
    pub fn parse(bytes: &[u8], family: ContainerFamily) -> Result<Self> {
        let header_size = read_u32(bytes, HEADER_SIZE_OFFSET, Endian::Big)? as usize;
        let count = read_u16(bytes, CHUNK_COUNT_OFFSET, Endian::Big)? as usize;

        let mut records = Vec::with_capacity(count);
        for i in 0..count {
            let pos = header_size + i * CHUNK_RECORD_SIZE;
            let tag = read_u64(bytes, pos + RECORD_TAG_OFFSET, Endian::Big)?;
            let record = ChunkRecord {
                tag,
                kind: ChunkType::from_tag(family, tag),
                offset: read_u32(bytes, pos + RECORD_OFFSET_OFFSET, Endian::Big)?,
                size: read_u32(bytes, pos + RECORD_SIZE_OFFSET, Endian::Big)?,
            };

            if record.offset as u64 + record.size as u64 > bytes.len() as u64 {
                return Err(Error::malformed(format!(
                    "chunk {} (tag 0x{:X}) spans {}..{} beyond file length {}",
                    i,
                    tag,
                    record.offset,
                    record.offset as u64 + record.size as u64,
                    bytes.len()
                )));
            }
            records.push(record);
        }

        debug!(?family, chunks = records.len(), "parsed chunk directory");
        Ok(Self { family, records })
    }

    /// Family the tags were interpreted for.
    #[inline]
    pub fn family(&self) -> ContainerFamily {
        self.family
    }

    /// All records in file order.
    #[inline]
    pub fn records(&self) -> &[ChunkRecord] {
        &self.records
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records of a type, in file order.
    pub fn all_of(&self, kind: ChunkType) -> impl Iterator<Item = &ChunkRecord> + '_ {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    /// First record of a type.
    ///
    /// Every consumer treats its chunks as mandatory, so absence is an error.
    pub fn first_of(&self, kind: ChunkType) -> Result<&ChunkRecord> {
        self.records
            .iter()
            .find(|r| r.kind == kind)
            .ok_or(Error::ChunkNotFound(kind))
    }
}

/// Assemble a container from `(tag, payload)` pairs for tests.
#[cfg(test)]
pub(crate) fn build_container(chunks: &[(u64, Vec<u8>)]) -> Vec<u8> {
    const TABLE_START: usize = 32;
    let data_start = TABLE_START + chunks.len() * CHUNK_RECORD_SIZE;

    let mut out = vec![0u8; data_start];
    out[0..4].copy_from_slice(b"HWRC");
    out[HEADER_SIZE_OFFSET..HEADER_SIZE_OFFSET + 4].copy_from_slice(&(TABLE_START as u32).to_be_bytes());
    out[CHUNK_COUNT_OFFSET..CHUNK_COUNT_OFFSET + 2].copy_from_slice(&(chunks.len() as u16).to_be_bytes());

    for (i, (tag, payload)) in chunks.iter().enumerate() {
        let pos = TABLE_START + i * CHUNK_RECORD_SIZE;
        let offset = out.len() as u32;
        out[pos..pos + 8].copy_from_slice(&tag.to_be_bytes());
        out[pos + 8..pos + 12].copy_from_slice(&offset.to_be_bytes());
        out[pos + 12..pos + 16].copy_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
    }
    out
}
