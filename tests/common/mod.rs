//! Synthetic resource files for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// Container with the chunk table at byte 32.
pub fn container(chunks: &[(u64, Vec<u8>)]) -> Vec<u8> {
    const TABLE_START: usize = 32;
    const RECORD: usize = 24;

    let mut out = vec![0u8; TABLE_START + chunks.len() * RECORD];
    out[0..4].copy_from_slice(b"HWRC");
    out[4..8].copy_from_slice(&(TABLE_START as u32).to_be_bytes());
    out[16..18].copy_from_slice(&(chunks.len() as u16).to_be_bytes());

    for (i, (tag, payload)) in chunks.iter().enumerate() {
        let pos = TABLE_START + i * RECORD;
        let offset = out.len() as u32;
        out[pos..pos + 8].copy_from_slice(&tag.to_be_bytes());
        out[pos + 8..pos + 12].copy_from_slice(&offset.to_be_bytes());
        out[pos + 12..pos + 16].copy_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
    }
    out
}

/// Flat `n` x `n` terrain with unit tile spacing and up-facing normals.
pub fn terrain(n: usize) -> Vec<u8> {
    let mut header = vec![0u8; 16];
    header[12..16].copy_from_slice(&1f32.to_be_bytes());

    let mut atlas = Vec::new();
    for _ in 0..2 {
        for c in [0f32, 0.0, 0.0, 0.0] {
            atlas.extend_from_slice(&c.to_be_bytes());
        }
    }
    atlas.resize(32 + 4 * n * n, 0);
    for _ in 0..n * n {
        atlas.extend_from_slice(&(1023u32 << 20).to_le_bytes());
    }
    container(&[(0x1111, header), (0x8888, atlas)])
}

/// Terrain whose occlusion map decodes to a uniform `value`.
///
/// 32 payload bytes widen to four BC3 blocks of an 8x8 map.
pub fn terrain_with_occlusion(n: usize, value: u8) -> Vec<u8> {
    let mut chunks = vec![(0x1111, vec![0u8; 16])];
    chunks.push((0x8888, vec![0u8; 32 + 8 * n * n]));

    let block = [value, value, 0, 0, 0, 0, 0, 0];
    let occlusion: Vec<u8> = block.iter().copied().cycle().take(32).collect();
    chunks.push((0xCCCC, occlusion));
    container(&chunks)
}

/// Mesh with one triangle group per `(material, section)`.
pub fn mesh(groups: &[(i32, i32)]) -> Vec<u8> {
    const SUB_TABLE: usize = 64;
    const GROUP_RECORD: usize = 152;
    const STRIDE: usize = 24;

    let groups_at = SUB_TABLE + 6 * 16;
    let mut info = vec![0u8; groups_at + groups.len() * GROUP_RECORD];
    info[SUB_TABLE..SUB_TABLE + 8].copy_from_slice(&(groups.len() as i64).to_le_bytes());
    info[SUB_TABLE + 8..SUB_TABLE + 16].copy_from_slice(&(groups_at as i64).to_le_bytes());

    let mut index = Vec::new();
    let mut vertex = Vec::new();
    for (i, (material, section)) in groups.iter().enumerate() {
        let at = groups_at + i * GROUP_RECORD;
        let fields = [
            (0, *material),
            (4, *section),
            (16, (index.len() / 2) as i32),
            (20, 1),
            (24, vertex.len() as i32),
            (28, (3 * STRIDE) as i32),
            (32, STRIDE as i32),
            (36, 3),
        ];
        for (offset, value) in fields {
            info[at + offset..at + offset + 4].copy_from_slice(&value.to_le_bytes());
        }
        for k in [0u16, 1, 2] {
            index.extend_from_slice(&k.to_le_bytes());
        }
        for _ in 0..3 {
            let mut rec = vec![0u8; STRIDE];
            rec[8..12].copy_from_slice(&1f32.to_le_bytes());
            vertex.extend_from_slice(&rec);
        }
    }

    let material = b"\\art\\warthog_df\0".to_vec();
    container(&[(0x700, info), (0x701, index), (0x702, vertex), (0x704, material)])
}

pub const LIGHTING: &str = r#"<?xml version="1.0"?>
<Lighting>
  <sunInclination>90</sunInclination>
  <sunRotation>0</sunRotation>
  <setTerrainColor>255,128,0</setTerrainColor>
  <backgroundColor>0,0,64</backgroundColor>
</Lighting>"#;

/// Write `bytes` at `root/rel`, creating directories.
pub fn put(root: &Path, rel: &str, bytes: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}
