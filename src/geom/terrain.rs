//! Terrain height-field (`.xtd`) decoding.
//!
//! The atlas chunk stores an `N x N` grid of packed positions and normals:
//!
//! ```text
//! +0     min     3 x f32 BE (Z,Y,X) + 4 pad
//! +16    range   3 x f32 BE (Z,Y,X) + 4 pad
//! +32    N*N     u32 LE packed positions, cell (x, z) at x*N + z
//! ...    N*N     u32 LE packed normals
//! ```

use tracing::debug;

use super::mesh::{Face, GenericMesh, Material};
use crate::container::{ChunkDirectory, ChunkType};
use crate::util::binary::{read_f32, read_u32, read_vec3, unpack_unorm10};
use crate::util::{reverse_components, Endian, Error, Result, Vec2, Vec3};

/// Sampling stride used when none is requested.
pub const TERRAIN_DEFAULT_STRIDE: usize = 1;

const TILE_SCALE_OFFSET: usize = 12;
const ATLAS_HEADER_SIZE: usize = 32;
const ATLAS_CELL_SIZE: usize = 8;
const WORLD_SCALE: f32 = 100.0;

/// Grid side length for an atlas chunk of `size` bytes.
pub fn grid_dimension(size: usize) -> Result<usize> {
    let cells = size
        .checked_sub(ATLAS_HEADER_SIZE)
        .ok_or_else(|| Error::InvalidGrid(format!("atlas chunk of {} bytes has no header", size)))?
        / ATLAS_CELL_SIZE;
    let n = (cells as f64).sqrt().round() as usize;
    if ATLAS_HEADER_SIZE + ATLAS_CELL_SIZE * n * n != size {
        return Err(Error::InvalidGrid(format!(
            "atlas chunk of {} bytes is not a square grid",
            size
        )));
    }
    Ok(n)
}

/// Rebuild the terrain surface, sampling every `stride`-th grid cell.
pub fn decode_terrain(bytes: &[u8], dir: &ChunkDirectory, stride: usize) -> Result<GenericMesh> {
    let header = dir.first_of(ChunkType::XtdHeader)?;
    let tile_scale = read_f32(bytes, header.offset as usize + TILE_SCALE_OFFSET, Endian::Big)?;

    let atlas = dir.first_of(ChunkType::XtdAtlas)?;
    let n = grid_dimension(atlas.size as usize)?;
    if stride == 0 || n % stride != 0 {
        return Err(Error::InvalidGrid(format!(
            "stride {} does not divide grid size {}",
            stride, n
        )));
    }

    let base = atlas.offset as usize;
    let min = reverse_components(read_vec3(bytes, base, Endian::Big)?);
    let range = reverse_components(read_vec3(bytes, base + 16, Endian::Big)?);
    let positions = base + ATLAS_HEADER_SIZE;
    let normals = positions + 4 * n * n;

    let m = n / stride;
    let mut mesh = GenericMesh::new();
    mesh.vertices.reserve(m * m);
    mesh.normals.reserve(m * m);
    mesh.texcoords.reserve(m * m);

    for i in 0..m {
        for j in 0..m {
            let (gx, gz) = (i * stride, j * stride);
            let cell = gx * n + gz;

            let packed = unpack_unorm10(read_u32(bytes, positions + cell * 4, Endian::Little)?);
            let p = packed * range + min + Vec3::new(gx as f32, 0.0, gz as f32) * tile_scale;
            mesh.vertices.push(Vec3::new(p.x, -p.z, p.y) * WORLD_SCALE);

            let packed = unpack_unorm10(read_u32(bytes, normals + cell * 4, Endian::Little)?);
            let nrm = (packed * 2.0 - Vec3::ONE).normalize_or_zero();
            mesh.normals.push(Vec3::new(nrm.z, nrm.x, nrm.y));

            mesh.texcoords
                .push(Vec2::new(gx as f32 / n as f32, 1.0 - gz as f32 / n as f32));
        }
    }

    let material = mesh.add_material(Material::new("terrain"));
    let section = mesh.add_section("terrain");
    let index = |i: usize, j: usize| (i * m + j) as u32;
    for i in 0..m.saturating_sub(1) {
        for j in 0..m - 1 {
            let (v00, v01) = (index(i, j), index(i, j + 1));
            let (v10, v11) = (index(i + 1, j), index(i + 1, j + 1));
            mesh.faces.push(Face { indices: [v00, v11, v10], material, section });
            mesh.faces.push(Face { indices: [v00, v01, v11], material, section });
        }
    }

    debug!(grid = n, stride, vertices = mesh.vertices.len(), faces = mesh.faces.len(), "decoded terrain");
    Ok(mesh)
}
