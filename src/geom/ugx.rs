//! Generic mesh (`.ugx`) decoding.
//!
//! The mesh table of a `.ugx` file is its chunk table: the reserved word and
//! big-endian type of each descriptor read together as the chunk tag. The
//! MeshInfo region carries a six-slot sub-table whose offsets are relative
//! to the start of the region:
//!
//! ```text
//! MeshInfo
//! +0    64 bytes    reserved
//! +64   6 x 16      (count: i64 LE, offset: i64 LE)
//!                   1 polygon groups, 2 bones, 3 links, 4 mesh id,
//!                   5 min bound, 6 max bound
//! ```

use tracing::{debug, warn};

use super::mesh::{Face, GenericMesh, Material};
use super::vertex::VertexLayout;
use crate::container::{ChunkDirectory, ChunkRecord, ChunkType};
use crate::util::binary::{read_cstring, read_f32, read_i32, read_i64, read_u16};
use crate::util::{Endian, Error, Mat4, Result};

const SUB_TABLE_OFFSET: usize = 64;
const SUB_TABLE_SLOTS: usize = 6;
const SUB_ENTRY_SIZE: usize = 16;

const POLYGON_RECORD_SIZE: usize = 152;
const BONE_RECORD_SIZE: usize = 80;

/// Region kind of a mesh table descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshDataType {
    MeshInfo,
    IndexData,
    VertexData,
}

/// One descriptor of the mesh table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshTableEntry {
    pub kind: MeshDataType,
    pub offset: u32,
    pub length: u32,
}

impl MeshTableEntry {
    /// Interpret a chunk record, if it is one of the mesh regions.
    pub fn from_record(record: &ChunkRecord) -> Option<Self> {
        let kind = match record.kind {
            ChunkType::UgxCachedData => MeshDataType::MeshInfo,
            ChunkType::UgxIndexBuffer => MeshDataType::IndexData,
            ChunkType::UgxVertexBuffer => MeshDataType::VertexData,
            _ => return None,
        };
        Some(Self {
            kind,
            offset: record.offset,
            length: record.size,
        })
    }
}

/// Sub-table slot of a MeshInfo region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum MeshSubDataType {
    MeshData = 1,
    BoneData = 2,
    LinkData = 3,
    MeshId = 4,
    MinBound = 5,
    MaxBound = 6,
}

/// Run of triangles sharing material, section and vertex layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolygonGroup {
    pub material_id: i32,
    /// Section id.
    pub polygon_id: i32,
    pub bone_id: i32,
    /// First index, in 16-bit units from the start of the index region.
    pub face_offset: i32,
    pub face_count: i32,
    /// Byte offset from the start of the vertex region.
    pub vert_offset: i32,
    pub vert_length: i32,
    pub vert_stride: i32,
    pub vert_count: i32,
    pub name: String,
}

/// Skeleton bone. Decoded but not used for mesh output.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneRecord {
    pub name: String,
    pub transform: Mat4,
    pub parent: i32,
}

/// Everything the mesh table describes.
#[derive(Clone, Debug, Default)]
pub struct MeshTable {
    pub entries: Vec<MeshTableEntry>,
    /// Groups ordered by first appearance of their section id, then by
    /// record order.
    pub groups: Vec<PolygonGroup>,
    pub bones: Vec<BoneRecord>,
    pub index_start: usize,
    pub vertex_start: usize,
}

fn to_usize(value: i64, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::malformed(format!("negative {}: {}", what, value)))
}

struct SubData {
    count: usize,
    offset: usize,
}

fn read_sub_table(bytes: &[u8], region: usize) -> Result<Vec<SubData>> {
    (0..SUB_TABLE_SLOTS)
        .map(|slot| {
            let pos = region + SUB_TABLE_OFFSET + slot * SUB_ENTRY_SIZE;
            let count = read_i64(bytes, pos, Endian::Little)?;
            let offset = read_i64(bytes, pos + 8, Endian::Little)?;
            Ok(SubData {
                count: to_usize(count, "sub-table count")?,
                offset: region + to_usize(offset, "sub-table offset")?,
            })
        })
        .collect()
}

fn read_polygon_group(bytes: &[u8], pos: usize, region: usize) -> Result<PolygonGroup> {
    let field = |index: usize| read_i32(bytes, pos + index * 4, Endian::Little);
    let name_offset = read_i32(bytes, pos + 56, Endian::Little)?;

    Ok(PolygonGroup {
        material_id: field(0)?,
        polygon_id: field(1)?,
        bone_id: field(3)?,
        face_offset: field(4)?,
        face_count: field(5)?,
        vert_offset: field(6)?,
        vert_length: field(7)?,
        vert_stride: field(8)?,
        vert_count: field(9)?,
        name: read_cstring(bytes, region + to_usize(name_offset.into(), "name offset")?)?,
    })
}

fn read_bone(bytes: &[u8], pos: usize, region: usize) -> Result<BoneRecord> {
    let name_offset = read_i32(bytes, pos, Endian::Little)?;
    let mut m = [0f32; 16];
    for (i, value) in m.iter_mut().enumerate() {
        *value = read_f32(bytes, pos + 8 + i * 4, Endian::Little)?;
    }

    Ok(BoneRecord {
        name: read_cstring(bytes, region + to_usize(name_offset.into(), "bone name offset")?)?,
        // stored row-major
        transform: Mat4::from_cols_array(&m).transpose(),
        parent: read_i32(bytes, pos + 72, Endian::Little)?,
    })
}

/// Walk the mesh table of a `.ugx` file.
pub fn decode_mesh_table(bytes: &[u8], dir: &ChunkDirectory) -> Result<MeshTable> {
    let entries: Vec<MeshTableEntry> = dir.records().iter().filter_map(MeshTableEntry::from_record).collect();
    let index_start = dir.first_of(ChunkType::UgxIndexBuffer)?.offset as usize;
    let vertex_start = dir.first_of(ChunkType::UgxVertexBuffer)?.offset as usize;

    let mut by_section: Vec<(i32, Vec<PolygonGroup>)> = Vec::new();
    let mut bones = Vec::new();

    for entry in entries.iter().filter(|e| e.kind == MeshDataType::MeshInfo) {
        let region = entry.offset as usize;
        let sub = read_sub_table(bytes, region)?;

        let groups = &sub[MeshSubDataType::MeshData as usize - 1];
        for i in 0..groups.count {
            let group = read_polygon_group(bytes, groups.offset + i * POLYGON_RECORD_SIZE, region)?;
            match by_section.iter_mut().find(|(id, _)| *id == group.polygon_id) {
                Some((_, list)) => list.push(group),
                None => by_section.push((group.polygon_id, vec![group])),
            }
        }

        let bone_data = &sub[MeshSubDataType::BoneData as usize - 1];
        for i in 0..bone_data.count {
            bones.push(read_bone(bytes, bone_data.offset + i * BONE_RECORD_SIZE, region)?);
        }
    }

    let groups: Vec<PolygonGroup> = by_section.into_iter().flat_map(|(_, list)| list).collect();
    debug!(groups = groups.len(), bones = bones.len(), "decoded mesh table");

    Ok(MeshTable {
        entries,
        groups,
        bones,
        index_start,
        vertex_start,
    })
}

/// Decode a `.ugx` file into a mesh.
///
/// Vertices of an unknown stride are dropped. Face indices are relative to
/// the vertices their group actually produced; a face that points outside
/// them is dropped too.
pub fn decode_mesh(bytes: &[u8], dir: &ChunkDirectory) -> Result<GenericMesh> {
    let table = decode_mesh_table(bytes, dir)?;
    let mut mesh = GenericMesh::new();

    for group in &table.groups {
        let base = mesh.vertices.len() as u32;
        let stride = to_usize(group.vert_stride.into(), "vertex stride")?;
        let vert_start = table.vertex_start + to_usize(group.vert_offset.into(), "vertex offset")?;

        match VertexLayout::for_stride(stride) {
            Some(layout) => {
                for j in 0..to_usize(group.vert_count.into(), "vertex count")? {
                    let v = layout.decode(bytes, vert_start + j * stride)?;
                    mesh.vertices.push(v.position);
                    mesh.normals.push(v.normal);
                    mesh.texcoords.push(v.texcoord);
                }
            }
            None => warn!(stride, group = %group.name, "skipping vertices of unknown stride"),
        }

        let emitted = mesh.vertices.len() as u32 - base;
        let face_count = to_usize(group.face_count.into(), "face count")?;
        if face_count == 0 {
            continue;
        }

        let material = mesh.add_material(Material::new(format!("material_{}", i64::from(group.material_id) + 1)));
        let section = mesh.add_section(format!("object_{}", i64::from(group.polygon_id) + 1));
        let face_start = table.index_start + to_usize(group.face_offset.into(), "face offset")? * 2;

        let mut dropped = 0usize;
        for k in 0..face_count {
            let pos = face_start + k * 6;
            let a = read_u16(bytes, pos, Endian::Little)? as u32;
            let b = read_u16(bytes, pos + 2, Endian::Little)? as u32;
            let c = read_u16(bytes, pos + 4, Endian::Little)? as u32;
            if a >= emitted || b >= emitted || c >= emitted {
                dropped += 1;
                continue;
            }
            mesh.faces.push(Face {
                indices: [base + a, base + c, base + b],
                material,
                section,
            });
        }
        if dropped > 0 {
            warn!(dropped, group = %group.name, "dropped faces outside the group's vertices");
        }
    }

    debug!(
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        materials = mesh.materials.len(),
        "decoded mesh"
    );
    Ok(mesh)
}

/// Texture paths referenced by the material chunk.
///
/// A backslash starts a capture, a NUL ends it (kept when longer than one
/// character) and any byte outside `'.'..='z'` discards it. The captured
/// text keeps its leading backslash.
pub fn texture_names(bytes: &[u8], dir: &ChunkDirectory) -> Result<Vec<String>> {
    let chunk = dir.first_of(ChunkType::UgxMaterial)?;
    let payload = bytes
        .get(chunk.range())
        .ok_or(Error::UnexpectedEof { offset: chunk.offset as usize, len: chunk.size as usize })?;

    let mut names = Vec::new();
    let mut current = String::new();
    let mut scanning = false;

    for &b in payload {
        if b == b'\\' {
            scanning = true;
        } else if b == 0 {
            if current.chars().count() > 1 {
                names.push(std::mem::take(&mut current));
            }
            scanning = false;
            current.clear();
        } else if !(46..=122).contains(&b) {
            scanning = false;
            current.clear();
        }

        if scanning {
            current.push(b as char);
        }
    }
    Ok(names)
}
