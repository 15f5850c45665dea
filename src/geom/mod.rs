//! Geometry decoding and the shared mesh model.
//!
//! This module provides:
//! - [`GenericMesh`] - indexed triangle mesh with materials and sections
//! - [`ExportOptions`] / [`NormalMode`] - transform and shading applied on export
//! - [`decode_mesh`] - `.ugx` polygon groups to a mesh
//! - [`decode_terrain`] - `.xtd` height-field to a mesh
//! - OBJ/MTL writers on [`GenericMesh`]

pub mod mesh;
pub mod obj;
pub mod terrain;
pub mod ugx;
pub mod vertex;

pub use mesh::{ExportOptions, Face, GenericMesh, Material, NormalMode, Section, TextureSlot};
pub use obj::obj_float;
pub use terrain::{decode_terrain, grid_dimension, TERRAIN_DEFAULT_STRIDE};
pub use ugx::{
    decode_mesh, decode_mesh_table, texture_names, BoneRecord, MeshDataType, MeshSubDataType,
    MeshTable, MeshTableEntry, PolygonGroup,
};
pub use vertex::{decode_vertex, Vertex, VertexLayout, KNOWN_STRIDES};
