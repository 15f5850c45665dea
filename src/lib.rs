//! # hwtools
//!
//! Reader for Halo Wars resource files: chunked binary containers holding
//! terrain height-fields, terrain textures and meshes, plus the scenario
//! XML that sits next to them.
//!
//! ## Modules
//!
//! - [`util`] - Errors, endian-aware readers, packed scalars, math types
//! - [`container`] - Chunk table shared by every binary resource
//! - [`core`] - Per-resource value cache
//! - [`geom`] - Vertex layouts, mesh and terrain decoders, [`GenericMesh`] and OBJ export
//! - [`texture`] - Block-compressed texture extraction
//! - [`scenario`] - Scenario lighting
//! - [`resource`] - [`Context`] registry and [`Resource`] handles
//!
//! ## Example
//!
//! ```ignore
//! use hwtools::prelude::*;
//!
//! let ctx = Context::new("/tmp/hw_scratch");
//! let terrain = ctx.resource_of_kind("scenario/skirmish/design/blood_gulch/blood_gulch", ResourceKind::Xtd)?;
//! let mut mesh = (*terrain.terrain_mesh(TERRAIN_DEFAULT_STRIDE)?).clone();
//! mesh.export_obj("out/blood_gulch_vismesh")?;
//! ```

pub mod util;
pub mod container;
pub mod core;
pub mod geom;
pub mod texture;
pub mod scenario;
pub mod resource;

// Re-export commonly used types
pub use util::{Error, Result};
pub use geom::{ExportOptions, GenericMesh, NormalMode};
pub use resource::{Context, Resource, ResourceKind};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, Vec2, Vec3, Mat4};
    pub use crate::container::{ChunkDirectory, ChunkType, ContainerFamily};
    pub use crate::geom::{ExportOptions, GenericMesh, Material, NormalMode, TextureSlot, TERRAIN_DEFAULT_STRIDE};
    pub use crate::resource::{AccessEvent, AccessKind, Context, Resource, ResourceKind};
    pub use crate::scenario::Lighting;
    pub use crate::texture::DecodedImage;
}
