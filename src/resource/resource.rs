//! A single resource file and its memoized products.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use roxmltree::Document;

use super::collaborator::XmlConverter;
use super::kind::ResourceKind;
use crate::container::{ChunkDirectory, ChunkType};
use crate::core::{Property, ValueCache};
use crate::geom::{self, GenericMesh};
use crate::scenario::Lighting;
use crate::texture::{self, BlockDecoder, DecodedImage};
use crate::util::{Error, Result};

/// One resource file under a context's scratch directory.
///
/// Obtained only through [`Context::resource`](super::Context::resource) or
/// [`Context::resource_of_kind`](super::Context::resource_of_kind), so there
/// is exactly one instance per path and context. Every accessor decodes on
/// first use and returns the cached value afterwards.
pub struct Resource {
    path: String,
    absolute: PathBuf,
    kind: ResourceKind,
    cache: ValueCache,
    block_decoder: Arc<dyn BlockDecoder>,
    xml_converter: Option<Arc<dyn XmlConverter>>,
}

impl Resource {
    pub(crate) fn new(
        path: String,
        absolute: PathBuf,
        kind: ResourceKind,
        block_decoder: Arc<dyn BlockDecoder>,
        xml_converter: Option<Arc<dyn XmlConverter>>,
    ) -> Self {
        Self {
            path,
            absolute,
            kind,
            cache: ValueCache::new(),
            block_decoder,
            xml_converter,
        }
    }

    /// Path relative to the scratch directory, `/`-separated.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn absolute_path(&self) -> &Path {
        &self.absolute
    }

    #[inline]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// File name without directory or extension.
    pub fn stem(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    }

    /// Memoized values of this resource.
    #[inline]
    pub fn cache(&self) -> &ValueCache {
        &self.cache
    }

    fn expect_kind(&self, kind: ResourceKind) -> Result<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(Error::kind_mismatch(kind, self.kind))
        }
    }

    fn read_file(path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => e.into(),
        })
    }

    /// Whole file contents of a binary resource.
    pub fn raw_bytes(&self) -> Result<Arc<Vec<u8>>> {
        if self.kind.is_xml() {
            return Err(Error::kind_mismatch("binary resource", self.kind));
        }
        self.cache
            .get_or_try_init(Property::RawBytes, || Self::read_file(&self.absolute))
    }

    /// Chunk table of a binary resource.
    pub fn chunks(&self) -> Result<Arc<ChunkDirectory>> {
        let family = self
            .kind
            .container_family()
            .ok_or_else(|| Error::kind_mismatch("binary resource", self.kind))?;
        self.cache.get_or_try_init(Property::Chunks, || {
            let bytes = self.raw_bytes()?;
            ChunkDirectory::parse(&bytes, family)
        })
    }

    /// Plain XML text of an XML resource.
    ///
    /// When only the compiled `<file>.xmb` exists it is converted first.
    pub fn xml_text(&self) -> Result<Arc<String>> {
        if !self.kind.is_xml() {
            return Err(Error::kind_mismatch("XML resource", self.kind));
        }
        self.cache.get_or_try_init(Property::XmlText, || {
            if !self.absolute.exists() {
                let mut compiled = self.absolute.clone().into_os_string();
                compiled.push(".xmb");
                let compiled = PathBuf::from(compiled);
                if !compiled.exists() {
                    return Err(Error::FileNotFound(self.absolute.clone()));
                }
                let converter = self
                    .xml_converter
                    .as_ref()
                    .ok_or(Error::MissingCollaborator("XML converter"))?;
                converter.convert(&compiled, &self.absolute)?;
            }
            let bytes = Self::read_file(&self.absolute)?;
            String::from_utf8(bytes).map_err(|e| Error::Xml(e.to_string()))
        })
    }

    /// Run `f` over the parsed XML document.
    ///
    /// The text is cached; the tree is rebuilt per call.
    pub fn with_xml<T>(&self, f: impl FnOnce(&Document) -> Result<T>) -> Result<T> {
        let text = self.xml_text()?;
        let doc = Document::parse(&text).map_err(|e| Error::Xml(e.to_string()))?;
        f(&doc)
    }

    /// Mesh of a `.ugx` resource.
    pub fn mesh(&self) -> Result<Arc<GenericMesh>> {
        self.expect_kind(ResourceKind::Ugx)?;
        self.cache.get_or_try_init(Property::Mesh, || {
            let (bytes, dir) = (self.raw_bytes()?, self.chunks()?);
            geom::decode_mesh(&bytes, &dir)
        })
    }

    /// Texture paths named by a `.ugx` resource's materials.
    pub fn texture_names(&self) -> Result<Arc<Vec<String>>> {
        self.expect_kind(ResourceKind::Ugx)?;
        self.cache.get_or_try_init(Property::TextureNames, || {
            let (bytes, dir) = (self.raw_bytes()?, self.chunks()?);
            geom::texture_names(&bytes, &dir)
        })
    }

    /// Terrain surface of a `.xtd` resource, sampled every `stride` cells.
    pub fn terrain_mesh(&self, stride: usize) -> Result<Arc<GenericMesh>> {
        self.expect_kind(ResourceKind::Xtd)?;
        self.cache.get_or_try_init(Property::TerrainMesh { stride }, || {
            let (bytes, dir) = (self.raw_bytes()?, self.chunks()?);
            geom::decode_terrain(&bytes, &dir, stride)
        })
    }

    /// Albedo atlas of a `.xtt` resource.
    pub fn albedo_texture(&self) -> Result<Arc<DecodedImage>> {
        self.expect_kind(ResourceKind::Xtt)?;
        self.cache.get_or_try_init(Property::AlbedoTexture, || {
            let (bytes, dir) = (self.raw_bytes()?, self.chunks()?);
            texture::extract_albedo(&bytes, &dir, self.block_decoder.as_ref())
        })
    }

    /// Ambient occlusion map of a `.xtd` resource.
    pub fn ambient_occlusion_texture(&self) -> Result<Arc<DecodedImage>> {
        self.alpha_texture(Property::AmbientOcclusionTexture, ChunkType::XtdAmbientOcclusion)
    }

    /// Opacity map of a `.xtd` resource.
    pub fn opacity_texture(&self) -> Result<Arc<DecodedImage>> {
        self.alpha_texture(Property::OpacityTexture, ChunkType::XtdAlpha)
    }

    fn alpha_texture(&self, key: Property, chunk: ChunkType) -> Result<Arc<DecodedImage>> {
        self.expect_kind(ResourceKind::Xtd)?;
        self.cache.get_or_try_init(key, || {
            let (bytes, dir) = (self.raw_bytes()?, self.chunks()?);
            texture::extract_alpha(&bytes, &dir, chunk, self.block_decoder.as_ref())
        })
    }

    /// Lighting of a `.gls` resource.
    pub fn lighting(&self) -> Result<Arc<Lighting>> {
        self.expect_kind(ResourceKind::Gls)?;
        self.cache.get_or_try_init(Property::Lighting, || {
            let text = self.xml_text()?;
            Lighting::from_xml(&text)
        })
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("cache", &self.cache)
            .finish()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.kind)
    }
}
