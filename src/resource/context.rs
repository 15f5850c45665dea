//! Working context: scratch directory, collaborators and the resource registry.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::{info, trace};

use super::collaborator::{ArchiveExpander, XmlConverter};
use super::kind::ResourceKind;
use super::resource::Resource;
use crate::texture::{BlockDecoder, Texture2dDecoder};
use crate::util::{Error, Result};

/// What happened to a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    Created,
    Accessed,
}

/// Notification delivered to a context's observer.
#[derive(Clone, Debug)]
pub struct AccessEvent {
    pub kind: AccessKind,
    /// Normalized relative path.
    pub path: String,
    pub resource_kind: ResourceKind,
    pub at: SystemTime,
}

impl fmt::Display for AccessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            AccessKind::Created => "Created",
            AccessKind::Accessed => "Accessed",
        };
        write!(f, "{} resource \"{}\"", verb, self.path)
    }
}

/// Callback invoked on every registry lookup.
pub type AccessObserver = dyn Fn(&AccessEvent) + Send + Sync;

/// Normalize a relative resource path to `/` separators.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Root of all resource access.
///
/// Holds the scratch directory that unpacked files live in, the optional
/// game install directory, the pluggable collaborators and a registry that
/// hands out one shared [`Resource`] per relative path.
pub struct Context {
    scratch_dir: PathBuf,
    install_dir: Option<PathBuf>,
    block_decoder: Arc<dyn BlockDecoder>,
    xml_converter: Option<Arc<dyn XmlConverter>>,
    archive_expander: Option<Arc<dyn ArchiveExpander>>,
    observer: Option<Arc<AccessObserver>>,
    resources: RwLock<HashMap<String, Arc<Resource>>>,
}

impl Context {
    /// Create a context over a scratch directory.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            install_dir: None,
            block_decoder: Arc::new(Texture2dDecoder),
            xml_converter: None,
            archive_expander: None,
            observer: None,
            resources: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    pub fn with_block_decoder(mut self, decoder: impl BlockDecoder + 'static) -> Self {
        self.block_decoder = Arc::new(decoder);
        self
    }

    pub fn with_xml_converter(mut self, converter: impl XmlConverter + 'static) -> Self {
        self.xml_converter = Some(Arc::new(converter));
        self
    }

    pub fn with_archive_expander(mut self, expander: impl ArchiveExpander + 'static) -> Self {
        self.archive_expander = Some(Arc::new(expander));
        self
    }

    /// Attach a callback that sees every resource creation and lookup.
    pub fn with_observer(mut self, observer: impl Fn(&AccessEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    #[inline]
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    #[inline]
    pub fn install_dir(&self) -> Option<&Path> {
        self.install_dir.as_deref()
    }

    /// Absolute path of a scratch-relative path.
    pub fn scratch_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.scratch_dir
            .join(normalize_path(&rel.as_ref().to_string_lossy()))
    }

    /// Resource at `rel`, or `None` if its extension is not a known kind.
    pub fn resource(&self, rel: impl AsRef<Path>) -> Result<Option<Arc<Resource>>> {
        let key = normalize_key(rel.as_ref())?;
        match ResourceKind::from_path(&key) {
            Some(kind) => Ok(Some(self.get_or_create(key, kind))),
            None => {
                trace!(path = %key, "no resource kind for extension");
                Ok(None)
            }
        }
    }

    /// Resource at `rel` that must be of `kind`.
    ///
    /// The kind's extension is appended when `rel` has none.
    pub fn resource_of_kind(&self, rel: impl AsRef<Path>, kind: ResourceKind) -> Result<Arc<Resource>> {
        let mut key = normalize_key(rel.as_ref())?;
        let ext = Path::new(&key)
            .extension()
            .map(|e| e.to_string_lossy().into_owned());
        match ext {
            None => {
                key.push('.');
                key.push_str(kind.extension());
            }
            Some(ext) if ResourceKind::from_extension(&ext) == Some(kind) => {}
            Some(ext) => return Err(Error::kind_mismatch(kind, ext)),
        }
        Ok(self.get_or_create(key, kind))
    }

    fn get_or_create(&self, key: String, kind: ResourceKind) -> Arc<Resource> {
        let existing = self.resources.read().get(&key).cloned();
        let (resource, created) = match existing {
            Some(r) => (r, false),
            None => match self.resources.write().entry(key) {
                Entry::Occupied(e) => (Arc::clone(e.get()), false),
                Entry::Vacant(e) => {
                    let absolute = self.scratch_dir.join(e.key());
                    let r = Arc::new(Resource::new(
                        e.key().clone(),
                        absolute,
                        kind,
                        Arc::clone(&self.block_decoder),
                        self.xml_converter.clone(),
                    ));
                    (Arc::clone(e.insert(r)), true)
                }
            },
        };

        let access = if created { AccessKind::Created } else { AccessKind::Accessed };
        trace!(path = resource.path(), ?access, "resource lookup");
        if let Some(observer) = &self.observer {
            observer(&AccessEvent {
                kind: access,
                path: resource.path().to_string(),
                resource_kind: resource.kind(),
                at: SystemTime::now(),
            });
        }
        resource
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    /// Check if no resource has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }

    /// Snapshot of registered resources, sorted by path.
    pub fn resources(&self) -> Vec<Arc<Resource>> {
        let mut all: Vec<_> = self.resources.read().values().cloned().collect();
        all.sort_by(|a, b| a.path().cmp(b.path()));
        all
    }

    /// Check whether the archive at install-relative `rel` has been expanded.
    pub fn is_archive_unpacked(&self, rel: impl AsRef<Path>) -> bool {
        archive_stem(rel.as_ref())
            .map(|stem| self.scratch_dir.join(format!("{}.eradef", stem)).exists())
            .unwrap_or(false)
    }

    /// Expand one archive into the scratch directory.
    ///
    /// Returns `Ok(false)` if it was already expanded.
    pub fn unpack_archive(&self, rel: impl AsRef<Path>) -> Result<bool> {
        let rel = rel.as_ref();
        if self.is_archive_unpacked(rel) {
            trace!(archive = %rel.display(), "already unpacked");
            return Ok(false);
        }
        let install = self
            .install_dir
            .as_ref()
            .ok_or(Error::MissingCollaborator("game install directory"))?;
        let expander = self
            .archive_expander
            .as_ref()
            .ok_or(Error::MissingCollaborator("archive expander"))?;
        let stem = archive_stem(rel).ok_or_else(|| Error::other(format!("bad archive path {}", rel.display())))?;

        expander.expand(&install.join(rel), &self.scratch_dir, &stem)?;
        info!(archive = %rel.display(), "unpacked archive");
        Ok(true)
    }

    /// Expand every `*.era` archive in the install directory.
    ///
    /// Returns how many were newly expanded.
    pub fn unpack_all_archives(&self) -> Result<usize> {
        let install = self
            .install_dir
            .as_ref()
            .ok_or(Error::MissingCollaborator("game install directory"))?;

        let mut archives: Vec<PathBuf> = fs::read_dir(install)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .is_some_and(|e| e.eq_ignore_ascii_case("era"))
            })
            .collect();
        archives.sort();

        let mut expanded = 0;
        for path in archives {
            if let Some(name) = path.file_name() {
                if self.unpack_archive(name)? {
                    expanded += 1;
                }
            }
        }
        Ok(expanded)
    }
}

fn normalize_key(rel: &Path) -> Result<String> {
    let key = normalize_path(&rel.to_string_lossy());
    if key.is_empty() {
        return Err(Error::other("empty resource path"));
    }
    Ok(key)
}

fn archive_stem(rel: &Path) -> Option<String> {
    rel.file_stem().map(|s| s.to_string_lossy().into_owned())
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("scratch_dir", &self.scratch_dir)
            .field("install_dir", &self.install_dir)
            .field("resources", &self.len())
            .field("xml_converter", &self.xml_converter.is_some())
            .field("archive_expander", &self.archive_expander.is_some())
            .finish()
    }
}
