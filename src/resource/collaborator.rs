//! External tools the library hands work to.
//!
//! Archive expansion and compiled-XML conversion are not implemented here;
//! callers plug them in on the [`Context`](super::Context).

use std::path::Path;

use crate::util::Result;

/// Expands a game archive into plain files.
pub trait ArchiveExpander: Send + Sync {
    /// Expand `archive` into `out_dir`. The expander writes
    /// `<out_dir>/<stem>.eradef` once everything is on disk.
    fn expand(&self, archive: &Path, out_dir: &Path, stem: &str) -> Result<()>;
}

/// Converts a compiled binary XML file into plain XML text.
pub trait XmlConverter: Send + Sync {
    /// Read `compiled` and write the plain document to `plain`.
    fn convert(&self, compiled: &Path, plain: &Path) -> Result<()>;
}
