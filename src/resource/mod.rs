//! Resource registry.
//!
//! A [`Context`] maps relative paths under a scratch directory to shared
//! [`Resource`] handles. Resources decode lazily and memoize their results.

mod collaborator;
mod context;
mod kind;
mod resource;

pub use collaborator::{ArchiveExpander, XmlConverter};
pub use context::{normalize_path, AccessEvent, AccessKind, AccessObserver, Context};
pub use kind::ResourceKind;
pub use resource::Resource;
