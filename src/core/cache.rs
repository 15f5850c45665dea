//! Per-resource memoization of derived values.
//!
//! Every decoded product of a resource (chunk table, mesh, textures...) is
//! stored here under a [`Property`] key the first time it is requested.
//! Later requests return the same `Arc` without running the loader again.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::util::{Error, Result};

/// Identifier of a derived value.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum Property {
    /// Whole file contents.
    RawBytes,
    /// Parsed chunk table.
    Chunks,
    /// Plain XML document text.
    XmlText,
    /// Decoded generic mesh.
    Mesh,
    /// Texture file names referenced by a mesh's materials.
    TextureNames,
    /// Terrain height-field mesh at a sampling stride.
    TerrainMesh { stride: usize },
    /// Terrain albedo atlas.
    AlbedoTexture,
    /// Terrain ambient occlusion map.
    AmbientOcclusionTexture,
    /// Terrain opacity map.
    OpacityTexture,
    /// Scenario lighting parameters.
    Lighting,
}

type Value = Arc<dyn Any + Send + Sync>;
type Slot = Arc<Mutex<Option<Value>>>;

/// Thread-safe property cache.
///
/// The map itself sits behind a `parking_lot::RwLock`; each key owns its own
/// mutex so one slow loader never blocks unrelated properties. A loader that
/// fails leaves its slot empty, so the next request tries again.
///
/// A loader must not request its own property.
#[derive(Default)]
pub struct ValueCache {
    slots: RwLock<HashMap<Property, Slot>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ValueCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: Property) -> Slot {
        if let Some(slot) = self.slots.read().get(&key) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(slots.entry(key).or_default())
    }

    /// Return the cached value for `key`, running `loader` on first access.
    ///
    /// Concurrent callers for the same key wait for the first one; the loader
    /// runs at most once per successful initialization.
    pub fn get_or_try_init<T, F>(&self, key: Property, loader: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T>,
    {
        let slot = self.slot(key);
        let mut guard = slot.lock();

        if let Some(value) = guard.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return downcast(key, Arc::clone(value));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(?key, "computing property");
        let value = Arc::new(loader()?);
        *guard = Some(Arc::clone(&value) as Value);
        Ok(value)
    }

    /// Cached value for `key`, if it has been computed.
    pub fn get<T: Any + Send + Sync>(&self, key: Property) -> Option<Arc<T>> {
        let slot = self.slots.read().get(&key).cloned()?;
        let value = slot.lock().clone()?;
        value.downcast::<T>().ok()
    }

    /// Check whether `key` holds a computed value.
    pub fn contains(&self, key: Property) -> bool {
        self.slots
            .read()
            .get(&key)
            .is_some_and(|slot| slot.lock().is_some())
    }

    /// Number of computed values.
    pub fn len(&self) -> usize {
        self.slots.read().values().filter(|s| s.lock().is_some()).count()
    }

    /// Check if nothing has been computed yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Requests answered from the cache.
    #[inline]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Requests that ran a loader.
    #[inline]
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

fn downcast<T: Any + Send + Sync>(key: Property, value: Value) -> Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| {
        Error::other(format!(
            "cached {:?} is not a {}",
            key,
            std::any::type_name::<T>()
        ))
    })
}

impl std::fmt::Debug for ValueCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCache")
            .field("len", &self.len())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}
