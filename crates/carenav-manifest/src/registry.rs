//! Process-lifetime manifest cache
//!
//! Manifests are parsed and validated at most once per `(module, version)`
//! pair; every caller after the first shares the same immutable `Arc`.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use tracing::debug;

use crate::loader::{ManifestError, ManifestLoader};
use crate::manifest::{ModuleHeader, ModuleManifest};

/// Probe type: reads only the header so the cache can be consulted before
/// paying for a full parse + validate.
#[derive(Deserialize)]
struct HeaderProbe {
    module: ModuleHeader,
}

/// Shared, versioned manifest cache
#[derive(Debug, Default)]
pub struct ManifestRegistry {
    loaded: DashMap<ModuleHeader, Arc<ModuleManifest>>,
}

impl ManifestRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON document, reusing the cached manifest for a version
    /// that was already loaded.
    ///
    /// # Errors
    /// Returns [`ManifestError`] if the document is malformed or invalid.
    pub fn load_json(&self, raw: &str) -> Result<Arc<ModuleManifest>, ManifestError> {
        let probe: HeaderProbe = serde_json::from_str(raw)?;
        if let Some(cached) = self.loaded.get(&probe.module) {
            debug!(module = %probe.module.id, version = %probe.module.version, "manifest cache hit");
            return Ok(Arc::clone(&cached));
        }
        let manifest = ManifestLoader::from_json(raw)?;
        Ok(self.insert(manifest))
    }

    /// Load a YAML document, reusing the cached manifest for a version
    /// that was already loaded.
    ///
    /// # Errors
    /// Returns [`ManifestError`] if the document is malformed or invalid.
    pub fn load_yaml(&self, raw: &str) -> Result<Arc<ModuleManifest>, ManifestError> {
        let probe: HeaderProbe = serde_yaml::from_str(raw)?;
        if let Some(cached) = self.loaded.get(&probe.module) {
            debug!(module = %probe.module.id, version = %probe.module.version, "manifest cache hit");
            return Ok(Arc::clone(&cached));
        }
        let manifest = ManifestLoader::from_yaml(raw)?;
        Ok(self.insert(manifest))
    }

    /// Insert an already-validated manifest, returning the shared handle
    ///
    /// If the same version was inserted concurrently, the first insert wins
    /// and its handle is returned.
    pub fn insert(&self, manifest: ModuleManifest) -> Arc<ModuleManifest> {
        let key = manifest.module.clone();
        let entry = self
            .loaded
            .entry(key)
            .or_insert_with(|| Arc::new(manifest));
        Arc::clone(&entry)
    }

    /// Fetch a cached manifest by exact header
    #[must_use]
    pub fn get(&self, header: &ModuleHeader) -> Option<Arc<ModuleManifest>> {
        self.loaded.get(header).map(|m| Arc::clone(&m))
    }

    /// Number of cached manifest versions
    #[must_use]
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}
