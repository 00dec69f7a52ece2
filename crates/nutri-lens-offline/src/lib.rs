#![warn(missing_docs)]
//! # nutri-lens-offline
//!
//! ## Purpose
//! Bootstraps and serves the offline snapshot of the client's static assets.
//!
//! ## Responsibilities
//! - Install the fixed precache manifest as one all-or-nothing batch.
//! - Serve cached assets first, falling back to the network unchanged.
//! - Keep the snapshot immutable: no write-back, no eviction, no freshness.
//!
//! ## Data flow
//! Startup -> [`OfflineAssetCache::install`] fetches every manifest path
//! through an [`AssetFetcher`] -> later requests go through
//! [`OfflineAssetCache::serve`], preferring the snapshot.
//!
//! ## Ownership and lifetimes
//! The cache owns its asset bodies. `serve` takes `&self`, so the
//! no-write-back rule is enforced by the signature rather than by discipline.
//!
//! ## Error model
//! Fetch failures surface as [`OfflineError`]; one failing manifest path
//! fails the whole install and commits nothing.
//!
//! ## Security and privacy notes
//! Only the fixed static manifest is cached; captured photos and analysis
//! responses never enter this store.

use std::collections::BTreeMap;

use thiserror::Error;

/// Version-tagged store name. Bumped manually when shipped assets change.
pub const STATIC_CACHE_NAME: &str = "nutri-lens-static-v2";

/// Fixed set of paths snapshotted at install time.
pub const PRECACHE_MANIFEST: [&str; 9] = [
    "/",
    "/static/css/dashboard.css",
    "/static/css/scan.css",
    "/static/css/loader.css",
    "/static/js/camera.js",
    "/static/js/loader.js",
    "/static/js/pwa-install.js",
    "/static/logo.png",
    "/static/logo.svg",
];

/// One fetched asset body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBody {
    /// Declared content type.
    pub content_type: String,
    /// Raw asset bytes.
    pub bytes: Vec<u8>,
}

/// Abstract network access used for install and passthrough serving.
pub trait AssetFetcher: Send + Sync {
    /// Fetches one asset by path.
    ///
    /// # Errors
    /// Returns [`OfflineError::Fetch`] when the asset cannot be retrieved.
    fn fetch(&self, path: &str) -> Result<AssetBody, OfflineError>;
}

/// Cache lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    /// Snapshot not yet committed; every request passes through.
    Installing,
    /// Snapshot committed and serving cache-first.
    Active,
}

/// Where a served asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    /// Returned from the committed snapshot.
    Cache,
    /// Fetched from the network on a snapshot miss.
    Network,
}

/// One served asset plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedAsset {
    /// The asset body handed to the caller.
    pub body: AssetBody,
    /// Whether the snapshot or the network produced it.
    pub served_from: ServedFrom,
}

/// Immutable-after-install snapshot of static assets.
#[derive(Debug)]
pub struct OfflineAssetCache {
    name: String,
    phase: CachePhase,
    assets: BTreeMap<String, AssetBody>,
}

impl OfflineAssetCache {
    /// Creates an empty cache in the installing phase.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phase: CachePhase::Installing,
            assets: BTreeMap::new(),
        }
    }

    /// Version-tagged store name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> CachePhase {
        self.phase
    }

    /// Returns `true` when the snapshot holds the path.
    pub fn contains(&self, path: &str) -> bool {
        self.assets.contains_key(path)
    }

    /// Number of snapshotted assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns `true` when nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Fetches every manifest path and commits them as one batch.
    ///
    /// Staging is all-or-nothing: the first failing path aborts the install,
    /// nothing is committed, and the cache stays in the installing phase.
    ///
    /// # Errors
    /// Returns [`OfflineError::AlreadyActive`] when a snapshot was committed
    /// before, and the failing path's [`OfflineError::Fetch`] otherwise.
    pub fn install(
        &mut self,
        fetcher: &dyn AssetFetcher,
        manifest: &[&str],
    ) -> Result<usize, OfflineError> {
        if self.phase == CachePhase::Active {
            return Err(OfflineError::AlreadyActive);
        }

        let mut staged = BTreeMap::new();
        for path in manifest {
            let body = fetcher.fetch(path)?;
            staged.insert((*path).to_string(), body);
        }

        let count = staged.len();
        self.assets = staged;
        self.phase = CachePhase::Active;
        Ok(count)
    }

    /// Serves one path: snapshot hit while active, network passthrough
    /// otherwise. Misses are returned unchanged and never written back.
    ///
    /// # Errors
    /// Propagates [`OfflineError::Fetch`] from the passthrough fetch.
    pub fn serve(
        &self,
        fetcher: &dyn AssetFetcher,
        path: &str,
    ) -> Result<ServedAsset, OfflineError> {
        if self.phase == CachePhase::Active
            && let Some(body) = self.assets.get(path)
        {
            return Ok(ServedAsset {
                body: body.clone(),
                served_from: ServedFrom::Cache,
            });
        }

        let body = fetcher.fetch(path)?;
        Ok(ServedAsset {
            body,
            served_from: ServedFrom::Network,
        })
    }
}

/// Errors produced by the offline cache.
#[derive(Debug, Error)]
pub enum OfflineError {
    /// One asset could not be fetched.
    #[error("asset fetch failure for {path}: {reason}")]
    Fetch {
        /// Requested asset path.
        path: String,
        /// Underlying failure description.
        reason: String,
    },
    /// A snapshot was already committed for this cache name.
    #[error("offline cache is already active")]
    AlreadyActive,
}
