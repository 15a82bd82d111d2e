//! Process-wide asset registry.
//!
//! Handles are opaque strings mapping to immutable byte buffers. The table
//! owns the bytes: registering transfers ownership in, releasing reclaims
//! the memory. Handles are scarce process-wide resources — every live
//! handle keeps a buffer alive — so callers release them explicitly, or
//! hold them in an [`AssetGuard`] for cleanup on all exit paths.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::{ChorusError, Result};

/// Registry seam between the combiner and whatever stores asset bytes.
///
/// Resolution is async because a registry may be backed by a remote
/// transport; registration and release are registry-local.
#[async_trait]
pub trait AssetRegistry: Send + Sync {
    /// Take ownership of `bytes` and return a handle for them.
    fn register(&self, bytes: Vec<u8>) -> String;

    /// Fetch the bytes behind a handle. Unknown handles are a transport
    /// failure, propagated verbatim to the caller.
    async fn resolve(&self, handle: &str) -> Result<Arc<Vec<u8>>>;

    /// Drop the buffer behind a handle. Returns false if it was not held.
    fn release(&self, handle: &str) -> bool;
}

/// In-process registry backed by a concurrent map.
#[derive(Default)]
pub struct AssetStore {
    table: DashMap<String, Arc<Vec<u8>>>,
    seq: AtomicU64,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live handles, for leak visibility.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Unique handle id from the current time plus a process-wide counter.
    fn gen_handle(&self) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{:x}-{:x}", nanos, n)
    }
}

#[async_trait]
impl AssetRegistry for AssetStore {
    fn register(&self, bytes: Vec<u8>) -> String {
        let handle = self.gen_handle();
        debug!(
            target = "assets",
            handle = %handle,
            bytes = bytes.len(),
            "Registered asset"
        );
        self.table.insert(handle.clone(), Arc::new(bytes));
        handle
    }

    async fn resolve(&self, handle: &str) -> Result<Arc<Vec<u8>>> {
        self.table
            .get(handle)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ChorusError::Transport(format!("unknown asset handle: {}", handle)))
    }

    fn release(&self, handle: &str) -> bool {
        let released = self.table.remove(handle).is_some();
        debug!(target = "assets", handle = %handle, released, "Released asset");
        released
    }
}

/// Scoped handle ownership: releases the handle when dropped.
pub struct AssetGuard {
    registry: Arc<dyn AssetRegistry>,
    handle: Option<String>,
}

impl AssetGuard {
    pub fn new(registry: Arc<dyn AssetRegistry>, handle: String) -> Self {
        Self {
            registry,
            handle: Some(handle),
        }
    }

    pub fn handle(&self) -> &str {
        self.handle.as_deref().unwrap_or_default()
    }

    /// Give up ownership without releasing the asset.
    pub fn into_handle(mut self) -> String {
        self.handle.take().unwrap_or_default()
    }
}

impl Drop for AssetGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.registry.release(&handle);
        }
    }
}
