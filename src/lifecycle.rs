//! Transient references to preview and output payloads.
//!
//! Every payload the session exposes (the preview of a selected file, the
//! encoded bytes of a processed image) is reachable through a
//! [`TransientRef`] handed out by a shared [`RefTracker`]. A reference is
//! revoked when its handle is dropped, so each one is revoked exactly once and
//! can never be read afterwards.
//!
//! The tracker keeps a table of live ids so the rest of the crate (and tests)
//! can check that nothing leaks: after a download-all there are no live
//! output references, after a new selection none of the old previews remain.
//!
//! ## Locators
//!
//! Each reference carries a printable locator, used as the link target in the
//! HTML report:
//! - `file:///abs/path/beach.jpg` for payloads that live on disk
//! - `mem:output/7` for payloads held in memory

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Preview,
    Output,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKind::Preview => f.write_str("preview"),
            RefKind::Output => f.write_str("output"),
        }
    }
}

/// The bytes behind a reference.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Read lazily from disk on every [`TransientRef::read`].
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

/// Counters over the lifetime of a tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefStats {
    pub created: u64,
    pub revoked: u64,
    /// Revocations of ids that were not live. Always zero through the public API.
    pub stray: u64,
}

impl RefStats {
    pub fn live(&self) -> u64 {
        self.created - self.revoked
    }
}

impl fmt::Display for RefStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} revoked, {} live",
            self.created,
            self.revoked,
            self.live()
        )?;
        if self.stray > 0 {
            write!(f, ", {} stray", self.stray)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct LiveEntry {
    kind: RefKind,
    locator: String,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    created: AtomicU64,
    revoked: AtomicU64,
    stray: AtomicU64,
    live: Mutex<HashMap<u64, LiveEntry>>,
}

/// Shared registry of live references. Cloning yields another handle to the
/// same table.
#[derive(Debug, Clone, Default)]
pub struct RefTracker {
    inner: Arc<Inner>,
}

impl RefTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<u64, LiveEntry>> {
        self.inner.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a payload and hand out the only handle to it.
    pub fn acquire(&self, kind: RefKind, payload: Payload) -> TransientRef {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let locator = match &payload {
            Payload::File(path) => file_locator(path),
            Payload::Bytes(_) => format!("mem:{kind}/{id}"),
        };
        self.table().insert(
            id,
            LiveEntry {
                kind,
                locator: locator.clone(),
            },
        );
        self.inner.created.fetch_add(1, Ordering::Relaxed);
        debug!(id, %kind, %locator, "reference acquired");

        TransientRef {
            id,
            kind,
            locator,
            payload,
            tracker: self.clone(),
        }
    }

    fn revoke(&self, id: u64) {
        match self.table().remove(&id) {
            Some(entry) => {
                self.inner.revoked.fetch_add(1, Ordering::Relaxed);
                debug!(id, kind = %entry.kind, locator = %entry.locator, "reference revoked");
            }
            None => {
                self.inner.stray.fetch_add(1, Ordering::Relaxed);
                error!(id, "revoked a reference that is not live");
            }
        }
    }

    pub fn live_count(&self) -> usize {
        self.table().len()
    }

    pub fn live_count_of(&self, kind: RefKind) -> usize {
        self.table().values().filter(|e| e.kind == kind).count()
    }

    pub fn is_live(&self, id: u64) -> bool {
        self.table().contains_key(&id)
    }

    pub fn stats(&self) -> RefStats {
        RefStats {
            created: self.inner.created.load(Ordering::Relaxed),
            revoked: self.inner.revoked.load(Ordering::Relaxed),
            stray: self.inner.stray.load(Ordering::Relaxed),
        }
    }
}

fn file_locator(path: &Path) -> String {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", abs.display())
}

/// Owning handle to a live reference. Dropping it revokes the reference.
///
/// Not `Clone`: there is exactly one handle per id, so revocation happens
/// exactly once and no read can follow it.
pub struct TransientRef {
    id: u64,
    kind: RefKind,
    locator: String,
    payload: Payload,
    tracker: RefTracker,
}

impl TransientRef {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> RefKind {
        self.kind
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// The payload bytes. File payloads are read from disk on each call.
    pub fn read(&self) -> Result<Arc<[u8]>, LifecycleError> {
        match &self.payload {
            Payload::Bytes(bytes) => Ok(Arc::clone(bytes)),
            Payload::File(path) => std::fs::read(path)
                .map(Arc::from)
                .map_err(|source| LifecycleError::Io {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

impl fmt::Debug for TransientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransientRef")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("locator", &self.locator)
            .finish()
    }
}

impl Drop for TransientRef {
    fn drop(&mut self) {
        self.tracker.revoke(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn bytes(data: &[u8]) -> Payload {
        Payload::Bytes(Arc::from(data))
    }

    // =========================================================================
    // acquire / revoke
    // =========================================================================

    #[test]
    fn acquire_registers_live_reference() {
        let tracker = RefTracker::new();
        let r = tracker.acquire(RefKind::Output, bytes(b"abc"));
        assert_eq!(tracker.live_count(), 1);
        assert!(tracker.is_live(r.id()));
        assert_eq!(r.kind(), RefKind::Output);
    }

    #[test]
    fn drop_revokes_exactly_once() {
        let tracker = RefTracker::new();
        let r = tracker.acquire(RefKind::Preview, bytes(b"x"));
        let id = r.id();
        drop(r);

        assert!(!tracker.is_live(id));
        assert_eq!(
            tracker.stats(),
            RefStats {
                created: 1,
                revoked: 1,
                stray: 0
            }
        );
    }

    #[test]
    fn ids_are_unique() {
        let tracker = RefTracker::new();
        let a = tracker.acquire(RefKind::Output, bytes(b"a"));
        let b = tracker.acquire(RefKind::Output, bytes(b"b"));
        assert_ne!(a.id(), b.id());
        assert_ne!(a.locator(), b.locator());
    }

    #[test]
    fn live_count_by_kind() {
        let tracker = RefTracker::new();
        let _p1 = tracker.acquire(RefKind::Preview, bytes(b"1"));
        let _p2 = tracker.acquire(RefKind::Preview, bytes(b"2"));
        let o = tracker.acquire(RefKind::Output, bytes(b"3"));

        assert_eq!(tracker.live_count_of(RefKind::Preview), 2);
        assert_eq!(tracker.live_count_of(RefKind::Output), 1);
        drop(o);
        assert_eq!(tracker.live_count_of(RefKind::Output), 0);
        assert_eq!(tracker.live_count(), 2);
    }

    #[test]
    fn clones_share_the_table() {
        let tracker = RefTracker::new();
        let other = tracker.clone();
        let _r = other.acquire(RefKind::Output, bytes(b"z"));
        assert_eq!(tracker.live_count(), 1);
    }

    #[test]
    fn stray_revocation_is_counted() {
        let tracker = RefTracker::new();
        tracker.revoke(42);
        assert_eq!(tracker.stats().stray, 1);
        assert_eq!(tracker.stats().revoked, 0);
    }

    // =========================================================================
    // locators and reads
    // =========================================================================

    #[test]
    fn memory_locator_names_kind_and_id() {
        let tracker = RefTracker::new();
        let r = tracker.acquire(RefKind::Output, bytes(b"x"));
        assert_eq!(r.locator(), format!("mem:output/{}", r.id()));
    }

    #[test]
    fn file_locator_is_absolute() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("beach.jpg");
        let tracker = RefTracker::new();
        let r = tracker.acquire(RefKind::Preview, Payload::File(path.clone()));
        assert_eq!(r.locator(), format!("file://{}", path.display()));
    }

    #[test]
    fn read_bytes_payload() {
        let tracker = RefTracker::new();
        let r = tracker.acquire(RefKind::Output, bytes(b"payload"));
        assert_eq!(&*r.read().unwrap(), b"payload");
    }

    #[test]
    fn read_file_payload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.bin");
        fs::write(&path, b"on disk").unwrap();

        let tracker = RefTracker::new();
        let r = tracker.acquire(RefKind::Preview, Payload::File(path));
        assert_eq!(&*r.read().unwrap(), b"on disk");
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let tracker = RefTracker::new();
        let r = tracker.acquire(
            RefKind::Preview,
            Payload::File(tmp.path().join("missing.jpg")),
        );
        assert!(matches!(r.read(), Err(LifecycleError::Io { .. })));
    }

    #[test]
    fn stats_display() {
        let stats = RefStats {
            created: 5,
            revoked: 3,
            stray: 0,
        };
        assert_eq!(stats.to_string(), "5 created, 3 revoked, 2 live");
    }
}
