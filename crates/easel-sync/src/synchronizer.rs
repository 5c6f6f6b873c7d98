use std::sync::Arc;

use chrono::{DateTime, Utc};
use easel_catalog::{Catalog, CatalogError, CanvasRecord, VersionRecord};
use easel_lock::{LockGuard, LockManager, LockProvider};
use easel_store::BlobStore;
use easel_types::{BlobKey, CanvasId, CanvasState, Transaction, Version};
use tracing::{debug, info, warn};

use crate::apply;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::legacy;

/// The state synchronizer.
///
/// Orchestrates locked read-modify-write cycles over canvas state:
/// resolves the version to build on, applies incoming transaction batches
/// in order, persists the new snapshot, and advances the head pointer,
/// all serialized per canvas by the distributed lock. Reads never lock.
pub struct Synchronizer {
    blobs: Arc<dyn BlobStore>,
    catalog: Arc<dyn Catalog>,
    locks: LockManager,
}

impl Synchronizer {
    /// Create a synchronizer with the default lock TTL and retry policy.
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        catalog: Arc<dyn Catalog>,
        locks: Arc<dyn LockProvider>,
    ) -> Self {
        Self::with_config(blobs, catalog, locks, SyncConfig::default())
    }

    /// Create a synchronizer with an explicit configuration.
    pub fn with_config(
        blobs: Arc<dyn BlobStore>,
        catalog: Arc<dyn Catalog>,
        locks: Arc<dyn LockProvider>,
        config: SyncConfig,
    ) -> Self {
        Self {
            blobs,
            catalog,
            locks: LockManager::with_config(locks, config.lock),
        }
    }

    // ---- Reads ----

    /// Load a canvas snapshot.
    ///
    /// Resolves the explicit `version` if given, else the canvas's head.
    /// A canvas with no head falls back to the legacy bridge when a
    /// pre-versioning document pointer exists (committing version 1 as a
    /// side effect), and otherwise yields a fresh empty state without
    /// persisting anything.
    pub async fn get_state(
        &self,
        canvas_id: &CanvasId,
        version: Option<Version>,
    ) -> SyncResult<CanvasState> {
        let canvas = self.require_canvas(canvas_id).await?;
        let target = match version {
            Some(v) => v,
            None => match canvas.head_version {
                Some(head) => head,
                None => {
                    if let Some(legacy_key) = canvas.legacy_state_key.as_ref() {
                        return self.migrate_legacy(canvas_id, legacy_key).await;
                    }
                    debug!(%canvas_id, "no committed version, returning empty state");
                    return Ok(CanvasState::empty());
                }
            },
        };
        self.load_snapshot(canvas_id, target).await
    }

    /// The suffix of the resolved snapshot's transaction log created
    /// strictly after `since`, in log order. Pure read, no lock.
    pub async fn get_transactions(
        &self,
        canvas_id: &CanvasId,
        version: Option<Version>,
        since: DateTime<Utc>,
    ) -> SyncResult<Vec<Transaction>> {
        let state = self.get_state(canvas_id, version).await?;
        Ok(state.transactions_since(since))
    }

    // ---- Storage primitives ----

    /// Serialize `state` and write it at its canonical blob key.
    ///
    /// Touches neither the catalog nor the head pointer; this is the pure
    /// storage primitive under the commit path and snapshot copies.
    pub async fn save_state(
        &self,
        canvas_id: &CanvasId,
        state: &CanvasState,
    ) -> SyncResult<BlobKey> {
        if !state.version.is_committed() {
            return Err(SyncError::UncommittedState {
                canvas_id: canvas_id.clone(),
            });
        }
        let bytes = state.encode()?;
        self.write_snapshot(canvas_id, state.version, bytes).await
    }

    /// [`save_state`](Self::save_state) plus the atomic catalog commit:
    /// version row insert and head advance in one step. The blob lands
    /// first, so a version is never discoverable without its payload.
    pub async fn commit_state(
        &self,
        canvas_id: &CanvasId,
        state: &CanvasState,
    ) -> SyncResult<BlobKey> {
        if !state.version.is_committed() {
            return Err(SyncError::UncommittedState {
                canvas_id: canvas_id.clone(),
            });
        }
        let bytes = state.encode()?;
        let content_hash = hex::encode(blake3::hash(&bytes).as_bytes());
        let blob_key = self.write_snapshot(canvas_id, state.version, bytes).await?;

        let record = VersionRecord::new(
            canvas_id.clone(),
            state.version,
            blob_key.clone(),
            content_hash,
        );
        self.catalog.commit_version(&record).await?;
        info!(%canvas_id, version = %state.version, "committed snapshot");
        Ok(blob_key)
    }

    // ---- Commit path ----

    /// The locked read-modify-write commit.
    ///
    /// Resolves the version to build on (explicit argument, else head),
    /// treats an empty batch as a logged no-op, and otherwise serializes
    /// behind the per-canvas lock: load, apply each transaction's diffs in
    /// order, append to the log, commit as the successor version. The lock
    /// is released on every exit path.
    ///
    /// Returns the committed version (or the resolved version on the
    /// empty-batch no-op).
    pub async fn sync_state(
        &self,
        canvas_id: &CanvasId,
        transactions: Vec<Transaction>,
        version: Option<Version>,
    ) -> SyncResult<Version> {
        let resolved = self.resolve_version_to_sync(canvas_id, version).await?;
        if transactions.is_empty() {
            debug!(%canvas_id, "empty transaction batch, nothing to synchronize");
            return Ok(resolved);
        }

        let guard = self.lock_state(canvas_id).await?;
        let result = self
            .commit_transactions(canvas_id, transactions, version, resolved)
            .await;
        if let Err(e) = guard.release().await {
            warn!(%canvas_id, error = %e, "failed to release canvas lock");
        }
        result
    }

    /// Re-entrant commit for a caller that already holds the canvas lock.
    /// Identical cycle to [`sync_state`](Self::sync_state), minus lock
    /// acquisition and release.
    pub async fn sync_state_locked(
        &self,
        canvas_id: &CanvasId,
        transactions: Vec<Transaction>,
        version: Option<Version>,
    ) -> SyncResult<Version> {
        let resolved = self.resolve_version_to_sync(canvas_id, version).await?;
        if transactions.is_empty() {
            debug!(%canvas_id, "empty transaction batch, nothing to synchronize");
            return Ok(resolved);
        }
        self.commit_transactions(canvas_id, transactions, version, resolved)
            .await
    }

    /// Acquire the per-canvas write lock with the configured bounded
    /// backoff. Exhausted contention surfaces as
    /// [`SyncError::OperationTooFrequent`].
    pub async fn lock_state(&self, canvas_id: &CanvasId) -> SyncResult<Box<dyn LockGuard>> {
        self.locks
            .lock_state(canvas_id)
            .await
            .map_err(|e| SyncError::lock_failure(canvas_id, e))
    }

    async fn commit_transactions(
        &self,
        canvas_id: &CanvasId,
        transactions: Vec<Transaction>,
        explicit: Option<Version>,
        fallback: Version,
    ) -> SyncResult<Version> {
        // The pre-lock resolution only served the fail-fast checks. With no
        // explicit version, build on the head as it stands now that the
        // lock is held; another writer may have advanced it since.
        let version_to_sync = match explicit {
            Some(v) => v,
            None => self.catalog.head(canvas_id).await?.unwrap_or(fallback),
        };

        let mut state = self.get_state(canvas_id, Some(version_to_sync)).await?;

        let batch = transactions.len();
        let synced_at = Utc::now();
        for mut tx in transactions {
            apply::apply_transaction(&mut state, &tx);
            tx.synced_at = Some(synced_at);
            state.transactions.push(tx);
        }

        let next = self.catalog.next_version(canvas_id).await?;
        state.version = next;
        self.commit_state(canvas_id, &state).await?;
        debug!(
            %canvas_id,
            from = %version_to_sync,
            to = %next,
            transactions = batch,
            "synchronized state"
        );
        Ok(next)
    }

    async fn resolve_version_to_sync(
        &self,
        canvas_id: &CanvasId,
        version: Option<Version>,
    ) -> SyncResult<Version> {
        let canvas = self.require_canvas(canvas_id).await?;
        version
            .or(canvas.head_version)
            .ok_or_else(|| SyncError::VersionNotFound {
                canvas_id: canvas_id.clone(),
                version: None,
            })
    }

    // ---- Duplication / teardown ----

    /// Copy the head snapshot of `source` as the next version of `target`
    /// (canvas duplication). The target must already exist; its lock
    /// guards the commit.
    pub async fn copy_state(&self, source: &CanvasId, target: &CanvasId) -> SyncResult<Version> {
        let mut state = self.get_state(source, None).await?;
        self.require_canvas(target).await?;

        let guard = self.lock_state(target).await?;
        let result = async {
            let next = self.catalog.next_version(target).await?;
            state.version = next;
            self.commit_state(target, &state).await?;
            Ok(next)
        }
        .await;
        if let Err(e) = guard.release().await {
            warn!(canvas_id = %target, error = %e, "failed to release canvas lock");
        }
        result
    }

    /// Tear down a canvas: purge its catalog rows and delete the snapshot
    /// blobs they point at.
    pub async fn delete_canvas(&self, canvas_id: &CanvasId) -> SyncResult<()> {
        let removed = self.catalog.purge(canvas_id).await?;
        for record in &removed {
            if let Err(e) = self.blobs.remove(&record.blob_key).await {
                warn!(%canvas_id, blob_key = %record.blob_key, error = %e, "failed to delete snapshot blob");
            }
        }
        info!(%canvas_id, versions = removed.len(), "canvas purged");
        Ok(())
    }

    // ---- Legacy bridge ----

    /// Materialize version 1 from the pre-versioning document blob and
    /// commit it. Racing migrations are benign: the source blob is
    /// read-only, so losing the commit race just means returning the
    /// winner's snapshot.
    async fn migrate_legacy(
        &self,
        canvas_id: &CanvasId,
        legacy_key: &BlobKey,
    ) -> SyncResult<CanvasState> {
        let bytes = self.blobs.get(legacy_key).await?;
        let state = legacy::materialize(bytes.as_deref());
        info!(
            %canvas_id,
            %legacy_key,
            nodes = state.nodes.len(),
            edges = state.edges.len(),
            "migrating legacy document"
        );

        match self.commit_state(canvas_id, &state).await {
            Ok(_) => Ok(state),
            Err(SyncError::Catalog(CatalogError::VersionExists { .. })) => {
                self.load_snapshot(canvas_id, state.version).await
            }
            Err(e) => Err(e),
        }
    }

    // ---- Internal helpers ----

    async fn require_canvas(&self, canvas_id: &CanvasId) -> SyncResult<CanvasRecord> {
        match self.catalog.canvas(canvas_id).await? {
            Some(record) if !record.is_deleted() => Ok(record),
            _ => Err(SyncError::CanvasNotFound {
                canvas_id: canvas_id.clone(),
            }),
        }
    }

    async fn load_snapshot(
        &self,
        canvas_id: &CanvasId,
        version: Version,
    ) -> SyncResult<CanvasState> {
        let record = self.catalog.version(canvas_id, version).await?.ok_or_else(|| {
            SyncError::VersionNotFound {
                canvas_id: canvas_id.clone(),
                version: Some(version),
            }
        })?;
        let bytes = self.blobs.get(&record.blob_key).await?.ok_or_else(|| {
            SyncError::SnapshotMissing {
                canvas_id: canvas_id.clone(),
                version,
                blob_key: record.blob_key.clone(),
            }
        })?;
        Ok(CanvasState::decode(&bytes)?)
    }

    async fn write_snapshot(
        &self,
        canvas_id: &CanvasId,
        version: Version,
        bytes: Vec<u8>,
    ) -> SyncResult<BlobKey> {
        let key = BlobKey::state(canvas_id, version);
        debug!(%canvas_id, %version, bytes = bytes.len(), "writing snapshot");
        self.blobs.put(&key, bytes).await?;
        Ok(key)
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("locks", &self.locks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_catalog::InMemoryCatalog;
    use easel_lock::{lock_key, InMemoryLockProvider, LockConfig, RetryConfig};
    use easel_store::InMemoryBlobStore;
    use easel_types::{Node, NodeDiff};
    use serde_json::json;
    use std::time::Duration;

    struct Harness {
        sync: Synchronizer,
        blobs: Arc<InMemoryBlobStore>,
        catalog: Arc<InMemoryCatalog>,
        locks: InMemoryLockProvider,
    }

    fn harness() -> Harness {
        harness_with_config(SyncConfig::default())
    }

    fn harness_with_config(config: SyncConfig) -> Harness {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let locks = InMemoryLockProvider::new();
        let sync = Synchronizer::with_config(
            blobs.clone(),
            catalog.clone(),
            Arc::new(locks.clone()),
            config,
        );
        Harness {
            sync,
            blobs,
            catalog,
            locks,
        }
    }

    fn canvas(id: &str) -> CanvasId {
        CanvasId::new(id)
    }

    async fn create_canvas(h: &Harness, id: &str) {
        h.catalog
            .insert_canvas(&CanvasRecord::new(canvas(id), "owner-1"))
            .await
            .unwrap();
    }

    /// Create a canvas and commit an empty initial snapshot, the way the
    /// canvas-creation call site bootstraps a lineage.
    async fn create_committed_canvas(h: &Harness, id: &str) {
        create_canvas(h, id).await;
        h.sync
            .commit_state(&canvas(id), &CanvasState::initial(vec![], vec![]))
            .await
            .unwrap();
    }

    fn add_node_tx(id: &str) -> Transaction {
        Transaction::new().with_node_diff(NodeDiff::add(Node::new(id)))
    }

    // -----------------------------------------------------------------------
    // get_state
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_state_of_unknown_canvas_fails() {
        let h = harness();
        let err = h.sync.get_state(&canvas("ghost"), None).await.unwrap_err();
        assert!(matches!(err, SyncError::CanvasNotFound { .. }));
    }

    #[tokio::test]
    async fn get_state_of_soft_deleted_canvas_fails() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;
        h.catalog.soft_delete(&canvas("c1")).await.unwrap();

        let err = h.sync.get_state(&canvas("c1"), None).await.unwrap_err();
        assert!(matches!(err, SyncError::CanvasNotFound { .. }));
    }

    #[tokio::test]
    async fn fresh_canvas_yields_empty_state_without_persisting() {
        let h = harness();
        create_canvas(&h, "c1").await;

        let state = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        assert_eq!(state.version, Version::UNCOMMITTED);
        assert!(state.nodes.is_empty());
        assert!(h.blobs.is_empty());
        assert!(h.catalog.head(&canvas("c1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn explicit_missing_version_fails() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;

        let err = h
            .sync
            .get_state(&canvas("c1"), Some(Version::new(9)))
            .await
            .unwrap_err();
        match err {
            SyncError::VersionNotFound { version, .. } => {
                assert_eq!(version, Some(Version::new(9)));
            }
            other => panic!("expected VersionNotFound, got: {other}"),
        }
    }

    #[tokio::test]
    async fn commit_then_get_roundtrips_structurally() {
        let h = harness();
        create_canvas(&h, "c1").await;

        let state = CanvasState::initial(
            vec![Node::new("a").with_attr("label", json!("start"))],
            vec![],
        );
        h.sync.commit_state(&canvas("c1"), &state).await.unwrap();

        let loaded = h
            .sync
            .get_state(&canvas("c1"), Some(Version::first()))
            .await
            .unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn missing_snapshot_blob_is_distinguished() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;
        h.blobs
            .remove(&BlobKey::state(&canvas("c1"), Version::first()))
            .await
            .unwrap();

        let err = h.sync.get_state(&canvas("c1"), None).await.unwrap_err();
        assert!(matches!(err, SyncError::SnapshotMissing { .. }));
    }

    // -----------------------------------------------------------------------
    // save_state / commit_state
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn save_state_touches_no_catalog_state() {
        let h = harness();
        create_canvas(&h, "c1").await;

        let state = CanvasState::initial(vec![Node::new("a")], vec![]);
        let key = h.sync.save_state(&canvas("c1"), &state).await.unwrap();
        assert_eq!(key.as_str(), "canvas-state/c1/1");
        assert!(h.blobs.exists(&key).await.unwrap());

        // No version row, no head: the blob alone is not discoverable.
        assert!(h.catalog.head(&canvas("c1")).await.unwrap().is_none());
        let err = h
            .sync
            .get_state(&canvas("c1"), Some(Version::first()))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::VersionNotFound { .. }));
    }

    #[tokio::test]
    async fn uncommitted_state_cannot_be_saved() {
        let h = harness();
        create_canvas(&h, "c1").await;

        let err = h
            .sync
            .save_state(&canvas("c1"), &CanvasState::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::UncommittedState { .. }));
    }

    #[tokio::test]
    async fn commit_state_records_content_hash() {
        let h = harness();
        create_canvas(&h, "c1").await;

        let state = CanvasState::initial(vec![Node::new("a")], vec![]);
        let key = h.sync.commit_state(&canvas("c1"), &state).await.unwrap();

        let record = h
            .catalog
            .version(&canvas("c1"), Version::first())
            .await
            .unwrap()
            .unwrap();
        let bytes = h.blobs.get(&key).await.unwrap().unwrap();
        assert_eq!(
            record.content_hash,
            hex::encode(blake3::hash(&bytes).as_bytes())
        );
    }

    // -----------------------------------------------------------------------
    // sync_state: resolution and no-op semantics
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn sync_without_any_version_fails() {
        let h = harness();
        create_canvas(&h, "c1").await;

        let err = h
            .sync
            .sync_state(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap_err();
        match err {
            SyncError::VersionNotFound { version, .. } => assert!(version.is_none()),
            other => panic!("expected VersionNotFound, got: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_batch_is_a_noop() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;

        let resolved = h.sync.sync_state(&canvas("c1"), vec![], None).await.unwrap();
        assert_eq!(resolved, Version::first());

        // Head, version rows, and lock all untouched.
        assert_eq!(
            h.catalog.head(&canvas("c1")).await.unwrap(),
            Some(Version::first())
        );
        assert_eq!(h.catalog.versions(&canvas("c1")).await.unwrap().len(), 1);
        assert!(!h.locks.is_held(&lock_key(&canvas("c1"))));
    }

    // -----------------------------------------------------------------------
    // sync_state: commit semantics
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn sync_commits_successor_version() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;

        let committed = h
            .sync
            .sync_state(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap();
        assert_eq!(committed, Version::new(2));

        let state = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        assert_eq!(state.version, Version::new(2));
        assert!(state.node("a").is_some());
        assert_eq!(state.transactions.len(), 1);
        assert!(state.transactions[0].synced_at.is_some());
        assert_eq!(
            h.catalog.head(&canvas("c1")).await.unwrap(),
            Some(Version::new(2))
        );
    }

    #[tokio::test]
    async fn transactions_apply_and_log_in_submission_order() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;

        let first = add_node_tx("a");
        let second = Transaction::new().with_node_diff(NodeDiff::add(
            Node::new("a").with_attr("label", json!("second")),
        ));
        let first_id = first.tx_id;
        let second_id = second.tx_id;

        h.sync
            .sync_state(&canvas("c1"), vec![first, second], None)
            .await
            .unwrap();

        let state = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        // Second add overwrote the first; log preserves both in order.
        assert_eq!(state.nodes.len(), 1);
        assert_eq!(state.node("a").unwrap().attrs["label"], json!("second"));
        assert_eq!(state.transactions[0].tx_id, first_id);
        assert_eq!(state.transactions[1].tx_id, second_id);
    }

    #[tokio::test]
    async fn sequential_syncs_accumulate_the_log() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;

        let t1 = add_node_tx("a");
        let t1_id = t1.tx_id;
        h.sync
            .sync_state(&canvas("c1"), vec![t1], None)
            .await
            .unwrap();

        let t2 = add_node_tx("b");
        let t2_id = t2.tx_id;
        h.sync
            .sync_state(&canvas("c1"), vec![t2], None)
            .await
            .unwrap();

        let state = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        assert_eq!(state.version, Version::new(3));
        let log: Vec<_> = state.transactions.iter().map(|tx| tx.tx_id).collect();
        assert_eq!(log, vec![t1_id, t2_id]);
        let ids: Vec<&str> = state.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn explicit_version_builds_on_that_snapshot() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;
        h.sync
            .sync_state(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap(); // version 2

        // Build on version 1 explicitly: "a" from version 2 must not appear.
        let committed = h
            .sync
            .sync_state(
                &canvas("c1"),
                vec![add_node_tx("b")],
                Some(Version::first()),
            )
            .await
            .unwrap();
        assert_eq!(committed, Version::new(3));

        let state = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        let ids: Vec<&str> = state.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn repeated_add_for_same_id_does_not_duplicate() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;

        h.sync
            .sync_state(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap();
        h.sync
            .sync_state(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap();

        let state = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        assert_eq!(state.nodes.len(), 1);
    }

    // -----------------------------------------------------------------------
    // sync_state: locking
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn contended_sync_fails_with_operation_too_frequent() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;
        let _held = h.sync.lock_state(&canvas("c1")).await.unwrap();

        let err = h
            .sync
            .sync_state(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap_err();
        match err {
            SyncError::OperationTooFrequent { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("expected OperationTooFrequent, got: {other}"),
        }

        // The failed writer committed nothing.
        assert_eq!(
            h.catalog.head(&canvas("c1")).await.unwrap(),
            Some(Version::first())
        );
    }

    #[tokio::test]
    async fn lock_released_after_successful_sync() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;

        h.sync
            .sync_state(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap();
        assert!(!h.locks.is_held(&lock_key(&canvas("c1"))));
    }

    #[tokio::test]
    async fn lock_released_after_failed_sync() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;

        // Explicit missing version fails inside the locked section.
        let err = h
            .sync
            .sync_state(
                &canvas("c1"),
                vec![add_node_tx("a")],
                Some(Version::new(99)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::VersionNotFound { .. }));
        assert!(!h.locks.is_held(&lock_key(&canvas("c1"))));

        // The canvas is not starved: the next commit goes through.
        h.sync
            .sync_state(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sync_state_locked_runs_under_caller_lock() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;

        let guard = h.sync.lock_state(&canvas("c1")).await.unwrap();
        let committed = h
            .sync
            .sync_state_locked(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap();
        assert_eq!(committed, Version::new(2));

        // The caller still holds the lock afterwards.
        assert!(h.locks.is_held(&lock_key(&canvas("c1"))));
        guard.release().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_lose_no_updates() {
        let config = SyncConfig {
            lock: LockConfig {
                ttl: Duration::from_secs(5),
                retry: RetryConfig {
                    max_retries: 12,
                    initial_delay: Duration::from_millis(5),
                },
            },
        };
        let h = harness_with_config(config);
        create_committed_canvas(&h, "c1").await;
        let sync = Arc::new(h.sync);

        let writers = 6;
        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let sync = Arc::clone(&sync);
                tokio::spawn(async move {
                    sync.sync_state(
                        &CanvasId::new("c1"),
                        vec![add_node_tx(&format!("marker-{i}"))],
                        None,
                    )
                    .await
                    .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let state = sync.get_state(&canvas("c1"), None).await.unwrap();
        assert_eq!(state.nodes.len(), writers);
        for i in 0..writers {
            assert!(
                state.node(&format!("marker-{i}")).is_some(),
                "marker-{i} was lost"
            );
        }
        assert_eq!(state.transactions.len(), writers);
        assert_eq!(
            h.catalog.head(&canvas("c1")).await.unwrap(),
            Some(Version::new(1 + writers as u64))
        );
    }

    // -----------------------------------------------------------------------
    // get_transactions
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn transactions_since_returns_strict_suffix_in_order() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;

        let t0 = Utc::now();
        let mut early = add_node_tx("a");
        early.created_at = t0 - chrono::Duration::seconds(10);
        let mut late = add_node_tx("b");
        late.created_at = t0 + chrono::Duration::seconds(10);
        let late_id = late.tx_id;

        h.sync
            .sync_state(&canvas("c1"), vec![early, late], None)
            .await
            .unwrap();

        let suffix = h
            .sync
            .get_transactions(&canvas("c1"), None, t0)
            .await
            .unwrap();
        assert_eq!(suffix.len(), 1);
        assert_eq!(suffix[0].tx_id, late_id);

        let all = h
            .sync
            .get_transactions(&canvas("c1"), None, t0 - chrono::Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Legacy bridge
    // -----------------------------------------------------------------------

    async fn create_legacy_canvas(h: &Harness, id: &str, blob: Option<&[u8]>) {
        let legacy_key = BlobKey::new(format!("legacy/{id}"));
        if let Some(bytes) = blob {
            h.blobs.put(&legacy_key, bytes.to_vec()).await.unwrap();
        }
        h.catalog
            .insert_canvas(
                &CanvasRecord::new(canvas(id), "owner-1").with_legacy_key(legacy_key),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn first_read_materializes_legacy_document_as_version_one() {
        let h = harness();
        let blob = json!({"nodes": [{"id": "A"}, {"id": "B"}], "edges": []}).to_string();
        create_legacy_canvas(&h, "c1", Some(blob.as_bytes())).await;

        let state = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        assert_eq!(state.version, Version::first());
        let ids: Vec<&str> = state.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert!(state.transactions.is_empty());

        // The migration committed: head advanced, row exists, hash set.
        assert_eq!(
            h.catalog.head(&canvas("c1")).await.unwrap(),
            Some(Version::first())
        );
        let record = h
            .catalog
            .version(&canvas("c1"), Version::first())
            .await
            .unwrap()
            .unwrap();
        assert!(!record.content_hash.is_empty());
    }

    #[tokio::test]
    async fn second_read_does_not_migrate_again() {
        let h = harness();
        let blob = json!({"nodes": [{"id": "A"}], "edges": []}).to_string();
        create_legacy_canvas(&h, "c1", Some(blob.as_bytes())).await;

        let first = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        let second = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(h.catalog.versions(&canvas("c1")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn absent_legacy_blob_migrates_as_empty() {
        let h = harness();
        create_legacy_canvas(&h, "c1", None).await;

        let state = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        assert_eq!(state.version, Version::first());
        assert!(state.nodes.is_empty());
        // Committed, so sync_state can build on it.
        h.sync
            .sync_state(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn undecodable_legacy_blob_migrates_as_empty() {
        let h = harness();
        create_legacy_canvas(&h, "c1", Some(b"\x00\x01 not yjs")).await;

        let state = h.sync.get_state(&canvas("c1"), None).await.unwrap();
        assert_eq!(state.version, Version::first());
        assert!(state.nodes.is_empty());
    }

    #[tokio::test]
    async fn legacy_blob_survives_migration() {
        let h = harness();
        let blob = json!({"nodes": [{"id": "A"}]}).to_string();
        create_legacy_canvas(&h, "c1", Some(blob.as_bytes())).await;

        h.sync.get_state(&canvas("c1"), None).await.unwrap();
        let stored = h
            .blobs
            .get(&BlobKey::new("legacy/c1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, blob.as_bytes());
    }

    // -----------------------------------------------------------------------
    // Duplication / teardown
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn copy_state_duplicates_head_snapshot() {
        let h = harness();
        create_committed_canvas(&h, "src").await;
        h.sync
            .sync_state(&canvas("src"), vec![add_node_tx("a")], None)
            .await
            .unwrap();
        create_canvas(&h, "dst").await;

        let committed = h.sync.copy_state(&canvas("src"), &canvas("dst")).await.unwrap();
        assert_eq!(committed, Version::first());

        let copied = h.sync.get_state(&canvas("dst"), None).await.unwrap();
        assert!(copied.node("a").is_some());
        assert_eq!(copied.transactions.len(), 1);

        // Source lineage untouched.
        assert_eq!(
            h.catalog.head(&canvas("src")).await.unwrap(),
            Some(Version::new(2))
        );
    }

    #[tokio::test]
    async fn copy_state_into_missing_canvas_fails() {
        let h = harness();
        create_committed_canvas(&h, "src").await;

        let err = h
            .sync
            .copy_state(&canvas("src"), &canvas("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::CanvasNotFound { .. }));
    }

    #[tokio::test]
    async fn delete_canvas_removes_rows_and_blobs() {
        let h = harness();
        create_committed_canvas(&h, "c1").await;
        h.sync
            .sync_state(&canvas("c1"), vec![add_node_tx("a")], None)
            .await
            .unwrap();

        h.sync.delete_canvas(&canvas("c1")).await.unwrap();
        assert!(h.catalog.canvas(&canvas("c1")).await.unwrap().is_none());
        assert!(h.blobs.is_empty());

        let err = h.sync.get_state(&canvas("c1"), None).await.unwrap_err();
        assert!(matches!(err, SyncError::CanvasNotFound { .. }));
    }
}
