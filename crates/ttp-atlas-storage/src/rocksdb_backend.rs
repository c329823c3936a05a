//! RocksDB storage backend implementation.
//!
//! One database with four column families backs all three store traits.
//! Writes that touch more than one key go through a `WriteBatch`, so a
//! commit is atomic: either the assignment revision and the decision
//! counter land together, or nothing lands.
//!
//! Appends (assignments, feedback, taxonomy publishes) serialize behind a
//! single mutex. That is coarser than the per-document serialization the
//! contracts require, but appends are short single-batch writes and reads
//! never take the lock.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, Options, WriteBatch, DB};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use ttp_atlas_core::error::{CoreError, CoreResult};
use ttp_atlas_core::traits::{AssignmentStore, FeedbackLedger, TaxonomyStore};
use ttp_atlas_core::types::{
    validate_technique_set, Assignment, FeedbackEvent, TaxonomySnapshot, TaxonomyVersion,
    Technique, TechniqueId,
};

use crate::column_families::{cf_names, get_column_family_descriptors, system_keys};
use crate::serialization::{
    deserialize_assignment, deserialize_feedback, deserialize_taxonomy, encode_assignment_key,
    encode_feedback_key, encode_version_key, serialize_assignment, serialize_feedback,
    serialize_taxonomy, SerializationError,
};

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database failed to open.
    #[error("Failed to open database at '{path}': {message}")]
    OpenFailed { path: String, message: String },

    /// Column family not found (should never happen if the DB opened
    /// with the canonical descriptor set).
    #[error("Column family '{name}' not found")]
    MissingColumnFamily { name: String },

    /// Underlying RocksDB operation failed.
    #[error("RocksDB error: {0}")]
    Rocks(#[from] rocksdb::Error),

    /// Record or key (de)serialization failed.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// The append lock was poisoned by a panicking writer.
    #[error("Storage append lock poisoned")]
    Poisoned,
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        CoreError::Storage(err.to_string())
    }
}

/// RocksDB-backed implementation of [`TaxonomyStore`],
/// [`AssignmentStore`], and [`FeedbackLedger`].
pub struct RocksDbAtlasStore {
    db: DB,
    append_lock: Mutex<()>,
}

impl RocksDbAtlasStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path, cache_size_mb: usize) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = get_column_family_descriptors(cache_size_mb * 1024 * 1024);
        let db = DB::open_cf_descriptors(&opts, path, descriptors).map_err(|e| {
            StorageError::OpenFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        })?;

        info!(path = %path.display(), cache_size_mb, "opened atlas store");
        Ok(Self {
            db,
            append_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::MissingColumnFamily {
                name: name.to_string(),
            })
    }

    fn system_u64(&self, key: &str) -> Result<Option<u64>, StorageError> {
        let cf = self.cf(cf_names::SYSTEM)?;
        match self.db.get_cf(cf, key.as_bytes())? {
            None => Ok(None),
            Some(bytes) => {
                if bytes.len() != 8 {
                    return Err(SerializationError::InvalidKeyLength {
                        expected: 8,
                        actual: bytes.len(),
                    }
                    .into());
                }
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes);
                Ok(Some(u64::from_be_bytes(buf)))
            }
        }
    }

    fn read_taxonomy(&self, version: u32) -> Result<Option<TaxonomySnapshot>, StorageError> {
        let cf = self.cf(cf_names::TAXONOMY_VERSIONS)?;
        match self.db.get_cf(cf, encode_version_key(version))? {
            None => Ok(None),
            Some(bytes) => Ok(Some(deserialize_taxonomy(&bytes)?)),
        }
    }

    fn version_contains(&self, id: &TechniqueId, version: u32) -> Result<bool, StorageError> {
        Ok(self
            .read_taxonomy(version)?
            .is_some_and(|snapshot| snapshot.contains(id)))
    }

    /// All assignment revisions for one document, ascending by revision
    /// (the key encoding makes the prefix scan come back in that order).
    fn scan_history(&self, document_id: Uuid) -> Result<Vec<Assignment>, StorageError> {
        let cf = self.cf(cf_names::ASSIGNMENTS)?;
        let prefix = document_id.as_bytes();
        let mut revisions = Vec::new();
        for item in self.db.prefix_iterator_cf(cf, prefix) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            revisions.push(deserialize_assignment(&value)?);
        }
        Ok(revisions)
    }

    fn scan_feedback(&self, document_id: Uuid) -> Result<Vec<FeedbackEvent>, StorageError> {
        let cf = self.cf(cf_names::FEEDBACK)?;
        let prefix = document_id.as_bytes();
        let mut events = Vec::new();
        for item in self.db.prefix_iterator_cf(cf, prefix) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            events.push(deserialize_feedback(&value)?);
        }
        events.sort_by_key(|e| e.seq);
        Ok(events)
    }
}

#[async_trait]
impl TaxonomyStore for RocksDbAtlasStore {
    async fn publish(&self, techniques: Vec<Technique>) -> CoreResult<TaxonomyVersion> {
        let _guard = self.append_lock.lock().map_err(|_| StorageError::Poisoned)?;

        let current = self
            .system_u64(system_keys::LATEST_TAXONOMY_VERSION)
            .map_err(CoreError::from)?
            .unwrap_or(0) as u32;

        let mut lookup_error: Option<StorageError> = None;
        let set = validate_technique_set(techniques, |successor| {
            (1..=current).any(|v| match self.version_contains(successor, v) {
                Ok(found) => found,
                Err(e) => {
                    lookup_error.get_or_insert(e);
                    false
                }
            })
        })?;
        if let Some(e) = lookup_error {
            return Err(e.into());
        }

        let version = TaxonomyVersion(current + 1);
        let snapshot = TaxonomySnapshot {
            version,
            published_at: Utc::now(),
            techniques: set,
        };

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(cf_names::TAXONOMY_VERSIONS).map_err(CoreError::from)?,
            encode_version_key(version.0),
            serialize_taxonomy(&snapshot).map_err(StorageError::from).map_err(CoreError::from)?,
        );
        batch.put_cf(
            self.cf(cf_names::SYSTEM).map_err(CoreError::from)?,
            system_keys::LATEST_TAXONOMY_VERSION.as_bytes(),
            (version.0 as u64).to_be_bytes(),
        );
        self.db
            .write(batch)
            .map_err(StorageError::from)
            .map_err(CoreError::from)?;

        info!(
            version = version.0,
            techniques = snapshot.len(),
            "published taxonomy version"
        );
        Ok(version)
    }

    async fn resolve(&self, id: &TechniqueId, as_of: TaxonomyVersion) -> CoreResult<Technique> {
        let snapshot = self.read_taxonomy(as_of.0).map_err(CoreError::from)?;
        snapshot
            .and_then(|s| s.get(id).cloned())
            .ok_or_else(|| CoreError::TechniqueNotFound {
                id: id.clone(),
                version: as_of,
            })
    }

    async fn latest(&self) -> CoreResult<Option<TaxonomyVersion>> {
        let raw = self
            .system_u64(system_keys::LATEST_TAXONOMY_VERSION)
            .map_err(CoreError::from)?;
        Ok(raw.map(|v| TaxonomyVersion(v as u32)))
    }

    async fn snapshot(&self, version: TaxonomyVersion) -> CoreResult<TaxonomySnapshot> {
        self.read_taxonomy(version.0)
            .map_err(CoreError::from)?
            .ok_or_else(|| CoreError::Validation {
                field: "version".to_string(),
                message: format!("taxonomy version {version} was never published"),
            })
    }
}

#[async_trait]
impl AssignmentStore for RocksDbAtlasStore {
    async fn append(&self, assignment: Assignment) -> CoreResult<()> {
        let _guard = self.append_lock.lock().map_err(|_| StorageError::Poisoned)?;

        let history = self
            .scan_history(assignment.document_id)
            .map_err(CoreError::from)?;
        let expected = history.len() as u32 + 1;
        if assignment.revision != expected {
            return Err(CoreError::RevisionConflict {
                document_id: assignment.document_id,
                expected,
                actual: assignment.revision,
            });
        }
        if let Some(previous) = history.last() {
            let ordered = (assignment.decided_at, assignment.decision_seq)
                > (previous.decided_at, previous.decision_seq);
            if !ordered {
                return Err(CoreError::RevisionConflict {
                    document_id: assignment.document_id,
                    expected,
                    actual: assignment.revision,
                });
            }
        }

        let last_seq = self
            .system_u64(system_keys::LAST_DECISION_SEQ)
            .map_err(CoreError::from)?
            .unwrap_or(0);

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(cf_names::ASSIGNMENTS).map_err(CoreError::from)?,
            encode_assignment_key(assignment.document_id, assignment.revision),
            serialize_assignment(&assignment)
                .map_err(StorageError::from)
                .map_err(CoreError::from)?,
        );
        batch.put_cf(
            self.cf(cf_names::SYSTEM).map_err(CoreError::from)?,
            system_keys::LAST_DECISION_SEQ.as_bytes(),
            last_seq.max(assignment.decision_seq).to_be_bytes(),
        );
        self.db
            .write(batch)
            .map_err(StorageError::from)
            .map_err(CoreError::from)?;

        debug!(
            document_id = %assignment.document_id,
            revision = assignment.revision,
            "appended assignment revision"
        );
        Ok(())
    }

    async fn latest(&self, document_id: Uuid) -> CoreResult<Option<Assignment>> {
        let mut history = self.scan_history(document_id).map_err(CoreError::from)?;
        Ok(history.pop())
    }

    async fn history(&self, document_id: Uuid) -> CoreResult<Vec<Assignment>> {
        Ok(self.scan_history(document_id).map_err(CoreError::from)?)
    }

    async fn last_decision_seq(&self) -> CoreResult<u64> {
        Ok(self
            .system_u64(system_keys::LAST_DECISION_SEQ)
            .map_err(CoreError::from)?
            .unwrap_or(0))
    }
}

#[async_trait]
impl FeedbackLedger for RocksDbAtlasStore {
    async fn record(&self, mut event: FeedbackEvent) -> CoreResult<u64> {
        let _guard = self.append_lock.lock().map_err(|_| StorageError::Poisoned)?;

        let existing = self
            .scan_feedback(event.document_id)
            .map_err(CoreError::from)?;
        let seq = existing.len() as u64 + 1;
        event.seq = seq;

        self.db
            .put_cf(
                self.cf(cf_names::FEEDBACK).map_err(CoreError::from)?,
                encode_feedback_key(event.document_id, event.recorded_at, seq),
                serialize_feedback(&event)
                    .map_err(StorageError::from)
                    .map_err(CoreError::from)?,
            )
            .map_err(StorageError::from)
            .map_err(CoreError::from)?;

        debug!(
            document_id = %event.document_id,
            seq,
            correction = event.is_correction(),
            "recorded feedback event"
        );
        Ok(seq)
    }

    async fn events_since(&self, since: DateTime<Utc>) -> CoreResult<Vec<FeedbackEvent>> {
        let cf = self.cf(cf_names::FEEDBACK).map_err(CoreError::from)?;
        let mut events = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_, value) = item.map_err(StorageError::from).map_err(CoreError::from)?;
            let event = deserialize_feedback(&value)
                .map_err(StorageError::from)
                .map_err(CoreError::from)?;
            if event.recorded_at >= since {
                events.push(event);
            }
        }
        events.sort_by_key(|e| (e.recorded_at, e.seq));
        Ok(events)
    }

    async fn events_for(&self, document_id: Uuid) -> CoreResult<Vec<FeedbackEvent>> {
        Ok(self.scan_feedback(document_id).map_err(CoreError::from)?)
    }
}
