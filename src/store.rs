//! Core collection type and builder.

use crate::backend::MapBackend;
use crate::error::{Error, Result};
use crate::flush::FlushPolicy;
use crate::model::{Record, RecordId};
use crate::persist::{atomic_write, load};
use crate::serializer::{Document, JsonSerializer, Serializer};
use crate::DefaultBackend;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Insertion-ordered collection of records persisted as one JSON document.
///
/// Generic over the record body `V` and map backend `M`. `V` must serialize
/// as a JSON object, since its fields are stored flat next to `id`. Use
/// [`open`](Self::open) for a quick start or [`builder`](Self::builder) to pick
/// the flush policy and output format.
///
/// Reads go straight to the backend. Mutations take a writer lock that also
/// covers the flush, so two writers never interleave a change with another's
/// write to disk. A mutation whose flush fails is rolled back before the
/// error is returned; a reader racing it may briefly see the change.
pub struct Collection<V, M = DefaultBackend<V>> {
    map: M,
    path: PathBuf,
    serializer: JsonSerializer,
    policy: FlushPolicy,
    // Next identifier to hand out. Holding the guard is what serialises writers.
    writer: Mutex<RecordId>,
    _marker: PhantomData<V>,
}

impl<V, M> Collection<V, M>
where
    V: Serialize + DeserializeOwned + Send + Sync + Clone + 'static,
    M: MapBackend<V>,
{
    /// Open (or create) a collection at `path`, flushing after every mutation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self>
    where
        M: Default,
    {
        Self::builder(path).build()
    }

    /// Open with a specific flush policy. Shorthand for
    /// `builder(path).policy(p).build()`.
    pub fn open_with_policy(path: impl AsRef<Path>, policy: FlushPolicy) -> Result<Self>
    where
        M: Default,
    {
        Self::builder(path).policy(policy).build()
    }

    /// Start configuring a new collection. Call
    /// [`.build()`](CollectionBuilder::build) when ready.
    pub fn builder(path: impl AsRef<Path>) -> CollectionBuilder<V, M>
    where
        M: Default,
    {
        CollectionBuilder::new(path)
    }

    // ---- reads ----

    /// Every record, ascending by identifier (which is insertion order).
    #[must_use]
    pub fn all(&self) -> Vec<Record<V>> {
        self.map
            .ordered_snapshot()
            .into_iter()
            .map(|(id, body)| Record::new(id, body))
            .collect()
    }

    /// Record at 1-based `position`, or `None` when out of range. Position 0
    /// is always out of range.
    #[must_use]
    pub fn at(&self, position: usize) -> Option<Record<V>> {
        let index = position.checked_sub(1)?;
        self.map
            .nth(index)
            .map(|(id, body)| Record::new(id, body))
    }

    /// Record with identifier `id`, or `None`.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<Record<V>> {
        self.map.get(id).map(|body| Record::new(id, body))
    }

    /// `true` if a record carries `id`.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.map.contains_key(id)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.map_len()
    }

    /// `true` when the collection has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path to the backing JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ---- writes ----

    /// Store `value` under a fresh identifier and return that identifier.
    ///
    /// If the flush fails the insert is undone and the identifier stays
    /// available.
    pub fn insert(&self, value: V) -> Result<RecordId> {
        let mut next = self.writer.lock();
        let id = *next;
        let bumped = id.checked_add(1).ok_or(Error::IdsExhausted)?;
        self.map.insert(id, value);
        if let Err(e) = self.after_mutation(bumped) {
            self.map.remove(id);
            return Err(e);
        }
        *next = bumped;
        Ok(id)
    }

    /// Mutate the body stored under `id` in place.
    ///
    /// Returns [`Error::NotFound`] and writes nothing if no record has that
    /// identifier. If the flush fails the previous body is put back.
    pub fn update<F>(&self, id: RecordId, f: F) -> Result<()>
    where
        F: FnOnce(&mut V),
    {
        let next = self.writer.lock();
        let previous = self.map.get(id).ok_or(Error::NotFound(id))?;
        let mut body = previous.clone();
        f(&mut body);
        self.map.insert(id, body);
        if let Err(e) = self.after_mutation(*next) {
            self.map.insert(id, previous);
            return Err(e);
        }
        Ok(())
    }

    /// Delete the record with identifier `id` and return it.
    ///
    /// Returns [`Error::NotFound`] and writes nothing if no record has that
    /// identifier. If the flush fails the record is put back. Once removed,
    /// the identifier is never handed out again.
    pub fn remove(&self, id: RecordId) -> Result<Record<V>> {
        let next = self.writer.lock();
        let body = self.map.remove(id).ok_or(Error::NotFound(id))?;
        if let Err(e) = self.after_mutation(*next) {
            self.map.insert(id, body);
            return Err(e);
        }
        Ok(Record::new(id, body))
    }

    // ---- persistence ----

    /// Write the whole collection to disk (atomic temp-file + rename),
    /// overwriting what was there.
    pub fn flush(&self) -> Result<()> {
        let next = self.writer.lock();
        self.write_document(*next)
    }

    // ---- internal ----

    fn after_mutation(&self, next_id: RecordId) -> Result<()> {
        match self.policy {
            FlushPolicy::Immediate => self.write_document(next_id),
            FlushPolicy::Manual => Ok(()),
        }
    }

    fn write_document(&self, next_id: RecordId) -> Result<()> {
        let doc = Document {
            next_id,
            records: self.all(),
        };
        let bytes = self.serializer.serialize(&doc)?;
        atomic_write(&self.path, &bytes)?;
        debug!(path = %self.path.display(), records = doc.records.len(), "collection flushed");
        Ok(())
    }
}

impl<V, M> std::fmt::Debug for Collection<V, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and opens a [`Collection`].
///
/// ```rust,no_run
/// use car_store::{CarStore, FlushPolicy};
///
/// let cars = CarStore::builder("cars.json")
///     .policy(FlushPolicy::Immediate)
///     .pretty(true)
///     .build()
///     .unwrap();
/// ```
pub struct CollectionBuilder<V, M> {
    path: PathBuf,
    policy: FlushPolicy,
    pretty: bool,
    _marker: PhantomData<(V, M)>,
}

impl<V, M> CollectionBuilder<V, M>
where
    V: Serialize + DeserializeOwned + Send + Sync + Clone + 'static,
    M: MapBackend<V> + Default,
{
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            policy: FlushPolicy::Immediate,
            pretty: false,
            _marker: PhantomData,
        }
    }

    /// Set the flush policy (default: [`FlushPolicy::Immediate`]).
    pub fn policy(mut self, policy: FlushPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Write human-readable JSON with indentation (default: compact).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// Load the existing document, if any, and return the collection.
    pub fn build(self) -> Result<Collection<V, M>> {
        let serializer = if self.pretty {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        };

        let doc = load::<V, _>(&self.path, &serializer)?;
        let map = M::default();
        let mut next_id = doc.next_id.max(1);
        for record in doc.records {
            let after = record.id.checked_add(1).ok_or_else(|| {
                Error::Deserialize(format!("record id {} leaves no identifier to assign", record.id))
            })?;
            next_id = next_id.max(after);
            map.insert(record.id, record.body);
        }
        debug!(path = %self.path.display(), records = map.map_len(), next_id, "collection loaded");

        Ok(Collection {
            map,
            path: self.path,
            serializer,
            policy: self.policy,
            writer: Mutex::new(next_id),
            _marker: PhantomData,
        })
    }
}

impl<V, M> std::fmt::Debug for CollectionBuilder<V, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionBuilder")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .field("pretty", &self.pretty)
            .finish()
    }
}
