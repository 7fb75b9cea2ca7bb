//! # Record Source
//! Contract for whatever stores mood records, plus a thread-safe in-memory
//! implementation used by the binary and the tests.
//!
//! `observe` yields full replacement sets, never deltas. The stream is
//! unbounded: a new set is emitted after every mutation of the store.

use std::path::Path;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;

use crate::error::StatsError;
use crate::record::MoodRecord;
use crate::window::ResolvedWindow;

pub type RecordStream = BoxStream<'static, Result<Vec<MoodRecord>, StatsError>>;

#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Live record sets for `window`. Dropping the stream ends the subscription.
    fn observe(&self, window: ResolvedWindow) -> RecordStream;

    fn name(&self) -> &'static str;

    /// First emission of `observe`, for one-off reads.
    async fn fetch(&self, window: ResolvedWindow) -> Result<Vec<MoodRecord>, StatsError> {
        match self.observe(window).next().await {
            Some(res) => res,
            None => Err(StatsError::Source(
                "record stream closed before first emission".into(),
            )),
        }
    }
}

#[derive(Debug)]
struct Inner {
    records: RwLock<Vec<MoodRecord>>,
    revision: watch::Sender<u64>,
}

impl Inner {
    fn records_in(&self, window: &ResolvedWindow) -> Result<Vec<MoodRecord>, StatsError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StatsError::Source("record store lock poisoned".into()))?;
        let mut out: Vec<MoodRecord> = guard
            .iter()
            .filter(|r| window.contains(r.timestamp))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

/// Shared in-memory store. Clones share the same records.
#[derive(Debug, Clone)]
pub struct InMemoryRecordSource {
    inner: Arc<Inner>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<MoodRecord>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                records: RwLock::new(records),
                revision,
            }),
        }
    }

    /// Load a JSON array of records.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading records from {}", path.display()))?;
        let records: Vec<MoodRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing records from {}", path.display()))?;
        tracing::info!(target: "stats", count = records.len(), path = %path.display(), "seed records loaded");
        Ok(Self::with_records(records))
    }

    pub fn insert(&self, record: MoodRecord) {
        {
            let mut v = self.inner.records.write().expect("record store lock poisoned");
            v.push(record);
        }
        self.inner.bump();
    }

    /// Remove by id. Returns whether anything was removed.
    pub fn remove(&self, id: i64) -> bool {
        let removed = {
            let mut v = self.inner.records.write().expect("record store lock poisoned");
            let before = v.len();
            v.retain(|r| r.id != id);
            v.len() != before
        };
        if removed {
            self.inner.bump();
        }
        removed
    }

    pub fn replace_all(&self, records: Vec<MoodRecord>) {
        {
            let mut v = self.inner.records.write().expect("record store lock poisoned");
            *v = records;
        }
        self.inner.bump();
    }

    /// Build and insert a record under one write lock, so concurrent callers
    /// never receive the same id. Nothing is stored if `build` fails.
    pub fn insert_with_next_id<E>(
        &self,
        build: impl FnOnce(i64) -> Result<MoodRecord, E>,
    ) -> Result<MoodRecord, E> {
        let rec = {
            let mut v = self.inner.records.write().expect("record store lock poisoned");
            let rec = build(next_id(&v))?;
            v.push(rec.clone());
            rec
        };
        self.inner.bump();
        Ok(rec)
    }

    pub fn len(&self) -> usize {
        self.inner.records.read().expect("record store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn next_id(records: &[MoodRecord]) -> i64 {
    records.iter().map(|r| r.id).max().map_or(1, |m| m + 1)
}

impl Default for InMemoryRecordSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecordSource for InMemoryRecordSource {
    fn observe(&self, window: ResolvedWindow) -> RecordStream {
        let inner = self.inner.clone();
        let rx = inner.revision.subscribe();

        stream::unfold((inner, rx, true), move |(inner, mut rx, first)| async move {
            // a fresh receiver has already seen the current revision
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let item = inner.records_in(&window);
            Some((item, (inner, rx, false)))
        })
        .boxed()
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
