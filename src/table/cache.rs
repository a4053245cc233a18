use crate::{common, error::Result, store, table};

use serde::{Deserialize, Serialize};
use std::{
    collections,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

/// How long a reconciled table handle may be reused.
///
/// ```rust
/// use dynamodb_model::table::cache;
/// use std::time::Duration;
///
/// let policy: cache::CachePolicy = serde_json::from_str(r#"{"ttl": {"secs": 30, "nanos": 0}}"#).unwrap();
/// assert_eq!(policy, cache::CachePolicy::Ttl(Duration::from_secs(30)));
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Reconcile on every operation.
    #[default]
    Always,
    /// Reuse a handle reconciled less than this long ago.
    Ttl(Duration),
}

#[derive(Debug)]
struct CacheEntry {
    handle: table::TableHandle,
    reconciled_at: Instant,
}

/// Reconciled table handles, keyed by table name.
///
/// Share one cache between models through an [`std::sync::Arc`] to reconcile a
/// table once for all of them.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: Mutex<collections::HashMap<String, CacheEntry>>,
}

impl SchemaCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached handle for `table_name`, if `policy` still allows reusing it.
    pub fn get(&self, table_name: &str, policy: CachePolicy) -> Option<table::TableHandle> {
        let CachePolicy::Ttl(ttl) = policy else {
            return None;
        };
        self.entries()
            .get(table_name)
            .filter(|entry| entry.reconciled_at.elapsed() < ttl)
            .map(|entry| entry.handle.clone())
    }

    /// Remember `handle` as freshly reconciled.
    pub fn insert(&self, handle: table::TableHandle) {
        let entry = CacheEntry {
            handle,
            reconciled_at: Instant::now(),
        };
        self.entries().insert(entry.handle.name.clone(), entry);
    }

    /// Forget the handle of `table_name`; the next operation reconciles again.
    pub fn invalidate(&self, table_name: &str) {
        self.entries().remove(table_name);
    }

    /// Cached handle for `schema`'s table, reconciling it when the policy says so
    /// or when the cached handle lacks one of `schema`'s indexes.
    pub async fn ensure_table<S: store::Store>(
        &self,
        store: &S,
        schema: &common::field::TableSchema,
        policy: CachePolicy,
        max_wait: Duration,
    ) -> Result<table::TableHandle> {
        let cached = self
            .get(&schema.name, policy)
            .filter(|handle| handle.covers(schema));
        if let Some(handle) = cached {
            #[cfg(feature = "tracing")]
            tracing::trace!(table = %schema.name, "schema cache hit");
            return Ok(handle);
        }
        let handle = table::reconcile::ensure_table(store, schema, max_wait).await?;
        if policy != CachePolicy::Always {
            self.insert(handle.clone());
        }
        Ok(handle)
    }

    fn entries(&self) -> MutexGuard<'_, collections::HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
