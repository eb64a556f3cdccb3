//! # In-Memory Store
//!
//! A process-local [`DocumentStore`] for development and tests. Events are
//! grouped into collections by `meta.type`, like the persistent backends
//! lay them out. Filters are evaluated in process.

use crate::document::{DocumentDatabase, DocumentStore};
use crate::plan::{FilterPlan, NativeClause};
use er_core::event::{self, TYPE_FIELD};
use er_core::{ConnectionUrl, Database, Driver, Error, Event, Result};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Cloneable handle to a set of in-memory collections.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<BTreeMap<String, Vec<Event>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `event` in the collection named by its `meta.type`.
    pub async fn insert(&self, event: Event) -> Result<()> {
        let collection = event::event_type(&event)
            .ok_or_else(|| Error::backend(format!("event has no {TYPE_FIELD}")))?
            .to_string();
        self.insert_into(collection, event).await;
        Ok(())
    }

    pub async fn insert_into(&self, collection: impl Into<String>, event: Event) {
        let mut collections = self.collections.write().await;
        collections.entry(collection.into()).or_default().push(event);
    }

    /// Load a JSON array of events. Returns how many were stored.
    pub async fn load_json(&self, json: &str) -> Result<usize> {
        let events: Vec<Event> = serde_json::from_str(json)
            .map_err(|e| Error::backend(format!("invalid event array: {e}")))?;
        let count = events.len();
        for event in events {
            self.insert(event).await?;
        }
        Ok(count)
    }

    /// Total number of stored events.
    pub async fn len(&self) -> usize {
        self.collections.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn find(&self, collection: &str, filter: &FilterPlan) -> Result<Vec<Event>> {
        let collections = self.collections.read().await;
        let mut found = Vec::new();
        for event in collections.get(collection).into_iter().flatten() {
            if matches(filter, event)? {
                found.push(event.clone());
            }
        }
        Ok(found)
    }

    async fn find_one(&self, collection: &str, filter: &FilterPlan) -> Result<Option<Event>> {
        let collections = self.collections.read().await;
        for event in collections.get(collection).into_iter().flatten() {
            if matches(filter, event)? {
                return Ok(Some(event.clone()));
            }
        }
        Ok(None)
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Filter evaluation
// =============================================================================

/// Whether `event` satisfies every clause of `plan`.
pub fn matches(plan: &FilterPlan, event: &Event) -> Result<bool> {
    for predicate in plan.predicates() {
        let value = event::field(event, &predicate.field);
        for clause in &predicate.clauses {
            if !clause_matches(value, clause)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn clause_matches(value: Option<&Value>, clause: &NativeClause) -> Result<bool> {
    let expected = clause.value.as_str();
    let ordered = |accept: fn(Ordering) -> bool| {
        value
            .and_then(|v| compare(v, expected))
            .is_some_and(accept)
    };
    Ok(match clause.op {
        "$eq" => value.is_some_and(|v| values_equal(v, expected)),
        // Documents without the field are "not equal" too.
        "$ne" => !value.is_some_and(|v| values_equal(v, expected)),
        "$gt" => ordered(Ordering::is_gt),
        "$gte" => ordered(Ordering::is_ge),
        "$lt" => ordered(Ordering::is_lt),
        "$lte" => ordered(Ordering::is_le),
        other => return Err(Error::UnknownOperator(other.to_string())),
    })
}

fn values_equal(a: &Value, b: &str) -> bool {
    match a {
        Value::Number(n) => numeric_cmp(n, b) == Some(Ordering::Equal),
        Value::String(s) => s == b,
        other => other.to_string() == b,
    }
}

/// Numbers compare numerically and strings lexicographically, going by
/// the stored value's JSON type. Anything else is incomparable.
fn compare(a: &Value, b: &str) -> Option<Ordering> {
    match a {
        Value::Number(n) => numeric_cmp(n, b),
        Value::String(s) => Some(s.as_str().cmp(b)),
        _ => None,
    }
}

/// Exact integer comparison where both sides fit, `f64` otherwise.
fn numeric_cmp(n: &Number, b: &str) -> Option<Ordering> {
    if let (Some(a), Ok(b)) = (n.as_i64(), b.parse::<i64>()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Ok(b)) = (n.as_u64(), b.parse::<u64>()) {
        return Some(a.cmp(&b));
    }
    n.as_f64()?.partial_cmp(&b.parse::<f64>().ok()?)
}

// =============================================================================
// Driver
// =============================================================================

/// Driver for `memory:///<database>` URLs.
///
/// Each database name maps to one [`MemoryStore`]; connecting twice to the
/// same name shares the data.
#[derive(Default)]
pub struct MemoryDriver {
    stores: Mutex<HashMap<String, MemoryStore>>,
}

impl MemoryDriver {
    pub const SCHEME: &'static str = "memory";

    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `store` for the database `name`.
    pub fn with_store(mut self, name: impl Into<String>, store: MemoryStore) -> Self {
        self.stores.get_mut().insert(name.into(), store);
        self
    }

    /// The store for `name`, created empty on first use.
    pub async fn store(&self, name: &str) -> MemoryStore {
        let mut stores = self.stores.lock().await;
        stores.entry(name.to_string()).or_default().clone()
    }
}

#[async_trait::async_trait]
impl Driver for MemoryDriver {
    fn name(&self) -> &'static str {
        Self::SCHEME
    }

    fn supports_scheme(&self, scheme: &str) -> bool {
        scheme == Self::SCHEME
    }

    async fn get(&self, url: &ConnectionUrl, span: tracing::Span) -> Result<Box<dyn Database>> {
        let store = self.store(url.database()?).await;
        tracing::debug!(
            parent: &span,
            "Opened in-memory database with {} event(s)",
            store.len().await
        );
        Ok(Box::new(DocumentDatabase::connect(store, span).await?))
    }
}
