//! # Document Database
//!
//! The [`Database`] implementation shared by every collection-partitioned
//! document store. A store only has to answer the primitive calls of
//! [`DocumentStore`]; partition routing, fan-out and result merging live
//! here.

use crate::partition;
use crate::plan::FilterPlan;
use er_core::{Database, Error, Event, MultipleEventsRequest, Result};
use futures_util::stream::{self, StreamExt};
use tracing::Span;

/// Upper bound on collections queried concurrently by one request.
pub const PARTITION_FANOUT: usize = 4;

/// Primitive operations of a collection-partitioned document store.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Round trip to the server.
    async fn ping(&self) -> Result<()>;

    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Every document in `collection` matching `filter`, in store order.
    async fn find(&self, collection: &str, filter: &FilterPlan) -> Result<Vec<Event>>;

    /// The first document in `collection` matching `filter`.
    async fn find_one(&self, collection: &str, filter: &FilterPlan) -> Result<Option<Event>>;

    async fn shutdown(&self) -> Result<()>;
}

pub struct DocumentDatabase<S> {
    store: S,
    span: Span,
}

impl<S: DocumentStore> DocumentDatabase<S> {
    /// Wrap `store` after a successful health check.
    pub async fn connect(store: S, span: Span) -> Result<Self> {
        if let Err(err) = store.ping().await {
            tracing::error!(parent: &span, "Health check failed: {err}");
            return Err(match err {
                Error::Connection(_) => err,
                other => Error::connection(other),
            });
        }
        Ok(Self { store, span })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Collections to query for `plan`. Only lists the store when the plan
    /// does not pin the partition field.
    async fn collections(&self, plan: &FilterPlan) -> Result<Vec<String>> {
        if partition::narrowed(plan).is_some() {
            return Ok(partition::select_partitions(plan, Vec::new()));
        }
        let all = self.store.list_collections().await?;
        Ok(partition::select_partitions(plan, all))
    }
}

/// Errors that end the whole request instead of skipping one collection.
fn is_fatal(err: &Error) -> bool {
    matches!(err, Error::Cancelled | Error::UnknownOperator(_))
}

#[async_trait::async_trait]
impl<S: DocumentStore> Database for DocumentDatabase<S> {
    async fn get_events(&self, request: &MultipleEventsRequest) -> Result<Vec<Event>> {
        let plan = FilterPlan::build(&request.params);
        let collections = self.collections(&plan).await?;
        tracing::debug!(
            parent: &self.span,
            "Querying {} collection(s) with {} condition(s)",
            collections.len(),
            request.params.condition_count()
        );

        let store = &self.store;
        let plan = &plan;
        let results: Vec<(String, Result<Vec<Event>>)> = stream::iter(collections)
            .map(|collection| async move {
                let result = store.find(&collection, plan).await;
                (collection, result)
            })
            .buffered(PARTITION_FANOUT)
            .collect()
            .await;

        let mut events = Vec::new();
        for (collection, result) in results {
            match result {
                Ok(mut found) => events.append(&mut found),
                Err(err) if is_fatal(&err) => return Err(err),
                Err(err) => {
                    tracing::warn!(parent: &self.span, "Skipping collection {collection}: {err}");
                }
            }
        }
        Ok(events)
    }

    async fn get_event_by_id(&self, id: &str) -> Result<Event> {
        let collections = self.collections(&FilterPlan::default()).await?;
        let plan = FilterPlan::by_id(id);
        for collection in &collections {
            match self.store.find_one(collection, &plan).await {
                Ok(Some(event)) => return Ok(event),
                Ok(None) => {}
                Err(err) if is_fatal(&err) => return Err(err),
                Err(err) => {
                    tracing::debug!(parent: &self.span, "Lookup of {id} in {collection} failed: {err}");
                }
            }
        }
        Err(Error::NotFound(id.to_string()))
    }

    async fn search_event(&self, _id: &str) -> Result<Event> {
        Err(Error::NotImplemented("search_event"))
    }

    async fn upstream_downstream_search(&self, _id: &str) -> Result<Vec<Event>> {
        Err(Error::NotImplemented("upstream_downstream_search"))
    }

    async fn close(&self) -> Result<()> {
        tracing::info!(parent: &self.span, "Closing document store connection");
        self.store.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use er_core::{Operator, Params};
    use serde_json::json;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Memory store that records every call and fails on demand.
    #[derive(Default)]
    struct InstrumentedStore {
        inner: MemoryStore,
        failing: HashSet<String>,
        fail_with: Option<fn() -> Error>,
        ping_fails: bool,
        delays: HashMap<String, Duration>,
        lists: AtomicUsize,
        queried: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl InstrumentedStore {
        fn queried(&self) -> Vec<String> {
            self.queried.lock().unwrap().clone()
        }

        fn record(&self, collection: &str) -> Result<()> {
            self.queried.lock().unwrap().push(collection.to_string());
            if self.failing.contains(collection) {
                let make = self.fail_with.unwrap_or(|| Error::backend("decode failed"));
                return Err(make());
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl DocumentStore for InstrumentedStore {
        async fn ping(&self) -> Result<()> {
            if self.ping_fails {
                return Err(Error::backend("server selection timeout"));
            }
            Ok(())
        }

        async fn list_collections(&self) -> Result<Vec<String>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list_collections().await
        }

        async fn find(&self, collection: &str, filter: &FilterPlan) -> Result<Vec<Event>> {
            self.record(collection)?;
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(collection) {
                tokio::time::sleep(*delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.find(collection, filter).await
        }

        async fn find_one(&self, collection: &str, filter: &FilterPlan) -> Result<Option<Event>> {
            self.record(collection)?;
            self.inner.find_one(collection, filter).await
        }

        async fn shutdown(&self) -> Result<()> {
            Ok(())
        }
    }

    fn event(id: &str, kind: &str, time: u64) -> Event {
        json!({ "meta": { "id": id, "type": kind, "time": time }, "data": {} })
            .as_object()
            .cloned()
            .unwrap()
    }

    async fn seeded() -> InstrumentedStore {
        let store = InstrumentedStore::default();
        for (id, kind, time) in [
            ("a1", "p1", 1),
            ("a2", "p1", 2),
            ("b1", "p2", 3),
            ("c1", "p3", 4),
            ("c2", "p3", 5),
        ] {
            store.inner.insert(event(id, kind, time)).await.unwrap();
        }
        store
    }

    async fn connect(store: InstrumentedStore) -> DocumentDatabase<InstrumentedStore> {
        DocumentDatabase::connect(store, Span::none()).await.unwrap()
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events
            .iter()
            .filter_map(er_core::event::event_id)
            .collect()
    }

    fn request(conditions: &[(Operator, &str, &str)]) -> MultipleEventsRequest {
        let mut params = Params::new();
        for (op, key, value) in conditions {
            params.add(*op, *key, *value);
        }
        MultipleEventsRequest::with_params(params)
    }

    #[tokio::test]
    async fn test_connect_fails_when_ping_fails() {
        let store = InstrumentedStore {
            ping_fails: true,
            ..Default::default()
        };
        let err = DocumentDatabase::connect(store, Span::none())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[tokio::test]
    async fn test_get_events_merges_collections_in_order() {
        let db = connect(seeded().await).await;
        let events = db.get_events(&request(&[])).await.unwrap();
        assert_eq!(ids(&events), vec!["a1", "a2", "b1", "c1", "c2"]);
        assert_eq!(db.store().queried(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_fan_out_is_bounded_and_keeps_collection_order() {
        let mut store = InstrumentedStore::default();
        for i in 1..=7u64 {
            let kind = format!("p{i}");
            store.inner.insert(event(&format!("e{i}"), &kind, i)).await.unwrap();
            // Earlier collections answer last.
            store.delays.insert(kind, Duration::from_millis((8 - i) * 10));
        }
        let db = connect(store).await;

        let events = db.get_events(&request(&[])).await.unwrap();
        assert_eq!(ids(&events), vec!["e1", "e2", "e3", "e4", "e5", "e6", "e7"]);

        let peak = db.store().peak_in_flight.load(Ordering::SeqCst);
        assert!(peak > 1, "collections were queried one at a time");
        assert!(peak <= PARTITION_FANOUT, "{peak} concurrent queries");
        assert_eq!(db.store().in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_events_skips_failing_collection() {
        let mut store = seeded().await;
        store.failing.insert("p2".into());
        let db = connect(store).await;

        let events = db.get_events(&request(&[])).await.unwrap();
        assert_eq!(ids(&events), vec!["a1", "a2", "c1", "c2"]);
    }

    #[tokio::test]
    async fn test_get_events_propagates_cancellation() {
        let mut store = seeded().await;
        store.failing.insert("p3".into());
        store.fail_with = Some(|| Error::Cancelled);
        let db = connect(store).await;

        let err = db.get_events(&request(&[])).await.err().unwrap();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn test_type_equality_queries_one_collection() {
        let db = connect(seeded().await).await;
        let events = db
            .get_events(&request(&[
                (Operator::Eq, "meta.type", "p3"),
                (Operator::Eq, "meta.id", "c2"),
            ]))
            .await
            .unwrap();

        assert_eq!(ids(&events), vec!["c2"]);
        assert_eq!(db.store().queried(), vec!["p3"]);
        assert_eq!(db.store().lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_filters_apply_across_collections() {
        let db = connect(seeded().await).await;
        let events = db
            .get_events(&request(&[
                (Operator::Gte, "meta.time", "2"),
                (Operator::Lt, "meta.time", "5"),
            ]))
            .await
            .unwrap();
        assert_eq!(ids(&events), vec!["a2", "b1", "c1"]);
        assert_eq!(db.store().lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_event_by_id_stops_at_first_hit() {
        let db = connect(seeded().await).await;
        let event = db.get_event_by_id("b1").await.unwrap();
        assert_eq!(er_core::event::event_id(&event), Some("b1"));
        assert_eq!(db.store().queried(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_get_event_by_id_exhausts_all_collections() {
        let db = connect(seeded().await).await;
        let err = db.get_event_by_id("zz").await.err().unwrap();
        assert!(matches!(&err, Error::NotFound(id) if id == "zz"));
        assert!(err.to_string().contains("zz"));
        assert_eq!(db.store().queried(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_get_event_by_id_treats_failure_as_miss() {
        let mut store = seeded().await;
        store.failing.insert("p1".into());
        let db = connect(store).await;
        let event = db.get_event_by_id("c1").await.unwrap();
        assert_eq!(er_core::event::event_id(&event), Some("c1"));
        assert_eq!(db.store().queried(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_search_capabilities_are_not_implemented() {
        let db = connect(seeded().await).await;
        assert!(matches!(
            db.search_event("a1").await,
            Err(Error::NotImplemented("search_event"))
        ));
        assert!(matches!(
            db.upstream_downstream_search("a1").await,
            Err(Error::NotImplemented("upstream_downstream_search"))
        ));
    }
}
