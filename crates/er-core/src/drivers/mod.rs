//! # Storage Driver Contract
//!
//! Every storage engine the repository can read from implements two
//! traits: a [`Driver`] that recognises connection URLs and opens
//! connections, and the [`Database`] those connections expose. The
//! [`registry::DriverRegistry`] picks a driver by URL scheme.

pub mod registry;
pub mod url;

use crate::error::Result;
use crate::event::Event;
use crate::requests::MultipleEventsRequest;
use self::url::ConnectionUrl;

/// A live connection to an event store.
///
/// One instance is created at startup and shared by every request task.
/// Implementations must not hold state that a request can mutate.
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    /// All events matching the request's filter parameters.
    ///
    /// Backends that partition their data may return partial results when
    /// individual partitions fail.
    async fn get_events(&self, request: &MultipleEventsRequest) -> Result<Vec<Event>>;

    /// The event whose `meta.id` equals `id`, or [`crate::Error::NotFound`].
    async fn get_event_by_id(&self, id: &str) -> Result<Event>;

    async fn search_event(&self, id: &str) -> Result<Event>;

    /// Events linked upstream and/or downstream of `id`.
    async fn upstream_downstream_search(&self, id: &str) -> Result<Vec<Event>>;

    /// Release the connection. Must be called once, by the owner, after
    /// every request task sharing the connection has finished.
    async fn close(&self) -> Result<()>;
}

/// A storage engine that can be connected to.
#[async_trait::async_trait]
pub trait Driver: Send + Sync {
    /// Human-readable driver name for logs.
    fn name(&self) -> &'static str;

    /// Whether this driver handles URLs with `scheme` (already lowercase).
    fn supports_scheme(&self, scheme: &str) -> bool;

    /// Connect to `url` and verify the connection with a round trip.
    ///
    /// `span` is the logging context the connection logs under. A failed
    /// health check is a [`crate::Error::Connection`]; no connection is
    /// returned in that case.
    async fn get(&self, url: &ConnectionUrl, span: tracing::Span) -> Result<Box<dyn Database>>;
}
