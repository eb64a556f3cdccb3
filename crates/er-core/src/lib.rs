//! # er-core: Event Repository Query Core
//!
//! The storage-agnostic half of the event repository read path:
//!
//! - [`query`] decodes the filter grammar (`key<op>value`) of an inbound
//!   query string into [`Params`].
//! - [`requests`] holds the structural request parameters that travel
//!   alongside the filters.
//! - [`drivers`] declares the [`Database`] / [`Driver`] contract every
//!   storage backend implements, and the [`DriverRegistry`] that picks a
//!   backend by connection-URL scheme.
//!
//! Nothing in this crate performs I/O. Backends live in `er-drivers`.

pub mod drivers;
pub mod error;
pub mod event;
pub mod params;
pub mod query;
pub mod requests;

pub use drivers::registry::DriverRegistry;
pub use drivers::url::ConnectionUrl;
pub use drivers::{Database, Driver};
pub use error::{Error, Result};
pub use event::Event;
pub use params::{Condition, Operator, Params};
pub use query::{decode_filter_parameters, ParsedFilter};
pub use requests::{MultipleEventsRequest, SingleEventRequest};
