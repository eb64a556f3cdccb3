//! # er-drivers: Storage Backends
//!
//! Every backend here is a document store partitioned into collections,
//! one per event type. They share one read path:
//!
//! 1. [`plan::FilterPlan::build`] translates [`er_core::Params`] into a
//!    native filter document.
//! 2. [`partition::select_partitions`] narrows the collections to scan
//!    when the filter pins `meta.type` to a single value.
//! 3. [`document::DocumentDatabase`] runs the plan against each selected
//!    collection through the [`document::DocumentStore`] seam and merges
//!    the results.
//!
//! The `memory` store is always compiled; MongoDB needs the `mongodb`
//! feature.

pub mod document;
pub mod memory;
pub mod partition;
pub mod plan;

#[cfg(feature = "mongodb")]
pub mod mongo;

use er_core::DriverRegistry;
use std::sync::Arc;

/// A registry holding every driver compiled into this build.
///
/// `memory` is passed in so callers can pre-seed its stores.
pub fn default_registry(memory: memory::MemoryDriver) -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    registry.register(Arc::new(memory));
    #[cfg(feature = "mongodb")]
    registry.register(Arc::new(mongo::MongoDriver));
    registry
}
