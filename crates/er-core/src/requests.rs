//! # Request Types
//!
//! Structural query parameters shared by the HTTP layer and the drivers.
//! Filter segments are decoded separately (see [`crate::query`]); the keys
//! listed in [`MultipleEventsRequest::QUERY_KEYS`] are kept out of them.

use crate::params::Params;
use serde::Deserialize;

/// Parameters of a multi-event read.
///
/// Pagination hints are echoed back to the caller but not enforced by the
/// drivers. `shallow` and `readable` are accepted and have no effect.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultipleEventsRequest {
    pub shallow: bool,
    pub page_no: u32,
    pub page_size: u32,
    pub page_start_item: u32,
    pub lazy: bool,
    pub readable: bool,
    #[serde(skip)]
    pub params: Params,
}

impl MultipleEventsRequest {
    /// Query keys decoded into this struct rather than into filters.
    pub const QUERY_KEYS: &'static [&'static str] = &[
        "shallow",
        "pageNo",
        "pageSize",
        "pageStartItem",
        "lazy",
        "readable",
    ];

    pub fn with_params(params: Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }
}

impl Default for MultipleEventsRequest {
    fn default() -> Self {
        Self {
            shallow: false,
            page_no: 1,
            page_size: 500,
            page_start_item: 1,
            lazy: false,
            readable: false,
            params: Params::new(),
        }
    }
}

/// Parameters of a single-event read. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SingleEventRequest {
    #[serde(default)]
    pub shallow: bool,
}
