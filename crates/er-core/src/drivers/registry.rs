//! # Driver Registry
//!
//! The set of storage drivers compiled into the process. Built once by the
//! composition root before the first request is served and read-only
//! afterwards.

use super::url::ConnectionUrl;
use super::{Database, Driver};
use crate::error::{Error, Result};
use std::sync::Arc;

#[derive(Default)]
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a driver. Earlier registrations win when schemes overlap.
    pub fn register(&mut self, driver: Arc<dyn Driver>) -> &mut Self {
        tracing::debug!("Registered storage driver {}", driver.name());
        self.drivers.push(driver);
        self
    }

    /// First registered driver that supports `scheme`.
    pub fn driver_for(&self, scheme: &str) -> Option<Arc<dyn Driver>> {
        let scheme = scheme.to_ascii_lowercase();
        self.drivers
            .iter()
            .find(|driver| driver.supports_scheme(&scheme))
            .cloned()
    }

    /// Names of the registered drivers, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|driver| driver.name()).collect()
    }

    /// Parse `raw_url`, pick its driver and open a health-checked connection.
    pub async fn connect(&self, raw_url: &str, span: tracing::Span) -> Result<Box<dyn Database>> {
        let url = ConnectionUrl::parse(raw_url)?;
        let driver = self
            .driver_for(url.scheme())
            .ok_or_else(|| Error::UnsupportedScheme(url.scheme().to_string()))?;
        tracing::info!("Connecting to {} with the {} driver", url, driver.name());
        driver.get(&url, span).await
    }
}
