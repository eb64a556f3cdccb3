//! # Connection URLs
//!
//! `scheme://[authority]/database[/...][?options]`. The scheme selects the
//! driver; the first path segment names the database.

use crate::error::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionUrl {
    raw: String,
    scheme: String,
    path: String,
}

impl ConnectionUrl {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidConnectionUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| invalid("missing \"://\" after the scheme"))?;
        let valid_scheme = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(invalid("scheme must start with a letter"));
        }

        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let path = match rest.find('/') {
            Some(i) => rest[i..].to_string(),
            None => String::new(),
        };

        Ok(Self {
            raw: raw.to_string(),
            scheme: scheme.to_ascii_lowercase(),
            path,
        })
    }

    /// Lowercased scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First path segment, required by drivers that address a named database.
    pub fn database(&self) -> Result<&str> {
        self.path
            .split('/')
            .nth(1)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::InvalidConnectionUrl {
                url: self.raw.clone(),
                reason: "no database name in path".to_string(),
            })
    }

    /// The URL exactly as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ConnectionUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        match self.database() {
            Ok(database) => write!(f, "…/{database}"),
            Err(_) => f.write_str("…"),
        }
    }
}
