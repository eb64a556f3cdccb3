//! # Filter Parameters
//!
//! [`Params`] is the storage-agnostic form of a filtered read: for every
//! field key, the ordered list of `(operator, value)` conditions the
//! caller asked for. No AND/OR semantics are imposed here; backends decide
//! how the conditions combine.

use serde::ser::{SerializeMap, SerializeTuple};
use serde::{Serialize, Serializer};
use std::fmt;

/// The six comparison operators of the filter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
        Self::Gte,
        Self::Lte,
    ];

    /// The decoded token as written in a filter (`>=`, not `%3E=`).
    pub const fn token(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

/// One `(operator, value)` pair recorded under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub op: Operator,
    pub value: String,
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.op)?;
        pair.serialize_element(&self.value)?;
        pair.end()
    }
}

/// Ordered multimap from field key to its conditions.
///
/// Keys are unique and kept in first-insertion order; conditions under a
/// key keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Vec<Condition>)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition under `key`.
    pub fn add(&mut self, op: Operator, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let condition = Condition {
            op,
            value: value.into(),
        };
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, conditions)) => conditions.push(condition),
            None => self.entries.push((key, vec![condition])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[Condition]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, conditions)| conditions.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Condition])> {
        self.entries
            .iter()
            .map(|(key, conditions)| (key.as_str(), conditions.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of conditions across all keys.
    pub fn condition_count(&self) -> usize {
        self.entries.iter().map(|(_, c)| c.len()).sum()
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, conditions) in &self.entries {
            map.serialize_entry(key, conditions)?;
        }
        map.end()
    }
}
