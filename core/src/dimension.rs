//! Workspace and dimension addressing.
//!
//! A workspace is a named line of changes; a dimension point selects which
//! variant of a node is addressed (e.g. `{"language": ["de"]}`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the workspace every request falls back to.
pub const LIVE_WORKSPACE: &str = "live";

/// Name of a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceName(String);

impl WorkspaceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The public `live` workspace.
    pub fn live() -> Self {
        Self(LIVE_WORKSPACE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WorkspaceName {
    fn default() -> Self {
        Self::live()
    }
}

impl fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkspaceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A point in the dimension space: dimension name to its ordered values.
///
/// Backed by a `BTreeMap` so two points with the same content compare and
/// hash equal regardless of the order they were given in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimensions(BTreeMap<String, Vec<String>>);

impl Dimensions {
    /// The empty dimension point (unvaried content).
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a dimension value, returning the extended point.
    pub fn with(mut self, dimension: impl Into<String>, values: &[&str]) -> Self {
        self.0.insert(
            dimension.into(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn get(&self, dimension: &str) -> Option<&[String]> {
        self.0.get(dimension).map(|v| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, values)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: [{}]", name, values.join(", "))?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, Vec<String>)> for Dimensions {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
