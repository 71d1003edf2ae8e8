use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// A glob-style metric path pattern, e.g. `servers.*.cpu.{user,system}`
///
/// The pattern is passed to hosts as-is; matching happens server side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    pattern: String,
}

impl PathQuery {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into() }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl From<&str> for PathQuery {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

/// A half-open span of unix seconds in which a leaf may hold data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

/// A fetchable metric path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafNode {
    pub path: String,
    /// Host the path was discovered on; fetches start their search there.
    pub host: Option<String>,
}

impl LeafNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), host: None }
    }

    pub fn with_host(path: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            host: Some(host.into()),
        }
    }

    /// Hosts do not expose finer availability, so a leaf covers `[0, now)`.
    pub fn intervals(&self) -> Vec<Interval> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        vec![Interval { start: 0, end: now }]
    }
}

/// A namespace path with children but no data of its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchNode {
    pub path: String,
}

impl BranchNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// A resolved path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Leaf(LeafNode),
    Branch(BranchNode),
}

impl Node {
    pub fn path(&self) -> &str {
        match self {
            Node::Leaf(leaf) => &leaf.path,
            Node::Branch(branch) => &branch.path,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Branch(_) => None,
        }
    }
}
