use cadent_common::protocol::error::{CadentError, Result};
use cadent_common::protocol::{PathEntry, PathsRequest, QueryParams};
use cadent_common::transport::{JsonCodec, Transport};
use std::collections::HashSet;
use tracing::{debug, error, warn};

use crate::host_ring::HostRing;
use crate::node::{BranchNode, LeafNode, Node, PathQuery};

/// A host that could not answer a path lookup
#[derive(Debug)]
pub struct HostFailure {
    pub host: String,
    pub error: CadentError,
}

/// Outcome of a full host sweep for one query
///
/// Per-host failures are not fatal; they are collected here so callers can
/// tell "nothing matched" from "half the hosts were down".
#[derive(Debug, Default)]
pub struct Resolution {
    /// Deduplicated nodes, in host-sweep then host order
    pub nodes: Vec<Node>,
    /// Number of hosts the query was sent to
    pub hosts_queried: usize,
    /// Hosts that failed, with their errors
    pub failures: Vec<HostFailure>,
}

impl Resolution {
    pub fn failed_hosts(&self) -> usize {
        self.failures.len()
    }

    /// True when every queried host failed
    pub fn all_failed(&self) -> bool {
        self.hosts_queried > 0 && self.failures.len() == self.hosts_queried
    }

    pub fn leaves(&self) -> impl Iterator<Item = &LeafNode> {
        self.nodes.iter().filter_map(Node::as_leaf)
    }
}

impl IntoIterator for Resolution {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

/// Resolves path queries against every host of a ring
pub struct PathResolver<'a, T> {
    ring: &'a HostRing,
    transport: &'a T,
}

impl<'a, T: Transport> PathResolver<'a, T> {
    pub fn new(ring: &'a HostRing, transport: &'a T) -> Self {
        Self { ring, transport }
    }

    /// Query every host, in configuration order, for paths matching `query`.
    ///
    /// The first host to report a path wins; later duplicates are skipped.
    /// Leaves remember the host they were found on.
    pub async fn find_nodes(&self, query: &PathQuery) -> Resolution {
        debug!("find {}", query.pattern());

        let params = PathsRequest::new(query.pattern()).params();
        let mut seen: HashSet<String> = HashSet::new();
        let mut resolution = Resolution::default();

        for host in self.ring.hosts() {
            resolution.hosts_queried += 1;

            let entries = match self.list_paths(host, &params).await {
                Ok(entries) => entries,
                Err(e) => {
                    error!("error in find on {}: {}", host, e);
                    resolution.failures.push(HostFailure {
                        host: host.clone(),
                        error: e,
                    });
                    continue;
                }
            };

            for entry in entries {
                if !seen.insert(entry.path.clone()) {
                    continue;
                }
                let node = if entry.is_leaf {
                    Node::Leaf(LeafNode::with_host(entry.path, host.clone()))
                } else {
                    Node::Branch(BranchNode::new(entry.path))
                };
                resolution.nodes.push(node);
            }
        }

        if !resolution.failures.is_empty() {
            warn!(
                "{} of {} hosts failed to resolve {}",
                resolution.failed_hosts(),
                resolution.hosts_queried,
                query.pattern()
            );
        }

        resolution
    }

    async fn list_paths(&self, host: &str, params: &QueryParams) -> Result<Vec<PathEntry>> {
        let body = self.transport.get(&format!("{}/paths", host), params).await?;
        JsonCodec::decode_paths(&body)
    }
}
