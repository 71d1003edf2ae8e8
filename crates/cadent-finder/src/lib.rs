pub mod chunker;
pub mod config;
pub mod fetcher;
pub mod finder;
pub mod host_ring;
pub mod node;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use chunker::{chunk_targets, Chunks};
pub use config::FinderConfig;
pub use fetcher::{CacheConsistentFetcher, ConsistentFetch, FetchOutcome};
pub use finder::{CadentFinder, FetchResult};
pub use host_ring::{HostRing, HostWalk};
pub use node::{BranchNode, Interval, LeafNode, Node, PathQuery};
pub use resolver::{HostFailure, PathResolver, Resolution};
