use cadent_common::protocol::error::Result;
use cadent_common::protocol::{MaxPoints, MetricsRequest, RenderEnvelope, SeriesPoint, TimeInfo};
use cadent_common::transport::{HttpTransport, JsonCodec, Transport};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

use crate::chunker::chunk_targets;
use crate::config::FinderConfig;
use crate::fetcher::{CacheConsistentFetcher, ConsistentFetch};
use crate::host_ring::HostRing;
use crate::node::{LeafNode, PathQuery};
use crate::resolver::{PathResolver, Resolution};

/// Merged result of a multi-path fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    /// Bounds of the first chunk that returned data, or the whole requested
    /// span with a single step when nothing did.
    pub time_info: TimeInfo,
    /// Points per path; missing samples are `None`.
    pub series: BTreeMap<String, Vec<SeriesPoint>>,
    /// Paths whose data is known to be stale after trying every host.
    pub stale: BTreeSet<String>,
}

impl FetchResult {
    /// The result for a range in which no host had data.
    pub fn empty(start: i64, end: i64) -> Self {
        Self {
            time_info: TimeInfo::whole_span(start, end),
            series: BTreeMap::new(),
            stale: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Cadent Finder - path resolution and bulk fetching across a host ring.
///
/// The finder is the entry point of this crate. It owns the [`HostRing`] and
/// the [`Transport`], and drives the other components:
///
/// 1. **Resolution**: [`PathResolver`] sweeps every host for a path query
/// 2. **Chunking**: [`chunk_targets`] keeps bulk requests under the URL budget
/// 3. **Bulk fetching**: one request per chunk, each to the next ring host
/// 4. **Consistency**: stale series are re-fetched through
///    [`CacheConsistentFetcher`] and spliced back into the result
///
/// All work for one call is sequential; the only state shared between calls
/// is the ring cursor.
///
/// # Example
///
/// ```no_run
/// # use cadent_finder::{CadentFinder, FinderConfig, PathQuery};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let finder = CadentFinder::new(FinderConfig::new(vec![
///     "http://cadent-a:8083".to_string(),
///     "http://cadent-b:8083".to_string(),
/// ]))?;
///
/// let resolution = finder.find_nodes(&PathQuery::new("servers.*.cpu")).await;
/// let leaves: Vec<_> = resolution.leaves().cloned().collect();
/// let result = finder.fetch_multi(&leaves, 1_700_000_000, 1_700_003_600).await?;
/// # Ok(())
/// # }
/// ```
pub struct CadentFinder<T = HttpTransport> {
    ring: HostRing,
    transport: T,
    config: FinderConfig,
}

impl CadentFinder<HttpTransport> {
    /// Creates a finder over HTTP using the config's hosts and timeout.
    ///
    /// # Errors
    /// - `CadentError::NoHosts` - the config has no hosts
    /// - `CadentError::Configuration` - a host is not an http(s) URL or a
    ///   limit is zero
    pub fn new(config: FinderConfig) -> Result<Self> {
        let transport = HttpTransport::with_timeout(config.timeout());
        Self::with_transport(config, transport)
    }

    /// Creates a finder from `CADENT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(FinderConfig::from_env()?)
    }
}

impl<T: Transport> CadentFinder<T> {
    /// Creates a finder that talks through `transport`.
    pub fn with_transport(config: FinderConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let ring = HostRing::new(config.urls.clone())?;

        info!(
            "Cadent finder initialized with {} hosts, url length {}",
            ring.len(),
            config.url_length
        );

        Ok(Self {
            ring,
            transport,
            config,
        })
    }

    pub fn ring(&self) -> &HostRing {
        &self.ring
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolves `query` against every host.
    ///
    /// Host failures never fail the call; they are reported in the returned
    /// [`Resolution`].
    pub async fn find_nodes(&self, query: &PathQuery) -> Resolution {
        PathResolver::new(&self.ring, &self.transport)
            .find_nodes(query)
            .await
    }

    /// Fetches one path, walking hosts until the answer is not stale.
    ///
    /// See [`CacheConsistentFetcher::fetch_until_consistent`].
    pub async fn fetch_until_consistent(
        &self,
        path: &str,
        start_host: Option<&str>,
        start: i64,
        end: i64,
    ) -> Result<Option<ConsistentFetch>> {
        CacheConsistentFetcher::new(&self.ring, &self.transport)
            .fetch_until_consistent(path, start_host, start, end, MaxPoints::for_span(start, end))
            .await
    }

    /// Fetches many leaves over `[start, end)` and merges the result.
    ///
    /// # Behavior
    ///
    /// - Leaf paths are split into chunks under the configured URL length
    /// - Each chunk goes to the next host of the ring, advancing the cursor
    /// - Chunks whose host returns nothing are skipped
    /// - The time bounds come from the first chunk that returned data
    /// - Stale series are re-fetched with [`Self::fetch_until_consistent`],
    ///   starting at the host the leaf was discovered on, or at the ring
    ///   cursor when that is the host that just answered stale
    /// - `NaN` samples become `None`
    ///
    /// # Returns
    /// - `Ok(result)` - merged series; when no host had data, an empty result
    ///   spanning `[start, end)` with a single step
    /// - `Err(...)` - a host failed or sent an undecodable body
    pub async fn fetch_multi(&self, nodes: &[LeafNode], start: i64, end: i64) -> Result<FetchResult> {
        let paths: Vec<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
        let discovered_on: HashMap<&str, &str> = nodes
            .iter()
            .filter_map(|n| n.host.as_deref().map(|h| (n.path.as_str(), h)))
            .collect();
        let max_points = MaxPoints::for_span(start, end);

        debug!(
            "fetch_multi {} paths over [{}, {}), max_points={:?}",
            paths.len(),
            start,
            end,
            max_points
        );

        let mut time_info: Option<TimeInfo> = None;
        let mut series = BTreeMap::new();
        let mut stale = BTreeSet::new();

        for chunk in chunk_targets(&paths, self.config.url_length) {
            if chunk.is_empty() {
                continue;
            }

            let host = self.ring.next_host();
            let request = MetricsRequest::new(
                chunk.iter().map(|p| p.to_string()).collect(),
                start,
                end,
            )
            .with_max_points(max_points);

            debug!("fetching {} targets from {}", chunk.len(), host);
            let envelope = match self.render(host, &request).await? {
                Some(envelope) if envelope.has_series() => envelope,
                _ => {
                    debug!("{} returned no data for {} targets", host, chunk.len());
                    continue;
                }
            };

            if time_info.is_none() {
                time_info = Some(
                    envelope
                        .time_info()
                        .unwrap_or_else(|| TimeInfo::whole_span(start, end)),
                );
            }

            for (key, bulk) in envelope.series {
                if !bulk.is_stale() {
                    series.insert(key, bulk.points());
                    continue;
                }

                let target = if bulk.target.is_empty() {
                    key.clone()
                } else {
                    bulk.target.clone()
                };
                let start_host = discovered_on
                    .get(target.as_str())
                    .copied()
                    .filter(|h| *h != host);
                debug!("{} is stale on {}, re-fetching", target, host);

                match self
                    .fetch_until_consistent(&target, start_host, start, end)
                    .await?
                {
                    Some(fetch) => {
                        if fetch.outcome.is_stale() {
                            stale.insert(key.clone());
                        }
                        series.insert(key, fetch.series.points());
                    }
                    None => {
                        warn!("no host returned data for {}, keeping stale series from {}", target, host);
                        stale.insert(key.clone());
                        series.insert(key, bulk.points());
                    }
                }
            }
        }

        let result = match time_info {
            Some(time_info) => FetchResult {
                time_info,
                series,
                stale,
            },
            None => FetchResult::empty(start, end),
        };

        if !result.stale.is_empty() {
            warn!("{} of {} series may be incomplete", result.stale.len(), result.series.len());
        }
        Ok(result)
    }

    /// Fetches a single leaf over `[start, end)`.
    ///
    /// Same contract as [`Self::fetch_multi`] for one path, without the bulk
    /// request: the consistency walk runs directly from the leaf's host.
    pub async fn fetch_leaf(
        &self,
        leaf: &LeafNode,
        start: i64,
        end: i64,
    ) -> Result<(TimeInfo, Vec<SeriesPoint>)> {
        let fetch = self
            .fetch_until_consistent(&leaf.path, leaf.host.as_deref(), start, end)
            .await?;

        Ok(match fetch {
            Some(fetch) => (
                fetch
                    .time_info
                    .unwrap_or_else(|| TimeInfo::whole_span(start, end)),
                fetch.series.points(),
            ),
            None => (TimeInfo::whole_span(start, end), Vec::new()),
        })
    }

    async fn render(&self, host: &str, request: &MetricsRequest) -> Result<Option<RenderEnvelope>> {
        let body = self
            .transport
            .get(&format!("{}/metrics", host), &request.params())
            .await?;
        JsonCodec::decode_render(&body)
    }
}
