//! Cache-consistent single-path fetching
//!
//! A cadent host that serves a render from its write cache may only hold part
//! of a series. Each series in a render says whether the host used its cache
//! (`using_cache`) and whether the requested range was fully cached
//! (`in_cache`). A series with `using_cache && !in_cache` is stale.
//!
//! [`CacheConsistentFetcher`] walks the ring until some host answers with a
//! non-stale series, visiting each host at most once. If every host is stale,
//! the last answer is accepted as-is.

use cadent_common::protocol::error::Result;
use cadent_common::protocol::{
    CacheState, MaxPoints, MetricsRequest, QueryParams, RenderEnvelope, RenderSeries, TimeInfo,
};
use cadent_common::transport::{JsonCodec, Transport};
use serde::Serialize;
use tracing::{debug, warn};

use crate::host_ring::HostRing;

/// How a consistent fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The host read from storage, bypassing its cache
    Authoritative,
    /// The host's cache covered the whole range
    CacheHit,
    /// No host had a complete answer; the data may have gaps
    StaleAccepted,
}

impl FetchOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, FetchOutcome::StaleAccepted)
    }
}

/// Result of [`CacheConsistentFetcher::fetch_until_consistent`]
#[derive(Debug, Clone)]
pub struct ConsistentFetch {
    /// Host the series came from
    pub host: String,
    pub time_info: Option<TimeInfo>,
    pub series: RenderSeries,
    pub outcome: FetchOutcome,
    /// Hosts contacted, including the one that answered
    pub attempts: usize,
}

/// Re-fetches one path across hosts until the answer is not stale
pub struct CacheConsistentFetcher<'a, T> {
    ring: &'a HostRing,
    transport: &'a T,
}

impl<'a, T: Transport> CacheConsistentFetcher<'a, T> {
    pub fn new(ring: &'a HostRing, transport: &'a T) -> Self {
        Self { ring, transport }
    }

    /// Fetch `path` over `[from, to)` from the first host with a consistent answer.
    ///
    /// The walk starts at `start_host` when given and known to the ring, else
    /// at the ring cursor. Hosts with no data for `path` are skipped. Returns
    /// `Ok(None)` when no host had any data. Transport errors end the walk.
    pub async fn fetch_until_consistent(
        &self,
        path: &str,
        start_host: Option<&str>,
        from: i64,
        to: i64,
        max_points: MaxPoints,
    ) -> Result<Option<ConsistentFetch>> {
        let params = MetricsRequest::single(path, from, to)
            .with_max_points(max_points)
            .params();

        let walk = self.ring.walk_from(start_host);
        let total = walk.len();
        let mut fallback: Option<ConsistentFetch> = None;

        for (i, host) in walk.enumerate() {
            let attempts = i + 1;

            let Some(envelope) = self.render(host, &params).await? else {
                debug!("{} returned no data for {}", host, path);
                continue;
            };
            let Some(series) = envelope.series_for(path) else {
                debug!("{} returned no series for {}", host, path);
                continue;
            };

            let outcome = match series.cache_state() {
                CacheState::Authoritative => FetchOutcome::Authoritative,
                CacheState::CacheHit => FetchOutcome::CacheHit,
                CacheState::Stale => FetchOutcome::StaleAccepted,
            };
            let fetch = ConsistentFetch {
                host: host.to_string(),
                time_info: envelope.time_info(),
                series: series.clone(),
                outcome,
                attempts,
            };

            if !outcome.is_stale() {
                debug!("{} consistent on {} after {} attempts", path, host, attempts);
                return Ok(Some(fetch));
            }
            if attempts == total {
                warn!("{} is stale on all {} hosts, accepting {}", path, total, host);
                return Ok(Some(fetch));
            }

            debug!("{} is stale on {}, trying next host", path, host);
            fallback = Some(fetch);
        }

        // later hosts had nothing; the last stale answer is the best there is
        if let Some(fetch) = &fallback {
            warn!(
                "{} is stale on {} and no later host has data, accepting it",
                path, fetch.host
            );
        }
        Ok(fallback)
    }

    async fn render(&self, host: &str, params: &QueryParams) -> Result<Option<RenderEnvelope>> {
        let body = self.transport.get(&format!("{}/metrics", host), params).await?;
        JsonCodec::decode_render(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{render, series, MockTransport};
    use cadent_common::protocol::error::CadentError;
    use serde_json::json;

    fn ring(hosts: &[&str]) -> HostRing {
        HostRing::new(hosts.iter().map(|h| h.to_string()).collect()).unwrap()
    }

    fn body(values: &[f64], using_cache: bool, in_cache: bool) -> serde_json::Value {
        render(0, 60, 60, vec![("x", series("x", values, using_cache, in_cache))])
    }

    async fn fetch(
        ring: &HostRing,
        transport: &MockTransport,
        start: Option<&str>,
    ) -> Result<Option<ConsistentFetch>> {
        CacheConsistentFetcher::new(ring, transport)
            .fetch_until_consistent("x", start, 0, 60, MaxPoints::Unbounded)
            .await
    }

    fn urls(transport: &MockTransport) -> Vec<String> {
        transport.calls().into_iter().map(|c| c.url).collect()
    }

    #[tokio::test]
    async fn test_authoritative_answer_returns_immediately() {
        let ring = ring(&["http://a", "http://b"]);
        let transport = MockTransport::new()
            .with_json("http://a/metrics", body(&[1.0], false, false))
            .with_json("http://b/metrics", body(&[2.0], false, false));

        let fetch = fetch(&ring, &transport, None).await.unwrap().unwrap();
        assert_eq!(fetch.host, "http://a");
        assert_eq!(fetch.outcome, FetchOutcome::Authoritative);
        assert_eq!(fetch.attempts, 1);
        assert_eq!(fetch.time_info, Some(TimeInfo::new(0, 60, 60)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_then_cache_hit() {
        let ring = ring(&["http://a", "http://b", "http://c"]);
        let transport = MockTransport::new()
            .with_json("http://a/metrics", body(&[1.0], true, false))
            .with_json("http://b/metrics", body(&[2.0], true, true))
            .with_json("http://c/metrics", body(&[3.0], false, false));

        let fetch = fetch(&ring, &transport, None).await.unwrap().unwrap();
        assert_eq!(fetch.host, "http://b");
        assert_eq!(fetch.outcome, FetchOutcome::CacheHit);
        assert_eq!(fetch.series.points(), vec![Some(2.0)]);
        assert_eq!(urls(&transport), vec!["http://a/metrics", "http://b/metrics"]);
    }

    #[tokio::test]
    async fn test_all_stale_accepts_last_host() {
        let ring = ring(&["http://a", "http://b", "http://c"]);
        let transport = MockTransport::new()
            .with_json("http://a/metrics", body(&[1.0], true, false))
            .with_json("http://b/metrics", body(&[2.0], true, false))
            .with_json("http://c/metrics", body(&[3.0], true, false));

        let fetch = fetch(&ring, &transport, None).await.unwrap().unwrap();
        assert_eq!(fetch.host, "http://c");
        assert_eq!(fetch.outcome, FetchOutcome::StaleAccepted);
        assert_eq!(fetch.attempts, 3);
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_single_host_stale_is_accepted() {
        let ring = ring(&["http://a"]);
        let transport =
            MockTransport::new().with_json("http://a/metrics", body(&[1.0], true, false));

        let fetch = fetch(&ring, &transport, None).await.unwrap().unwrap();
        assert!(fetch.outcome.is_stale());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_answers_are_skipped() {
        let ring = ring(&["http://a", "http://b", "http://c"]);
        let transport = MockTransport::new()
            .with_body("http://a/metrics", "")
            .with_json("http://b/metrics", render(0, 60, 60, vec![]))
            .with_json("http://c/metrics", body(&[3.0], false, false));

        let fetch = fetch(&ring, &transport, None).await.unwrap().unwrap();
        assert_eq!(fetch.host, "http://c");
        assert_eq!(fetch.attempts, 3);
    }

    #[tokio::test]
    async fn test_no_host_has_data() {
        let ring = ring(&["http://a", "http://b"]);
        let transport = MockTransport::new()
            .with_json("http://a/metrics", json!(null))
            .with_json("http://b/metrics", json!({"series": {}}));

        assert!(fetch(&ring, &transport, None).await.unwrap().is_none());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_stale_kept_when_later_hosts_are_empty() {
        let ring = ring(&["http://a", "http://b"]);
        let transport = MockTransport::new()
            .with_json("http://a/metrics", body(&[1.0], true, false))
            .with_body("http://b/metrics", "null");

        let fetch = fetch(&ring, &transport, None).await.unwrap().unwrap();
        assert_eq!(fetch.host, "http://a");
        assert_eq!(fetch.outcome, FetchOutcome::StaleAccepted);
        assert_eq!(fetch.attempts, 1);
    }

    #[tokio::test]
    async fn test_walk_starts_at_given_host_and_wraps() {
        let ring = ring(&["http://a", "http://b", "http://c"]);
        let transport = MockTransport::new()
            .with_json("http://a/metrics", body(&[1.0], false, false))
            .with_json("http://b/metrics", body(&[2.0], true, false))
            .with_json("http://c/metrics", body(&[3.0], true, false));

        let fetch = fetch(&ring, &transport, Some("http://b")).await.unwrap().unwrap();
        assert_eq!(fetch.host, "http://a");
        assert_eq!(
            urls(&transport),
            vec!["http://b/metrics", "http://c/metrics", "http://a/metrics"]
        );
    }

    #[tokio::test]
    async fn test_walk_starts_at_cursor_and_leaves_it() {
        let ring = ring(&["http://a", "http://b"]);
        ring.next_host();
        let transport = MockTransport::new()
            .with_json("http://a/metrics", body(&[1.0], false, false))
            .with_json("http://b/metrics", body(&[2.0], true, false));

        let fetch = fetch(&ring, &transport, None).await.unwrap().unwrap();
        assert_eq!(fetch.host, "http://a");
        assert_eq!(urls(&transport), vec!["http://b/metrics", "http://a/metrics"]);
        assert_eq!(ring.current_host(), "http://b");
    }

    #[tokio::test]
    async fn test_series_matched_by_target() {
        let ring = ring(&["http://a"]);
        let transport = MockTransport::new().with_json(
            "http://a/metrics",
            render(0, 60, 60, vec![("uid-1", series("x", &[4.0], false, false))]),
        );

        let fetch = fetch(&ring, &transport, None).await.unwrap().unwrap();
        assert_eq!(fetch.series.target, "x");
    }

    #[tokio::test]
    async fn test_request_parameters() {
        let ring = ring(&["http://a"]);
        let transport =
            MockTransport::new().with_json("http://a/metrics", body(&[1.0], false, false));

        CacheConsistentFetcher::new(&ring, &transport)
            .fetch_until_consistent("x", None, 100, 10_000, MaxPoints::Capped(4096))
            .await
            .unwrap();

        let call = &transport.calls()[0];
        assert_eq!(call.targets(), vec!["x"]);
        assert_eq!(call.param("from"), Some("100"));
        assert_eq!(call.param("to"), Some("10000"));
        assert_eq!(call.param("max_points"), Some("4096"));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let ring = ring(&["http://a", "http://b"]);
        let transport =
            MockTransport::new().with_json("http://b/metrics", body(&[1.0], false, false));

        let err = fetch(&ring, &transport, None).await.unwrap_err();
        assert!(matches!(err, CadentError::Transport(_)));
        assert_eq!(transport.call_count(), 1);
    }
}
