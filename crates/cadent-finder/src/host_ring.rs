use cadent_common::protocol::error::{CadentError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin ring over a fixed set of cadent hosts
///
/// The host list never changes after construction. The cursor is shared by
/// every caller, so concurrent fetches interleave their advancement; retry
/// walks use [`HostRing::walk_from`], which snapshots a start position and
/// leaves the cursor alone.
#[derive(Debug)]
pub struct HostRing {
    hosts: Vec<String>,
    cursor: AtomicUsize,
}

impl HostRing {
    /// Create a ring from host base URLs
    ///
    /// Trailing slashes are stripped. Fails on an empty list or on a host
    /// without an `http://` or `https://` prefix.
    pub fn new(hosts: Vec<String>) -> Result<Self> {
        if hosts.is_empty() {
            return Err(CadentError::NoHosts);
        }

        let hosts = hosts
            .into_iter()
            .map(|h| normalize_host(&h))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            hosts,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Get the host at the cursor and advance it, wrapping after the last host
    pub fn next_host(&self) -> &str {
        let len = self.hosts.len();
        let idx = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);
        &self.hosts[idx]
    }

    /// Get the host at the cursor without advancing
    pub fn current_host(&self) -> &str {
        &self.hosts[self.cursor.load(Ordering::Relaxed) % self.hosts.len()]
    }

    /// Visit every host exactly once, in ring order
    ///
    /// Starts at `start` when it is one of the ring's hosts, otherwise at the
    /// current cursor position.
    pub fn walk_from(&self, start: Option<&str>) -> HostWalk<'_> {
        let start = start
            .and_then(|h| self.position(h))
            .unwrap_or_else(|| self.cursor.load(Ordering::Relaxed) % self.hosts.len());
        HostWalk {
            hosts: &self.hosts,
            start,
            taken: 0,
        }
    }

    /// Index of `host` in the ring
    pub fn position(&self, host: &str) -> Option<usize> {
        let host = host.trim_end_matches('/');
        self.hosts.iter().position(|h| h == host)
    }

    /// Get the number of hosts
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Always false; an empty ring cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Get all hosts in configuration order
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }
}

/// A single pass over the ring, see [`HostRing::walk_from`]
#[derive(Debug, Clone)]
pub struct HostWalk<'a> {
    hosts: &'a [String],
    start: usize,
    taken: usize,
}

impl<'a> Iterator for HostWalk<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.taken == self.hosts.len() {
            return None;
        }
        let host = &self.hosts[(self.start + self.taken) % self.hosts.len()];
        self.taken += 1;
        Some(host)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.hosts.len() - self.taken;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HostWalk<'_> {}

fn normalize_host(host: &str) -> Result<String> {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        Ok(host.to_string())
    } else {
        Err(CadentError::Configuration(format!(
            "host '{}' must start with http:// or https://",
            host
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(hosts: &[&str]) -> HostRing {
        HostRing::new(hosts.iter().map(|h| h.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_ring_creation() {
        let ring = ring(&["http://localhost:8083", "http://localhost:8084"]);
        assert_eq!(ring.len(), 2);
        assert!(!ring.is_empty());
    }

    #[test]
    fn test_round_robin() {
        let ring = ring(&["http://a", "http://b", "http://c"]);

        assert_eq!(ring.next_host(), "http://a");
        assert_eq!(ring.next_host(), "http://b");
        assert_eq!(ring.next_host(), "http://c");
        assert_eq!(ring.next_host(), "http://a");
        // wraps around
    }

    #[test]
    fn test_current_does_not_advance() {
        let ring = ring(&["http://a", "http://b"]);
        assert_eq!(ring.current_host(), "http://a");
        assert_eq!(ring.current_host(), "http://a");
        ring.next_host();
        assert_eq!(ring.current_host(), "http://b");
        ring.next_host();
        assert_eq!(ring.current_host(), "http://a");
    }

    #[test]
    fn test_empty_hosts_fails_fast() {
        let result = HostRing::new(vec![]);
        assert!(matches!(result, Err(CadentError::NoHosts)));
    }

    #[test]
    fn test_host_without_scheme_rejected() {
        let result = HostRing::new(vec!["localhost:8083".to_string()]);
        assert!(matches!(result, Err(CadentError::Configuration(_))));
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let ring = ring(&["http://a/", "https://b//"]);
        assert_eq!(ring.hosts(), &["http://a".to_string(), "https://b".to_string()]);
        assert_eq!(ring.position("http://b"), None);
        assert_eq!(ring.position("https://b/"), Some(1));
    }

    #[test]
    fn test_single_host() {
        let ring = ring(&["http://only"]);
        assert_eq!(ring.next_host(), "http://only");
        assert_eq!(ring.next_host(), "http://only");
        assert_eq!(ring.walk_from(None).collect::<Vec<_>>(), vec!["http://only"]);
    }

    #[test]
    fn test_walk_from_current_position() {
        let ring = ring(&["http://a", "http://b", "http://c"]);
        ring.next_host();

        let walk: Vec<&str> = ring.walk_from(None).collect();
        assert_eq!(walk, vec!["http://b", "http://c", "http://a"]);
        // walking leaves the cursor where it was
        assert_eq!(ring.current_host(), "http://b");
    }

    #[test]
    fn test_walk_from_known_host() {
        let ring = ring(&["http://a", "http://b", "http://c"]);
        let walk: Vec<&str> = ring.walk_from(Some("http://c")).collect();
        assert_eq!(walk, vec!["http://c", "http://a", "http://b"]);
    }

    #[test]
    fn test_walk_from_unknown_host_uses_cursor() {
        let ring = ring(&["http://a", "http://b"]);
        let walk: Vec<&str> = ring.walk_from(Some("http://zzz")).collect();
        assert_eq!(walk, vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_walk_visits_each_host_once() {
        let ring = ring(&["http://a", "http://b", "http://c", "http://d"]);
        for _ in 0..3 {
            ring.next_host();
        }
        let walk = ring.walk_from(None);
        assert_eq!(walk.len(), 4);

        let mut seen: Vec<&str> = walk.collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_concurrent_next_host_stays_in_range() {
        use std::sync::Arc;
        use std::thread;

        let ring = Arc::new(ring(&["http://a", "http://b", "http://c"]));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let host = ring.next_host().to_string();
                        assert!(ring.position(&host).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // 4000 advances over 3 hosts
        assert_eq!(ring.current_host(), "http://b");
    }
}
