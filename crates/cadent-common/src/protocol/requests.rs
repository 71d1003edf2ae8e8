//! Cadent Request Parameters
//!
//! Both endpoints are plain GETs; a request is just its query string.
//! Repeated keys are allowed (`target` appears once per metric).

use serde::{Deserialize, Serialize};

/// Ordered query parameters, repeated keys allowed.
pub type QueryParams = Vec<(String, String)>;

/// Point cap applied to wide time ranges.
pub const MAX_POINTS: u32 = 4096;

/// Wire format requested from the host.
const FORMAT: &str = "json";

/// Resolution requested for a render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxPoints {
    /// Let the host pick its native resolution.
    #[default]
    Unbounded,
    /// Ask the host to downsample to at most this many points.
    Capped(u32),
}

impl MaxPoints {
    /// Picks the resolution for a `[from, to)` span in seconds.
    ///
    /// Spans shorter than [`MAX_POINTS`] seconds cannot exceed the cap even at
    /// one-second resolution, so they are left unbounded.
    pub fn for_span(from: i64, to: i64) -> Self {
        if to.saturating_sub(from) < MAX_POINTS as i64 {
            MaxPoints::Unbounded
        } else {
            MaxPoints::Capped(MAX_POINTS)
        }
    }

    /// Value of the `max_points` parameter; empty means unbounded.
    pub fn as_param(&self) -> String {
        match self {
            MaxPoints::Unbounded => String::new(),
            MaxPoints::Capped(n) => n.to_string(),
        }
    }
}

/// A `/paths` lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsRequest {
    pub query: String,
}

impl PathsRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }

    pub fn params(&self) -> QueryParams {
        vec![
            ("query".to_string(), self.query.clone()),
            ("format".to_string(), FORMAT.to_string()),
        ]
    }
}

/// A `/metrics` render for one or more targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsRequest {
    pub targets: Vec<String>,
    pub from: i64,
    pub to: i64,
    pub max_points: MaxPoints,
}

impl MetricsRequest {
    pub fn new(targets: Vec<String>, from: i64, to: i64) -> Self {
        Self {
            targets,
            from,
            to,
            max_points: MaxPoints::default(),
        }
    }

    /// Single-target render.
    pub fn single(target: impl Into<String>, from: i64, to: i64) -> Self {
        Self::new(vec![target.into()], from, to)
    }

    pub fn with_max_points(mut self, max_points: MaxPoints) -> Self {
        self.max_points = max_points;
        self
    }

    pub fn params(&self) -> QueryParams {
        let mut params: QueryParams = self
            .targets
            .iter()
            .map(|t| ("target".to_string(), t.clone()))
            .collect();
        params.push(("from".to_string(), self.from.to_string()));
        params.push(("to".to_string(), self.to.to_string()));
        params.push(("max_points".to_string(), self.max_points.as_param()));
        params.push(("format".to_string(), FORMAT.to_string()));
        params
    }
}
