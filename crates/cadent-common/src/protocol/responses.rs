//! Cadent Response Types
//!
//! Typed envelopes for the `/paths` and `/metrics` endpoints. Every field the
//! fetch engine relies on is explicit here and validated at decode time; a
//! payload that does not fit is a [`CadentError::Decode`](super::CadentError::Decode).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A sample, or `None` where the host had no data.
pub type SeriesPoint = Option<f64>;

/// One match returned by `/paths`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub path: String,
    /// Leaves hold data; everything else is a namespace branch.
    #[serde(rename = "leaf", default)]
    pub is_leaf: bool,
}

impl PathEntry {
    pub fn leaf(path: impl Into<String>) -> Self {
        Self { path: path.into(), is_leaf: true }
    }

    pub fn branch(path: impl Into<String>) -> Self {
        Self { path: path.into(), is_leaf: false }
    }
}

/// Resolution and bounds shared by every series of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInfo {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl TimeInfo {
    pub fn new(start: i64, end: i64, step: i64) -> Self {
        Self { start, end, step }
    }

    /// The "no data" range: `[start, end)` as a single step.
    pub fn whole_span(start: i64, end: i64) -> Self {
        Self { start, end, step: end.saturating_sub(start) }
    }
}

/// A single sample as sent by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(default)]
    pub time: Option<i64>,
    /// NaN marks a gap. `null`, `"NaN"` and infinite strings decode to NaN too.
    #[serde(default = "nan", deserialize_with = "deserialize_sample")]
    pub value: f64,
}

impl DataPoint {
    pub fn new(value: f64) -> Self {
        Self { time: None, value }
    }

    /// The sample with the NaN sentinel replaced by `None`.
    pub fn normalized(&self) -> SeriesPoint {
        if self.value.is_nan() {
            None
        } else {
            Some(self.value)
        }
    }
}

fn nan() -> f64 {
    f64::NAN
}

fn deserialize_sample<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(f64::NAN),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("sample out of range: {}", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|v| if v.is_finite() { v } else { f64::NAN })
            .map_err(|_| D::Error::custom(format!("invalid sample: {:?}", s))),
        other => Err(D::Error::custom(format!("invalid sample: {}", other))),
    }
}

/// How authoritative a series answer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheState {
    /// Served without a cache layer.
    Authoritative,
    /// Served from a cache that holds the complete range.
    CacheHit,
    /// Served from a cache that does not hold the range yet.
    Stale,
}

/// One series inside a render envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderSeries {
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub data: Vec<DataPoint>,
    #[serde(default)]
    pub using_cache: bool,
    #[serde(default)]
    pub in_cache: bool,
}

impl RenderSeries {
    pub fn cache_state(&self) -> CacheState {
        match (self.using_cache, self.in_cache) {
            (false, _) => CacheState::Authoritative,
            (true, true) => CacheState::CacheHit,
            (true, false) => CacheState::Stale,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.cache_state() == CacheState::Stale
    }

    /// Samples with every NaN turned into `None`.
    pub fn points(&self) -> Vec<SeriesPoint> {
        self.data.iter().map(DataPoint::normalized).collect()
    }
}

/// The body of a `/metrics` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderEnvelope {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(default)]
    pub step: Option<i64>,
    #[serde(default)]
    pub series: BTreeMap<String, RenderSeries>,
}

impl RenderEnvelope {
    pub fn has_series(&self) -> bool {
        !self.series.is_empty()
    }

    /// Bounds of this render, if the host sent them.
    ///
    /// A missing step falls back to the whole span.
    pub fn time_info(&self) -> Option<TimeInfo> {
        let (start, end) = (self.start?, self.end?);
        Some(TimeInfo::new(start, end, self.step.unwrap_or(end.saturating_sub(start))))
    }

    /// Finds the series for `path`, by key first and then by target.
    pub fn series_for(&self, path: &str) -> Option<&RenderSeries> {
        self.series
            .get(path)
            .or_else(|| self.series.values().find(|s| s.target == path))
    }
}
