//! In-memory transport for unit tests

use cadent_common::protocol::error::{CadentError, Result};
use cadent_common::protocol::QueryParams;
use cadent_common::transport::Transport;
use cadent_common::transport::Bytes;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&QueryParams) -> Result<Bytes> + Send + Sync>;

/// A recorded request
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub params: QueryParams,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn targets(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == "target")
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// Transport answering from per-URL handlers; unknown URLs fail as unreachable
#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<String, Handler>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler<F>(mut self, url: &str, handler: F) -> Self
    where
        F: Fn(&QueryParams) -> Result<Bytes> + Send + Sync + 'static,
    {
        self.routes.insert(url.to_string(), Box::new(handler));
        self
    }

    pub fn with_body(self, url: &str, body: &'static str) -> Self {
        self.with_handler(url, move |_| Ok(Bytes::from_static(body.as_bytes())))
    }

    pub fn with_json(self, url: &str, value: Value) -> Self {
        let body = Bytes::from(value.to_string());
        self.with_handler(url, move |_| Ok(body.clone()))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    async fn get(&self, url: &str, params: &QueryParams) -> Result<Bytes> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            params: params.clone(),
        });
        match self.routes.get(url) {
            Some(handler) => handler(params),
            None => Err(CadentError::Transport(format!("connection refused: {}", url))),
        }
    }
}

/// One series of a render body; `NaN` samples are sent as the string "NaN"
pub fn series(target: &str, values: &[f64], using_cache: bool, in_cache: bool) -> Value {
    let data: Vec<Value> = values
        .iter()
        .map(|v| {
            if v.is_nan() {
                json!({"value": "NaN"})
            } else {
                json!({"value": v})
            }
        })
        .collect();
    json!({
        "target": target,
        "using_cache": using_cache,
        "in_cache": in_cache,
        "data": data,
    })
}

/// A render body with the given `(key, series)` pairs
pub fn render(start: i64, end: i64, step: i64, entries: Vec<(&str, Value)>) -> Value {
    let series: serde_json::Map<String, Value> = entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    json!({"start": start, "end": end, "step": step, "series": series})
}
