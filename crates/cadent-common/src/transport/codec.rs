use crate::protocol::error::Result;
use crate::protocol::{PathEntry, RenderEnvelope};

/// JSON codec for cadent response bodies
///
/// Hosts answer "nothing here" in several ways: an empty body, a JSON `null`,
/// or an envelope without series. The first two are folded into "no data"
/// here so callers only deal with typed values.
///
/// # Example
///
/// ```
/// use cadent_common::transport::JsonCodec;
///
/// let paths = JsonCodec::decode_paths(br#"[{"path": "servers", "leaf": false}]"#).unwrap();
/// assert_eq!(paths.len(), 1);
///
/// let render = JsonCodec::decode_render(b"").unwrap();
/// assert!(render.is_none());
/// ```
pub struct JsonCodec;

impl JsonCodec {
    /// Decode a `/paths` body
    ///
    /// # Returns
    ///
    /// The matched entries in host order; empty for an empty or `null` body
    pub fn decode_paths(data: &[u8]) -> Result<Vec<PathEntry>> {
        if is_blank(data) {
            return Ok(Vec::new());
        }
        let entries: Option<Vec<PathEntry>> = serde_json::from_slice(data)?;
        Ok(entries.unwrap_or_default())
    }

    /// Decode a `/metrics` body
    ///
    /// # Returns
    ///
    /// `None` when the host sent no envelope at all
    pub fn decode_render(data: &[u8]) -> Result<Option<RenderEnvelope>> {
        if is_blank(data) {
            return Ok(None);
        }
        Ok(serde_json::from_slice(data)?)
    }
}

fn is_blank(data: &[u8]) -> bool {
    data.iter().all(u8::is_ascii_whitespace)
}
