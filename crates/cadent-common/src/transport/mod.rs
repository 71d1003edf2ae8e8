//! Cadent Transport Layer
//!
//! This module provides the HTTP transport and codec used to talk to cadent hosts.
//!
//! # Architecture
//!
//! - **Transport**: HTTP/1.1 GET with pooled keep-alive connections
//! - **Codec**: JSON bodies decoded into the typed envelopes of [`crate::protocol`]
//!
//! # Components
//!
//! - **[`JsonCodec`]**: Decode `/paths` and `/metrics` bodies
//! - **[`Transport`]**: Trait the fetch engine is generic over
//! - **[`HttpTransport`]**: hyper-based implementation of [`Transport`]

pub mod codec;
pub mod http;

pub use codec::JsonCodec;
pub use http::{HttpTransport, Transport, DEFAULT_TIMEOUT};
pub use hyper::body::Bytes;
