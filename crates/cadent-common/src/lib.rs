//! Cadent Common Types and Transport
//!
//! This crate provides the protocol definitions and HTTP transport layer
//! used to talk to cadent metric hosts.
//!
//! # Overview
//!
//! A cadent host exposes two read endpoints:
//!
//! - **`/paths`**: resolves a glob-style query into matching metric paths
//! - **`/metrics`**: renders one or more targets over a time range
//!
//! This crate contains the shared pieces every client needs:
//!
//! - **Protocol Layer**: request parameters, typed response envelopes, errors
//! - **Transport Layer**: JSON decoding and an HTTP GET transport
//!
//! # Components
//!
//! - [`protocol`] - Request/response types and [`CadentError`]
//! - [`transport`] - [`JsonCodec`](transport::JsonCodec) and the [`Transport`](transport::Transport) trait
//!
//! # Example
//!
//! ```
//! use cadent_common::{MaxPoints, MetricsRequest};
//!
//! let request = MetricsRequest::new(vec!["servers.a.cpu".to_string()], 0, 60)
//!     .with_max_points(MaxPoints::for_span(0, 60));
//! assert_eq!(request.max_points, MaxPoints::Unbounded);
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
