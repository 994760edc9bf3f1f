//! Synchronous client for the Online Labs cloud API.
//!
//! # Overview
//! Typed wrappers over the compute API (servers, volumes, images) and the
//! account API (user, organizations, tokens). Every operation is one blocking
//! HTTP round trip authenticated with `X-Auth-Token`, returning a decoded
//! envelope or a `ClientError`.
//!
//! # Design
//! - `OnlineLabsClient` holds only immutable configuration and a transport;
//!   no state survives between calls.
//! - Each operation splits into `build_*` (produces an `HttpRequest`) and a
//!   networked method, so requests are testable as plain data.
//! - The executor attaches auth headers, traces the exchange at debug level
//!   and turns statuses of 300 and above into `ClientError::Api`.
//! - `Transport` is the seam to the network. `UreqTransport` is the default;
//!   tests substitute fakes. Nothing retries, paginates or caches.

pub mod account;
pub mod client;
pub mod compute;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod transport;
pub mod types;

pub use account::read_public_key;
pub use client::OnlineLabsClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use executor::{check_status, decode, perform_request};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::*;
