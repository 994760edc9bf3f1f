//! The Online Labs resource client.
//!
//! # Design
//! `OnlineLabsClient` holds an immutable `ClientConfig` and a transport. Each
//! API operation comes in two halves:
//! - a `build_*` method producing an `HttpRequest` without touching the
//!   network, so URL, verb and payload are testable as plain data;
//! - a networked method that runs the request through the executor and
//!   decodes the result.
//!
//! Account operations live in `account.rs`, compute operations in
//! `compute.rs`. Both are `impl` blocks on the type defined here.

use std::fmt::Display;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::executor;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::{Transport, UreqTransport};

/// Escapes every byte but ASCII alphanumerics, `-`, `_` and `~`. Dots are
/// escaped as well so `..` never reaches the server as a dot segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'~');

/// Percent-encodes an identifier for use as one URL path segment.
pub(crate) fn path_segment(id: &str) -> impl Display + '_ {
    utf8_percent_encode(id, PATH_SEGMENT)
}

/// Synchronous client for the compute and account APIs.
///
/// Cloning is cheap when the transport is (`UreqTransport` and `Arc<T>`
/// both share their connection pool).
#[derive(Debug, Clone)]
pub struct OnlineLabsClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl OnlineLabsClient<UreqTransport> {
    /// Client for the production endpoints over a fresh `ureq` agent.
    pub fn new(
        user_id: impl Into<String>,
        token: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self::from_config(ClientConfig::new(user_id, token, organization))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> OnlineLabsClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        debug!(
            user_id = %config.user_id,
            organization = %config.organization,
            compute_url = %config.compute_url,
            account_url = %config.account_url,
            "creating client"
        );
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn compute_url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.compute_url)
    }

    pub(crate) fn account_url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.account_url)
    }

    pub(crate) fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest::new(method, url, &self.config.token, None)
    }

    pub(crate) fn json_request<P: Serialize>(
        &self,
        method: HttpMethod,
        url: String,
        payload: &P,
    ) -> Result<HttpRequest> {
        let body = serde_json::to_string(payload).map_err(ClientError::Encode)?;
        Ok(HttpRequest::new(method, url, &self.config.token, Some(body)))
    }

    /// Executes `request` and decodes the body into `R`.
    pub(crate) fn fetch<R: DeserializeOwned>(&self, request: &HttpRequest) -> Result<R> {
        let bytes = executor::execute(&self.transport, request)?;
        executor::decode(&bytes)
    }

    /// Executes `request` and ignores any body.
    pub(crate) fn send(&self, request: &HttpRequest) -> Result<()> {
        executor::execute(&self.transport, request)?;
        Ok(())
    }
}
