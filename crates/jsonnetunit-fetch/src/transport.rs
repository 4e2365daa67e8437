//! Live network access.
//!
//! [`Transport`] is the seam between the fetcher and the network so that the
//! cache and redirect logic can be exercised without I/O (see [`crate::fakes`]).

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{FetchError, Result};

/// Issues a single GET and returns the body of a 2xx response.
///
/// Implementations must not retry; a non-2xx status is a terminal
/// [`FetchError::Status`].
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a transport. `timeout` bounds each request end to end; `None`
    /// waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("jsonnetunit/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| FetchError::Transport {
            url: String::new(),
            detail: format!("failed to create HTTP client: {e}"),
        })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        info!(url = %url, "fetching");

        let transport_err = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            detail: e.to_string(),
        };

        let response = self.client.get(url).send().map_err(transport_err)?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "fetch failed");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(transport_err)?;
        Ok(body.to_vec())
    }
}
