//! In-memory transport for tests (no network)
//!
//! `RecordingTransport` serves canned responses and counts every request so
//! tests can assert how often the network would have been hit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{FetchError, Result};
use crate::transport::Transport;

/// Canned-response transport with a request log.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    responses: Mutex<HashMap<String, std::result::Result<Vec<u8>, u16>>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 for `url`.
    pub fn with_response(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.into()));
        self
    }

    /// Answer `url` with a non-2xx `status`.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(status));
        self
    }

    /// Total number of requests issued.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs requested, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());

        match self.responses.lock().unwrap().get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
