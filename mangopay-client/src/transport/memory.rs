//! In-memory transport for tests.
//!
//! [`MemoryTransport`] answers requests from a queue of canned responses and
//! records every request it receives, so tests can assert on what was sent
//! (or that nothing was sent at all).

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use serde_json::Value;

use crate::{
    action::Method,
    error::TransportError,
    transport::{ApiRequest, Transport, TransportResponse},
};

type Canned = Result<TransportResponse, TransportError>;

/// A request seen by a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Path, query string included.
    pub path: String,
    /// Body bytes, if any.
    pub body: Option<Vec<u8>>,
    /// Client id of the credentials used.
    pub client_id: String,
}

impl RecordedRequest {
    /// Parses the body as JSON.
    #[must_use]
    pub fn json_body(&self) -> Option<Value> {
        self.body.as_deref().and_then(|b| serde_json::from_slice(b).ok())
    }
}

/// Transport returning queued responses in order.
///
/// When the queue is empty, requests fail with [`TransportError::Network`].
#[derive(Debug, Default)]
pub struct MemoryTransport {
    responses: Mutex<VecDeque<Canned>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MemoryTransport {
    /// Creates a transport with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw response.
    pub fn push(&self, response: TransportResponse) {
        self.queue().push_back(Ok(response));
    }

    /// Queues a JSON response with the given status.
    pub fn push_json(&self, status: u16, body: &Value) {
        self.push(TransportResponse {
            status,
            body: body.to_string().into_bytes(),
            headers: vec![("content-type".to_owned(), "application/json".to_owned())],
        });
    }

    /// Queues a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.queue().push_back(Err(error));
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Canned>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(&self, request: ApiRequest<'_>) -> Canned {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(RecordedRequest {
            method: request.method,
            path: request.path.to_owned(),
            body: request.body.map(<[u8]>::to_vec),
            client_id: request.credentials.client_id().to_owned(),
        });

        self.queue().pop_front().unwrap_or_else(|| {
            Err(TransportError::Network(format!(
                "no response queued for {} {}",
                request.method, request.path
            )))
        })
    }
}

impl Transport for MemoryTransport {
    async fn execute<'a>(&'a self, request: ApiRequest<'a>) -> Canned {
        self.respond(request)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
