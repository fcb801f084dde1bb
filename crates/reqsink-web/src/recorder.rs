//! Capture recorder: decides whether to record an inbound request and
//! materializes a capture from it.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, Method, Uri};
use reqsink_db::entities::capture;
use tracing::debug;

use crate::store::{CaptureStore, NewCapture, StoreError};

/// Bodies beyond this size are recorded with an empty body rather than
/// rejected; recording the request's existence matters more than fidelity.
pub const MAX_CAPTURE_BODY_BYTES: usize = 1024 * 1024;

/// The slice of an inbound request the recorder needs, detached from the
/// transport so the policy is testable without a server.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    /// Header name -> value, duplicates collapsed last-wins
    pub headers: BTreeMap<String, String>,
    /// Raw body bytes as delivered by the transport
    pub body: Vec<u8>,
    /// True when the request carries a valid operator session for this
    /// same instance. Computed by the auth layer, not in here.
    pub from_self: bool,
}

impl InboundRequest {
    /// Build from the pieces of an axum request. The body must already be
    /// read to completion; a client that disconnected mid-body never gets
    /// this far, so nothing partial is ever recorded.
    pub fn from_parts(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Vec<u8>,
        from_self: bool,
    ) -> Self {
        let mut collapsed = BTreeMap::new();
        for (name, value) in headers {
            // Last occurrence wins; undecodable values degrade to ""
            collapsed.insert(
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            );
        }

        Self {
            method: method.as_str().to_string(),
            path: uri.path().to_string(),
            query: uri.query().unwrap_or_default().to_string(),
            headers: collapsed,
            body,
            from_self,
        }
    }
}

pub struct CaptureRecorder {
    store: CaptureStore,
    ignore_from_self: bool,
}

impl CaptureRecorder {
    pub fn new(store: CaptureStore, ignore_from_self: bool) -> Self {
        Self {
            store,
            ignore_from_self,
        }
    }

    /// Record the request, unless the suppression policy says to skip it.
    ///
    /// Exactly one insert per non-suppressed request; storage failures
    /// propagate without retry. The insert completes before this returns,
    /// so a subsequent recent-list read in the same handler sees the row.
    pub async fn record(&self, req: InboundRequest) -> Result<Option<capture::Model>, StoreError> {
        if self.ignore_from_self && req.from_self {
            debug!(path = %req.path, "Skipping capture of self-originated request");
            return Ok(None);
        }

        let domain = req.headers.get("host").cloned().unwrap_or_default();

        let path = if req.path.starts_with('/') {
            req.path
        } else {
            format!("/{}", req.path)
        };

        // Best-effort text decode; undecodable or oversized bodies become ""
        let body = if req.body.len() > MAX_CAPTURE_BODY_BYTES {
            String::new()
        } else {
            String::from_utf8(req.body).unwrap_or_default()
        };

        let capture = self
            .store
            .insert(NewCapture {
                method: req.method,
                url_path: path,
                query_params: req.query,
                domain,
                headers: req.headers,
                body,
            })
            .await?;

        debug!(ordinal = capture.id, public_id = %capture.public_id, "Recorded capture");
        Ok(Some(capture))
    }
}
