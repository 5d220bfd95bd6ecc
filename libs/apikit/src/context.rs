use std::sync::Arc;

use axum::extract::OriginalUri;
use axum::http::{request::Parts, HeaderMap, HeaderName, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

/// Header carrying the request id set by the ingress layers.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request-context handle passed as the first argument of every handler.
///
/// Cloning is cheap; all clones refer to the same request. The handle owns the
/// request head (method, uri, headers, extensions) and the single response slot
/// of the request: the first call to [`finalize`](Self::finalize) wins, later
/// calls are no-ops. A finalized request stays finalized after its response
/// has been handed to the router.
#[derive(Clone)]
pub struct RequestCtx {
    inner: Arc<Inner>,
}

struct Inner {
    parts: Parts,
    recorded_body: Mutex<Option<String>>,
    response: Mutex<Slot>,
}

enum Slot {
    Open,
    Pending(Response),
    Sent,
}

impl RequestCtx {
    pub fn from_parts(parts: Parts) -> Self {
        Self {
            inner: Arc::new(Inner {
                parts,
                recorded_body: Mutex::new(None),
                response: Mutex::new(Slot::Open),
            }),
        }
    }

    pub fn method(&self) -> &Method {
        &self.inner.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.inner.parts.uri
    }

    /// Uri as received by the outermost router, before any `nest` prefix was stripped.
    pub fn original_uri(&self) -> &Uri {
        self.inner
            .parts
            .extensions
            .get::<OriginalUri>()
            .map(|o| &o.0)
            .unwrap_or(self.uri())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.parts.headers
    }

    /// Typed lookup in the request extensions (shared state injected by router layers).
    pub fn extension<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.inner.parts.extensions.get::<T>().cloned()
    }

    /// Request id propagated by the ingress, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.inner
            .parts
            .headers
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
    }

    /// JSON text of the decoded request body, kept for diagnostics.
    pub fn recorded_body(&self) -> Option<String> {
        self.inner.recorded_body.lock().clone()
    }

    pub(crate) fn record_body(&self, body: String) {
        *self.inner.recorded_body.lock() = Some(body);
    }

    /// Write the response for this request.
    ///
    /// Returns `false` when the request was already finalized; the new
    /// response is dropped in that case.
    pub fn finalize(&self, status: StatusCode, body: impl IntoResponse) -> bool {
        let mut slot = self.inner.response.lock();
        if !matches!(*slot, Slot::Open) {
            tracing::warn!(uri = %self.uri(), "response already finalized, ignoring write");
            return false;
        }
        *slot = Slot::Pending((status, body).into_response());
        true
    }

    pub fn is_finalized(&self) -> bool {
        !matches!(*self.inner.response.lock(), Slot::Open)
    }

    /// Hand the pending response over; the slot stays closed afterwards.
    pub(crate) fn take_response(&self) -> Option<Response> {
        let mut slot = self.inner.response.lock();
        match std::mem::replace(&mut *slot, Slot::Sent) {
            Slot::Pending(resp) => Some(resp),
            Slot::Open => {
                *slot = Slot::Open;
                None
            }
            Slot::Sent => None,
        }
    }
}

impl std::fmt::Debug for RequestCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCtx")
            .field("method", self.method())
            .field("uri", self.uri())
            .field("finalized", &self.is_finalized())
            .finish()
    }
}
