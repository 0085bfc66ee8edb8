//! A `Job` pairs one owned `Request` with the handler chosen for it. The
//! server loop constructs jobs; exactly one worker consumes each.

use crate::http::{Request, Response};
use std::sync::Arc;

/// A handler is a function from an owned request to an owned response. It
/// must not touch the connection directly; all I/O goes through
/// `Response`. Handlers may block (sleep, read files) — the pool is sized
/// to absorb that.
///
/// Cheap to clone (an `Arc`) so the same registered handler can be handed
/// to many jobs without re-boxing per request.
pub type Handler = Arc<dyn Fn(Request) -> Response + Send + Sync + 'static>;

pub struct Job {
    request: Request,
    handler: Handler,
}

impl Job {
    pub fn new(request: Request, handler: Handler) -> Job {
        Job { request, handler }
    }

    /// Runs the handler and sends its response. A handler that panics
    /// (e.g. on a response-body file it cannot read) propagates the
    /// panic to the caller — the worker loop is the one that decides
    /// this terminates only that worker. A failure in `send` itself
    /// (a network error, not a handler error) is returned instead of
    /// panicking: it gets logged and the connection is simply dropped.
    pub fn execute_and_send(self) -> Result<(), crate::error::ServerError> {
        let response = (self.handler)(self.request);
        response.send()
    }
}
