//! Unique `Method -> Handler` mapping, built once before `serve()` starts
//! and read-only for the lifetime of the server.

use crate::http::{Method, Request, Response, Status};
use crate::job::Handler;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

pub struct HandlerRegistry {
    handlers: HashMap<Method, Handler>,
    not_found: Handler,
}

impl HandlerRegistry {
    pub fn new(templates_root: impl Into<PathBuf>) -> HandlerRegistry {
        let not_found_path = templates_root.into().join("not_found.html");
        let not_found: Handler = Arc::new(move |req: Request| {
            let body = Response::body_from_file(&not_found_path)
                .unwrap_or_else(|e| panic!("failed to read not_found template: {e}"));
            Response::from_request(req, Status::NotFound, body)
        });

        HandlerRegistry {
            handlers: HashMap::new(),
            not_found,
        }
    }

    /// Registers `handler` under `method`.
    ///
    /// # Panics
    ///
    /// Panics if `method` is already registered — duplicate registration
    /// is a programming error, not something a caller should be able to
    /// silently shadow.
    pub fn link(&mut self, method: Method, handler: Handler) {
        if self.handlers.contains_key(&method) {
            panic!("duplicate handler registration for {:?} {}", method.verb, method.uri);
        }
        self.handlers.insert(method, handler);
    }

    /// Looks up the handler for `method`, falling back to the built-in
    /// 404 handler when nothing is registered.
    pub fn resolve(&self, method: &Method) -> Handler {
        self.handlers
            .get(method)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.not_found))
    }
}
