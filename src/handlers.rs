//! Demo route handlers shipped with the binary. Outside the core
//! dispatch engine's own taxonomy, but needed to make the shipped
//! server runnable and exercisable end to end.

use crate::http::{Response, Status};
use crate::job::Handler;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// `GET /` — serves `templates/index.html`.
pub fn index(templates_root: PathBuf) -> Handler {
    Arc::new(move |req| {
        let path = templates_root.join("index.html");
        let body = Response::body_from_file(&path)
            .unwrap_or_else(|e| panic!("failed to read index template: {e}"));
        Response::from_request(req, Status::Ok, body)
    })
}

/// `GET /slow_request` — sleeps 5 seconds before responding, to
/// demonstrate that the pool keeps serving other connections while one
/// worker is blocked.
pub fn slow_request(templates_root: PathBuf) -> Handler {
    Arc::new(move |req| {
        std::thread::sleep(Duration::from_secs(5));
        let path = templates_root.join("slow_request.html");
        let body = Response::body_from_file(&path)
            .unwrap_or_else(|e| panic!("failed to read slow_request template: {e}"));
        Response::from_request(req, Status::Ok, body)
    })
}
