//! Dispatch engine for a minimal multithreaded HTTP/1.x server: a
//! closable job queue, a fixed-size worker pool built around it, the
//! request-line framing state machine, and the accept/shutdown loop that
//! ties them together.

pub mod error;
pub mod handlers;
pub mod http;
pub mod job;
pub mod job_queue;
pub mod pool;
pub mod registry;
pub mod server;
pub mod worker;
