//! Crate-wide error type.
//!
//! Protocol and network errors here are recoverable: the server loop logs
//! them and moves on to the next connection. I/O errors raised while a
//! handler assembles a response body are fatal to the worker that raised
//! them (see `worker.rs`); they are not a distinct variant here because
//! they reuse `Io`, and the worker is the one that decides to terminate.

use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid HTTP request line: {0:?}")]
    InvalidHttpRequest(String),

    #[error("request line exceeded {limit} bytes before a terminator was found")]
    ReceiveTooBigMessage { limit: usize },

    #[error("response partially sent to {peer}: sent {sent} of {expected} bytes")]
    MessagePartiallySent {
        expected: usize,
        sent: usize,
        peer: SocketAddr,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
