//! HTTP/1.x request-line parsing and response framing.
//!
//! Only the request line is parsed; headers, bodies, and keep-alive are
//! explicitly out of scope. A `Request` owns the connection's `TcpStream`
//! from the moment it is read off the wire until a `Response` is derived
//! from it and sent, at which point the stream moves to the `Response`.

use crate::error::ServerError;
use regex::bytes::Regex;
use std::fmt;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::OnceLock;

/// Closed enumeration of accepted HTTP methods.
///
/// `Update` covers both the `UPDATE` and `PUT` spellings seen in the
/// observed source; the wire grammar only ever matches the literal token
/// `UPDATE` (see `request_line_regex`), which is non-standard HTTP but
/// preserved here for compatibility (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Update,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
}

impl Verb {
    fn from_ascii_upper(token: &[u8]) -> Option<Verb> {
        Some(match token {
            b"GET" => Verb::Get,
            b"POST" => Verb::Post,
            b"UPDATE" => Verb::Update,
            b"PATCH" => Verb::Patch,
            b"DELETE" => Verb::Delete,
            b"HEAD" => Verb::Head,
            b"OPTIONS" => Verb::Options,
            b"TRACE" => Verb::Trace,
            b"CONNECT" => Verb::Connect,
            _ => return None,
        })
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Update => "UPDATE",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
            Verb::Trace => "TRACE",
            Verb::Connect => "CONNECT",
        };
        f.write_str(s)
    }
}

/// A validated request path: non-empty, starts with `/`, contains no spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri(String);

impl Uri {
    pub fn new(raw: impl Into<String>) -> Result<Uri, ServerError> {
        let raw = raw.into();
        if raw.is_empty() || !raw.starts_with('/') || raw.contains(' ') {
            return Err(ServerError::InvalidHttpRequest(raw));
        }
        Ok(Uri(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `(Verb, URI)` composite used as the dispatch key in the handler registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub verb: Verb,
    pub uri: Uri,
}

impl Method {
    pub fn new(verb: Verb, uri: Uri) -> Method {
        Method { verb, uri }
    }
}

/// HTTP version token. `V1_1` is the default used when synthesizing a 422
/// whose request line carried no parseable version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V1_0,
    V1_1,
    V2,
    V3,
}

impl Default for Version {
    fn default() -> Self {
        Version::V1_1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Version::V1_0 => "HTTP/1.0",
            Version::V1_1 => "HTTP/1.1",
            Version::V2 => "HTTP/2",
            Version::V3 => "HTTP/3",
        };
        f.write_str(s)
    }
}

impl Version {
    fn from_token(token: &[u8]) -> Option<Version> {
        match token {
            b"HTTP/1.1" => Some(Version::V1_1),
            b"HTTP/1" | b"HTTP/1.0" => Some(Version::V1_0),
            b"HTTP/2" | b"HTTP/2.0" => Some(Version::V2),
            b"HTTP/3" | b"HTTP/3.0" => Some(Version::V3),
            _ => None,
        }
    }
}

/// Response status. A closed set, matching the three outcomes this core
/// ever produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    UnprocessableContent,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::NotFound => 404,
            Status::UnprocessableContent => 422,
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NotFound => "NOT FOUND",
            Status::UnprocessableContent => "UNPROCESSABLE CONTENT",
        }
    }
}

/// A parsed request line plus the connection it arrived on.
///
/// Owns the stream until `Response::from_request` takes it.
pub struct Request {
    pub method: Method,
    pub version: Version,
    stream: TcpStream,
}

impl Request {
    fn into_stream(self) -> TcpStream {
        self.stream
    }
}

/// An outbound reply, derived from exactly one `Request`.
pub struct Response {
    version: Version,
    status: Status,
    body: Vec<u8>,
    stream: TcpStream,
}

fn request_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?-u)^(?i:(GET|POST|UPDATE|PATCH|DELETE|HEAD|OPTIONS|TRACE|CONNECT)) (/[^ ]*(?:/[^ ]*)*) (HTTP/(?:1\.1|[1-3](?:\.0)?))\r\n",
        )
        .expect("request line regex is a compile-time constant")
    })
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

/// Loosely recovers a `Version` from a truncated/garbage buffer, used only
/// when synthesizing a 422 for an oversized request line. Falls back to
/// `HTTP/1.1` when no version token can be found.
fn recover_version(data: &[u8]) -> Version {
    static VERSION_RE: OnceLock<Regex> = OnceLock::new();
    let re = VERSION_RE
        .get_or_init(|| Regex::new(r"(?-u)HTTP/(?:1\.1|[1-3](?:\.0)?)").expect("static regex"));
    re.find(data)
        .and_then(|m| Version::from_token(m.as_bytes()))
        .unwrap_or_default()
}

/// Reads the request line off `stream` and validates it against the
/// canonical grammar. Accumulates reads into a growing buffer, the same
/// way the teacher's own `Request::new` loops `stream.read` into a `Vec`
/// until it has enough to work with, since a request line can arrive
/// split across more than one TCP read. `max_len` is the too-big
/// threshold: once the buffer reaches it without a `\r\n` having shown
/// up, the request is rejected with a framed 422 and
/// `ReceiveTooBigMessage`.
pub fn read_request(mut stream: TcpStream, max_len: usize) -> Result<Request, ServerError> {
    let mut data: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 512];

    loop {
        if let Some(pos) = find_crlf(&data) {
            let line = &data[..pos + 2];
            let caps = request_line_regex().captures(line).ok_or_else(|| {
                ServerError::InvalidHttpRequest(String::from_utf8_lossy(line).into_owned())
            })?;

            let verb = Verb::from_ascii_upper(&caps[1].to_ascii_uppercase())
                .ok_or_else(|| ServerError::InvalidHttpRequest(String::from_utf8_lossy(line).into_owned()))?;
            let uri = Uri::new(String::from_utf8_lossy(&caps[2]).into_owned())?;
            let version = Version::from_token(&caps[3])
                .ok_or_else(|| ServerError::InvalidHttpRequest(String::from_utf8_lossy(line).into_owned()))?;

            return Ok(Request {
                method: Method::new(verb, uri),
                version,
                stream,
            });
        }

        if data.len() >= max_len {
            let version = recover_version(&data);
            write_too_big_response(&mut stream, version)?;
            graceful_close(&mut stream)?;
            return Err(ServerError::ReceiveTooBigMessage { limit: max_len });
        }

        let want = chunk.len().min(max_len - data.len());
        let n = stream.read(&mut chunk[..want])?;
        if n == 0 {
            return Err(ServerError::InvalidHttpRequest(
                String::from_utf8_lossy(&data).into_owned(),
            ));
        }
        data.extend_from_slice(&chunk[..n]);
    }
}

fn write_too_big_response(stream: &mut TcpStream, version: Version) -> Result<(), ServerError> {
    let msg = format!("{version} 422 UNPROCESSABLE CONTENT\r\n\r\n");
    stream.write_all(msg.as_bytes())?;
    Ok(())
}

/// Shuts down the write half, drains the read half until EOF, then lets
/// the socket close on drop. Prevents RST and truncated reads on clients
/// (notably browsers) that keep reading after their own half-close.
fn graceful_close(stream: &mut TcpStream) -> Result<(), ServerError> {
    stream.shutdown(Shutdown::Write)?;
    let mut sink = [0u8; 512];
    loop {
        match stream.read(&mut sink) {
            Ok(0) => break,
            Ok(_) => continue,
            Err(e) => return Err(ServerError::Io(e)),
        }
    }
    Ok(())
}

impl Response {
    /// Builds a response from the request it answers, taking ownership of
    /// its stream. `body` is the full response payload (see
    /// `body_from_file` for the standard way to produce it).
    pub fn from_request(request: Request, status: Status, body: Vec<u8>) -> Response {
        let version = request.version;
        Response {
            version,
            status,
            body,
            stream: request.into_stream(),
        }
    }

    /// Reads `path` in full and uses its bytes as the body. The only
    /// source of body bytes in this core; binary files are not required
    /// to round-trip.
    pub fn body_from_file(path: &std::path::Path) -> Result<Vec<u8>, ServerError> {
        Ok(std::fs::read(path)?)
    }

    /// Serializes and writes the response, then performs a graceful
    /// close. A short write (fewer bytes written than serialized) is
    /// reported as `MessagePartiallySent` rather than retried.
    pub fn send(mut self) -> Result<(), ServerError> {
        let header = format!(
            "{} {} {}\r\nContent-Length: {}\r\n\r\n",
            self.version,
            self.status.code(),
            self.status.phrase(),
            self.body.len()
        );
        let mut out = header.into_bytes();
        out.extend_from_slice(&self.body);

        let written = self.stream.write(&out)?;
        if written != out.len() {
            let peer = self.stream.peer_addr()?;
            return Err(ServerError::MessagePartiallySent {
                expected: out.len(),
                sent: written,
                peer,
            });
        }

        graceful_close(&mut self.stream)
    }
}
