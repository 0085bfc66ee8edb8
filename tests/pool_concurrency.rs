//! End-to-end check that a slow handler occupying one worker does not
//! block a concurrent request to a fast route, proving the pool actually
//! runs jobs in parallel rather than serializing them.

use dispatch_httpd::http::{Method, Uri, Verb};
use dispatch_httpd::job::Handler;
use dispatch_httpd::registry::HandlerRegistry;
use dispatch_httpd::server::accept_loop;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn spawn_server(registry: HandlerRegistry) -> (SocketAddr, Arc<AtomicBool>, std::thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    let handle = std::thread::spawn(move || {
        accept_loop(listener, registry, 4, 1024, false, running_clone).unwrap();
    });
    std::thread::sleep(Duration::from_millis(30));
    (addr, running, handle)
}

fn send_and_read(addr: SocketAddr, request: &str) -> (Vec<u8>, Duration) {
    let start = Instant::now();
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    (out, start.elapsed())
}

#[test]
fn a_slow_handler_does_not_block_a_concurrent_fast_one() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "fast").unwrap();
    std::fs::write(dir.path().join("not_found.html"), "nope").unwrap();

    let mut registry = HandlerRegistry::new(dir.path());
    registry.link(
        Method::new(Verb::Get, Uri::new("/").unwrap()),
        dispatch_httpd::handlers::index(dir.path().to_path_buf()),
    );

    let slow_path = dir.path().join("slow_request.html");
    std::fs::write(&slow_path, "slow").unwrap();
    let slow_handler: Handler = Arc::new(move |req| {
        std::thread::sleep(Duration::from_millis(400));
        let body = dispatch_httpd::http::Response::body_from_file(&slow_path).unwrap();
        dispatch_httpd::http::Response::from_request(req, dispatch_httpd::http::Status::Ok, body)
    });
    registry.link(
        Method::new(Verb::Get, Uri::new("/slow_request").unwrap()),
        slow_handler,
    );

    let (addr, running, handle) = spawn_server(registry);

    let slow_thread = std::thread::spawn(move || send_and_read(addr, "GET /slow_request HTTP/1.1\r\n\r\n"));
    // Give the slow request time to be accepted and land on a worker
    // before firing the fast one.
    std::thread::sleep(Duration::from_millis(100));
    let (fast_body, fast_elapsed) = send_and_read(addr, "GET / HTTP/1.1\r\n\r\n");

    assert!(
        fast_elapsed < Duration::from_millis(350),
        "fast request took {fast_elapsed:?}, pool appears to be serializing jobs"
    );
    assert!(String::from_utf8_lossy(&fast_body).ends_with("fast"));

    let (slow_body, _) = slow_thread.join().unwrap();
    assert!(String::from_utf8_lossy(&slow_body).ends_with("slow"));

    running.store(false, Ordering::SeqCst);
    handle.join().unwrap();
}
