//! Binds the listener, installs the shutdown signal handler, and drives
//! the non-blocking accept loop that feeds the worker pool.

use crate::http;
use crate::job::Job;
use crate::pool::WorkerPool;
use crate::registry::HandlerRegistry;
use signal_hook::consts::{SIGABRT, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Configuration injected at server construction: the templates root is
/// not a module-level constant so the core stays testable with a
/// temporary directory.
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub pool_size: usize,
    pub max_request_line: usize,
    pub templates_root: PathBuf,
    pub debug_requests: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: "127.0.0.1:8000".parse().unwrap(),
            pool_size: 4,
            max_request_line: 1024,
            templates_root: PathBuf::from("templates"),
            debug_requests: false,
        }
    }
}

/// Binds `config.addr`, installs the signal handler, and accepts
/// connections until SIGINT/SIGTERM/SIGABRT is received. Returns once the
/// pool has drained and joined every worker.
pub fn serve(config: ServerConfig, registry: HandlerRegistry) -> io::Result<()> {
    let listener = TcpListener::bind(config.addr)?;
    log::info!("server listening on {}", listener.local_addr()?);

    let running = Arc::new(AtomicBool::new(true));
    let _signal_thread = spawn_signal_thread(Arc::clone(&running))?;

    accept_loop(
        listener,
        registry,
        config.pool_size,
        config.max_request_line,
        config.debug_requests,
        running,
    )
}

/// The accept/dispatch loop itself, split out from `serve` so tests can
/// drive it against a listener bound to an ephemeral port and stop it
/// with a plain `AtomicBool` instead of a real OS signal.
pub fn accept_loop(
    listener: TcpListener,
    registry: HandlerRegistry,
    pool_size: usize,
    max_request_line: usize,
    debug_requests: bool,
    running: Arc<AtomicBool>,
) -> io::Result<()> {
    listener.set_nonblocking(true)?;
    let pool = WorkerPool::new(pool_size);
    let mut request_count: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let stream = match listener.accept() {
            Ok((stream, _peer)) => stream,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(10));
                continue;
            }
            Err(e) => {
                log::warn!("error during the acceptation of a new connection: {e}");
                continue;
            }
        };

        if let Err(e) = stream.set_nonblocking(false) {
            log::warn!("error during the acceptation of a new connection: {e}");
            continue;
        }

        match http::read_request(stream, max_request_line) {
            Ok(request) => {
                if debug_requests {
                    log::debug!(
                        "Request {request_count}: {} {}",
                        request.method.verb,
                        request.method.uri
                    );
                    request_count += 1;
                }
                let handler = registry.resolve(&request.method);
                pool.submit(Job::new(request, handler));
            }
            Err(e) => {
                log::warn!("{e}");
                continue;
            }
        }
    }

    drop(pool);
    Ok(())
}

/// Masks signals on every other thread (implicitly, by being the only
/// thread that ever waits on them) and dedicates one thread to the
/// blocking `Signals` iterator, flipping `running` to false on the first
/// SIGINT/SIGTERM/SIGABRT.
fn spawn_signal_thread(running: Arc<AtomicBool>) -> io::Result<std::thread::JoinHandle<()>> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGABRT])?;
    Ok(std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            log::info!("shutdown signal received ({sig}), draining queue");
            running.store(false, Ordering::SeqCst);
        }
    }))
}
