use dispatch_httpd::handlers;
use dispatch_httpd::http::{Method, Uri, Verb};
use dispatch_httpd::registry::HandlerRegistry;
use dispatch_httpd::server::{self, ServerConfig};

fn main() {
    env_logger::init();

    let config = ServerConfig::default();
    let mut registry = HandlerRegistry::new(config.templates_root.clone());

    registry.link(
        Method::new(Verb::Get, Uri::new("/").unwrap()),
        handlers::index(config.templates_root.clone()),
    );
    registry.link(
        Method::new(Verb::Get, Uri::new("/slow_request").unwrap()),
        handlers::slow_request(config.templates_root.clone()),
    );

    if let Err(e) = server::serve(config, registry) {
        log::error!("fatal server error: {e}");
        std::process::exit(1);
    }
}
