//! Shared utilities for integration tests.

use odata_books::config::{parse_config, ServiceConfig};
use odata_books::lifecycle::{build_service, Shutdown};
use odata_books::HttpServer;
use tokio::net::TcpListener;

/// A running service on an ephemeral port. Shuts down on drop.
pub struct TestServer {
    pub root: String,
    shutdown: Shutdown,
}

impl TestServer {
    /// Absolute URL of `path` below the service root.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the service with `config`, bound to 127.0.0.1 on a free port.
pub async fn spawn_server(mut config: ServiceConfig) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".into();
    let service = build_service(&config).unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let root = format!("http://{}{}", addr, config.odata.service_root());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = HttpServer::new(config, service)
            .run(listener, server_shutdown)
            .await;
    });

    TestServer { root, shutdown }
}

/// Start the service from TOML text.
#[allow(dead_code)]
pub async fn spawn_with_toml(toml: &str) -> TestServer {
    spawn_server(parse_config(toml).unwrap()).await
}

#[allow(dead_code)]
pub async fn spawn_default() -> TestServer {
    spawn_server(ServiceConfig::default()).await
}
