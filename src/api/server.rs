//! Mock catalog HTTP server on top of `tiny_http`

use std::net::SocketAddr;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{debug, error, info, warn};
use rand::Rng;
use tiny_http::{Header, Request, Response, Server};

use super::handler::{ApiResponse, DocumentsHandler, PDF, Route, route};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `127.0.0.1:3000`
    pub bind: String,
    /// Artificial response delay in milliseconds
    pub delay_ms: Range<u64>,
    /// Directory served under `/mock-documents/`
    pub documents_dir: Option<PathBuf>,
    pub threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            delay_ms: 200..1000,
            documents_dir: None,
            threads: 4,
        }
    }
}

struct Shared {
    server: Server,
    handler: DocumentsHandler,
    config: ServerConfig,
}

/// A bound server that has not started serving yet
pub struct ApiServer {
    shared: Arc<Shared>,
}

impl ApiServer {
    pub fn bind(config: ServerConfig, handler: DocumentsHandler) -> Result<Self> {
        let server = Server::http(&config.bind)
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("Failed to bind {}", config.bind))?;
        info!("Document API listening on {:?}", server.server_addr().to_ip());
        Ok(Self {
            shared: Arc::new(Shared {
                server,
                handler,
                config,
            }),
        })
    }

    /// The bound TCP address (useful when binding port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.shared.server.server_addr().to_ip()
    }

    /// Start the worker threads and return immediately
    pub fn spawn(self) -> ServerHandle {
        let threads = self.shared.config.threads.max(1);
        let workers = (0..threads)
            .map(|_| {
                let shared = Arc::clone(&self.shared);
                std::thread::spawn(move || serve_requests(&shared))
            })
            .collect();
        ServerHandle {
            shared: self.shared,
            workers,
        }
    }

    /// Serve until the process exits
    pub fn run(self) {
        let handle = self.spawn();
        for worker in handle.workers {
            let _ = worker.join();
        }
    }
}

/// Running server; dropping it does not stop the workers, [`shutdown`](Self::shutdown) does
pub struct ServerHandle {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.shared.server.server_addr().to_ip()
    }

    pub fn base_url(&self) -> Option<String> {
        self.local_addr().map(|addr| format!("http://{addr}"))
    }

    pub fn shutdown(self) {
        for _ in &self.workers {
            self.shared.server.unblock();
        }
        for worker in self.workers {
            let _ = worker.join();
        }
        info!("Document API stopped");
    }
}

fn serve_requests(shared: &Shared) {
    let mut rng = rand::thread_rng();
    loop {
        let request = match shared.server.recv() {
            Ok(request) => request,
            Err(e) => {
                debug!("Server worker exiting: {e}");
                break;
            }
        };
        handle_request(shared, request, &mut rng);
    }
}

fn handle_request<R: Rng>(shared: &Shared, request: Request, rng: &mut R) {
    let method = request.method().to_string();
    let target = request.url().to_string();

    let response = match route(&target) {
        (Route::Documents, query) => {
            if method == "GET" {
                delay(&shared.config.delay_ms, rng);
            }
            shared.handler.handle(&method, query, rng)
        }
        (Route::MockFile(name), _) => serve_mock_file(shared, &method, name),
        (Route::NotFound, _) => ApiResponse::text(404, "Not found"),
    };

    info!("{method} {target} -> {}", response.status);
    if let Err(e) = request.respond(into_http(response)) {
        error!("Failed to send response for {target}: {e}");
    }
}

fn delay<R: Rng>(range: &Range<u64>, rng: &mut R) {
    if range.start < range.end {
        std::thread::sleep(Duration::from_millis(rng.gen_range(range.clone())));
    }
}

fn serve_mock_file(shared: &Shared, method: &str, name: &str) -> ApiResponse {
    if method != "GET" {
        return ApiResponse::text(405, format!("Method {method} not allowed"));
    }
    let Some(dir) = &shared.config.documents_dir else {
        return ApiResponse::text(404, "Not found");
    };
    match std::fs::read(dir.join(name)) {
        Ok(body) => ApiResponse {
            status: 200,
            content_type: PDF,
            body,
        },
        Err(e) => {
            warn!("Mock document {name} unavailable: {e}");
            ApiResponse::text(404, "Not found")
        }
    }
}

fn into_http(response: ApiResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut http = Response::from_data(response.body).with_status_code(response.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], response.content_type.as_bytes()) {
        http = http.with_header(header);
    }
    http
}
