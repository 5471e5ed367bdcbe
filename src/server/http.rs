//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Every route is served
//! both at its bare path and under the `/api` prefix.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::HeaderValue;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Args;
use crate::db::{DocumentStore, MemoryStore};
use crate::repo::{EventRepository, LeadRepository};
use crate::routes;
use crate::types::{CrmError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Document store backing both repositories
    pub store: Arc<dyn DocumentStore>,
    pub leads: LeadRepository,
    pub events: EventRepository,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create AppState over an in-memory store (dev mode, tests)
    pub fn new(args: Args) -> Self {
        Self::with_store(args, Arc::new(MemoryStore::new()))
    }

    /// Create AppState over the given document store
    pub fn with_store(args: Args, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            leads: LeadRepository::new(Arc::clone(&store)),
            events: EventRepository::new(Arc::clone(&store)),
            store,
            args,
            started_at: Instant::now(),
        }
    }

    /// Per-call store timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.args.request_timeout_ms)
    }

    /// Run a repository call under the request timeout. Expiry is reported
    /// as [`CrmError::StoreUnavailable`].
    pub async fn timed<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.request_timeout(), call).await?
    }
}

/// Start the HTTP server and serve until Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "openhouse listening on {} as node {} (store: {})",
        state.args.listen,
        state.args.node_id,
        state.store.backend()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await;

    Ok(())
}

/// Accept connections on `listener` until `shutdown` resolves.
///
/// Connections already accepted keep running on their own tasks.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }
}

/// Strip the `/api` prefix and any trailing slash
fn route_path(path: &str) -> &str {
    let path = match path.strip_prefix("/api") {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    };
    match path.strip_suffix('/') {
        Some("") | None => path,
        Some(trimmed) => trimmed,
    }
}

/// Route incoming HTTP requests
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let full_path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    info!(peer = %addr, method = %method, path = %full_path, "Request");

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(peer = %addr, error = %e, "Failed to read request body");
            return Ok(routes::error_response(&CrmError::Validation(
                "Invalid body".into(),
            )));
        }
    };

    let path = route_path(&full_path);
    let query = query.as_deref();

    let response = match (method, path) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(&state),

        // Readiness probe - 200 only when the document store answers
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(&state).await
        }

        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        (Method::GET, "/events") => routes::list_events(&state).await,
        (Method::POST, "/events") => routes::create_event(&state, &body).await,
        (Method::PUT, "/events") => routes::update_event(&state, &body).await,
        (Method::DELETE, p) if p.starts_with("/events/") => {
            routes::delete_event(&state, &p["/events/".len()..]).await
        }

        (Method::GET, "/leads") => routes::list_leads(&state, query).await,
        (Method::POST, "/leads") => routes::create_lead(&state, &body).await,
        (Method::PUT, "/leads") => routes::update_lead(&state, &body).await,
        (Method::DELETE, p) if p.starts_with("/leads/") => {
            routes::delete_lead(&state, &p["/leads/".len()..]).await
        }

        (Method::GET, "/dashboard") => routes::dashboard(&state, query).await,

        (Method::POST, "/calendar/reconcile") => routes::reconcile_calendar(&state, &body).await,
        (Method::POST, "/calendar/showings") => routes::add_showing(&state, &body).await,

        (method, p) => {
            debug!(method = %method, path = %p, "No route");
            not_found_response(&full_path)
        }
    };

    Ok(with_cors(response))
}

fn with_cors(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    response
        .headers_mut()
        .insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    response
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "code": "NOT_FOUND",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
