//! The HTTP surface: one `GET /` route returning the current window as JSON.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};

use crate::service::PriceService;

/// Upper bound on one request's cache and upstream work.
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(100);
/// Middleware backstop around every request. Kept above [`REQUEST_DEADLINE`]
/// so an expired request is answered by the handler with [`ERROR_BODY`].
pub const SERVER_TIMEOUT: Duration = Duration::from_secs(110);
/// How long in-flight requests may run after shutdown begins.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub const ERROR_BODY: &str = "error: error retrieving stock price data";

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PriceService>,
    /// Root token; every request works under a child of it.
    pub shutdown: CancellationToken,
    pub deadline: Duration,
}

impl AppState {
    pub fn new(service: Arc<PriceService>, shutdown: CancellationToken) -> Self {
        Self {
            service,
            shutdown,
            deadline: REQUEST_DEADLINE,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(current_prices))
        .layer(TimeoutLayer::new(SERVER_TIMEOUT))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

fn request_span(request: &Request<Body>) -> Span {
    let header_str = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };

    info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        user_agent = %header_str(header::USER_AGENT.as_str()),
        request_id = %header_str(REQUEST_ID_HEADER),
    )
}

async fn current_prices(State(state): State<AppState>) -> Response {
    let cancel = state.shutdown.child_token();
    // Dropping the handler (server timeout, client gone) cancels the chain.
    let _guard = cancel.clone().drop_guard();

    let window = match tokio::time::timeout(state.deadline, state.service.current_window(&cancel)).await {
        Ok(Ok(window)) => window,
        Ok(Err(e)) => {
            error!(symbol = state.service.symbol(), error = %e, "failed to retrieve stock price data");
            return error_response();
        }
        Err(_) => {
            error!(
                symbol = state.service.symbol(),
                deadline_ms = state.deadline.as_millis() as u64,
                "request deadline exceeded"
            );
            return error_response();
        }
    };

    match serde_json::to_vec(&window) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to serialize window");
            error_response()
        }
    }
}

fn error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain")],
        ERROR_BODY,
    )
        .into_response()
}

/// Serves `app` until `shutdown` fires, then stops accepting and drains.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "server listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
