use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::controller::Controller;

pub mod api;
pub mod routes;

pub const STATIC_DIR: &str = "frontend/dist";

impl IntoResponse for routes::HttpResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

async fn api_handler(
    State(ctl): State<Arc<Controller>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> routes::HttpResponse {
    let body = String::from_utf8_lossy(&body);
    routes::route_request(&ctl, method.as_str(), uri.path(), &body).await
}

async fn index() -> Html<&'static str> {
    Html(routes::index_html())
}

/// The console router: `/api/*` goes through [routes::route_request], `/` serves the console
/// page and everything else falls through to static files under `static_dir`.
pub fn router(ctl: Arc<Controller>, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/*rest", any(api_handler))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(ctl)
}

pub async fn run_server(bind_addr: &str, ctl: Arc<Controller>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "orbsmith server listening");
    axum::serve(listener, router(ctl, STATIC_DIR)).await
}
