//! EuskalIA server: a thin CRUD API backing the EuskalIA mobile client.

#[forbid(unsafe_code)]
#[deny(missing_docs, unused_mut)]
pub mod config;
mod crypto;
mod database;
pub mod error;
mod generator;
mod leaderboard;
mod lesson;
mod mail;
mod progress;
mod router;
mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::http::{Method, header};
use axum::routing::get;
use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub db: database::Database,
    pub crypto: Arc<crypto::Cipher>,
    pub mail: mail::Mailer,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support. The mobile client calls from any origin.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status))
        .nest("/api/users", router::users::router())
        .nest("/api/lessons", router::lessons::router())
        .nest("/api/leaderboard", router::leaderboard::router())
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read()?;

    let (path, pool_size) = match config.database {
        Some(ref database) => (
            database.path.clone(),
            database.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
        ),
        None => (
            database::DEFAULT_DATABASE_PATH.to_owned(),
            database::DEFAULT_POOL_SIZE,
        ),
    };
    let db = database::Database::new(&path, pool_size).await?;

    // execute migrations scripts on start.
    sqlx::migrate!().run(&db.sqlite).await?;

    // field encryption key comes from the configuration or the
    // environment; there is no built-in default.
    let key = match config
        .encryption
        .as_ref()
        .and_then(|encryption| encryption.key.clone())
        .or_else(|| std::env::var("EUSKALIA_KEY").ok())
    {
        Some(key) => key,
        None => {
            tracing::error!(
                "missing `encryption.key` entry on `config.yaml` file and `EUSKALIA_KEY` environment variable"
            );
            std::process::exit(0);
        },
    };
    let crypto = Arc::new(crypto::Cipher::new(key)?);

    // handle mail sender.
    let mail = match &config.mail {
        Some(cfg) => mail::Mailer::new(cfg, &config.url),
        None => mail::Mailer::default(),
    };

    Ok(AppState {
        config,
        db,
        crypto,
        mail,
    })
}
