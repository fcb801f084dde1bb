pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod recorder;
pub mod render;
pub mod store;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    http::{header, HeaderName, HeaderValue},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::Config;
use query::CaptureQueries;
use recorder::CaptureRecorder;
use store::CaptureStore;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub store: CaptureStore,
    pub recorder: CaptureRecorder,
    pub queries: CaptureQueries,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let store = CaptureStore::new(db.clone());
        let recorder = CaptureRecorder::new(store.clone(), config.ignore_from_self);
        let queries = CaptureQueries::new(store.clone());

        Self {
            db,
            config,
            store,
            recorder,
            queries,
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reqsink API",
        version = "0.1.0",
        description = "REST API for inspecting and managing captured requests",
        contact(
            name = "Reqsink Team",
            email = "team@reqsink.dev"
        )
    ),
    paths(
        api::health,
        api::list_captures,
        api::get_capture,
        api::delete_capture,
        api::list_users,
        api::create_user,
        api::delete_user,
    ),
    components(
        schemas(
            models::CaptureDto,
            models::CaptureList,
            models::CaptureListQuery,
            models::UserDto,
            models::UserList,
            models::CreateUserRequest,
            models::HealthResponse,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "captures", description = "Captured request inspection endpoints"),
        (name = "users", description = "User account management endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// Build the full router: capture catch-all, HTML pages, admin API,
/// and Swagger UI, with tracing and security headers layered on top.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_doc = ApiDoc::openapi();

    // Login, logout and health stay reachable without a session
    let public_router = Router::new()
        .route("/b/login", get(handlers::login_form).post(handlers::login))
        .route("/b/logout", post(handlers::logout))
        .route(
            "/b/password",
            get(handlers::password_form).post(handlers::change_password),
        )
        .route("/b/api/health", get(api::health))
        .with_state(state.clone());

    // Permalink pages redirect to the login form when auth is on
    let pages_router = Router::new()
        .route("/b/requests/{public_id}", get(handlers::view_capture))
        .with_state(state.clone())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth_page,
        ));

    // Admin API answers 401 JSON when auth is on
    let api_router = Router::new()
        .route("/b/api/requests", get(api::list_captures))
        .route(
            "/b/api/requests/{public_id}",
            get(api::get_capture).delete(api::delete_capture),
        )
        .route("/b/api/users", get(api::list_users).post(api::create_user))
        .route("/b/api/users/{id}", axum::routing::delete(api::delete_user))
        .with_state(state.clone())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth_api,
        ));

    // Everything that is not a /b route gets captured. The catch-all is
    // deliberately not auth-gated: webhooks must land whether or not the
    // dashboard is locked down. The session cookie is still consulted for
    // self-origin suppression.
    let capture_router = Router::new()
        .fallback(handlers::catch_all)
        .with_state(state.clone());

    Router::new()
        .merge(SwaggerUi::new("/b/docs").url("/b/api/openapi.json", api_doc))
        .merge(public_router)
        .merge(pages_router)
        .merge(api_router)
        .merge(capture_router)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin"),
        ))
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: Arc<AppState>, bind_addr: SocketAddr) -> Result<(), anyhow::Error> {
    let router = build_router(state);

    info!("Listening on {}", bind_addr);
    info!("Swagger UI: http://{}/b/docs", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    info!("Shutdown signal received");
}
