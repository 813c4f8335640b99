use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Extension, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use tenant_gate::config;
use tenant_gate::database::router::ConnectionRouter;
use tenant_gate::middleware::{
    jwt_auth_middleware, tenant_context_middleware, AppState, TenantContext,
};
use tenant_gate::services::directory::TenantDirectory;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting tenant-gate in {:?} mode", config.environment);

    let router = Arc::new(ConnectionRouter::new(config.database.clone()));
    let directory = Arc::new(TenantDirectory::new(
        router.clone(),
        Duration::from_secs(config.directory.cache_ttl_secs),
    ));
    let state = AppState {
        router: router.clone(),
        directory,
    };

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("TENANT_GATE_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("tenant-gate listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server");

    // Every cached pool is disposed exactly once, at teardown
    router.dispose_all().await;
}

fn app(state: AppState) -> Router {
    // The resolution pipeline guards everything under /api; health and the
    // service banner stay public so probes work before auth is configured
    let protected = Router::new()
        .route("/api/whoami", get(whoami))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            tenant_context_middleware,
        ))
        .layer(axum::middleware::from_fn(jwt_auth_middleware));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "tenant-gate",
            "version": version,
            "description": "Tenant resolution and schema routing core",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "whoami": "/api/whoami (protected - resolved tenant context)",
            }
        }
    }))
}

/// Liveness: can the service reach the shared/default schema
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.router.health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

/// Echo the resolved request context: who is calling, and which tenant (if
/// any) this request was routed to
async fn whoami(Extension(context): Extension<TenantContext>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "subject": context.principal.subject,
            "role": context.principal.role,
            "tenant": context.tenant.as_ref().map(|t| json!({
                "slug": t.slug,
                "schema_name": t.schema_name,
                "status": t.status,
            })),
        }
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
}
