use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::adapter::{default_registry, AdapterRegistry};
use crate::config::TesterConfig;
use crate::host::Session;

pub mod routes;

/// Server state
pub struct AppState {
    pub registry: Arc<AdapterRegistry>,
    /// The harness UI's session; never held across a script run
    pub session: Mutex<Session>,
}

impl AppState {
    pub fn new(config: &TesterConfig) -> crate::Result<Self> {
        let registry = Arc::new(default_registry(config)?);
        let mut session = Session::new(registry.clone(), config.selection.bounding_box()?)?;

        if let Some(name) = &config.default_adapter {
            if !session.select_adapter(name) {
                tracing::warn!(
                    "Configured default adapter '{}' is not registered, using '{}'",
                    name,
                    session.current_adapter().name
                );
            }
        }

        Ok(Self {
            registry,
            session: Mutex::new(session),
        })
    }
}

pub fn router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/api/adapters", get(routes::list_adapters))
        .route("/api/execute", post(routes::execute))
        .route("/api/circle", get(routes::circle))
        .route("/api/session", get(routes::get_session))
        .route("/api/session/code", put(routes::set_code))
        .route("/api/session/adapter", put(routes::set_adapter))
        .route("/api/session/variables", put(routes::set_variables))
        .route("/api/session/variables/new", post(routes::add_variable))
        .route("/api/session/selection", put(routes::set_selection))
        .route("/api/session/run", post(routes::run_session))
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn start_server(config: &TesterConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config)?);
    let app = router(state, config.server.static_dir.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Starting server on {}", addr);
    println!("🌍 Harness running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
