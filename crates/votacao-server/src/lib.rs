//! votacao-server: HTTP API over the voting engine.
//!
//! Routes keep the paths and JSON keys the browser pages already use.

pub mod error;
pub mod handlers;
pub mod state;

use anyhow::{Context, Result};
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use votacao_core::VotingEngine;
use votacao_store::{create_storage, VotacaoConfig};

use handlers::{admin, health, participant};

pub use error::ApiError;
pub use state::AppState;

/// Build the router with every route.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let admin_routes = Router::new()
        .route("/apresentadores", get(admin::list_presenters))
        .route("/conteudo", get(admin::presenter_content))
        .route("/perguntas", post(admin::replace_content))
        .route("/topicos", post(admin::add_topic))
        .route(
            "/topicos/:id",
            put(admin::edit_topic).delete(admin::delete_topic),
        )
        .route("/relatorio", get(admin::class_report))
        .route("/export-json", get(admin::export_json))
        .route("/export-excel-completo", get(admin::export_xlsx))
        .route("/reset-votos", post(admin::reset_votes))
        .route("/reseed", post(admin::reseed));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/login", post(participant::login))
        .route(
            "/api/turmas-com-apresentadores",
            get(participant::classes_with_presenters),
        )
        .route(
            "/api/apresentador/:code/perguntas",
            get(participant::presenter_questions),
        )
        .route("/api/votos", post(participant::cast_vote))
        .route(
            "/api/turma/:turma_id/topicos-estrelas",
            get(participant::star_board),
        )
        .route("/api/estrelas", post(participant::grant_star))
        .nest("/api/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Open storage and the engine from `config`, then serve until Ctrl+C or
/// SIGTERM.
pub async fn serve(config: VotacaoConfig) -> Result<()> {
    let storage = create_storage(&config.storage);
    let seed = config.load_seed()?;
    info!("opening {} storage", storage.name());
    let engine = VotingEngine::open(
        storage,
        seed,
        config.identity_resolver(),
        config.to_rules(),
    )
    .await?;
    info!(
        "using '{}' identity matching",
        engine.identity().matcher_name()
    );

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("server running on http://{addr}");

    axum::serve(listener, router(AppState::new(engine)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
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
