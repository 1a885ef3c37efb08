//! HTTP/WebSocket boundary around the giftgrab rule engine.
//!
//! Each game lives behind its own session actor ([`SessionHandle`]); the
//! [`Registry`] owns actor lifecycles, the [`Hub`] fans accepted mutations
//! out to that session's sockets, and the axum router glues the lobby
//! endpoints and the `/ws` stream onto those pieces.

mod config;
mod error;
mod hub;
mod message;
mod registry;
mod routes;
mod session;
mod ws;

pub use config::Config;
pub use error::ApiError;
pub use hub::{Hub, Outlet};
pub use message::{ActionKind, ActionMessage, ErrorView, ServerMessage, StateView};
pub use registry::{Registry, SessionEntry};
pub use session::{SessionError, SessionHandle};

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn from_config(config: Config) -> Self {
        let registry = match &config.persist_path {
            Some(path) => Registry::with_persistence(config.queue_capacity, path.clone()).await,
            None => Registry::new(config.queue_capacity),
        };
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/game", post(routes::create_game))
        .route("/game/:id", get(routes::get_game).delete(routes::close_game))
        .route("/game/:id/join", post(routes::join_game))
        .route("/game/:id/submissions", post(routes::open_submissions))
        .route("/game/:id/gift", post(routes::submit_gift))
        .route("/game/:id/start", post(routes::start_game))
        .route("/ws/:id/:player_id", get(ws::ws_handler))
        .with_state(state)
}
