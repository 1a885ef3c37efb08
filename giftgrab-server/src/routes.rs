use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use giftgrab_core::{Action, Context, GamePhase, Gift, PlayerId};

use crate::error::ApiError;
use crate::message::StateView;
use crate::registry::SessionEntry;
use crate::AppState;

#[derive(Serialize)]
pub struct CreateGameResponse {
    pub game_id: String,
    pub host_token: String,
}

#[derive(Deserialize)]
pub struct CreateParams {
    pub seed: Option<u64>,
}

#[derive(Deserialize)]
pub struct JoinRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct JoinResponse {
    pub player_id: String,
}

#[derive(Deserialize)]
pub struct GiftRequest {
    pub player_id: String,
    pub product_url: String,
    pub hint: String,
    pub image_url: Option<String>,
    pub title: Option<String>,
}

#[derive(Serialize)]
pub struct GiftResponse {
    pub gift: Gift,
}

#[derive(Serialize)]
pub struct PhaseResponse {
    pub phase: GamePhase,
}

#[derive(Serialize)]
pub struct StartResponse {
    pub phase: GamePhase,
    pub turn_order: Vec<PlayerId>,
    pub active_player: Option<PlayerId>,
}

pub async fn create_game(
    State(state): State<AppState>,
    Query(params): Query<CreateParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let provided = headers
        .get("x-admin-password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided != state.config.admin_password {
        return Err(ApiError::BadAdminPassword);
    }

    let (game_id, entry) = state.registry.create(params.seed).await;
    state.registry.persist().await;

    Ok((
        StatusCode::CREATED,
        Json(CreateGameResponse {
            game_id,
            host_token: entry.host_token.clone(),
        }),
    ))
}

pub async fn join_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let entry = session(&state, &game_id).await?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name required".into()));
    }

    let player_id = Uuid::new_v4().to_string();
    entry
        .handle
        .apply(
            Action::Join {
                player_id: player_id.clone(),
                name,
                joined_at: now_millis(),
            },
            Context::anonymous(),
        )
        .await?;
    entry.touch().await;
    state.registry.persist().await;

    Ok(Json(JoinResponse { player_id }))
}

pub async fn open_submissions(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PhaseResponse>, ApiError> {
    let entry = session(&state, &game_id).await?;
    verify_host(&entry, &headers)?;

    entry
        .handle
        .apply(Action::OpenSubmissions, Context::host())
        .await?;
    entry.touch().await;
    state.registry.persist().await;

    Ok(Json(PhaseResponse {
        phase: entry.handle.snapshot().phase,
    }))
}

pub async fn submit_gift(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(payload): Json<GiftRequest>,
) -> Result<Json<GiftResponse>, ApiError> {
    let entry = session(&state, &game_id).await?;
    if payload.product_url.trim().is_empty() || payload.hint.trim().is_empty() {
        return Err(ApiError::BadRequest("product_url and hint required".into()));
    }

    entry
        .handle
        .apply(
            Action::SubmitGift {
                gift_id: Uuid::new_v4().to_string(),
                product_url: payload.product_url,
                hint: payload.hint,
                image_url: payload.image_url,
                title: payload.title,
            },
            Context::player(payload.player_id.clone()),
        )
        .await?;
    entry.touch().await;
    state.registry.persist().await;

    // The upsert may have kept an earlier gift id; read back the stored entry.
    let snapshot = entry.handle.snapshot();
    let gift = snapshot
        .gift_by_submitter(&payload.player_id)
        .cloned()
        .ok_or(ApiError::Internal)?;
    Ok(Json(GiftResponse { gift }))
}

pub async fn start_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StartResponse>, ApiError> {
    let entry = session(&state, &game_id).await?;
    verify_host(&entry, &headers)?;

    entry.handle.apply(Action::Start, Context::host()).await?;
    entry.touch().await;
    state.registry.persist().await;

    let snapshot = entry.handle.snapshot();
    Ok(Json(StartResponse {
        phase: snapshot.phase,
        turn_order: snapshot.rotation.order.clone(),
        active_player: snapshot.active_player().cloned(),
    }))
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<StateView>, ApiError> {
    let entry = session(&state, &game_id).await?;
    Ok(Json(StateView::of(&entry.handle.snapshot())))
}

pub async fn close_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let entry = session(&state, &game_id).await?;
    verify_host(&entry, &headers)?;

    state.registry.close(&game_id).await;
    state.registry.persist().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn session(state: &AppState, id: &str) -> Result<Arc<SessionEntry>, ApiError> {
    state.registry.get(id).await.ok_or(ApiError::SessionNotFound)
}

fn verify_host(entry: &SessionEntry, headers: &HeaderMap) -> Result<(), ApiError> {
    let token = headers
        .get("x-host-token")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::MissingHostToken)?;
    if token != entry.host_token {
        return Err(ApiError::BadHostToken);
    }
    Ok(())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
