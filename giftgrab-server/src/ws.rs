use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::time::{interval, Instant};

use giftgrab_core::Context;

use crate::message::{ActionMessage, ErrorView, ServerMessage, StateView};
use crate::registry::SessionEntry;
use crate::session::SessionError;
use crate::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path((game_id, player_id)): Path<(String, String)>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, game_id, player_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, game_id: String, player_id: String) {
    let (mut sender, mut receiver) = socket.split();

    let Some(entry) = state.registry.get(&game_id).await else {
        let _ = send(&mut sender, &error("unknown_session", "game not found")).await;
        return;
    };
    let snapshot = entry.handle.snapshot();
    if snapshot.player(&player_id).is_none() {
        let _ = send(&mut sender, &error("unknown_player", "player not found")).await;
        return;
    }

    let mut outlet = entry.hub.connect(player_id.clone()).await;
    entry.touch().await;
    log::debug!("[ws {game_id}] {player_id} connected");

    // Full resync on connect: the snapshot alone is enough, no event replay.
    if send(&mut sender, &ServerMessage::State(StateView::of(&snapshot)))
        .await
        .is_err()
    {
        entry.hub.disconnect(&player_id, outlet.serial).await;
        return;
    }

    let heartbeat = state.config.heartbeat;
    let mut ping = interval(heartbeat);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            broadcast = outlet.rx.recv() => match broadcast {
                Some(msg) => {
                    if send(&mut sender, &msg).await.is_err() {
                        break;
                    }
                }
                // Queue gone: superseded by a reconnect, dropped for
                // backpressure, or the session shut down.
                None => break,
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    last_seen = Instant::now();
                    match act(&state, &entry, &player_id, &text).await {
                        Flow::Continue => {}
                        Flow::Reply(msg) => {
                            if send(&mut sender, &msg).await.is_err() {
                                break;
                            }
                        }
                        Flow::Stop => break,
                    }
                }
                Some(Ok(Message::Pong(_))) | Some(Ok(Message::Ping(_))) => {
                    last_seen = Instant::now();
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = ping.tick() => {
                if last_seen.elapsed() > heartbeat * 2 {
                    log::debug!("[ws {game_id}] {player_id} missed heartbeat window");
                    break;
                }
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    entry.hub.disconnect(&player_id, outlet.serial).await;
    entry.touch().await;
    log::debug!("[ws {game_id}] {player_id} disconnected");
}

enum Flow {
    Continue,
    Reply(ServerMessage),
    Stop,
}

/// Parses and applies one inbound action frame. Rejections become `error`
/// replies to this socket only; accepted actions are broadcast by the
/// session actor, so there is nothing to reply with here.
async fn act(state: &AppState, entry: &SessionEntry, player_id: &str, text: &str) -> Flow {
    let frame: ActionMessage = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => return Flow::Reply(error("bad_message", err.to_string())),
    };
    if frame.actor_player_id != player_id {
        return Flow::Reply(error("actor_mismatch", "action actor must match connection"));
    }

    let (action, actor) = frame.split();
    match entry.handle.apply(action, Context::player(actor)).await {
        Ok(_) => {
            entry.touch().await;
            state.registry.persist().await;
            Flow::Continue
        }
        Err(SessionError::Rejected(rejection)) => {
            Flow::Reply(ServerMessage::Error(ErrorView::from(&rejection)))
        }
        Err(SessionError::Closed) => Flow::Stop,
    }
}

fn error(reason: &str, detail: impl Into<String>) -> ServerMessage {
    ServerMessage::Error(ErrorView::new(reason, detail))
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).unwrap();
    sender.send(Message::Text(json)).await
}
