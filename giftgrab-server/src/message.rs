use serde::{Deserialize, Serialize};

use giftgrab_core::{Action, Game, GameEvent, GiftId, PlayerId, Rejection};

/// Messages pushed to connected clients. Every accepted mutation produces a
/// fresh `state` followed by its `event`s; `error` goes only to the socket
/// whose action was rejected.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    State(StateView),
    Event(GameEvent),
    Error(ErrorView),
}

/// Full game snapshot plus the computed active player, so clients never have
/// to re-derive turn state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StateView {
    #[serde(flatten)]
    pub game: Game,
    pub active_player: Option<PlayerId>,
}

impl StateView {
    pub fn of(game: &Game) -> Self {
        Self {
            active_player: game.active_player().cloned(),
            game: game.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorView {
    pub reason: String,
    pub detail: String,
}

impl ErrorView {
    pub fn new(reason: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            detail: detail.into(),
        }
    }
}

impl From<&Rejection> for ErrorView {
    fn from(rejection: &Rejection) -> Self {
        Self::new(rejection.code(), rejection.to_string())
    }
}

/// Inbound action frame from a client socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionMessage {
    pub action: ActionKind,
    pub gift_id: GiftId,
    pub actor_player_id: PlayerId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ChooseGift,
    StealGift,
}

impl ActionMessage {
    pub fn split(self) -> (Action, PlayerId) {
        let action = match self.action {
            ActionKind::ChooseGift => Action::ChooseGift {
                gift_id: self.gift_id,
            },
            ActionKind::StealGift => Action::StealGift {
                gift_id: self.gift_id,
            },
        };
        (action, self.actor_player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_frames_use_the_flat_wire_shape() {
        let msg: ActionMessage = serde_json::from_str(
            r#"{"action":"steal_gift","gift_id":"g1","actor_player_id":"p1"}"#,
        )
        .unwrap();
        assert_eq!(msg.action, ActionKind::StealGift);

        let (action, actor) = msg.split();
        assert_eq!(
            action,
            Action::StealGift {
                gift_id: "g1".into()
            }
        );
        assert_eq!(actor, "p1");
    }

    #[test]
    fn server_messages_are_type_tagged() {
        let json = serde_json::to_value(ServerMessage::Event(GameEvent::TurnChanged {
            player_id: "p1".into(),
        }))
        .unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["data"]["type"], "turn_changed");
        assert_eq!(json["data"]["player_id"], "p1");

        let state = ServerMessage::State(StateView::of(&Game::new("g1", 0)));
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["data"]["phase"], "lobby");
        assert!(json["data"]["active_player"].is_null());
    }
}
