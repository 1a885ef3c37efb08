use serde::{Deserialize, Serialize};

use crate::state::{GiftId, PlayerId};

/// Everything a client needs to render an accepted transition without
/// re-deriving it from the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GameEvent {
    PlayerJoined {
        player_id: PlayerId,
        name: String,
    },
    SubmissionsOpened,
    GiftSubmitted {
        player_id: PlayerId,
        gift_id: GiftId,
    },
    GameStarted {
        turn_order: Vec<PlayerId>,
    },
    GiftOpened {
        player_id: PlayerId,
        gift_id: GiftId,
    },
    GiftStolen {
        from: PlayerId,
        to: PlayerId,
        gift_id: GiftId,
    },
    TurnChanged {
        player_id: PlayerId,
    },
    GameFinished,
}
