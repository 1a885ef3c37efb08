use serde::{Deserialize, Serialize};

use crate::state::{GiftId, PlayerId};

/// Closed set of game actions. Actor identity and privilege travel in
/// [`Context`], not in the action payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum Action {
    Join {
        player_id: PlayerId,
        name: String,
        joined_at: u64,
    },
    OpenSubmissions,
    SubmitGift {
        gift_id: GiftId,
        product_url: String,
        hint: String,
        image_url: Option<String>,
        title: Option<String>,
    },
    Start,
    ChooseGift {
        gift_id: GiftId,
    },
    StealGift {
        gift_id: GiftId,
    },
}

/// Who is acting. `privileged` is pre-verified by the transport layer (host
/// token, admin password); the reducer only checks that it was set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub actor: Option<PlayerId>,
    pub privileged: bool,
}

impl Context {
    pub fn player(id: impl Into<PlayerId>) -> Self {
        Self {
            actor: Some(id.into()),
            privileged: false,
        }
    }

    pub fn host() -> Self {
        Self {
            actor: None,
            privileged: true,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}
