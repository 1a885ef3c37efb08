use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::event::GameEvent;
use crate::turn::Rotation;

pub type PlayerId = String;
pub type GiftId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub joined_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GiftState {
    Unopened,
    Opened,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gift {
    pub id: GiftId,
    pub submitted_by: PlayerId,
    pub product_url: String,
    pub hint: String,
    pub image_url: Option<String>,
    pub title: Option<String>,
    pub opened_by: Option<PlayerId>,
    pub held_by: Option<PlayerId>,
    pub stolen_count: u8,
    /// Player who most recently lost this gift; blocks them from stealing
    /// it back until their next accepted action resolves.
    pub stolen_from: Option<PlayerId>,
    pub state: GiftState,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Lobby,
    Submissions,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    pub id: String,
    pub seed: u64,
    pub phase: GamePhase,
    pub players: Vec<Player>,
    pub gifts: Vec<Gift>,
    pub rotation: Rotation,
    pub history: Vec<GameEvent>,
}

impl Game {
    pub fn new(id: impl Into<String>, seed: u64) -> Self {
        Self {
            id: id.into(),
            seed,
            phase: GamePhase::Lobby,
            players: Vec::new(),
            gifts: Vec::new(),
            rotation: Rotation::default(),
            history: Vec::new(),
        }
    }

    /// The single player authorized to act right now, if the game is live.
    pub fn active_player(&self) -> Option<&PlayerId> {
        match self.phase {
            GamePhase::InProgress => self.rotation.active(),
            _ => None,
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn gift(&self, id: &str) -> Option<&Gift> {
        self.gifts.iter().find(|g| g.id == id)
    }

    pub fn gift_by_submitter(&self, player_id: &str) -> Option<&Gift> {
        self.gifts.iter().find(|g| g.submitted_by == player_id)
    }

    /// End condition: every gift opened and every player holding exactly one.
    pub fn is_complete(&self) -> bool {
        if self.players.is_empty() || self.gifts.is_empty() {
            return false;
        }
        if !self
            .gifts
            .iter()
            .all(|g| matches!(g.state, GiftState::Opened))
        {
            return false;
        }
        let mut holder_counts: HashMap<&PlayerId, u8> = HashMap::new();
        for gift in &self.gifts {
            if let Some(holder) = &gift.held_by {
                *holder_counts.entry(holder).or_insert(0) += 1;
            }
        }
        let required: HashSet<&PlayerId> = self.players.iter().map(|p| &p.id).collect();
        required.iter().all(|pid| holder_counts.get(pid) == Some(&1))
    }
}
