use thiserror::Error;

/// Reasons the reducer refuses an action. Rejections are ordinary values:
/// they never carry partial state and never reach other clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("action not valid in current phase")]
    InvalidPhase,
    #[error("not the active player")]
    NotActivePlayer,
    #[error("gift not found")]
    UnknownGift,
    #[error("player not found")]
    UnknownPlayer,
    #[error("gift already opened")]
    GiftAlreadyOpened,
    #[error("gift not opened yet")]
    GiftNotOpened,
    #[error("gift at steal limit")]
    StealCapReached,
    #[error("immediate steal back not allowed")]
    ImmediateStealBackForbidden,
    #[error("name already taken")]
    DuplicateName,
    #[error("name required")]
    InvalidName,
    #[error("no players joined")]
    NoPlayers,
    #[error("host capability required")]
    NotHost,
    #[error("all players must submit gifts")]
    MissingGifts,
}

impl Rejection {
    /// Stable wire code for the rejection taxonomy.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::InvalidPhase => "invalid_phase",
            Rejection::NotActivePlayer => "not_active_player",
            Rejection::UnknownGift => "unknown_gift",
            Rejection::UnknownPlayer => "unknown_player",
            Rejection::GiftAlreadyOpened => "gift_already_opened",
            Rejection::GiftNotOpened => "gift_not_opened",
            Rejection::StealCapReached => "steal_cap_reached",
            Rejection::ImmediateStealBackForbidden => "immediate_steal_back_forbidden",
            Rejection::DuplicateName => "duplicate_name",
            Rejection::InvalidName => "invalid_name",
            Rejection::NoPlayers => "no_players",
            Rejection::NotHost => "not_host",
            Rejection::MissingGifts => "missing_gifts",
        }
    }
}
