use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

use giftgrab_core::{apply, Action, Context, Game, GameEvent, Rejection};

use crate::hub::Hub;
use crate::message::StateView;

/// Upper bound on queued actions; in practice at most one per connected
/// client is ever in flight.
const INBOX_CAPACITY: usize = 64;

pub enum SessionCommand {
    Apply {
        action: Action,
        ctx: Context,
        reply: oneshot::Sender<Result<Vec<GameEvent>, Rejection>>,
    },
    Shutdown,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session closed")]
    Closed,
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

/// Cheap handle to a running session actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    snapshot: watch::Receiver<Game>,
}

impl SessionHandle {
    pub async fn apply(
        &self,
        action: Action,
        ctx: Context,
    ) -> Result<Vec<GameEvent>, SessionError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(SessionCommand::Apply { action, ctx, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        match response.await {
            Ok(Ok(events)) => Ok(events),
            Ok(Err(rejection)) => Err(SessionError::Rejected(rejection)),
            Err(_) => Err(SessionError::Closed),
        }
    }

    /// Latest fully-applied state. Reads never queue behind pending writes
    /// and never observe a partial mutation.
    pub fn snapshot(&self) -> Game {
        self.snapshot.borrow().clone()
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(SessionCommand::Shutdown).await;
    }
}

/// Spawns the actor task owning `game`. The actor is the only writer of the
/// state; everything else sees it through snapshots and broadcasts.
pub fn spawn(game: Game, hub: Arc<Hub>) -> SessionHandle {
    let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(game.clone());
    let actor = SessionActor {
        game,
        inbox,
        hub,
        snapshot: snapshot_tx,
    };
    tokio::spawn(actor.run());
    SessionHandle {
        tx,
        snapshot: snapshot_rx,
    }
}

struct SessionActor {
    game: Game,
    inbox: mpsc::Receiver<SessionCommand>,
    hub: Arc<Hub>,
    snapshot: watch::Sender<Game>,
}

impl SessionActor {
    /// Commands are applied strictly in arrival order; no two actions ever
    /// evaluate against overlapping state.
    async fn run(mut self) {
        while let Some(cmd) = self.inbox.recv().await {
            match cmd {
                SessionCommand::Apply { action, ctx, reply } => {
                    match apply(&self.game, &action, &ctx) {
                        Ok(outcome) => {
                            self.game = outcome.game;
                            self.snapshot.send_replace(self.game.clone());
                            self.hub
                                .publish(StateView::of(&self.game), &outcome.events)
                                .await;
                            let _ = reply.send(Ok(outcome.events));
                        }
                        Err(rejection) => {
                            log::debug!("[session {}] rejected: {}", self.game.id, rejection);
                            let _ = reply.send(Err(rejection));
                        }
                    }
                }
                SessionCommand::Shutdown => break,
            }
        }
        self.hub.clear().await;
        log::debug!("[session {}] stopped", self.game.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ServerMessage;
    use giftgrab_core::{GamePhase, Gift, GiftState, Player, Rotation};

    fn player(id: &str) -> Player {
        Player {
            id: id.to_string(),
            name: id.to_string(),
            joined_at: 0,
        }
    }

    fn unopened_gift(id: &str, submitted_by: &str) -> Gift {
        Gift {
            id: id.to_string(),
            submitted_by: submitted_by.to_string(),
            product_url: format!("https://example.com/{id}"),
            hint: format!("gift-{id}"),
            image_url: None,
            title: None,
            opened_by: None,
            held_by: None,
            stolen_count: 0,
            stolen_from: None,
            state: GiftState::Unopened,
        }
    }

    fn live_game(ids: &[&str]) -> Game {
        let mut game = Game::new("s1", 7);
        game.phase = GamePhase::InProgress;
        game.players = ids.iter().map(|id| player(id)).collect();
        game.gifts = ids
            .iter()
            .enumerate()
            .map(|(i, id)| unopened_gift(&format!("g{}", i + 1), id))
            .collect();
        game.rotation = Rotation::start(ids.iter().map(|s| s.to_string()).collect());
        game
    }

    fn choose(gift: &str) -> Action {
        Action::ChooseGift {
            gift_id: gift.to_string(),
        }
    }

    #[tokio::test]
    async fn applies_actions_in_arrival_order() {
        let hub = Arc::new(Hub::new(8));
        let handle = spawn(live_game(&["p1", "p2"]), hub);

        handle
            .apply(choose("g1"), Context::player("p1"))
            .await
            .unwrap();
        // The race loser observes the already-applied open.
        let err = handle
            .apply(choose("g1"), Context::player("p2"))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::Rejected(Rejection::GiftAlreadyOpened));

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.gift("g1").unwrap().held_by.as_deref(), Some("p1"));
        assert_eq!(snapshot.active_player().map(String::as_str), Some("p2"));
    }

    #[tokio::test]
    async fn concurrent_claims_produce_exactly_one_winner() {
        let hub = Arc::new(Hub::new(8));
        let handle = spawn(live_game(&["p1", "p2"]), hub);

        let (a, b) = tokio::join!(
            handle.apply(choose("g1"), Context::player("p1")),
            handle.apply(choose("g1"), Context::player("p2")),
        );
        assert_eq!(u32::from(a.is_ok()) + u32::from(b.is_ok()), 1);
    }

    #[tokio::test]
    async fn accepted_actions_are_broadcast_with_a_snapshot() {
        let hub = Arc::new(Hub::new(8));
        let mut outlet = hub.connect("p2".to_string()).await;
        let handle = spawn(live_game(&["p1", "p2"]), hub);

        let events = handle
            .apply(choose("g2"), Context::player("p1"))
            .await
            .unwrap();
        assert_eq!(events.len(), 2);

        match outlet.rx.recv().await.unwrap() {
            ServerMessage::State(view) => {
                assert_eq!(view.active_player.as_deref(), Some("p2"));
                assert_eq!(view.game.gift("g2").unwrap().held_by.as_deref(), Some("p1"));
            }
            other => panic!("expected state, got {other:?}"),
        }
        assert_eq!(
            outlet.rx.recv().await.unwrap(),
            ServerMessage::Event(events[0].clone())
        );
        assert_eq!(
            outlet.rx.recv().await.unwrap(),
            ServerMessage::Event(events[1].clone())
        );
    }

    #[tokio::test]
    async fn rejections_are_not_broadcast() {
        let hub = Arc::new(Hub::new(8));
        let mut outlet = hub.connect("p1".to_string()).await;
        let handle = spawn(live_game(&["p1", "p2"]), hub);

        let before = handle.snapshot();
        let err = handle
            .apply(choose("g1"), Context::player("p2"))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::Rejected(Rejection::NotActivePlayer));
        assert_eq!(handle.snapshot(), before);
        assert!(outlet.rx.try_recv().is_err());
    }
}
