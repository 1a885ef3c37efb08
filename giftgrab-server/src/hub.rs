use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, Mutex};

use giftgrab_core::{GameEvent, PlayerId};

use crate::message::{ServerMessage, StateView};

/// Fan-out point for one session's live connections.
///
/// One connection per player: a reconnect supersedes the previous socket,
/// whose queue closes and ends its task. Outbound queues are bounded; a
/// client that cannot drain its queue loses the connection rather than ever
/// blocking the broadcast path for the rest of the session.
pub struct Hub {
    capacity: usize,
    serial: AtomicU64,
    connections: Mutex<HashMap<PlayerId, Connection>>,
}

struct Connection {
    serial: u64,
    tx: mpsc::Sender<ServerMessage>,
}

/// Receiving end handed to the socket task. The hub keeps the only sender:
/// once the connection is removed, `rx` drains and returns `None`.
pub struct Outlet {
    pub serial: u64,
    pub rx: mpsc::Receiver<ServerMessage>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            serial: AtomicU64::new(0),
            connections: Mutex::new(HashMap::new()),
        }
    }

    pub async fn connect(&self, player: PlayerId) -> Outlet {
        let serial = self.serial.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut connections = self.connections.lock().await;
        if connections
            .insert(player.clone(), Connection { serial, tx })
            .is_some()
        {
            log::debug!("[hub] superseding connection for {player}");
        }
        Outlet { serial, rx }
    }

    /// Removes the connection only if it still belongs to this outlet; a
    /// stale socket task cannot evict its successor.
    pub async fn disconnect(&self, player: &PlayerId, serial: u64) {
        let mut connections = self.connections.lock().await;
        if connections.get(player).map(|c| c.serial) == Some(serial) {
            connections.remove(player);
        }
    }

    /// Pushes the fresh snapshot, then the events behind it, to every live
    /// connection. Never waits: a full or closed queue costs that client its
    /// connection, not the session its throughput.
    pub async fn publish(&self, state: StateView, events: &[GameEvent]) {
        let mut connections = self.connections.lock().await;
        let mut dropped = Vec::new();
        for (player, connection) in connections.iter() {
            let mut delivered = connection
                .tx
                .try_send(ServerMessage::State(state.clone()))
                .is_ok();
            for event in events {
                if !delivered {
                    break;
                }
                delivered = connection
                    .tx
                    .try_send(ServerMessage::Event(event.clone()))
                    .is_ok();
            }
            if !delivered {
                dropped.push(player.clone());
            }
        }
        for player in dropped {
            log::warn!("[hub] dropping slow or dead connection for {player}");
            connections.remove(&player);
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.connections.lock().await.clear();
    }
}
