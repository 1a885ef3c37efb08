use serde::{Deserialize, Serialize};

use crate::state::PlayerId;

/// Turn order, cursor, and the forced-turn stack.
///
/// The active player is a pure function of this value: the top of `forced`
/// when a steal chain is running, otherwise `order[cursor]`. The cursor only
/// moves when a chain-free choose resolves; steals never advance it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rotation {
    pub order: Vec<PlayerId>,
    pub cursor: usize,
    pub forced: Vec<PlayerId>,
}

impl Rotation {
    pub fn start(order: Vec<PlayerId>) -> Self {
        Self {
            order,
            cursor: 0,
            forced: Vec::new(),
        }
    }

    pub fn active(&self) -> Option<&PlayerId> {
        self.forced.last().or_else(|| self.order.get(self.cursor))
    }

    /// Consumes the actor's owed forced turn, if any. The actor can only act
    /// while active, so a non-empty stack always has them on top.
    pub fn serve(&mut self, actor: &PlayerId) {
        if self.forced.last() == Some(actor) {
            self.forced.pop();
        }
    }

    /// Owes `victim` the next out-of-rotation turn.
    pub fn demand(&mut self, victim: PlayerId) {
        self.forced.push(victim);
    }

    /// Moves the cursor to the next seat, wrapping.
    pub fn advance(&mut self) {
        if !self.order.is_empty() {
            self.cursor = (self.cursor + 1) % self.order.len();
        }
    }

    pub fn in_forced_chain(&self) -> bool {
        !self.forced.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotation(order: &[&str]) -> Rotation {
        Rotation::start(order.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn active_prefers_forced_stack_over_cursor() {
        let mut rot = rotation(&["a", "b", "c"]);
        assert_eq!(rot.active().map(String::as_str), Some("a"));

        rot.demand("c".into());
        assert_eq!(rot.active().map(String::as_str), Some("c"));

        rot.serve(&"c".to_string());
        assert_eq!(rot.active().map(String::as_str), Some("a"));
    }

    #[test]
    fn serve_only_pops_the_owing_actor() {
        let mut rot = rotation(&["a", "b"]);
        rot.demand("b".into());
        rot.serve(&"a".to_string());
        assert!(rot.in_forced_chain());
        rot.serve(&"b".to_string());
        assert!(!rot.in_forced_chain());
    }

    #[test]
    fn advance_wraps_around_the_order() {
        let mut rot = rotation(&["a", "b", "c"]);
        rot.advance();
        rot.advance();
        assert_eq!(rot.active().map(String::as_str), Some("c"));
        rot.advance();
        assert_eq!(rot.active().map(String::as_str), Some("a"));
    }

    #[test]
    fn empty_rotation_has_no_active_player() {
        let mut rot = Rotation::default();
        assert_eq!(rot.active(), None);
        rot.advance();
        assert_eq!(rot.active(), None);
    }
}
