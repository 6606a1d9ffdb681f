//! Per-round guess buffering for the server edge.
//!
//! One buffer lives for exactly one round: it is cleared when a target is
//! announced and drained conceptually at the reveal. A player's first
//! accepted guess is final — a repeat submission never overwrites it.

use std::collections::HashMap;

use mapdart_round::{GeoPoint, Guess, PlayerId};

/// Result of attempting to buffer a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferResult {
    /// First guess from this player this round; stored.
    Accepted,
    /// Player already has a guess this round; the stored one stands.
    AlreadyGuessed,
}

/// Guesses for the active round, keyed by player.
#[derive(Debug, Default)]
pub struct GuessBuffer {
    guesses: HashMap<PlayerId, GeoPoint>,
    /// Submission order, for a deterministic reveal payload.
    order: Vec<PlayerId>,
}

impl GuessBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the player's guess unless one is already present.
    pub fn try_buffer(&mut self, player_id: PlayerId, point: GeoPoint) -> BufferResult {
        if self.guesses.contains_key(&player_id) {
            return BufferResult::AlreadyGuessed;
        }
        self.guesses.insert(player_id, point);
        self.order.push(player_id);
        BufferResult::Accepted
    }

    pub fn get(&self, player_id: PlayerId) -> Option<GeoPoint> {
        self.guesses.get(&player_id).copied()
    }

    /// All buffered guesses in submission order.
    pub fn guesses_in_order(&self) -> Vec<Guess> {
        self.order
            .iter()
            .filter_map(|&player_id| {
                self.guesses.get(&player_id).map(|&point| Guess {
                    player_id,
                    point,
                })
            })
            .collect()
    }

    /// Drop a departing player's guess so the reveal cannot reference a
    /// session that no longer exists.
    pub fn remove(&mut self, player_id: PlayerId) {
        if self.guesses.remove(&player_id).is_some() {
            self.order.retain(|&id| id != player_id);
        }
    }

    /// Start a new round.
    pub fn clear(&mut self) {
        self.guesses.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.guesses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guesses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_guess_accepted() {
        let mut buffer = GuessBuffer::new();
        let result = buffer.try_buffer(1, GeoPoint::new(10.0, 20.0));
        assert_eq!(result, BufferResult::Accepted);
        assert_eq!(buffer.get(1), Some(GeoPoint::new(10.0, 20.0)));
    }

    #[test]
    fn test_repeat_guess_does_not_overwrite() {
        let mut buffer = GuessBuffer::new();
        buffer.try_buffer(1, GeoPoint::new(10.0, 20.0));

        let result = buffer.try_buffer(1, GeoPoint::new(-5.0, 60.0));
        assert_eq!(result, BufferResult::AlreadyGuessed);
        // The first guess stands.
        assert_eq!(buffer.get(1), Some(GeoPoint::new(10.0, 20.0)));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_guesses_come_back_in_submission_order() {
        let mut buffer = GuessBuffer::new();
        buffer.try_buffer(5, GeoPoint::new(1.0, 1.0));
        buffer.try_buffer(2, GeoPoint::new(2.0, 2.0));
        buffer.try_buffer(9, GeoPoint::new(3.0, 3.0));

        let ids: Vec<_> = buffer
            .guesses_in_order()
            .iter()
            .map(|g| g.player_id)
            .collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[test]
    fn test_clear_starts_a_fresh_round() {
        let mut buffer = GuessBuffer::new();
        buffer.try_buffer(1, GeoPoint::new(10.0, 20.0));
        buffer.clear();

        assert!(buffer.is_empty());
        // The player may guess again in the new round.
        assert_eq!(
            buffer.try_buffer(1, GeoPoint::new(0.0, 0.0)),
            BufferResult::Accepted
        );
    }

    #[test]
    fn test_remove_departing_player() {
        let mut buffer = GuessBuffer::new();
        buffer.try_buffer(1, GeoPoint::new(10.0, 20.0));
        buffer.try_buffer(2, GeoPoint::new(30.0, 40.0));

        buffer.remove(1);
        assert_eq!(buffer.get(1), None);
        let ids: Vec<_> = buffer
            .guesses_in_order()
            .iter()
            .map(|g| g.player_id)
            .collect();
        assert_eq!(ids, vec![2]);
    }
}
