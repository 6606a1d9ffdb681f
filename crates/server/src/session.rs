//! Session management for the server edge.

use mapdart_round::PlayerId;

/// Session identifier (server-internal, per connection).
pub type SessionId = u64;

/// One joined player's session state.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub player_id: PlayerId,
    pub username: String,
    /// Accumulated score across rounds; carried into every standings
    /// snapshot.
    pub score: u64,
    /// Epoch milliseconds of the last packet seen from this session, for
    /// the inactivity sweep.
    pub last_packet_ms: i64,
}

impl Session {
    pub fn new(id: SessionId, player_id: PlayerId, username: String, now_ms: i64) -> Self {
        Self {
            id,
            player_id,
            username,
            score: 0,
            last_packet_ms: now_ms,
        }
    }

    /// Record liveness for the inactivity sweep.
    pub fn touch(&mut self, now_ms: i64) {
        self.last_packet_ms = now_ms;
    }
}
