//! The authoritative round cadence.
//!
//! Mirrors the edge's lifecycle onto wall-clock time: every half-cycle
//! alternates between revealing the round in flight and announcing the next
//! target. Clients only ever advance on these broadcasts; their countdowns
//! are cosmetic.

use std::sync::Arc;
use std::time::Duration;

use mapdart_wire::{ServerEnvelope, encode_frame};
use tokio::time;
use tracing::{debug, info};

use crate::net::{AppState, now_ms};

pub async fn drive(state: Arc<AppState>, half_cycle: Duration) {
    let mut interval = time::interval(half_cycle);

    loop {
        interval.tick().await;

        // First half: close the round in flight, if there is one.
        let reveal = state.server.write().await.reveal_round();
        if let Some(reveal) = reveal {
            debug!(guesses = reveal.guesses.len(), "revealing solution");
            state
                .broadcast(encode_frame(&ServerEnvelope::solution_reveal(reveal)))
                .await;
        }

        interval.tick().await;

        // Second half: announce the next target.
        let announce = state.server.write().await.begin_round();
        info!(name = %announce.name, country = %announce.country, "new target");
        state
            .broadcast(encode_frame(&ServerEnvelope::target_announce(announce)))
            .await;

        // Drop sessions that have gone quiet. The kick frame is queued
        // before the channel is removed, so it still reaches the client.
        let kicks = state.server.write().await.sweep_idle(now_ms());
        for (session_id, kick) in kicks {
            info!(session_id, "kicking idle session");
            state
                .send_to(session_id, encode_frame(&ServerEnvelope::kick(kick)))
                .await;
            state.unregister(session_id).await;
        }
    }
}
