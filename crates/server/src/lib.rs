//! Mapdart Server Edge
//!
//! The authoritative side of the game. It owns:
//! - Session management and the join flow
//! - Guess validation and per-round buffering
//! - The round lifecycle: announce a target, later reveal it
//! - Scoring and the standings snapshot
//! - Inactivity and shutdown kicks
//!
//! The edge performs no I/O and never reads a clock: the hosting process
//! passes epoch milliseconds into the methods that need time, and every
//! method returns the wire messages to deliver instead of sending them.
//! That keeps the whole game logic synchronous, deterministic under a
//! seed, and testable without a socket.

#![deny(unsafe_code)]

pub mod catalog;
pub mod guess_buffer;
pub mod session;
pub mod validation;

use std::collections::HashMap;

use mapdart_round::{GeoPoint, PlayerId, Standing, distance_km, score_for_distance};
use mapdart_wire::{
    GuessSubmit, JoinAck, JoinRequest, Kick, SessionMetadata, SolutionReveal, TargetAnnounce,
};

use catalog::{Catalog, City};
use guess_buffer::{BufferResult, GuessBuffer};
use session::{Session, SessionId};
use validation::{GuessValidation, validate_guess_point, validate_join};

// ============================================================================
// Defaults
// ============================================================================

/// Cosmetic guess countdown length sent to clients, in seconds.
pub const GUESS_DURATION_SECS: u32 = 5;

/// Sessions silent longer than this are kicked, in milliseconds.
pub const IDLE_TIMEOUT_MS: i64 = 3 * 60 * 1000;

/// Kick reason for the inactivity sweep.
const KICK_IDLE: &str = "Automatically removed due to inactivity";

/// Kick reason broadcast on graceful shutdown.
const KICK_SHUTDOWN: &str = "Server going down";

// ============================================================================
// Configuration
// ============================================================================

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Seed for the catalog shuffle; a fixed seed reproduces a run.
    pub seed: u64,
    /// Countdown length handed to clients in the session metadata.
    pub guess_duration_secs: u32,
    /// Inactivity window before a session is kicked.
    pub idle_timeout_ms: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            guess_duration_secs: GUESS_DURATION_SECS,
            idle_timeout_ms: IDLE_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// Join Outcome
// ============================================================================

/// Result of a join request.
#[derive(Debug)]
pub enum JoinOutcome {
    /// Player admitted. The host delivers the ack and the metadata, then
    /// keeps the session id for routing.
    Admitted {
        session_id: SessionId,
        ack: JoinAck,
        metadata: SessionMetadata,
    },
    /// Join rejected. The host delivers the kick and closes the connection.
    Rejected { kick: Kick },
}

// ============================================================================
// Server
// ============================================================================

/// Authoritative game state for one room.
pub struct Server {
    config: ServerConfig,
    catalog: Catalog,
    sessions: HashMap<SessionId, Session>,
    /// PlayerId → SessionId mapping.
    player_sessions: HashMap<PlayerId, SessionId>,
    /// Session ids in join order; standings snapshots follow this order so
    /// the client-side tiebreak ("original snapshot order") is stable.
    join_order: Vec<SessionId>,
    next_session_id: SessionId,
    next_player_id: PlayerId,
    /// Guesses for the active round.
    guesses: GuessBuffer,
    /// The announced, not yet revealed target. `Some` is the server-side
    /// "accepting guesses" phase.
    active_target: Option<City>,
}

impl Server {
    /// Server over the embedded location catalog.
    pub fn new(config: ServerConfig) -> Self {
        let catalog = Catalog::embedded(config.seed);
        Self::with_catalog(config, catalog)
    }

    /// Server over a caller-provided catalog.
    pub fn with_catalog(config: ServerConfig, catalog: Catalog) -> Self {
        Self {
            config,
            catalog,
            sessions: HashMap::new(),
            player_sessions: HashMap::new(),
            join_order: Vec::new(),
            next_session_id: 1,
            next_player_id: 1,
            guesses: GuessBuffer::new(),
            active_target: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// True between a target announcement and its reveal.
    pub fn has_active_round(&self) -> bool {
        self.active_target.is_some()
    }

    // ========================================================================
    // Join Flow
    // ========================================================================

    /// Process a join request from a fresh connection.
    pub fn join(&mut self, request: &JoinRequest, now_ms: i64) -> JoinOutcome {
        let verdict = validate_join(
            &request.username,
            self.sessions.values().map(|s| s.username.as_str()),
        );
        if let Some(message) = verdict.kick_message() {
            return JoinOutcome::Rejected {
                kick: Kick {
                    message: message.to_string(),
                },
            };
        }

        let session_id = self.next_session_id;
        self.next_session_id += 1;
        let player_id = self.next_player_id;
        self.next_player_id += 1;

        let session = Session::new(session_id, player_id, request.username.clone(), now_ms);
        self.sessions.insert(session_id, session);
        self.player_sessions.insert(player_id, session_id);
        self.join_order.push(session_id);

        JoinOutcome::Admitted {
            session_id,
            ack: JoinAck { player_id },
            metadata: SessionMetadata {
                guess_duration_secs: self.config.guess_duration_secs,
            },
        }
    }

    /// Remove a departed connection and anything it buffered this round.
    pub fn disconnect_session(&mut self, session_id: SessionId) {
        if let Some(session) = self.sessions.remove(&session_id) {
            self.player_sessions.remove(&session.player_id);
            self.join_order.retain(|&id| id != session_id);
            self.guesses.remove(session.player_id);
        }
    }

    // ========================================================================
    // Guess Intake
    // ========================================================================

    /// Validate and buffer a guess from a session.
    ///
    /// Any message from a joined session counts as liveness, even when the
    /// guess itself is dropped.
    pub fn receive_guess(
        &mut self,
        session_id: SessionId,
        guess: &GuessSubmit,
        now_ms: i64,
    ) -> GuessValidation {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return GuessValidation::DroppedUnknownSession;
        };
        session.touch(now_ms);
        let player_id = session.player_id;

        let point = GeoPoint::new(guess.latitude, guess.longitude);
        if let Some(dropped) = validate_guess_point(point) {
            return dropped;
        }
        if self.active_target.is_none() {
            return GuessValidation::DroppedNoActiveRound;
        }

        match self.guesses.try_buffer(player_id, point) {
            BufferResult::Accepted => GuessValidation::Accepted,
            BufferResult::AlreadyGuessed => GuessValidation::DroppedAlreadyGuessed,
        }
    }

    // ========================================================================
    // Round Lifecycle
    // ========================================================================

    /// Open a new round: draw the next target, clear the previous round's
    /// guesses, and return the announcement to broadcast. Coordinates stay
    /// server-side until the reveal.
    pub fn begin_round(&mut self) -> TargetAnnounce {
        let city = self.catalog.next_city();
        self.guesses.clear();

        let announce = TargetAnnounce {
            name: city.name.clone(),
            country: city.country.clone(),
            location: None,
        };
        self.active_target = Some(city);
        announce
    }

    /// Close the active round: score every buffered guess, fold the points
    /// into the sessions, and return the reveal to broadcast. `None` when
    /// no round is open (the very first half-cycle, or a repeated call).
    pub fn reveal_round(&mut self) -> Option<SolutionReveal> {
        let city = self.active_target.take()?;
        let target = city.point();

        for guess in self.guesses.guesses_in_order() {
            let points = score_for_distance(distance_km(guess.point, target));
            if let Some(&session_id) = self.player_sessions.get(&guess.player_id)
                && let Some(session) = self.sessions.get_mut(&session_id)
            {
                session.score += points;
            }
        }

        Some(SolutionReveal {
            location: Some(target.into()),
            location_name: city.name,
            guesses: self
                .guesses
                .guesses_in_order()
                .into_iter()
                .map(Into::into)
                .collect(),
            standings: self
                .standings_snapshot()
                .into_iter()
                .map(Into::into)
                .collect(),
        })
    }

    /// The full standings in stable join order. Sent wholesale with every
    /// reveal; never patched incrementally.
    pub fn standings_snapshot(&self) -> Vec<Standing> {
        self.join_order
            .iter()
            .filter_map(|session_id| self.sessions.get(session_id))
            .map(|session| Standing {
                player_id: session.player_id,
                username: session.username.clone(),
                score: session.score,
            })
            .collect()
    }

    // ========================================================================
    // Kicks
    // ========================================================================

    /// Kick every session that has been silent past the configured window.
    /// Returns the kicks to deliver; the sessions are already gone.
    pub fn sweep_idle(&mut self, now_ms: i64) -> Vec<(SessionId, Kick)> {
        let expired: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| now_ms - s.last_packet_ms > self.config.idle_timeout_ms)
            .map(|s| s.id)
            .collect();

        expired
            .into_iter()
            .map(|session_id| {
                self.disconnect_session(session_id);
                (
                    session_id,
                    Kick {
                        message: KICK_IDLE.to_string(),
                    },
                )
            })
            .collect()
    }

    /// Farewell kicks for a graceful shutdown, one per connected session.
    pub fn shutdown_kicks(&self) -> Vec<(SessionId, Kick)> {
        self.join_order
            .iter()
            .map(|&session_id| {
                (
                    session_id,
                    Kick {
                        message: KICK_SHUTDOWN.to_string(),
                    },
                )
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
