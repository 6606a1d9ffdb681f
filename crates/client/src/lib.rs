//! Mapdart Client Round Tracker
//!
//! This crate contains the client-side state machine that mirrors one round
//! of the guessing game. It is driven entirely by inbound server events plus
//! one local input (a map click), and it gates the single outbound guess a
//! player may submit per round.
//!
//! The tracker performs no I/O and owns no rendering surface. Presentation
//! is a capability: hosts inject a [`Presenter`] and the tracker tells it
//! *what* to show, never *how*. Outbound traffic is modeled the same way —
//! event handlers return the wire message to send, and the host's transport
//! delivers it. This keeps the machine testable without a map, a DOM, or a
//! socket.
//!
//! Event processing is strictly sequential: the host calls one handler at a
//! time and each runs to completion. No handler blocks, suspends, or panics
//! on inbound data — an event that is invalid in the current state is a
//! silent no-op.

#![deny(unsafe_code)]

pub mod presenter;

pub use presenter::Presenter;

use mapdart_round::{GeoPoint, PlayerId, Standing, rounded_km, top_standings, LEADERBOARD_LIMIT};
use mapdart_wire::{
    GuessSubmit, JoinAck, JoinRequest, Kick, ServerPayload, SessionMetadata, SolutionReveal,
    TargetAnnounce,
};

// ============================================================================
// Phase
// ============================================================================

/// Round phase as seen by this client.
///
/// `Idle` before any round was announced (and again after a kick);
/// `AcceptingGuesses` between a target announcement and its reveal;
/// `Revealed` between a reveal and the next announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AcceptingGuesses,
    Revealed,
}

// ============================================================================
// Configuration
// ============================================================================

/// Per-deployment options for the tracker.
///
/// Deployments differ only in their [`Presenter`] implementation and in
/// these values; everything else is one shared machine.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Locally stored username, sent with the join request.
    pub username: String,
    /// Game room to join.
    pub game_id: String,
    /// Countdown length used until the server's session metadata arrives.
    pub default_guess_duration_secs: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: "player".to_string(),
            game_id: "PRIMARY".to_string(),
            default_guess_duration_secs: 5,
        }
    }
}

// ============================================================================
// Round Tracker
// ============================================================================

/// The announced target of the active round, as shown in the banner.
/// Coordinates are unknown to the client until the reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTarget {
    pub name: String,
    pub country: String,
}

/// Client-side round state machine.
///
/// Holds the session state the server cannot see (whether this player has
/// already guessed in the active round, the locally placed guess) and the
/// state the server assigned (the player id). Mutated only from the host's
/// single event-processing path.
pub struct RoundTracker {
    config: ClientConfig,
    phase: Phase,
    /// Set by a kick; once set, every handler is a no-op forever.
    terminated: bool,
    /// Assigned by the server in the join ack.
    player_id: Option<PlayerId>,
    /// Countdown length for upcoming rounds, cosmetic only.
    guess_duration_secs: u32,
    has_guessed_this_round: bool,
    /// The active round's target, created on announce and discarded when
    /// the round closes.
    active_target: Option<ActiveTarget>,
    /// The local guess for the active round, kept until the reveal so the
    /// distance indicator can be drawn between it and the solution, then
    /// discarded with the round.
    local_guess: Option<GeoPoint>,
}

impl RoundTracker {
    pub fn new(config: ClientConfig) -> Self {
        let guess_duration_secs = config.default_guess_duration_secs;
        Self {
            config,
            phase: Phase::Idle,
            terminated: false,
            player_id: None,
            guess_duration_secs,
            has_guessed_this_round: false,
            active_target: None,
            local_guess: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True after a kick; the session is over and only a reconnect (with a
    /// fresh tracker) can resume play.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn has_guessed_this_round(&self) -> bool {
        self.has_guessed_this_round
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    /// The announced target while a round is open.
    pub fn active_target(&self) -> Option<&ActiveTarget> {
        self.active_target.as_ref()
    }

    /// The join request sent once per connection establishment.
    pub fn join_request(&self) -> JoinRequest {
        JoinRequest {
            username: self.config.username.clone(),
            game_id: self.config.game_id.clone(),
        }
    }

    // ========================================================================
    // Inbound Events
    // ========================================================================

    /// Dispatch a decoded server payload to the matching handler.
    ///
    /// Returns the outbound message to send, if any (none of the current
    /// server events produce one; the variant exists so hosts have a single
    /// entry point alongside [`RoundTracker::on_guess_input`]).
    pub fn on_server_event(
        &mut self,
        payload: ServerPayload,
        presenter: &mut dyn Presenter,
    ) -> Option<GuessSubmit> {
        match payload {
            ServerPayload::JoinAck(ack) => self.on_join_ack(&ack),
            ServerPayload::SessionMetadata(metadata) => self.on_session_metadata(&metadata),
            ServerPayload::TargetAnnounce(announce) => {
                self.on_target_announced(&announce, presenter);
            }
            ServerPayload::SolutionReveal(reveal) => {
                self.on_solution_revealed(&reveal, presenter);
            }
            ServerPayload::Kick(kick) => self.on_kicked(&kick, presenter),
        }
        None
    }

    /// Record the server-assigned player id.
    pub fn on_join_ack(&mut self, ack: &JoinAck) {
        if self.terminated {
            return;
        }
        self.player_id = Some(ack.player_id);
    }

    /// Record the countdown length for upcoming rounds. A zero duration is
    /// the Protobuf default for an absent field and is ignored.
    pub fn on_session_metadata(&mut self, metadata: &SessionMetadata) {
        if self.terminated {
            return;
        }
        if metadata.guess_duration_secs > 0 {
            self.guess_duration_secs = metadata.guess_duration_secs;
        }
    }

    /// A new round's target was announced.
    ///
    /// Valid from any state. The previous round's countdown is halted (not
    /// merely overwritten — a superseded timer must never fire into the new
    /// round), its visuals are cleared, and guessing reopens. Two
    /// consecutive announcements with no reveal in between behave exactly
    /// like one: the second resets the guess gate and the visuals again.
    pub fn on_target_announced(
        &mut self,
        announce: &TargetAnnounce,
        presenter: &mut dyn Presenter,
    ) {
        if self.terminated {
            return;
        }

        presenter.halt_countdown();
        presenter.clear_round_visuals();
        presenter.show_target(&announce.name, &announce.country);
        presenter.begin_countdown(self.guess_duration_secs);

        self.has_guessed_this_round = false;
        self.active_target = Some(ActiveTarget {
            name: announce.name.clone(),
            country: announce.country.clone(),
        });
        self.local_guess = None;
        self.phase = Phase::AcceptingGuesses;
    }

    /// Local map click.
    ///
    /// Accepted only while guesses are open and this player has not guessed
    /// yet; returns the single outbound guess of the round. Every other
    /// call — wrong phase, repeat click, after a kick — is a silent no-op
    /// that touches neither state nor presentation.
    pub fn on_guess_input(
        &mut self,
        point: GeoPoint,
        presenter: &mut dyn Presenter,
    ) -> Option<GuessSubmit> {
        if self.terminated
            || self.phase != Phase::AcceptingGuesses
            || self.has_guessed_this_round
        {
            return None;
        }

        presenter.place_own_guess_marker(point);
        self.has_guessed_this_round = true;
        self.local_guess = Some(point);

        Some(GuessSubmit {
            latitude: point.latitude,
            longitude: point.longitude,
        })
    }

    /// The active round's solution was broadcast.
    ///
    /// Valid only while guesses are open. A reveal received in `Idle` (a
    /// broadcast that predates this client's first round) or in `Revealed`
    /// (a duplicate) is ignored wholesale — no state change, no side
    /// effects. A reveal without a location is malformed and ignored the
    /// same way.
    pub fn on_solution_revealed(
        &mut self,
        reveal: &SolutionReveal,
        presenter: &mut dyn Presenter,
    ) {
        if self.terminated || self.phase != Phase::AcceptingGuesses {
            return;
        }
        let Some(target) = reveal.location_point() else {
            return;
        };

        presenter.halt_countdown();
        presenter.place_solution_marker(target);

        if let Some(own) = self.local_guess {
            presenter.draw_distance_line(own, target);
            presenter.show_distance_km(rounded_km(own, target));
        }

        for guess in &reveal.guesses {
            // Own guess is excluded by id equality on the server-assigned
            // player id, never by position in the list.
            if Some(guess.player_id) == self.player_id {
                continue;
            }
            presenter.place_opponent_marker(
                guess.player_id,
                GeoPoint::new(guess.latitude, guess.longitude),
            );
        }

        let rows: Vec<Standing> = reveal
            .standings
            .iter()
            .cloned()
            .map(Standing::from)
            .collect();
        presenter.render_leaderboard(&leaderboard_lines(&rows));

        // The round is closed; its target and guess are discarded.
        self.active_target = None;
        self.local_guess = None;
        self.phase = Phase::Revealed;
    }

    /// Forced termination. Terminal: the presenter is told to navigate
    /// away, and the tracker stops processing events for good.
    pub fn on_kicked(&mut self, kick: &Kick, presenter: &mut dyn Presenter) {
        if self.terminated {
            return;
        }

        presenter.halt_countdown();
        presenter.navigate_away(&kick.message);

        self.phase = Phase::Idle;
        self.terminated = true;
        self.has_guessed_this_round = false;
        self.active_target = None;
        self.local_guess = None;
    }
}

// ============================================================================
// Leaderboard Formatting
// ============================================================================

/// Render a standings snapshot into the presentation lines:
/// 1-indexed rank, username, score, top rows only.
pub fn leaderboard_lines(rows: &[Standing]) -> Vec<String> {
    top_standings(rows, LEADERBOARD_LIMIT)
        .iter()
        .enumerate()
        .map(|(index, s)| format!("{}. {} - {}", index + 1, s.username, s.score))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::test_support::{RecordingPresenter, RenderOp};
    use mapdart_wire::{GeoPointProto, PlayerGuessProto, StandingProto};

    fn tracker() -> RoundTracker {
        RoundTracker::new(ClientConfig::default())
    }

    fn announce(name: &str, country: &str) -> TargetAnnounce {
        TargetAnnounce {
            name: name.to_string(),
            country: country.to_string(),
            location: None,
        }
    }

    fn reveal_at(lat: f64, lon: f64) -> SolutionReveal {
        SolutionReveal {
            location: Some(GeoPointProto {
                latitude: lat,
                longitude: lon,
            }),
            location_name: "somewhere".to_string(),
            guesses: vec![],
            standings: vec![],
        }
    }

    fn standing(player_id: PlayerId, username: &str, score: u64) -> StandingProto {
        StandingProto {
            player_id,
            username: username.to_string(),
            score,
        }
    }

    #[test]
    fn test_starts_idle_with_no_player_id() {
        let t = tracker();
        assert_eq!(t.phase(), Phase::Idle);
        assert!(t.player_id().is_none());
        assert!(!t.has_guessed_this_round());
        assert!(!t.is_terminated());
    }

    #[test]
    fn test_join_request_uses_config() {
        let t = RoundTracker::new(ClientConfig {
            username: "alice".to_string(),
            game_id: "EU-1".to_string(),
            default_guess_duration_secs: 5,
        });

        let req = t.join_request();
        assert_eq!(req.username, "alice");
        assert_eq!(req.game_id, "EU-1");
    }

    #[test]
    fn test_target_announced_opens_round() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);

        assert_eq!(t.phase(), Phase::AcceptingGuesses);
        assert!(!t.has_guessed_this_round());
        assert_eq!(
            p.ops,
            vec![
                RenderOp::HaltCountdown,
                RenderOp::ClearRoundVisuals,
                RenderOp::ShowTarget("Pisa".to_string(), "Italy".to_string()),
                RenderOp::BeginCountdown(5),
            ]
        );
    }

    #[test]
    fn test_active_target_lives_exactly_as_long_as_the_round() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();
        assert!(t.active_target().is_none());

        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);
        assert_eq!(
            t.active_target(),
            Some(&ActiveTarget {
                name: "Pisa".to_string(),
                country: "Italy".to_string(),
            })
        );

        t.on_solution_revealed(&reveal_at(43.7, 10.4), &mut p);
        assert!(t.active_target().is_none());
    }

    #[test]
    fn test_session_metadata_sets_countdown_length() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        t.on_session_metadata(&SessionMetadata {
            guess_duration_secs: 9,
        });
        t.on_target_announced(&announce("Oslo", "Norway"), &mut p);

        assert!(p.ops.contains(&RenderOp::BeginCountdown(9)));
    }

    #[test]
    fn test_zero_metadata_duration_is_ignored() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        t.on_session_metadata(&SessionMetadata {
            guess_duration_secs: 0,
        });
        t.on_target_announced(&announce("Oslo", "Norway"), &mut p);

        assert!(p.ops.contains(&RenderOp::BeginCountdown(5)));
    }

    #[test]
    fn test_guess_emitted_exactly_once_per_round() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();
        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);

        let first = t.on_guess_input(GeoPoint::new(10.0, 20.0), &mut p);
        assert_eq!(
            first,
            Some(GuessSubmit {
                latitude: 10.0,
                longitude: 20.0,
            })
        );
        assert!(t.has_guessed_this_round());

        // The repeat click is silently ignored: no message, no render op.
        let ops_before = p.ops.len();
        let second = t.on_guess_input(GeoPoint::new(30.0, 40.0), &mut p);
        assert!(second.is_none());
        assert_eq!(p.ops.len(), ops_before);
    }

    #[test]
    fn test_guess_ignored_outside_accepting_phase() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        // Idle: no round yet.
        assert!(t.on_guess_input(GeoPoint::new(1.0, 2.0), &mut p).is_none());
        assert!(p.ops.is_empty());

        // Revealed: round is closed.
        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);
        t.on_solution_revealed(&reveal_at(43.7, 10.4), &mut p);
        assert_eq!(t.phase(), Phase::Revealed);

        let ops_before = p.ops.len();
        assert!(t.on_guess_input(GeoPoint::new(1.0, 2.0), &mut p).is_none());
        assert_eq!(p.ops.len(), ops_before);
    }

    #[test]
    fn test_reveal_while_idle_is_a_complete_no_op() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        let mut reveal = reveal_at(43.7, 10.4);
        reveal.standings.push(standing(1, "alice", 50));
        t.on_solution_revealed(&reveal, &mut p);

        assert_eq!(t.phase(), Phase::Idle);
        assert!(p.ops.is_empty());
    }

    #[test]
    fn test_duplicate_reveal_is_ignored() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();
        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);
        t.on_solution_revealed(&reveal_at(43.7, 10.4), &mut p);

        let ops_before = p.ops.len();
        t.on_solution_revealed(&reveal_at(43.7, 10.4), &mut p);
        assert_eq!(p.ops.len(), ops_before);
        assert_eq!(t.phase(), Phase::Revealed);
    }

    #[test]
    fn test_reveal_without_location_is_ignored() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();
        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);

        let ops_before = p.ops.len();
        let reveal = SolutionReveal {
            location: None,
            location_name: String::new(),
            guesses: vec![],
            standings: vec![],
        };
        t.on_solution_revealed(&reveal, &mut p);

        assert_eq!(t.phase(), Phase::AcceptingGuesses);
        assert_eq!(p.ops.len(), ops_before);
    }

    #[test]
    fn test_perfect_guess_scenario() {
        // Announce → guess at (10, 20) → reveal at (10, 20):
        // distance is zero and both markers land on the same point.
        let mut t = tracker();
        let mut p = RecordingPresenter::default();
        let spot = GeoPoint::new(10.0, 20.0);

        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);
        t.on_guess_input(spot, &mut p).unwrap();
        t.on_solution_revealed(&reveal_at(10.0, 20.0), &mut p);

        assert!(p.ops.contains(&RenderOp::OwnGuessMarker(spot)));
        assert!(p.ops.contains(&RenderOp::SolutionMarker(spot)));
        assert!(p.ops.contains(&RenderOp::DistanceLine(spot, spot)));
        assert!(p.ops.contains(&RenderOp::ShowDistanceKm(0)));
        assert_eq!(t.phase(), Phase::Revealed);
    }

    #[test]
    fn test_reveal_without_local_guess_draws_no_distance() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);
        t.on_solution_revealed(&reveal_at(43.7, 10.4), &mut p);

        assert!(p.ops.iter().all(|op| !matches!(op, RenderOp::DistanceLine(..))));
        assert!(p.ops.iter().all(|op| !matches!(op, RenderOp::ShowDistanceKm(_))));
    }

    #[test]
    fn test_own_guess_excluded_from_opponent_markers_by_id() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        t.on_join_ack(&JoinAck { player_id: 7 });
        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);
        t.on_guess_input(GeoPoint::new(10.0, 20.0), &mut p);

        let mut reveal = reveal_at(43.7, 10.4);
        reveal.guesses = vec![
            PlayerGuessProto {
                player_id: 7,
                latitude: 10.0,
                longitude: 20.0,
            },
            PlayerGuessProto {
                player_id: 9,
                latitude: -5.0,
                longitude: 60.0,
            },
        ];
        t.on_solution_revealed(&reveal, &mut p);

        let opponents: Vec<_> = p
            .ops
            .iter()
            .filter_map(|op| match op {
                RenderOp::OpponentMarker(id, _) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(opponents, vec![9]);
    }

    #[test]
    fn test_leaderboard_rendered_sorted_and_ranked() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);
        let mut reveal = reveal_at(43.7, 10.4);
        reveal.standings = vec![
            standing(1, "alice", 50),
            standing(2, "bob", 80),
            standing(3, "carol", 80),
        ];
        t.on_solution_revealed(&reveal, &mut p);

        let lines = p
            .ops
            .iter()
            .find_map(|op| match op {
                RenderOp::Leaderboard(lines) => Some(lines.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            lines,
            vec![
                "1. bob - 80".to_string(),
                "2. carol - 80".to_string(),
                "3. alice - 50".to_string(),
            ]
        );
    }

    #[test]
    fn test_leaderboard_lines_cap_at_ten() {
        let rows: Vec<Standing> = (0..12)
            .map(|i| Standing {
                player_id: i,
                username: format!("p{i}"),
                score: 200 - i,
            })
            .collect();

        let lines = leaderboard_lines(&rows);
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "1. p0 - 200");
        assert_eq!(lines[9], "10. p9 - 191");
    }

    #[test]
    fn test_back_to_back_announcements_reset_the_round() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);
        t.on_guess_input(GeoPoint::new(10.0, 20.0), &mut p).unwrap();
        assert!(t.has_guessed_this_round());

        // No reveal in between: the second announcement still reopens the
        // gate and clears the first round's visuals and countdown.
        p.ops.clear();
        t.on_target_announced(&announce("Lima", "Peru"), &mut p);

        assert!(!t.has_guessed_this_round());
        assert_eq!(p.ops[0], RenderOp::HaltCountdown);
        assert_eq!(p.ops[1], RenderOp::ClearRoundVisuals);
        assert!(
            t.on_guess_input(GeoPoint::new(-12.0, -77.0), &mut p)
                .is_some()
        );
    }

    #[test]
    fn test_kick_is_terminal() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        t.on_target_announced(&announce("Pisa", "Italy"), &mut p);
        t.on_kicked(
            &Kick {
                message: "Bad username".to_string(),
            },
            &mut p,
        );

        assert!(t.is_terminated());
        assert_eq!(t.phase(), Phase::Idle);
        assert!(
            p.ops
                .contains(&RenderOp::NavigateAway("Bad username".to_string()))
        );

        // Everything after the kick is a no-op.
        let ops_before = p.ops.len();
        assert!(t.on_guess_input(GeoPoint::new(1.0, 2.0), &mut p).is_none());
        t.on_target_announced(&announce("Lima", "Peru"), &mut p);
        t.on_solution_revealed(&reveal_at(0.0, 0.0), &mut p);
        t.on_kicked(
            &Kick {
                message: "again".to_string(),
            },
            &mut p,
        );
        assert_eq!(p.ops.len(), ops_before);
        assert_eq!(t.phase(), Phase::Idle);
    }

    #[test]
    fn test_server_event_dispatch_covers_all_payloads() {
        let mut t = tracker();
        let mut p = RecordingPresenter::default();

        t.on_server_event(ServerPayload::JoinAck(JoinAck { player_id: 3 }), &mut p);
        assert_eq!(t.player_id(), Some(3));

        t.on_server_event(
            ServerPayload::SessionMetadata(SessionMetadata {
                guess_duration_secs: 7,
            }),
            &mut p,
        );
        t.on_server_event(
            ServerPayload::TargetAnnounce(announce("Quito", "Ecuador")),
            &mut p,
        );
        assert_eq!(t.phase(), Phase::AcceptingGuesses);
        assert!(p.ops.contains(&RenderOp::BeginCountdown(7)));

        t.on_server_event(ServerPayload::SolutionReveal(reveal_at(-0.2, -78.5)), &mut p);
        assert_eq!(t.phase(), Phase::Revealed);

        t.on_server_event(
            ServerPayload::Kick(Kick {
                message: "Server going down".to_string(),
            }),
            &mut p,
        );
        assert!(t.is_terminated());
    }
}
