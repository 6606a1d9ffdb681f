//! Presentation capability for the round tracker.
//!
//! The tracker never touches a rendering surface. Hosts implement
//! [`Presenter`] over whatever they have — a map widget, a terminal, a test
//! recorder — and the tracker calls these operations as rounds progress.
//! Deployment-specific details (marker icons, tile providers, popup markup)
//! live entirely inside the implementation.

use mapdart_round::{GeoPoint, PlayerId};

/// Abstract presentation operations the tracker may request.
///
/// Implementations must be cheap and non-blocking; they are called inline
/// from event processing. None of them may call back into the tracker.
pub trait Presenter {
    /// Show the round's target banner ("Name, Country").
    fn show_target(&mut self, name: &str, country: &str);

    /// Remove every visual belonging to the previous round: markers, the
    /// distance indicator, the distance text, opponent markers.
    fn clear_round_visuals(&mut self);

    /// Start the cosmetic guess countdown for the new round.
    fn begin_countdown(&mut self, seconds: u32);

    /// Stop a running countdown. Called before a new one begins so a
    /// superseded round's timer can never fire into the next round, and on
    /// reveal/kick when no countdown should run at all. Must be idempotent.
    fn halt_countdown(&mut self);

    /// Place the local player's guess marker.
    fn place_own_guess_marker(&mut self, point: GeoPoint);

    /// Place the solution marker at the revealed target location.
    fn place_solution_marker(&mut self, point: GeoPoint);

    /// Draw the distance indicator between the local guess and the target.
    fn draw_distance_line(&mut self, from: GeoPoint, to: GeoPoint);

    /// Display the local player's distance to the target in whole km.
    fn show_distance_km(&mut self, km: u64);

    /// Place an opponent's guess marker. Never called for the local player.
    fn place_opponent_marker(&mut self, player_id: PlayerId, point: GeoPoint);

    /// Replace the leaderboard with the given pre-formatted lines.
    fn render_leaderboard(&mut self, lines: &[String]);

    /// Leave the game surface, showing the given message (kick path).
    fn navigate_away(&mut self, message: &str);
}

// ============================================================================
// Test Support
// ============================================================================
