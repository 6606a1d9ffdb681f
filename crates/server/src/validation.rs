//! Join and guess validation for the server edge.
//!
//! Every inbound message is classified before it can touch game state:
//! - Bad or duplicate username: the join is rejected with a kick.
//! - Guess with NaN/Inf coordinates: DROP
//! - Guess outside the -90..=90 / -180..=180 envelope: DROP
//! - Guess with no round open: DROP
//! - Repeat guess in one round: DROP (the first guess is immutable)
//!
//! Drops are silent toward the client; the host logs them.

use std::sync::OnceLock;

use mapdart_round::GeoPoint;
use regex::Regex;

/// Usernames: 1-32 characters of letters, digits, space, underscore, dash.
const USERNAME_PATTERN: &str = r"^[A-Za-z0-9 _-]{1,32}$";

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(USERNAME_PATTERN).unwrap())
}

/// Result of validating a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinValidation {
    /// Username is well-formed and free.
    Accepted,
    /// Username fails the pattern (empty, too long, bad characters).
    BadUsername,
    /// Username is already in use by a connected player (case-sensitive).
    UsernameTaken,
}

impl JoinValidation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// The kick reason shown to the rejected client, if rejected.
    pub fn kick_message(&self) -> Option<&'static str> {
        match self {
            Self::Accepted => None,
            Self::BadUsername => Some("Bad username"),
            Self::UsernameTaken => Some("Username taken"),
        }
    }
}

/// Validate a join request against the currently connected usernames.
pub fn validate_join<'a, I>(username: &str, existing: I) -> JoinValidation
where
    I: IntoIterator<Item = &'a str>,
{
    if !username_regex().is_match(username) {
        return JoinValidation::BadUsername;
    }
    if existing.into_iter().any(|taken| taken == username) {
        return JoinValidation::UsernameTaken;
    }
    JoinValidation::Accepted
}

/// Result of validating a guess.
#[derive(Debug, Clone, PartialEq)]
pub enum GuessValidation {
    /// Guess accepted and buffered for the active round.
    Accepted,
    /// Dropped: the session never completed a join.
    DroppedUnknownSession,
    /// Dropped: no round is accepting guesses right now.
    DroppedNoActiveRound,
    /// Dropped: this player already guessed this round.
    DroppedAlreadyGuessed,
    /// Dropped: NaN or infinite coordinate.
    DroppedNonFinite,
    /// Dropped: coordinate outside the valid latitude/longitude envelope.
    DroppedOutOfRange { latitude: f64, longitude: f64 },
}

impl GuessValidation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Structural checks on a guess coordinate. Round-state checks (round open,
/// already guessed) happen at the buffer.
pub fn validate_guess_point(point: GeoPoint) -> Option<GuessValidation> {
    if !point.latitude.is_finite() || !point.longitude.is_finite() {
        return Some(GuessValidation::DroppedNonFinite);
    }
    if !point.is_in_range() {
        return Some(GuessValidation::DroppedOutOfRange {
            latitude: point.latitude,
            longitude: point.longitude,
        });
    }
    None
}
