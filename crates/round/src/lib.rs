//! Mapdart Round Core
//!
//! This crate contains the pure domain logic shared by the client tracker
//! and the authoritative server edge: geographic points, great-circle
//! distance, the scoring curve, and leaderboard ordering.
//!
//! The crate is deliberately isolated. It MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Read wall-clock time
//! - Use ambient/unseeded randomness
//!
//! Everything here is total over finite inputs: no function panics or
//! returns an error for any in-range latitude/longitude pair, so callers
//! on the event-processing path never have a failure to propagate.

#![deny(unsafe_code)]

// ============================================================================
// Type Aliases
// ============================================================================

/// Server-assigned participant identifier, stable for the life of a
/// connection. Callers MUST NOT assume ids are contiguous or start at a
/// specific value; the id is only an equality/ordering key.
pub type PlayerId = u64;

// ============================================================================
// Core Types
// ============================================================================

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both coordinates are finite and within the usual
    /// -90..=90 / -180..=180 envelope.
    pub fn is_in_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

/// A player's submitted coordinate for the active round.
/// At most one per player per round; immutable once accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guess {
    pub player_id: PlayerId,
    pub point: GeoPoint,
}

/// One leaderboard row. A reveal carries the full standings snapshot,
/// replacing prior standings wholesale (never patched incrementally).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub player_id: PlayerId,
    pub username: String,
    pub score: u64,
}

// ============================================================================
// Constants
// ============================================================================

/// Mean Earth radius used for great-circle distance, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance at or beyond which a guess scores zero, in kilometers.
pub const MAX_SCORED_DISTANCE_KM: u64 = 1500;

/// Number of leaderboard rows presentation shows.
pub const LEADERBOARD_LIMIT: usize = 10;

// ============================================================================
// Great-Circle Distance
// ============================================================================

/// Great-circle distance between two points, in kilometers.
///
/// Haversine on a sphere of radius [`EARTH_RADIUS_KM`]. Chosen over a flat
/// approximation because guesses and targets are globally distributed, and
/// over Vincenty because haversine is total: it cannot fail to converge.
///
/// Longitudes are consumed through periodic functions only, so a longitude
/// and the same longitude shifted by 360 degrees name the same meridian and
/// yield the same distance.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    // h can exceed 1.0 by a few ulps for antipodal points; clamp before asin.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Distance rounded to the nearest whole kilometer, as shown to players.
pub fn rounded_km(a: GeoPoint, b: GeoPoint) -> u64 {
    distance_km(a, b).round() as u64
}

// ============================================================================
// Scoring
// ============================================================================

/// Points awarded for a guess `kms` kilometers off target.
///
/// Zero at or beyond [`MAX_SCORED_DISTANCE_KM`]; otherwise the deficit to
/// 1500 km, divided by four and rounded up. Maximum 375 for a perfect guess.
pub fn score_for_distance(kms: f64) -> u64 {
    let kilometers = kms.floor() as u64;
    if kilometers >= MAX_SCORED_DISTANCE_KM {
        return 0;
    }

    (MAX_SCORED_DISTANCE_KM - kilometers).div_ceil(4)
}

// ============================================================================
// Standings
// ============================================================================

/// Order a standings snapshot for presentation.
///
/// Stable sort by score descending: rows with equal scores keep the
/// snapshot's original order (there is deliberately no name tiebreak).
/// Truncated to `limit` rows.
pub fn top_standings(rows: &[Standing], limit: usize) -> Vec<Standing> {
    let mut ordered: Vec<Standing> = rows.to_vec();
    ordered.sort_by(|a, b| b.score.cmp(&a.score));
    ordered.truncate(limit);
    ordered
}

// ============================================================================
// Tests
// ============================================================================
