//! Mapdart Wire Protocol Types
//!
//! This crate defines the shared Protobuf message types exchanged between a
//! game client and the server edge. Both binaries MUST depend on this crate
//! so the schema cannot drift between the two ends.
//!
//! Each direction has a single envelope with a oneof payload; one WebSocket
//! binary frame carries exactly one encoded envelope, so the frame boundary
//! is the message boundary.
//!
//! Standings and guesses travel as ordered `repeated` fields rather than
//! Protobuf maps: the leaderboard tiebreak is "original snapshot order", and
//! only an ordered field preserves it across the wire.

#![deny(unsafe_code)]

use mapdart_round::{GeoPoint, Guess, PlayerId, Standing};
use prost::{Message, Oneof};

// ============================================================================
// Client → Server
// ============================================================================

/// Envelope for every client-originated message.
#[derive(Clone, PartialEq, Message)]
pub struct ClientEnvelope {
    #[prost(oneof = "ClientPayload", tags = "1, 2")]
    pub payload: Option<ClientPayload>,
}

/// Client payload variants.
#[derive(Clone, PartialEq, Oneof)]
pub enum ClientPayload {
    /// Sent once per connection establishment.
    #[prost(message, tag = "1")]
    Join(JoinRequest),

    /// Sent at most once per round, only while guesses are open.
    #[prost(message, tag = "2")]
    Guess(GuessSubmit),
}

/// Join a game with a locally stored username.
#[derive(Clone, PartialEq, Message)]
pub struct JoinRequest {
    #[prost(string, tag = "1")]
    pub username: String,

    #[prost(string, tag = "2")]
    pub game_id: String,
}

/// A player's guess for the active round.
#[derive(Clone, PartialEq, Message)]
pub struct GuessSubmit {
    #[prost(double, tag = "1")]
    pub latitude: f64,

    #[prost(double, tag = "2")]
    pub longitude: f64,
}

// ============================================================================
// Server → Client
// ============================================================================

/// Envelope for every server-originated message.
#[derive(Clone, PartialEq, Message)]
pub struct ServerEnvelope {
    #[prost(oneof = "ServerPayload", tags = "1, 2, 3, 4, 5")]
    pub payload: Option<ServerPayload>,
}

/// Server payload variants.
#[derive(Clone, PartialEq, Oneof)]
pub enum ServerPayload {
    /// Join accepted; carries the server-assigned player id.
    #[prost(message, tag = "1")]
    JoinAck(JoinAck),

    /// Connection-time session parameters.
    #[prost(message, tag = "2")]
    SessionMetadata(SessionMetadata),

    /// A new round's target was announced.
    #[prost(message, tag = "3")]
    TargetAnnounce(TargetAnnounce),

    /// The active round's solution, all guesses, and the standings snapshot.
    #[prost(message, tag = "4")]
    SolutionReveal(SolutionReveal),

    /// Forced session termination.
    #[prost(message, tag = "5")]
    Kick(Kick),
}

/// Join acknowledgement.
///
/// The assigned id is the key clients use to tell their own guess apart
/// from opponents' in a reveal; comparison is always id equality, never
/// positional.
#[derive(Clone, PartialEq, Message)]
pub struct JoinAck {
    #[prost(uint64, tag = "1")]
    pub player_id: PlayerId,
}

/// Session parameters sent once after the ack.
#[derive(Clone, PartialEq, Message)]
pub struct SessionMetadata {
    /// Length of the cosmetic guess countdown, in seconds. Presentation
    /// only; the server's own broadcasts remain authoritative on timing.
    #[prost(uint32, tag = "1")]
    pub guess_duration_secs: u32,
}

/// Round start.
#[derive(Clone, PartialEq, Message)]
pub struct TargetAnnounce {
    #[prost(string, tag = "1")]
    pub name: String,

    #[prost(string, tag = "2")]
    pub country: String,

    /// Unset by the authoritative server: coordinates are withheld until
    /// the reveal. Clients must not rely on it.
    #[prost(message, optional, tag = "3")]
    pub location: Option<GeoPointProto>,
}

/// Round end: solution location, every buffered guess, and the full
/// standings snapshot (replaces prior standings wholesale).
#[derive(Clone, PartialEq, Message)]
pub struct SolutionReveal {
    #[prost(message, optional, tag = "1")]
    pub location: Option<GeoPointProto>,

    #[prost(string, tag = "2")]
    pub location_name: String,

    #[prost(message, repeated, tag = "3")]
    pub guesses: Vec<PlayerGuessProto>,

    /// Standings in the server's stable session order; clients apply the
    /// score sort and rely on this order for ties.
    #[prost(message, repeated, tag = "4")]
    pub standings: Vec<StandingProto>,
}

/// Forced termination with a human-readable reason.
#[derive(Clone, PartialEq, Message)]
pub struct Kick {
    #[prost(string, tag = "1")]
    pub message: String,
}

// ============================================================================
// Embedded Messages
// ============================================================================

/// A point on the globe in decimal degrees.
#[derive(Clone, Copy, PartialEq, Message)]
pub struct GeoPointProto {
    #[prost(double, tag = "1")]
    pub latitude: f64,

    #[prost(double, tag = "2")]
    pub longitude: f64,
}

/// One player's guess as revealed to everyone.
#[derive(Clone, PartialEq, Message)]
pub struct PlayerGuessProto {
    #[prost(uint64, tag = "1")]
    pub player_id: PlayerId,

    #[prost(double, tag = "2")]
    pub latitude: f64,

    #[prost(double, tag = "3")]
    pub longitude: f64,
}

/// One leaderboard row.
#[derive(Clone, PartialEq, Message)]
pub struct StandingProto {
    #[prost(uint64, tag = "1")]
    pub player_id: PlayerId,

    #[prost(string, tag = "2")]
    pub username: String,

    #[prost(uint64, tag = "3")]
    pub score: u64,
}

// ============================================================================
// Envelope Constructors
// ============================================================================

impl ClientEnvelope {
    pub fn join(request: JoinRequest) -> Self {
        Self {
            payload: Some(ClientPayload::Join(request)),
        }
    }

    pub fn guess(guess: GuessSubmit) -> Self {
        Self {
            payload: Some(ClientPayload::Guess(guess)),
        }
    }
}

impl ServerEnvelope {
    pub fn join_ack(ack: JoinAck) -> Self {
        Self {
            payload: Some(ServerPayload::JoinAck(ack)),
        }
    }

    pub fn session_metadata(metadata: SessionMetadata) -> Self {
        Self {
            payload: Some(ServerPayload::SessionMetadata(metadata)),
        }
    }

    pub fn target_announce(announce: TargetAnnounce) -> Self {
        Self {
            payload: Some(ServerPayload::TargetAnnounce(announce)),
        }
    }

    pub fn solution_reveal(reveal: SolutionReveal) -> Self {
        Self {
            payload: Some(ServerPayload::SolutionReveal(reveal)),
        }
    }

    pub fn kick(kick: Kick) -> Self {
        Self {
            payload: Some(ServerPayload::Kick(kick)),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<GeoPoint> for GeoPointProto {
    fn from(p: GeoPoint) -> Self {
        Self {
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

impl From<GeoPointProto> for GeoPoint {
    fn from(p: GeoPointProto) -> Self {
        Self {
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

impl From<Guess> for PlayerGuessProto {
    fn from(g: Guess) -> Self {
        Self {
            player_id: g.player_id,
            latitude: g.point.latitude,
            longitude: g.point.longitude,
        }
    }
}

impl From<PlayerGuessProto> for Guess {
    fn from(g: PlayerGuessProto) -> Self {
        Self {
            player_id: g.player_id,
            point: GeoPoint::new(g.latitude, g.longitude),
        }
    }
}

impl From<Standing> for StandingProto {
    fn from(s: Standing) -> Self {
        Self {
            player_id: s.player_id,
            username: s.username,
            score: s.score,
        }
    }
}

impl From<StandingProto> for Standing {
    fn from(s: StandingProto) -> Self {
        Self {
            player_id: s.player_id,
            username: s.username,
            score: s.score,
        }
    }
}

impl SolutionReveal {
    /// The solution location, if the payload is structurally complete.
    /// A reveal without a location is malformed and callers treat the
    /// whole event as a no-op.
    pub fn location_point(&self) -> Option<GeoPoint> {
        self.location.map(GeoPoint::from)
    }
}

// ============================================================================
// Frame Helpers
// ============================================================================

/// Encode an envelope into a single binary frame.
pub fn encode_frame<M: Message>(envelope: &M) -> Vec<u8> {
    envelope.encode_to_vec()
}

/// Decode a client frame. `None` for frames that do not parse or carry an
/// empty envelope; the caller drops such frames silently.
pub fn decode_client_frame(bytes: &[u8]) -> Option<ClientPayload> {
    ClientEnvelope::decode(bytes).ok()?.payload
}

/// Decode a server frame. Same contract as [`decode_client_frame`].
pub fn decode_server_frame(bytes: &[u8]) -> Option<ServerPayload> {
    ServerEnvelope::decode(bytes).ok()?.payload
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_request_roundtrip() {
        let envelope = ClientEnvelope::join(JoinRequest {
            username: "alice".to_string(),
            game_id: "PRIMARY".to_string(),
        });

        let frame = encode_frame(&envelope);
        let decoded = decode_client_frame(&frame).unwrap();

        match decoded {
            ClientPayload::Join(req) => {
                assert_eq!(req.username, "alice");
                assert_eq!(req.game_id, "PRIMARY");
            }
            other => panic!("wrong payload: {other:?}"),
        }
    }

    #[test]
    fn test_solution_reveal_roundtrip_preserves_standing_order() {
        // Tie handling depends on wire order surviving encode/decode.
        let reveal = SolutionReveal {
            location: Some(GeoPointProto {
                latitude: 43.7,
                longitude: 10.4,
            }),
            location_name: "Pisa".to_string(),
            guesses: vec![PlayerGuessProto {
                player_id: 7,
                latitude: 41.9,
                longitude: 12.5,
            }],
            standings: vec![
                StandingProto {
                    player_id: 2,
                    username: "bob".to_string(),
                    score: 80,
                },
                StandingProto {
                    player_id: 3,
                    username: "carol".to_string(),
                    score: 80,
                },
            ],
        };

        let frame = encode_frame(&ServerEnvelope::solution_reveal(reveal));
        let Some(ServerPayload::SolutionReveal(decoded)) = decode_server_frame(&frame) else {
            panic!("wrong payload");
        };

        assert_eq!(decoded.location_name, "Pisa");
        assert_eq!(decoded.standings[0].username, "bob");
        assert_eq!(decoded.standings[1].username, "carol");
        assert_eq!(decoded.guesses.len(), 1);
    }

    #[test]
    fn test_kick_roundtrip() {
        let frame = encode_frame(&ServerEnvelope::kick(Kick {
            message: "Username taken".to_string(),
        }));

        match decode_server_frame(&frame) {
            Some(ServerPayload::Kick(kick)) => assert_eq!(kick.message, "Username taken"),
            other => panic!("wrong payload: {other:?}"),
        }
    }

    #[test]
    fn test_empty_and_garbage_frames_are_dropped() {
        // An empty envelope decodes but carries no payload.
        let empty = encode_frame(&ClientEnvelope { payload: None });
        assert!(decode_client_frame(&empty).is_none());

        // Truncated garbage does not decode at all.
        assert!(decode_server_frame(&[0xFF, 0x01, 0x02]).is_none());
    }

    #[test]
    fn test_geo_point_conversion_roundtrip() {
        let point = GeoPoint::new(-33.86, 151.21);
        let proto: GeoPointProto = point.into();
        let back: GeoPoint = proto.into();
        assert_eq!(back, point);
    }

    #[test]
    fn test_reveal_without_location_is_malformed() {
        let reveal = SolutionReveal {
            location: None,
            location_name: String::new(),
            guesses: vec![],
            standings: vec![],
        };
        assert!(reveal.location_point().is_none());
    }
}
