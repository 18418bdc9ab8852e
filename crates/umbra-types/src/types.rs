//! Core value types shared across the Umbra crates.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player.
///
/// Newtype over `u64` so it can't be confused with counters or round
/// numbers. Serializes as the bare number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoundState
// ---------------------------------------------------------------------------

/// The phase of the round state machine.
///
/// ```text
/// Lobby ──→ Intermission ──→ Playing ──→ RoundEnd
///               ↑  │                        │
///               └──┘ (nobody connected)     │
///               └───────────────────────────┘
///
/// any ──→ Shutdown
/// ```
///
/// The round controller owns the current value; everyone else observes it
/// through the shared state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RoundState {
    /// Process just started; no round has been scheduled yet.
    #[default]
    Lobby,
    /// Waiting for the next round to begin.
    Intermission,
    /// A round is live. Lights move and detect players.
    Playing,
    /// The round just ended; survivors are known.
    RoundEnd,
    /// Terminal. No further transitions are accepted.
    Shutdown,
}

impl RoundState {
    /// Returns `true` if moving from `self` to `target` is an edge of the
    /// round state machine.
    ///
    /// `Intermission → Intermission` is valid (the empty-server self-loop).
    /// Every state may move to `Shutdown` except `Shutdown` itself.
    pub fn can_transition_to(self, target: Self) -> bool {
        use RoundState::*;
        match (self, target) {
            (Shutdown, _) => false,
            (_, Shutdown) => true,
            (Lobby | RoundEnd | Intermission, Intermission) => true,
            (Intermission, Playing) => true,
            (Playing, RoundEnd) => true,
            _ => false,
        }
    }

    /// Returns `true` while a round is actively being played.
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns `true` once the machine has been torn down.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Shutdown)
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "Lobby",
            Self::Intermission => "Intermission",
            Self::Playing => "Playing",
            Self::RoundEnd => "RoundEnd",
            Self::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A value held by the shared state store.
///
/// The store compares values with `==` to decide whether a `set` is a
/// change. Floats compare by bit pattern, so a NaN equals the same NaN and
/// `0.0` differs from `-0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Explicit "nothing".
    Nil,
    /// A flag.
    Bool(bool),
    /// A signed integer (counters, round numbers).
    Int(i64),
    /// A floating-point number (timers, fractions).
    Float(f64),
    /// Free-form text.
    Text(String),
    /// A round phase.
    Round(RoundState),
    /// An ordered list of players.
    Players(Vec<PlayerId>),
}

impl Value {
    /// Returns the round state if this value holds one.
    pub fn as_round(&self) -> Option<RoundState> {
        match self {
            Self::Round(state) => Some(*state),
            _ => None,
        }
    }

    /// Returns the integer if this value holds one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the player list if this value holds one.
    pub fn as_players(&self) -> Option<&[PlayerId]> {
        match self {
            Self::Players(players) => Some(players.as_slice()),
            _ => None,
        }
    }

    /// Returns the text if this value holds some.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Round(a), Self::Round(b)) => a == b,
            (Self::Players(a), Self::Players(b)) => a == b,
            _ => false,
        }
    }
}

impl From<RoundState> for Value {
    fn from(state: RoundState) -> Self {
        Self::Round(state)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<PlayerId>> for Value {
    fn from(players: Vec<PlayerId>) -> Self {
        Self::Players(players)
    }
}
