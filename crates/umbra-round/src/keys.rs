//! State store keys the round controller publishes under.

/// Current [`RoundState`](umbra_types::RoundState).
pub const ROUND_STATE: &str = "RoundState";

/// Rounds played so far, incremented on every Playing entry.
pub const ROUND_NUMBER: &str = "RoundNumber";

/// Players still alive in the current round.
pub const ALIVE_PLAYERS: &str = "AlivePlayers";

/// Players alive when the last round ended.
pub const SURVIVORS: &str = "Survivors";

/// Why the last round ended.
pub const ROUND_END_REASON: &str = "RoundEndReason";
