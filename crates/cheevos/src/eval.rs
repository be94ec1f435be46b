//! Trigger evaluation boundary.
//!
//! The condition language is interpreted by a host supplied
//! [`TriggerEngine`]. The engine is stateless between calls: everything it
//! needs to remember across frames (hit counts, delta values, the
//! waiting-for-false latch) lives in a [`TriggerMemo`] owned by the runtime,
//! which is also what progress capture serializes.

use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

use crate::error::ErrorCode;
use crate::memory::MemoryReader;

/// Per-definition evaluation state, opaque to the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMemo(pub Vec<u8>);

impl TriggerMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromRepr, Display)]
#[repr(u8)]
pub enum TriggerStatus {
    #[default]
    Inactive = 0,
    /// True when first evaluated; must go false before it can fire
    Waiting = 1,
    Active = 2,
    /// Everything but the final trigger conditions is true
    Primed = 3,
    Triggered = 4,
    Paused = 5,
    Reset = 6,
    Disabled = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Measured {
    pub value: u32,
    pub target: u32,
}

impl Measured {
    pub fn percent(&self) -> f32 {
        if self.target == 0 {
            return 0.0;
        }
        (self.value.min(self.target) as f32 * 100.0) / self.target as f32
    }
}

impl std::fmt::Display for Measured {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.value, self.target)
    }
}

/// Result of evaluating one achievement trigger for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerOutcome {
    pub status: TriggerStatus,
    pub measured: Option<Measured>,
}

impl TriggerOutcome {
    pub fn status(status: TriggerStatus) -> Self {
        Self {
            status,
            measured: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromRepr, Display)]
#[repr(u8)]
pub enum LeaderboardStatus {
    #[default]
    Inactive = 0,
    Waiting = 1,
    Active = 2,
    Started = 3,
    Canceled = 4,
    Triggered = 5,
    Disabled = 6,
}

/// Result of evaluating one leaderboard for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeaderboardOutcome {
    pub status: LeaderboardStatus,
    pub value: i32,
}

/// Interpreter for achievement, leaderboard and rich presence definitions.
///
/// Implementations must not panic on malformed definitions; they report
/// them through the `validate_*` calls, after which the runtime marks the
/// definition disabled and never evaluates it.
pub trait TriggerEngine: Send + Sync {
    fn validate_trigger(&self, definition: &str) -> Result<(), ErrorCode>;

    fn evaluate_trigger(
        &self,
        definition: &str,
        memo: &mut TriggerMemo,
        memory: &MemoryReader<'_>,
    ) -> TriggerOutcome;

    fn validate_leaderboard(&self, definition: &str) -> Result<(), ErrorCode>;

    fn evaluate_leaderboard(
        &self,
        definition: &str,
        memo: &mut TriggerMemo,
        memory: &MemoryReader<'_>,
    ) -> LeaderboardOutcome;

    /// Validate a rich presence script. Engines without rich presence
    /// support reject every script.
    fn validate_rich_presence(&self, _script: &str) -> Result<(), ErrorCode> {
        Err(ErrorCode::InvalidState)
    }

    fn evaluate_rich_presence(
        &self,
        _script: &str,
        _memo: &mut TriggerMemo,
        _memory: &MemoryReader<'_>,
    ) -> String {
        String::new()
    }
}
