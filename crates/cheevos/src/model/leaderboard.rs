use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

use super::format::ValueFormat;
use crate::text::TrackerDisplay;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr, Display,
)]
#[repr(u8)]
pub enum LeaderboardState {
    #[default]
    Inactive = 0,
    /// Waiting for the start condition
    Active = 1,
    /// Attempt in progress, tracker visible
    Tracking = 2,
    Disabled = 3,
}

/// Coarse display format of a leaderboard value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr, Display,
)]
#[repr(u8)]
pub enum LeaderboardFormat {
    Time = 0,
    Score = 1,
    #[default]
    Value = 2,
}

impl From<ValueFormat> for LeaderboardFormat {
    fn from(format: ValueFormat) -> Self {
        if format.is_time() {
            LeaderboardFormat::Time
        } else if format == ValueFormat::Score {
            LeaderboardFormat::Score
        } else {
            LeaderboardFormat::Value
        }
    }
}

/// Snapshot of one leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub id: u32,
    pub subset_id: u32,
    pub title: String,
    pub description: String,
    /// Last formatted value while tracking
    pub tracker_value: TrackerDisplay,
    pub state: LeaderboardState,
    pub format: LeaderboardFormat,
    pub value_format: ValueFormat,
    pub lower_is_better: bool,
    pub hidden: bool,
}

impl std::fmt::Display for Leaderboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// On-screen value for an attempt in progress. Shown when the attempt
/// starts and hidden when it is submitted, cancelled or reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardTracker {
    pub id: u32,
    pub display: TrackerDisplay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    pub username: String,
    pub rank: u32,
    pub score: TrackerDisplay,
}

/// Server response to a leaderboard submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub leaderboard_id: u32,
    pub submitted_score: TrackerDisplay,
    pub best_score: TrackerDisplay,
    pub new_rank: u32,
    pub num_entries: u32,
    pub top_entries: Vec<ScoreboardEntry>,
}
