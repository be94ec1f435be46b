use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

use crate::text::{BadgeName, MeasuredProgress};

/// Achievement state as seen by the host
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr, Display,
)]
#[repr(u8)]
pub enum AchievementState {
    /// Unprocessed
    #[default]
    Inactive = 0,
    /// Eligible to trigger
    Active = 1,
    /// Earned by the user
    Unlocked = 2,
    /// Not supported by this version of the runtime
    Disabled = 3,
}

/// Which achievement sets an achievement belongs to (or a filter selects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr)]
#[repr(u8)]
pub enum AchievementCategory {
    None = 0,
    #[default]
    Core = 1,
    Unofficial = 2,
    CoreAndUnofficial = 3,
}

impl AchievementCategory {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Whether every category bit of `other` is set in `self`.
    pub fn includes(self, other: AchievementCategory) -> bool {
        other != AchievementCategory::None && self.bits() & other.bits() == other.bits()
    }
}

/// Modes an achievement has been unlocked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr)]
#[repr(u8)]
pub enum UnlockedMode {
    #[default]
    None = 0,
    Softcore = 1,
    Hardcore = 2,
    Both = 3,
}

impl UnlockedMode {
    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn from_bits(bits: u8) -> Self {
        Self::from_repr(bits & 0x03).unwrap_or_default()
    }

    pub fn has_softcore(self) -> bool {
        self.bits() & UnlockedMode::Softcore.bits() != 0
    }

    pub fn has_hardcore(self) -> bool {
        self.bits() & UnlockedMode::Hardcore.bits() != 0
    }

    /// Record an unlock in the given mode. A hardcore unlock also counts
    /// as a softcore unlock.
    pub fn with_unlock(self, hardcore: bool) -> Self {
        let added = if hardcore {
            UnlockedMode::Both
        } else {
            UnlockedMode::Softcore
        };
        Self::from_bits(self.bits() | added.bits())
    }

    /// Whether the achievement counts as unlocked for the current mode.
    pub fn is_unlocked_in(self, hardcore: bool) -> bool {
        if hardcore {
            self.has_hardcore()
        } else {
            self.has_softcore()
        }
    }
}

/// UI grouping for achievement lists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr, Display,
)]
#[repr(u8)]
pub enum BucketType {
    #[default]
    Unknown = 0,
    Locked = 1,
    Unlocked = 2,
    Unsupported = 3,
    Unofficial = 4,
    #[strum(serialize = "Recently Unlocked")]
    RecentlyUnlocked = 5,
    #[strum(serialize = "Active Challenge")]
    ActiveChallenge = 6,
    #[strum(serialize = "Almost There")]
    AlmostThere = 7,
}

/// Snapshot of one achievement.
///
/// Snapshots are never mutated; the runtime builds a new one whenever the
/// achievement changes. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: u32,
    pub subset_id: u32,
    pub title: String,
    pub description: String,
    pub badge_name: BadgeName,
    pub points: u32,
    pub state: AchievementState,
    pub category: AchievementCategory,
    pub bucket: BucketType,
    /// `None` while still locked
    pub unlock_time: Option<DateTime<Utc>>,
    pub measured_progress: MeasuredProgress,
    pub measured_percent: f32,
    pub unlocked: UnlockedMode,
    pub rarity: f32,
    pub rarity_hardcore: f32,
    pub badge_url: Option<String>,
    pub badge_locked_url: Option<String>,
}

impl Achievement {
    /// Image for the given state: the locked badge unless unlocked.
    pub fn image_url(&self, state: AchievementState) -> Option<&str> {
        match state {
            AchievementState::Unlocked => self.badge_url.as_deref(),
            _ => self
                .badge_locked_url
                .as_deref()
                .or(self.badge_url.as_deref()),
        }
    }

    /// Image matching the current state.
    pub fn current_image_url(&self) -> Option<&str> {
        self.image_url(self.state)
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == AchievementState::Unlocked
    }
}

impl std::fmt::Display for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}
