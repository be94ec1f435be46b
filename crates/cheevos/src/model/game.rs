use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

use crate::console::ConsoleId;
use crate::text::{GameHash, SubsetBadge};

/// Progress of a game load, from the host's point of view.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr, Display,
)]
#[repr(u8)]
pub enum LoadGameState {
    #[default]
    None = 0,
    IdentifyingGame = 1,
    FetchingGameData = 2,
    StartingSession = 3,
    Done = 4,
    Aborted = 5,
}

/// The loaded game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: u32,
    pub console_id: ConsoleId,
    pub title: String,
    pub hash: GameHash,
    pub badge_name: String,
    pub image_url: Option<String>,
}

impl std::fmt::Display for GameInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] ({})", self.title, self.id, self.console_id)
    }
}

/// A group of achievements and leaderboards within the loaded game. The
/// first subset is the core set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subset {
    pub id: u32,
    pub title: String,
    pub num_achievements: u32,
    pub num_leaderboards: u32,
    pub badge_name: Option<SubsetBadge>,
    pub badge_url: Option<String>,
}

/// The logged in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub display_name: String,
    pub username: String,
    pub token: String,
    pub score: u32,
    pub score_softcore: u32,
    pub num_unread_messages: u32,
    pub avatar_url: Option<String>,
}

/// Achievement counts for the loaded game in the current mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGameSummary {
    pub num_core_achievements: u32,
    pub num_unofficial_achievements: u32,
    pub num_unlocked_achievements: u32,
    pub num_unsupported_achievements: u32,
    pub points_core: u32,
    pub points_unlocked: u32,
}

impl UserGameSummary {
    pub fn is_complete(&self) -> bool {
        self.num_core_achievements > 0
            && self.num_unlocked_achievements == self.num_core_achievements
    }
}

/// One game's unlock counts from the all-progress query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgressEntry {
    pub game_id: u32,
    pub num_achievements: u32,
    pub num_unlocked_achievements: u32,
    pub num_unlocked_achievements_hardcore: u32,
}

/// One known content hash from the hash library query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashEntry {
    pub hash: GameHash,
    pub game_id: u32,
}

/// Media URLs derived from badge and user names.
pub(crate) mod media {
    pub fn achievement_badge(media_host: &str, badge: &str, locked: bool) -> String {
        let suffix = if locked { "_lock" } else { "" };
        format!("{}/Badge/{badge}{suffix}.png", media_host.trim_end_matches('/'))
    }

    pub fn game_image(media_host: &str, badge: &str) -> String {
        format!("{}/Images/{badge}.png", media_host.trim_end_matches('/'))
    }

    pub fn user_avatar(media_host: &str, username: &str) -> String {
        format!("{}/UserPic/{username}.png", media_host.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_urls() {
        assert_eq!(
            media::achievement_badge("https://m.example/", "00123", true),
            "https://m.example/Badge/00123_lock.png"
        );
        assert_eq!(
            media::game_image("https://m.example", "000042"),
            "https://m.example/Images/000042.png"
        );
        assert_eq!(
            media::user_avatar("https://m.example", "alice"),
            "https://m.example/UserPic/alice.png"
        );
    }

    #[test]
    fn test_summary_complete() {
        let mut summary = UserGameSummary {
            num_core_achievements: 2,
            num_unlocked_achievements: 1,
            ..Default::default()
        };
        assert!(!summary.is_complete());
        summary.num_unlocked_achievements = 2;
        assert!(summary.is_complete());
        assert!(!UserGameSummary::default().is_complete());
    }
}
