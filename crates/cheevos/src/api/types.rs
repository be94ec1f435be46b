use std::collections::HashMap;

use serde::Deserialize;

use crate::model::{HashEntry, Scoreboard, ScoreboardEntry, UserProgressEntry, ValueFormat, format_value};
use crate::text::GameHash;

/// Achievement flag value for the core set.
pub(crate) const FLAG_CORE: u32 = 3;
/// Achievement flag value for unofficial achievements.
pub(crate) const FLAG_UNOFFICIAL: u32 = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct LoginResponse {
    pub user: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub token: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub softcore_score: u32,
    #[serde(default)]
    pub messages: u32,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GameIdResponse {
    #[serde(rename = "GameID", default)]
    pub game_id: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GameSetsResponse {
    #[serde(rename = "GameId")]
    pub game_id: u32,
    pub title: String,
    #[serde(default)]
    pub console_id: u32,
    #[serde(default)]
    pub image_icon_url: Option<String>,
    #[serde(default)]
    pub rich_presence_patch: Option<String>,
    #[serde(default)]
    pub sets: Vec<SetData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SetData {
    pub achievement_set_id: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(default)]
    pub image_icon_url: Option<String>,
    #[serde(default)]
    pub achievements: Vec<AchievementData>,
    #[serde(default)]
    pub leaderboards: Vec<LeaderboardData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AchievementData {
    #[serde(rename = "ID")]
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub points: u32,
    pub mem_addr: String,
    #[serde(default)]
    pub badge_name: String,
    #[serde(rename = "BadgeURL", default)]
    pub badge_url: Option<String>,
    #[serde(rename = "BadgeLockedURL", default)]
    pub badge_locked_url: Option<String>,
    #[serde(default = "default_flags")]
    pub flags: u32,
    #[serde(default)]
    pub rarity: f32,
    #[serde(default)]
    pub rarity_hardcore: f32,
}

fn default_flags() -> u32 {
    FLAG_CORE
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct LeaderboardData {
    #[serde(rename = "ID")]
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub mem: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub lower_is_better: bool,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct StartSessionResponse {
    #[serde(default)]
    pub unlocks: Vec<UnlockEntry>,
    #[serde(default)]
    pub hardcore_unlocks: Vec<UnlockEntry>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct UnlockEntry {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(default)]
    pub when: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AwardResponse {
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub softcore_score: u32,
    #[serde(default)]
    pub achievements_remaining: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SubmitLeaderboardResponse {
    pub response: SubmitLeaderboardData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SubmitLeaderboardData {
    pub score: i32,
    #[serde(default)]
    pub best_score: i32,
    #[serde(default)]
    pub rank_info: RankInfo,
    #[serde(default)]
    pub top_entries: Vec<TopEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RankInfo {
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub num_entries: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct TopEntry {
    pub user: String,
    pub score: i32,
    pub rank: u32,
}

impl SubmitLeaderboardData {
    pub fn into_scoreboard(self, leaderboard_id: u32, format: ValueFormat) -> Scoreboard {
        Scoreboard {
            leaderboard_id,
            submitted_score: format_value(format, self.score),
            best_score: format_value(format, self.best_score),
            new_rank: self.rank_info.rank,
            num_entries: self.rank_info.num_entries,
            top_entries: self
                .top_entries
                .into_iter()
                .map(|entry| ScoreboardEntry {
                    username: entry.user,
                    rank: entry.rank,
                    score: format_value(format, entry.score),
                })
                .collect(),
        }
    }
}

/// Success envelope with no payload we care about.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct EmptyResponse {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AllProgressResponse {
    #[serde(default)]
    pub response: HashMap<String, ProgressData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ProgressData {
    #[serde(default)]
    pub achievements: u32,
    #[serde(default)]
    pub unlocked: u32,
    #[serde(default)]
    pub unlocked_hardcore: u32,
}

impl AllProgressResponse {
    /// Entries sorted by game id; keys that are not numeric are skipped.
    pub fn into_entries(self) -> Vec<UserProgressEntry> {
        let mut entries: Vec<UserProgressEntry> = self
            .response
            .into_iter()
            .filter_map(|(key, data)| {
                let game_id = key.parse().ok()?;
                Some(UserProgressEntry {
                    game_id,
                    num_achievements: data.achievements,
                    num_unlocked_achievements: data.unlocked,
                    num_unlocked_achievements_hardcore: data.unlocked_hardcore,
                })
            })
            .collect();
        entries.sort_by_key(|entry| entry.game_id);
        entries
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HashLibraryResponse {
    #[serde(rename = "MD5List", default)]
    pub md5_list: HashMap<String, u32>,
}

impl HashLibraryResponse {
    /// Entries sorted by hash; hashes longer than the hash limit are skipped.
    pub fn into_entries(self) -> Vec<HashEntry> {
        let mut entries: Vec<HashEntry> = self
            .md5_list
            .into_iter()
            .filter_map(|(hash, game_id)| {
                Some(HashEntry {
                    hash: GameHash::new(hash).ok()?,
                    game_id,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.hash.as_str().cmp(b.hash.as_str()));
        entries
    }
}
