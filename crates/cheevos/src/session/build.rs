//! Turning service responses into session tables.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::records::{AchievementRecord, LeaderboardRecord, RichPresence};
use crate::api::{FLAG_UNOFFICIAL, GameSetsResponse, SetData, StartSessionResponse};
use crate::console::ConsoleId;
use crate::eval::{LeaderboardStatus, TriggerEngine, TriggerMemo, TriggerStatus};
use crate::model::{
    Achievement, AchievementCategory, AchievementState, BucketType, GameInfo, Leaderboard,
    LeaderboardFormat, LeaderboardState, Subset, UnlockedMode, ValueFormat, media,
};
use crate::text::{BadgeName, GameHash, MeasuredProgress, SubsetBadge, TrackerDisplay};

/// Everything a successful load swaps in, built before the swap.
#[derive(Debug)]
pub(crate) struct StagedGame {
    pub game: GameInfo,
    pub subsets: Vec<Subset>,
    pub achievements: Vec<AchievementRecord>,
    pub leaderboards: Vec<LeaderboardRecord>,
    pub rich_presence: Option<RichPresence>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct StageOptions<'a> {
    pub media_host: &'a str,
    pub hardcore: bool,
    pub encore: bool,
    pub unofficial: bool,
}

/// Last path segment of an image URL without its extension.
fn badge_from_url(url: &str) -> &str {
    let file = url.rsplit('/').next().unwrap_or(url);
    file.split('.').next().unwrap_or(file)
}

fn unlock_time(when: i64) -> Option<DateTime<Utc>> {
    if when <= 0 {
        return None;
    }
    DateTime::from_timestamp(when, 0)
}

pub(crate) fn stage_game(
    sets: GameSetsResponse,
    unlocks: &StartSessionResponse,
    hash: GameHash,
    console_hint: ConsoleId,
    engine: &dyn TriggerEngine,
    options: StageOptions<'_>,
) -> StagedGame {
    let mut unlocked: HashMap<u32, (UnlockedMode, i64)> = HashMap::new();
    for entry in &unlocks.unlocks {
        let slot = unlocked.entry(entry.id).or_insert((UnlockedMode::None, 0));
        slot.0 = slot.0.with_unlock(false);
        slot.1 = slot.1.max(entry.when);
    }
    for entry in &unlocks.hardcore_unlocks {
        let slot = unlocked.entry(entry.id).or_insert((UnlockedMode::None, 0));
        slot.0 = slot.0.with_unlock(true);
        slot.1 = slot.1.max(entry.when);
    }

    let badge_name = sets
        .image_icon_url
        .as_deref()
        .map(badge_from_url)
        .unwrap_or_default()
        .to_string();
    let image_url = sets.image_icon_url.clone().or_else(|| {
        (!badge_name.is_empty()).then(|| media::game_image(options.media_host, &badge_name))
    });
    let console_id = ConsoleId::from_u32(sets.console_id)
        .filter(|id| *id != ConsoleId::Unknown)
        .unwrap_or(console_hint);

    let game = GameInfo {
        id: sets.game_id,
        console_id,
        title: sets.title.clone(),
        hash,
        badge_name,
        image_url,
    };

    let mut ordered: Vec<SetData> = sets.sets;
    // core set first, otherwise keep service order
    ordered.sort_by_key(|set| set.kind != "core");

    let mut subsets = Vec::with_capacity(ordered.len());
    let mut achievements = Vec::new();
    let mut leaderboards = Vec::new();

    for set in ordered {
        let subset_id = set.achievement_set_id;
        let mut num_achievements = 0;

        for data in set.achievements {
            let category = if data.flags == FLAG_UNOFFICIAL {
                AchievementCategory::Unofficial
            } else {
                AchievementCategory::Core
            };
            if category == AchievementCategory::Unofficial && !options.unofficial {
                continue;
            }

            let valid = match engine.validate_trigger(&data.mem_addr) {
                Ok(()) => true,
                Err(code) => {
                    warn!(achievement = data.id, %code, "Achievement definition rejected");
                    false
                }
            };
            let (mode, when) = unlocked
                .get(&data.id)
                .copied()
                .unwrap_or((UnlockedMode::None, 0));
            let badge_url = data.badge_url.clone().or_else(|| {
                (!data.badge_name.is_empty())
                    .then(|| media::achievement_badge(options.media_host, &data.badge_name, false))
            });
            let badge_locked_url = data.badge_locked_url.clone().or_else(|| {
                (!data.badge_name.is_empty())
                    .then(|| media::achievement_badge(options.media_host, &data.badge_name, true))
            });

            let mut record = AchievementRecord {
                info: Achievement {
                    id: data.id,
                    subset_id,
                    title: data.title,
                    description: data.description,
                    badge_name: BadgeName::truncated(&data.badge_name),
                    points: data.points,
                    state: AchievementState::Inactive,
                    category,
                    bucket: BucketType::Unknown,
                    unlock_time: unlock_time(when),
                    measured_progress: MeasuredProgress::default(),
                    measured_percent: 0.0,
                    unlocked: mode,
                    rarity: data.rarity,
                    rarity_hardcore: data.rarity_hardcore,
                    badge_url,
                    badge_locked_url,
                },
                definition: data.mem_addr,
                valid,
                memo: TriggerMemo::new(),
                status: TriggerStatus::Inactive,
                measured: None,
            };
            record.rearm(options.hardcore, options.encore);
            achievements.push(record);
            num_achievements += 1;
        }

        let num_leaderboards = set.leaderboards.len() as u32;
        for data in set.leaderboards {
            let valid = match engine.validate_leaderboard(&data.mem) {
                Ok(()) => true,
                Err(code) => {
                    warn!(leaderboard = data.id, %code, "Leaderboard definition rejected");
                    false
                }
            };
            let value_format = ValueFormat::parse(&data.format);
            let mut record = LeaderboardRecord {
                info: Leaderboard {
                    id: data.id,
                    subset_id,
                    title: data.title,
                    description: data.description,
                    tracker_value: TrackerDisplay::default(),
                    state: LeaderboardState::Inactive,
                    format: LeaderboardFormat::from(value_format),
                    value_format,
                    lower_is_better: data.lower_is_better,
                    hidden: data.hidden,
                },
                definition: data.mem,
                valid,
                memo: TriggerMemo::new(),
                status: LeaderboardStatus::Inactive,
                value: 0,
                tracker: None,
            };
            record.rearm(options.hardcore);
            leaderboards.push(record);
        }

        subsets.push(Subset {
            id: subset_id,
            title: set.title.unwrap_or_else(|| sets.title.clone()),
            num_achievements,
            num_leaderboards,
            badge_name: set
                .image_icon_url
                .as_deref()
                .map(|url| SubsetBadge::truncated(badge_from_url(url))),
            badge_url: set.image_icon_url,
        });
    }

    let rich_presence = sets
        .rich_presence_patch
        .filter(|script| !script.trim().is_empty())
        .and_then(|script| match engine.validate_rich_presence(&script) {
            Ok(()) => Some(RichPresence {
                script,
                memo: TriggerMemo::new(),
                message: String::new(),
            }),
            Err(code) => {
                warn!(%code, "Rich presence script rejected");
                None
            }
        });

    StagedGame {
        game,
        subsets,
        achievements,
        leaderboards,
        rich_presence,
    }
}
