//! Achievement lists grouped for display.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Achievement, AchievementCategory, AchievementState, BucketType, Subset};

/// Seconds an unlock is listed under "Recently Unlocked".
pub const RECENT_UNLOCK_SECS: i64 = 600;

/// Measured percentage from which a locked achievement is "Almost There".
pub const ALMOST_THERE_PERCENT: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ListGrouping {
    /// Locked / unlocked per subset
    #[default]
    LockState,
    /// Adds active challenges, recent unlocks and almost-there buckets
    Progress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementBucket {
    pub bucket_type: BucketType,
    /// Zero for buckets shared by all subsets
    pub subset_id: u32,
    pub label: String,
    pub achievements: Vec<Achievement>,
}

/// Bucket an achievement belongs to.
pub(crate) fn classify(
    state: AchievementState,
    category: AchievementCategory,
    unlock_time: Option<DateTime<Utc>>,
    measured_percent: f32,
    challenge_active: bool,
    now: DateTime<Utc>,
) -> BucketType {
    match state {
        AchievementState::Unlocked => match unlock_time {
            Some(time) if now - time < Duration::seconds(RECENT_UNLOCK_SECS) => {
                BucketType::RecentlyUnlocked
            }
            _ => BucketType::Unlocked,
        },
        AchievementState::Disabled => BucketType::Unsupported,
        _ if category == AchievementCategory::Unofficial => BucketType::Unofficial,
        _ if challenge_active => BucketType::ActiveChallenge,
        _ if measured_percent >= ALMOST_THERE_PERCENT => BucketType::AlmostThere,
        _ => BucketType::Locked,
    }
}

fn bucket_for(achievement: &Achievement, grouping: ListGrouping, now: DateTime<Utc>) -> BucketType {
    let challenge_active = achievement.bucket == BucketType::ActiveChallenge;
    let bucket = classify(
        achievement.state,
        achievement.category,
        achievement.unlock_time,
        achievement.measured_percent,
        challenge_active,
        now,
    );
    match (grouping, bucket) {
        (ListGrouping::LockState, BucketType::RecentlyUnlocked) => BucketType::Unlocked,
        (ListGrouping::LockState, BucketType::ActiveChallenge | BucketType::AlmostThere) => {
            BucketType::Locked
        }
        _ => bucket,
    }
}

/// Group `achievements` into display buckets.
///
/// Shared buckets (active challenges, recent unlocks, almost there) come
/// first, then locked and unlocked per subset in subset order, then
/// unofficial and unsupported. Empty buckets are omitted.
pub fn build_buckets(
    achievements: &[Achievement],
    subsets: &[Subset],
    category: AchievementCategory,
    grouping: ListGrouping,
    now: DateTime<Utc>,
) -> Vec<AchievementBucket> {
    let core_subset = subsets.first().map(|s| s.id);
    let mut buckets: Vec<AchievementBucket> = Vec::new();

    let mut push = |bucket_type: BucketType, subset: Option<&Subset>, list: Vec<Achievement>| {
        if list.is_empty() {
            return;
        }
        let label = match subset {
            Some(subset) if Some(subset.id) != core_subset => {
                format!("{} - {}", subset.title, bucket_type)
            }
            _ => bucket_type.to_string(),
        };
        buckets.push(AchievementBucket {
            bucket_type,
            subset_id: subset.map(|s| s.id).unwrap_or(0),
            label,
            achievements: list,
        });
    };

    let classified: Vec<(BucketType, &Achievement)> = achievements
        .iter()
        .filter(|a| category.includes(a.category))
        .map(|a| (bucket_for(a, grouping, now), a))
        .collect();

    let collect = |bucket: BucketType, subset_id: Option<u32>| -> Vec<Achievement> {
        classified
            .iter()
            .filter(|(b, a)| *b == bucket && subset_id.is_none_or(|id| a.subset_id == id))
            .map(|(_, a)| (*a).clone())
            .collect()
    };

    for bucket in [
        BucketType::ActiveChallenge,
        BucketType::RecentlyUnlocked,
        BucketType::AlmostThere,
    ] {
        push(bucket, None, collect(bucket, None));
    }

    for subset in subsets {
        for bucket in [BucketType::Locked, BucketType::Unlocked] {
            push(bucket, Some(subset), collect(bucket, Some(subset.id)));
        }
    }

    for bucket in [BucketType::Unofficial, BucketType::Unsupported] {
        push(bucket, None, collect(bucket, None));
    }

    buckets
}
