use chrono::{DateTime, Utc};

use crate::eval::{LeaderboardStatus, Measured, TriggerMemo, TriggerStatus};
use crate::model::{
    Achievement, AchievementState, Leaderboard, LeaderboardState, classify, format_value,
};
use crate::text::MeasuredProgress;

/// Runtime side of one achievement: the current snapshot plus evaluation
/// state the host never sees.
#[derive(Debug, Clone)]
pub(crate) struct AchievementRecord {
    pub info: Achievement,
    pub definition: String,
    /// Definition passed validation at load
    pub valid: bool,
    pub memo: TriggerMemo,
    pub status: TriggerStatus,
    pub measured: Option<Measured>,
}

impl AchievementRecord {
    pub fn id(&self) -> u32 {
        self.info.id
    }

    /// Replace the snapshot with an edited copy and re-derive its bucket.
    pub fn update(&mut self, edit: impl FnOnce(&mut Achievement)) {
        let mut next = self.info.clone();
        edit(&mut next);
        next.bucket = classify(
            next.state,
            next.category,
            next.unlock_time,
            next.measured_percent,
            self.status == TriggerStatus::Primed,
            Utc::now(),
        );
        self.info = next;
    }

    pub fn set_measured(&mut self, measured: Option<Measured>) {
        self.measured = measured;
        self.update(|a| match measured {
            Some(m) if m.target > 0 => {
                a.measured_progress = MeasuredProgress::truncated(&m.to_string());
                a.measured_percent = m.percent();
            }
            _ => {
                a.measured_progress = MeasuredProgress::default();
                a.measured_percent = 0.0;
            }
        });
    }

    /// Forget evaluation state and derive the state for the given mode.
    pub fn rearm(&mut self, hardcore: bool, encore: bool) {
        self.memo.clear();
        self.status = TriggerStatus::Inactive;
        self.measured = None;
        let state = if !self.valid {
            AchievementState::Disabled
        } else if self.info.unlocked.is_unlocked_in(hardcore) && !encore {
            AchievementState::Unlocked
        } else {
            AchievementState::Active
        };
        self.update(|a| {
            a.state = state;
            a.measured_progress = MeasuredProgress::default();
            a.measured_percent = 0.0;
        });
    }

    pub fn record_unlock(&mut self, hardcore: bool, when: DateTime<Utc>) {
        self.update(|a| {
            a.state = AchievementState::Unlocked;
            a.unlocked = a.unlocked.with_unlock(hardcore);
            a.unlock_time = Some(when);
        });
    }

    pub fn is_active(&self) -> bool {
        self.info.state == AchievementState::Active
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LeaderboardRecord {
    pub info: Leaderboard,
    pub definition: String,
    pub valid: bool,
    pub memo: TriggerMemo,
    pub status: LeaderboardStatus,
    pub value: i32,
    pub tracker: Option<u32>,
}

impl LeaderboardRecord {
    pub fn id(&self) -> u32 {
        self.info.id
    }

    pub fn update(&mut self, edit: impl FnOnce(&mut Leaderboard)) {
        let mut next = self.info.clone();
        edit(&mut next);
        self.info = next;
    }

    pub fn set_value(&mut self, value: i32) {
        self.value = value;
        let display = format_value(self.info.value_format, value);
        self.update(|lb| lb.tracker_value = display);
    }

    /// Leaderboards only run in hardcore.
    pub fn rearm(&mut self, hardcore: bool) {
        self.memo.clear();
        self.status = LeaderboardStatus::Inactive;
        self.value = 0;
        self.tracker = None;
        let state = if !self.valid {
            LeaderboardState::Disabled
        } else if hardcore {
            LeaderboardState::Active
        } else {
            LeaderboardState::Inactive
        };
        self.update(|lb| {
            lb.state = state;
            lb.tracker_value = Default::default();
        });
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(
            self.info.state,
            LeaderboardState::Active | LeaderboardState::Tracking
        )
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RichPresence {
    pub script: String,
    pub memo: TriggerMemo,
    pub message: String,
}
