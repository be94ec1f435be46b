//! Session state machine.
//!
//! [`Session`] is the single mutable root of the runtime. The client keeps
//! it behind one mutex; frame evaluation and every async completion mutate
//! it only while holding that lock. Events produced by a mutation are
//! buffered here and handed to the dispatcher before the lock is released.

mod build;
mod progress;
mod records;
mod submission;

pub(crate) use build::{StageOptions, StagedGame, stage_game};
pub(crate) use records::{AchievementRecord, LeaderboardRecord, RichPresence};
pub(crate) use submission::{Submission, SubmissionKind, SubmissionQueue};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::{debug, error, info, warn};

use crate::config::{ClientConfig, LogLevel};
use crate::error::{Error, Result};
use crate::event::{Event, LoadFailureReason};
use crate::model::{
    Achievement, AchievementBucket, AchievementCategory, AchievementState, GameInfo, Leaderboard,
    LeaderboardTracker, ListGrouping, LoadGameState, Subset, UserGameSummary,
    UserInfo, build_buckets,
};

/// Frames between pauses allowed in hardcore (20 s at 60 fps).
pub const PAUSE_INTERVAL_FRAMES: u64 = 1200;

/// Coarse lifecycle of the loaded game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display,
)]
pub enum LoadState {
    #[default]
    NoGame,
    Identifying,
    Loading,
    Loaded,
}

/// Runtime mode switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modes {
    pub hardcore: bool,
    pub encore: bool,
    pub spectator: bool,
    pub unofficial: bool,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr,
    Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Hardcore,
    Encore,
    Spectator,
    Unofficial,
}

/// Session mutating operations; at most one runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum OpKind {
    Login,
    LoadGame,
    ChangeMedia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingOp {
    pub token: u64,
    pub kind: OpKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProgressIndicator {
    pub achievement_id: u32,
    pub frames_left: u32,
}

/// Network work decided under the lock and started after it is released.
#[derive(Debug, Clone)]
pub(crate) enum Job {
    Submit(Submission),
    Ping {
        game_id: u32,
        game_hash: String,
        rich_presence: String,
        hardcore: bool,
    },
}

pub(crate) struct Session {
    pub config: Arc<ClientConfig>,
    pub load_state: LoadState,
    pub load_progress: LoadGameState,
    pub game: Option<GameInfo>,
    pub subsets: Vec<Subset>,
    pub achievements: Vec<AchievementRecord>,
    pub leaderboards: Vec<LeaderboardRecord>,
    pub rich_presence: Option<RichPresence>,
    pub user: Option<UserInfo>,
    pub modes: Modes,
    /// Encore flag the loaded game was set up with
    pub loaded_encore: bool,
    pub trackers: BTreeMap<u32, LeaderboardTracker>,
    pub challenge_indicators: BTreeSet<u32>,
    pub progress_indicator: Option<ProgressIndicator>,
    pub reset_pending: bool,
    pub frame_count: u64,
    pub last_pause_frame: Option<u64>,
    pub op: Option<PendingOp>,
    pub submissions: SubmissionQueue,
    pub last_ping: Option<Instant>,
    next_token: u64,
    next_tracker_id: u32,
    events: Vec<Event>,
}

impl Session {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        let modes = Modes {
            hardcore: config.hardcore,
            encore: config.encore,
            spectator: config.spectator,
            unofficial: config.unofficial,
        };
        Self {
            config,
            load_state: LoadState::NoGame,
            load_progress: LoadGameState::None,
            game: None,
            subsets: Vec::new(),
            achievements: Vec::new(),
            leaderboards: Vec::new(),
            rich_presence: None,
            user: None,
            modes,
            loaded_encore: false,
            trackers: BTreeMap::new(),
            challenge_indicators: BTreeSet::new(),
            progress_indicator: None,
            reset_pending: false,
            frame_count: 0,
            last_pause_frame: None,
            op: None,
            submissions: SubmissionQueue::default(),
            last_ping: None,
            next_token: 0,
            next_tracker_id: 0,
            events: Vec::new(),
        }
    }

    // ---- events and logging ----

    pub fn emit(&mut self, event: Event) {
        debug!(event = event.name(), "emit");
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Log through tracing and, if the configured level admits it, to the
    /// host as an event.
    pub fn log(&mut self, level: LogLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            LogLevel::Error => error!("{}", text),
            LogLevel::Warning => warn!("{}", text),
            LogLevel::Info => info!("{}", text),
            LogLevel::Verbose => debug!("{}", text),
            LogLevel::None => return,
        }
        if self.config.log_level.admits(level) {
            self.events.push(Event::LogMessage { level, text });
        }
    }

    // ---- operation slot ----

    /// Claim the mutating-operation slot.
    pub fn begin_op(&mut self, kind: OpKind) -> Result<u64> {
        if let Some(op) = self.op {
            debug!(running = %op.kind, requested = %kind, "operation rejected, busy");
            return Err(Error::Busy);
        }
        self.next_token += 1;
        let token = self.next_token;
        self.op = Some(PendingOp { token, kind });
        Ok(token)
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.op.is_some_and(|op| op.token == token)
    }

    /// Release the slot if `token` still owns it. Returns whether it did.
    pub fn finish_op(&mut self, token: u64) -> bool {
        if !self.is_current(token) {
            return false;
        }
        if self.op.is_some_and(|op| op.kind == OpKind::LoadGame)
            && self.load_state != LoadState::Loaded
        {
            self.load_state = LoadState::NoGame;
        }
        self.op = None;
        true
    }

    /// Cancellation cleanup: release the slot and mark an unfinished load
    /// as aborted.
    pub fn abandon_op(&mut self, token: u64) {
        let was_load = self.op.is_some_and(|op| op.kind == OpKind::LoadGame);
        if self.finish_op(token) && was_load {
            self.load_progress = LoadGameState::Aborted;
        }
    }

    // ---- login ----

    pub fn credentials(&self) -> Result<crate::api::Credentials> {
        let user = self.user.as_ref().ok_or(Error::NotLoggedIn)?;
        Ok(crate::api::Credentials {
            username: user.username.clone(),
            token: user.token.clone(),
        })
    }

    pub fn logout(&mut self) {
        if let Some(op) = self.op {
            // drop whatever was in flight; its completion will find the
            // slot gone and resolve as aborted
            self.abandon_op(op.token);
        }
        if self.load_state == LoadState::Loaded {
            self.unload();
        }
        if let Some(user) = self.user.take() {
            self.log(LogLevel::Info, format!("{} logged out", user.username));
        }
    }

    // ---- load lifecycle ----

    /// Start a game load. Requires a login and no loaded game.
    pub fn begin_load(&mut self) -> Result<u64> {
        if self.user.is_none() {
            return Err(Error::NotLoggedIn);
        }
        match self.load_state {
            LoadState::NoGame => {}
            LoadState::Loaded => {
                return Err(Error::InvalidState(
                    "a game is already loaded, unload it first".to_string(),
                ));
            }
            LoadState::Identifying | LoadState::Loading => return Err(Error::Busy),
        }
        let token = self.begin_op(OpKind::LoadGame)?;
        self.load_state = LoadState::Identifying;
        self.load_progress = LoadGameState::IdentifyingGame;
        Ok(token)
    }

    /// Advance the visible load progress. Returns `false` if the load is no
    /// longer current (aborted or cancelled).
    pub fn advance_load(&mut self, token: u64, progress: LoadGameState) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.load_progress = progress;
        if progress != LoadGameState::IdentifyingGame {
            self.load_state = LoadState::Loading;
        }
        true
    }

    /// Swap in a staged game.
    pub fn commit_game(&mut self, staged: StagedGame) -> GameInfo {
        self.submissions.clear();
        self.install_game(staged)
    }

    fn install_game(&mut self, staged: StagedGame) -> GameInfo {
        self.hide_all_indicators();

        let game = staged.game.clone();
        self.game = Some(staged.game);
        self.subsets = staged.subsets;
        self.achievements = staged.achievements;
        self.leaderboards = staged.leaderboards;
        self.rich_presence = staged.rich_presence;
        self.loaded_encore = self.modes.encore;
        self.reset_pending = false;
        self.last_ping = Some(Instant::now());
        self.load_state = LoadState::Loaded;
        self.load_progress = LoadGameState::Done;

        self.log(
            LogLevel::Info,
            format!(
                "Loaded {} ({} achievements, {} leaderboards)",
                game,
                self.achievements.len(),
                self.leaderboards.len()
            ),
        );
        self.emit(Event::GameLoaded { game: game.clone() });
        game
    }

    pub fn fail_load(&mut self, error: &Error) {
        self.load_state = LoadState::NoGame;
        self.load_progress = LoadGameState::None;
        self.log(LogLevel::Error, format!("Failed to load game: {error}"));
        self.emit(Event::GameLoadFailed {
            reason: LoadFailureReason::from(error),
            code: error.code(),
            message: error.to_string(),
        });
    }

    /// Discard the loaded game, or abort a load in progress.
    pub fn unload_game(&mut self) -> Result<()> {
        match self.load_state {
            LoadState::NoGame => Err(Error::NoGameLoaded),
            LoadState::Identifying | LoadState::Loading => {
                if let Some(op) = self.op.filter(|op| op.kind == OpKind::LoadGame) {
                    self.abandon_op(op.token);
                }
                self.load_state = LoadState::NoGame;
                self.load_progress = LoadGameState::Aborted;
                self.log(LogLevel::Info, "Game load aborted");
                Ok(())
            }
            LoadState::Loaded => {
                self.unload();
                Ok(())
            }
        }
    }

    fn unload(&mut self) {
        if let Some(op) = self.op.filter(|op| op.kind == OpKind::ChangeMedia) {
            self.abandon_op(op.token);
        }
        let dropped = self.submissions.len();
        self.submissions.clear();

        let game = self.game.take();
        self.subsets.clear();
        self.achievements.clear();
        self.leaderboards.clear();
        self.rich_presence = None;
        self.trackers.clear();
        self.challenge_indicators.clear();
        self.progress_indicator = None;
        self.reset_pending = false;
        self.last_ping = None;
        self.load_state = LoadState::NoGame;
        self.load_progress = LoadGameState::None;

        if dropped > 0 {
            debug!(dropped, "discarded pending submissions on unload");
        }
        if let Some(game) = game {
            self.log(LogLevel::Info, format!("Unloaded {game}"));
        }
    }

    /// Replace the game data after a media change to a different game.
    pub fn swap_media_game(&mut self, staged: StagedGame) -> GameInfo {
        // pending unlocks belong to the old game and stay valid
        self.install_game(staged)
    }

    /// Media for the same game: only the hash changes.
    pub fn update_hash(&mut self, hash: crate::text::GameHash) -> Option<GameInfo> {
        let game = self.game.as_mut()?;
        game.hash = hash;
        Some(game.clone())
    }

    // ---- modes ----

    pub fn set_mode(&mut self, mode: Mode, enabled: bool) {
        match mode {
            Mode::Hardcore => self.set_hardcore(enabled),
            Mode::Encore => self.modes.encore = enabled,
            Mode::Spectator => self.modes.spectator = enabled,
            Mode::Unofficial => self.modes.unofficial = enabled,
        }
    }

    pub fn set_hardcore(&mut self, enabled: bool) {
        if self.modes.hardcore == enabled {
            return;
        }
        self.modes.hardcore = enabled;
        self.log(
            LogLevel::Info,
            format!("Hardcore {}", if enabled { "enabled" } else { "disabled" }),
        );
        if self.load_state == LoadState::Loaded && !self.reset_pending {
            self.reset_pending = true;
            self.emit(Event::ResetRequested);
        }
    }

    // ---- reset ----

    /// Emulator was reset: forget all evaluation state and re-arm.
    pub fn reset(&mut self) {
        if self.game.is_none() {
            self.reset_pending = false;
            return;
        }
        self.hide_all_indicators();
        let (hardcore, encore) = (self.modes.hardcore, self.loaded_encore);
        for record in &mut self.achievements {
            record.rearm(hardcore, encore);
        }
        for record in &mut self.leaderboards {
            record.rearm(hardcore);
        }
        if let Some(rp) = self.rich_presence.as_mut() {
            rp.memo.clear();
        }
        self.reset_pending = false;
        self.log(LogLevel::Verbose, "Runtime reset");
    }

    /// Hide every visible indicator and tracker, emitting hide events.
    pub fn hide_all_indicators(&mut self) {
        let challenges = std::mem::take(&mut self.challenge_indicators);
        for id in challenges {
            if let Some(record) = self.achievement(id) {
                let achievement = record.info.clone();
                self.emit(Event::ChallengeIndicatorHide { achievement });
            }
        }
        if let Some(indicator) = self.progress_indicator.take() {
            self.emit(Event::ProgressIndicatorHide {
                achievement_id: indicator.achievement_id,
            });
        }
        let trackers = std::mem::take(&mut self.trackers);
        for tracker in trackers.into_values() {
            self.emit(Event::TrackerHide { tracker });
        }
        for record in &mut self.leaderboards {
            record.tracker = None;
        }
    }

    pub fn next_tracker_id(&mut self) -> u32 {
        self.next_tracker_id += 1;
        self.next_tracker_id
    }

    // ---- lookups ----

    pub fn achievement(&self, id: u32) -> Option<&AchievementRecord> {
        self.achievements.iter().find(|r| r.id() == id)
    }

    pub fn achievement_mut(&mut self, id: u32) -> Option<&mut AchievementRecord> {
        self.achievements.iter_mut().find(|r| r.id() == id)
    }

    pub fn leaderboard(&self, id: u32) -> Option<&LeaderboardRecord> {
        self.leaderboards.iter().find(|r| r.id() == id)
    }

    pub fn subset(&self, id: u32) -> Option<&Subset> {
        self.subsets.iter().find(|s| s.id == id)
    }

    // ---- queries ----

    pub fn achievement_list(
        &self,
        category: AchievementCategory,
        grouping: ListGrouping,
    ) -> Vec<AchievementBucket> {
        let snapshots: Vec<Achievement> =
            self.achievements.iter().map(|r| r.info.clone()).collect();
        build_buckets(&snapshots, &self.subsets, category, grouping, Utc::now())
    }

    pub fn leaderboard_list(&self) -> Vec<Leaderboard> {
        self.leaderboards
            .iter()
            .filter(|r| !r.info.hidden)
            .map(|r| r.info.clone())
            .collect()
    }

    pub fn user_game_summary(&self) -> UserGameSummary {
        let mut summary = UserGameSummary::default();
        let hardcore = self.modes.hardcore;
        for record in &self.achievements {
            let info = &record.info;
            match info.category {
                AchievementCategory::Unofficial => {
                    summary.num_unofficial_achievements += 1;
                    continue;
                }
                AchievementCategory::None => continue,
                _ => {}
            }
            summary.num_core_achievements += 1;
            summary.points_core += info.points;
            if info.unlocked.is_unlocked_in(hardcore) {
                summary.num_unlocked_achievements += 1;
                summary.points_unlocked += info.points;
            } else if info.state == AchievementState::Disabled {
                summary.num_unsupported_achievements += 1;
            }
        }
        summary
    }

    /// Whether the host needs to call `do_frame` at all.
    pub fn is_processing_required(&self) -> bool {
        self.achievements.iter().any(AchievementRecord::is_active)
            || self.leaderboards.iter().any(LeaderboardRecord::is_evaluated)
            || self.rich_presence.is_some()
    }

    /// Hardcore pause throttle. Records the pause when it is allowed.
    pub fn can_pause(&mut self) -> (bool, u32) {
        if !self.modes.hardcore || self.game.is_none() {
            return (true, 0);
        }
        if let Some(last) = self.last_pause_frame {
            let elapsed = self.frame_count.saturating_sub(last);
            if elapsed < PAUSE_INTERVAL_FRAMES {
                return (false, (PAUSE_INTERVAL_FRAMES - elapsed) as u32);
            }
        }
        self.last_pause_frame = Some(self.frame_count);
        (true, 0)
    }

    // ---- completion checks ----

    /// Emit subset/game completion for the subset of `achievement_id` if
    /// every core achievement in it is unlocked in the current mode.
    pub fn check_completion(&mut self, achievement_id: u32) {
        let Some(subset_id) = self.achievement(achievement_id).map(|r| r.info.subset_id) else {
            return;
        };
        let hardcore = self.modes.hardcore;
        let complete = self
            .achievements
            .iter()
            .filter(|r| r.info.subset_id == subset_id)
            .filter(|r| r.info.category == AchievementCategory::Core)
            .all(|r| r.info.unlocked.is_unlocked_in(hardcore));
        if !complete {
            return;
        }

        let is_core = self.subsets.first().is_some_and(|s| s.id == subset_id);
        if is_core {
            if let Some(game) = self.game.clone() {
                self.log(LogLevel::Info, format!("Completed {}", game.title));
                self.emit(Event::GameCompleted { game });
            }
        } else if let Some(subset) = self.subset(subset_id).cloned() {
            self.log(LogLevel::Info, format!("Completed subset {}", subset.title));
            self.emit(Event::SubsetCompleted { subset });
        }
    }

    /// Queue a submission unless spectating.
    pub fn queue_submission(&mut self, kind: SubmissionKind) {
        if self.modes.spectator {
            debug!(id = kind.related_id(), "spectator mode, submission suppressed");
            return;
        }
        let hash = self
            .game
            .as_ref()
            .map(|g| g.hash.to_string())
            .unwrap_or_default();
        self.submissions.push(kind, hash);
    }

    /// Periodic bookkeeping shared by `do_frame` and `idle`.
    pub fn bookkeeping(&mut self, now: Instant) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .submissions
            .take_due(now)
            .into_iter()
            .map(Job::Submit)
            .collect();

        if let (Some(game), Some(last)) = (self.game.as_ref(), self.last_ping) {
            if self.user.is_some() && now.duration_since(last) >= self.config.ping_interval() {
                jobs.push(Job::Ping {
                    game_id: game.id,
                    game_hash: game.hash.to_string(),
                    rich_presence: self
                        .rich_presence
                        .as_ref()
                        .map(|rp| rp.message.clone())
                        .unwrap_or_default(),
                    hardcore: self.modes.hardcore,
                });
                self.last_ping = Some(now);
            }
        }
        jobs
    }

    /// Apply the outcome of a submission. Responses for submissions the
    /// queue no longer holds (the game was unloaded meanwhile) are dropped.
    pub fn finish_submission(
        &mut self,
        submission: &Submission,
        result: Result<Option<Event>>,
    ) {
        if !self.submissions.owns(submission) {
            debug!(id = submission.id, "submission for unloaded game dropped");
            return;
        }
        match result {
            Ok(event) => {
                if self.submissions.remove(submission.id).is_none() {
                    return;
                }
                if let Some(event) = event {
                    self.emit(event);
                }
                if self.submissions.is_empty() && self.submissions.set_disconnected(false) {
                    self.log(LogLevel::Info, "Reconnected to server");
                    self.emit(Event::ClientReconnected);
                }
            }
            Err(e) if e.is_retryable() => {
                let delay = self.config.retry_delay(submission.attempts.saturating_sub(1));
                if !self.submissions.reschedule(submission.id, delay) {
                    return;
                }
                self.log(
                    LogLevel::Warning,
                    format!("Submission failed ({e}), retrying in {delay:?}"),
                );
                if self.submissions.set_disconnected(true) {
                    self.emit(Event::ClientDisconnected);
                }
            }
            Err(e) => {
                if self.submissions.remove(submission.id).is_none() {
                    return;
                }
                let api = match submission.kind {
                    SubmissionKind::Award { .. } => crate::api::API_AWARD_ACHIEVEMENT,
                    SubmissionKind::Leaderboard { .. } => crate::api::API_SUBMIT_LEADERBOARD,
                };
                self.log(LogLevel::Error, format!("{api} rejected: {e}"));
                self.emit(Event::ServerError {
                    api: api.to_string(),
                    message: e.to_string(),
                    related_id: Some(submission.kind.related_id()),
                });
                if self.submissions.is_empty() && self.submissions.set_disconnected(false) {
                    self.emit(Event::ClientReconnected);
                }
            }
        }
    }
}
