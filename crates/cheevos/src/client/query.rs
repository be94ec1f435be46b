//! Read-only views of the session. Every value returned is a snapshot.

use super::Client;
use crate::model::{
    Achievement, AchievementBucket, AchievementCategory, GameInfo, Leaderboard,
    LeaderboardTracker, ListGrouping, LoadGameState, Subset, UserGameSummary, UserInfo,
};
use crate::session::LoadState;

impl Client {
    pub fn is_logged_in(&self) -> bool {
        self.shared.session.lock().user.is_some()
    }

    pub fn user_info(&self) -> Option<UserInfo> {
        self.shared.session.lock().user.clone()
    }

    /// Token to pass to a later [`Credential::Token`](super::Credential)
    /// login.
    pub fn login_token(&self) -> Option<String> {
        self.shared
            .session
            .lock()
            .user
            .as_ref()
            .map(|u| u.token.clone())
    }

    pub fn load_state(&self) -> LoadState {
        self.shared.session.lock().load_state
    }

    /// Finer grained progress of the current (or last) load.
    pub fn load_game_state(&self) -> LoadGameState {
        self.shared.session.lock().load_progress
    }

    pub fn is_game_loaded(&self) -> bool {
        self.load_state() == LoadState::Loaded
    }

    pub fn game_info(&self) -> Option<GameInfo> {
        self.shared.session.lock().game.clone()
    }

    pub fn subset_info(&self, id: u32) -> Option<Subset> {
        self.shared.session.lock().subset(id).cloned()
    }

    pub fn subsets(&self) -> Vec<Subset> {
        self.shared.session.lock().subsets.clone()
    }

    pub fn achievement_info(&self, id: u32) -> Option<Achievement> {
        self.shared
            .session
            .lock()
            .achievement(id)
            .map(|r| r.info.clone())
    }

    pub fn leaderboard_info(&self, id: u32) -> Option<Leaderboard> {
        self.shared
            .session
            .lock()
            .leaderboard(id)
            .map(|r| r.info.clone())
    }

    /// Achievements grouped for display.
    pub fn achievement_list(
        &self,
        category: AchievementCategory,
        grouping: ListGrouping,
    ) -> Vec<AchievementBucket> {
        self.shared
            .session
            .lock()
            .achievement_list(category, grouping)
    }

    /// Visible leaderboards in service order.
    pub fn leaderboard_list(&self) -> Vec<Leaderboard> {
        self.shared.session.lock().leaderboard_list()
    }

    pub fn has_leaderboards(&self) -> bool {
        let session = self.shared.session.lock();
        session.leaderboards.iter().any(|r| !r.info.hidden)
    }

    pub fn active_trackers(&self) -> Vec<LeaderboardTracker> {
        self.shared
            .session
            .lock()
            .trackers
            .values()
            .cloned()
            .collect()
    }

    pub fn has_rich_presence(&self) -> bool {
        self.shared.session.lock().rich_presence.is_some()
    }

    /// Last evaluated rich presence message (empty before the first frame).
    pub fn rich_presence_message(&self) -> Option<String> {
        self.shared
            .session
            .lock()
            .rich_presence
            .as_ref()
            .map(|rp| rp.message.clone())
    }

    /// Unlock counts and points for the current mode.
    pub fn user_game_summary(&self) -> UserGameSummary {
        self.shared.session.lock().user_game_summary()
    }

    /// Whether [`Client::do_frame`] has anything to evaluate.
    pub fn is_processing_required(&self) -> bool {
        self.shared.session.lock().is_processing_required()
    }

    /// Submissions not yet accepted by the server.
    pub fn pending_submissions(&self) -> usize {
        self.shared.session.lock().submissions.len()
    }

    /// Whether a submission is waiting out a network failure.
    pub fn is_disconnected(&self) -> bool {
        self.shared.session.lock().submissions.is_disconnected()
    }
}
