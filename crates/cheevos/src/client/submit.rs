//! Unlock and score submission, plus the periodic ping.

use std::sync::Arc;

use tracing::{debug, warn};

use super::Shared;
use crate::api::{
    self, API_AWARD_ACHIEVEMENT, API_PING, API_SUBMIT_LEADERBOARD, ApiRequest, AwardResponse,
    Credentials, EmptyResponse, SubmitLeaderboardResponse,
};
use crate::error::Result;
use crate::event::Event;
use crate::session::{Job, Submission, SubmissionKind};

/// Successful submission results.
enum Accepted {
    Award(Option<AwardResponse>),
    Leaderboard(Event),
}

impl Shared {
    /// Start the network work decided during a frame or idle tick.
    pub(crate) fn spawn_jobs(self: &Arc<Self>, jobs: Vec<Job>) {
        for job in jobs {
            let shared = Arc::clone(self);
            match job {
                Job::Submit(submission) => {
                    let name = match submission.kind {
                        SubmissionKind::Award { .. } => "award",
                        SubmissionKind::Leaderboard { .. } => "submit-score",
                    };
                    self.executor
                        .spawn(name, Box::new(move || shared.run_submission(submission)));
                }
                Job::Ping {
                    game_id,
                    game_hash,
                    rich_presence,
                    hardcore,
                } => {
                    self.executor.spawn(
                        "ping",
                        Box::new(move || {
                            shared.run_ping(game_id, &game_hash, &rich_presence, hardcore)
                        }),
                    );
                }
            }
        }
    }

    fn run_submission(&self, submission: Submission) {
        let result = self
            .with_session(|session| session.credentials())
            .and_then(|credentials| self.send_submission(&submission, &credentials));

        self.with_session(|session| {
            let result = result.map(|accepted| match accepted {
                Accepted::Award(response) => {
                    if let (Some(response), Some(user)) = (response, session.user.as_mut()) {
                        user.score = response.score;
                        user.score_softcore = response.softcore_score;
                    }
                    None
                }
                Accepted::Leaderboard(event) => Some(event),
            });
            session.finish_submission(&submission, result);
        });
    }

    fn send_submission(
        &self,
        submission: &Submission,
        credentials: &Credentials,
    ) -> Result<Accepted> {
        match submission.kind {
            SubmissionKind::Award {
                achievement_id,
                hardcore,
            } => {
                let request = ApiRequest::new(API_AWARD_ACHIEVEMENT)
                    .auth(credentials)
                    .param("a", achievement_id)
                    .param("h", u8::from(hardcore))
                    .param("m", &submission.game_hash);
                match api::call::<AwardResponse>(self.transport.as_ref(), &self.config, &request)
                {
                    Ok(response) => Ok(Accepted::Award(Some(response))),
                    Err(e) if api::is_already_unlocked(&e) => {
                        debug!(achievement_id, "server already has the unlock");
                        Ok(Accepted::Award(None))
                    }
                    Err(e) => Err(e),
                }
            }
            SubmissionKind::Leaderboard {
                leaderboard_id,
                score,
                format,
            } => {
                let request = ApiRequest::new(API_SUBMIT_LEADERBOARD)
                    .auth(credentials)
                    .param("i", leaderboard_id)
                    .param("s", score)
                    .param("m", &submission.game_hash);
                let response: SubmitLeaderboardResponse =
                    api::call(self.transport.as_ref(), &self.config, &request)?;
                Ok(Accepted::Leaderboard(Event::LeaderboardScoreboard {
                    leaderboard_id,
                    scoreboard: response.response.into_scoreboard(leaderboard_id, format),
                }))
            }
        }
    }

    fn run_ping(&self, game_id: u32, game_hash: &str, rich_presence: &str, hardcore: bool) {
        let credentials = match self.session.lock().credentials() {
            Ok(credentials) => credentials,
            Err(_) => return,
        };
        let mut request = ApiRequest::new(API_PING)
            .auth(&credentials)
            .param("g", game_id)
            .param("m", game_hash)
            .param("h", u8::from(hardcore));
        if !rich_presence.is_empty() {
            request = request.param("a", rich_presence);
        }
        if let Err(e) = api::call::<EmptyResponse>(self.transport.as_ref(), &self.config, &request)
        {
            warn!(game_id, error = %e, "ping failed");
        }
    }
}
