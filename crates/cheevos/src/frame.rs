//! Frame driver.
//!
//! One `do_frame` evaluates every active achievement, every running
//! leaderboard and (once a second) rich presence against the memory the
//! host passes in, then performs the periodic bookkeeping `idle` also does.
//! Nothing here returns an error: bad definitions were disabled at load and
//! unreadable memory reads as zero.

use std::time::Instant;

use chrono::Utc;
use tracing::trace;

use crate::config::LogLevel;
use crate::eval::{LeaderboardStatus, TriggerEngine, TriggerStatus};
use crate::event::Event;
use crate::memory::{MemoryReader, ReadMemory};
use crate::model::{AchievementCategory, AchievementState, LeaderboardState, LeaderboardTracker};
use crate::session::{Job, LoadState, ProgressIndicator, Session, SubmissionKind};

/// Rich presence is re-evaluated every this many frames.
pub const RICH_PRESENCE_FRAMES: u64 = 60;

/// Evaluate one emulated frame.
pub(crate) fn do_frame(
    session: &mut Session,
    engine: &dyn TriggerEngine,
    memory: &dyn ReadMemory,
) -> Vec<Job> {
    if session.load_state != LoadState::Loaded {
        return idle(session);
    }
    if session.reset_pending {
        // evaluation waits for the host; network upkeep does not
        return idle(session);
    }

    session.frame_count += 1;
    let reader = MemoryReader::new(memory);

    evaluate_achievements(session, engine, &reader);
    evaluate_leaderboards(session, engine, &reader);
    tick_progress_indicator(session);
    if (session.frame_count - 1) % RICH_PRESENCE_FRAMES == 0 {
        evaluate_rich_presence(session, engine, &reader);
    }

    let short_reads = reader.short_reads();
    if short_reads > 0 {
        trace!(short_reads, frame = session.frame_count, "short memory reads");
    }

    session.bookkeeping(Instant::now())
}

/// Bookkeeping for a paused emulator.
pub(crate) fn idle(session: &mut Session) -> Vec<Job> {
    session.bookkeeping(Instant::now())
}

fn evaluate_achievements(
    session: &mut Session,
    engine: &dyn TriggerEngine,
    reader: &MemoryReader<'_>,
) {
    for index in 0..session.achievements.len() {
        if !session.achievements[index].is_active() {
            continue;
        }
        let record = &mut session.achievements[index];
        let previous = record.status;
        let outcome = engine.evaluate_trigger(&record.definition, &mut record.memo, reader);
        record.status = outcome.status;
        let id = record.id();

        match outcome.status {
            TriggerStatus::Triggered => {
                unlock(session, index);
                continue;
            }
            TriggerStatus::Disabled => {
                record.update(|a| a.state = AchievementState::Disabled);
                let title = record.info.title.clone();
                hide_indicators_for(session, id);
                session.log(
                    LogLevel::Warning,
                    format!("Achievement {id} ({title}) disabled by the evaluator"),
                );
                continue;
            }
            _ => {}
        }

        let primed = outcome.status == TriggerStatus::Primed;
        if primed != (previous == TriggerStatus::Primed) {
            // bucket follows the challenge state
            record.update(|_| {});
        }

        let old_measured = record.measured;
        let mut progressed = false;
        if outcome.measured != old_measured {
            progressed = match outcome.measured {
                Some(new) => {
                    new.target > 0 && new.value > old_measured.map(|m| m.value).unwrap_or(0)
                }
                None => false,
            };
            record.set_measured(outcome.measured);
        }

        if primed && session.challenge_indicators.insert(id) {
            let achievement = session.achievements[index].info.clone();
            session.emit(Event::ChallengeIndicatorShow { achievement });
        } else if !primed && session.challenge_indicators.remove(&id) {
            let achievement = session.achievements[index].info.clone();
            session.emit(Event::ChallengeIndicatorHide { achievement });
        }

        if progressed {
            show_progress(session, index);
        }
    }
}

fn unlock(session: &mut Session, index: usize) {
    let hardcore = session.modes.hardcore;
    let id = session.achievements[index].id();
    hide_indicators_for(session, id);

    let record = &mut session.achievements[index];
    let repeat = record.info.unlocked.is_unlocked_in(hardcore);
    record.record_unlock(hardcore, Utc::now());
    let achievement = record.info.clone();

    session.log(
        LogLevel::Info,
        format!(
            "Achievement unlocked: {} ({} points)",
            achievement.title, achievement.points
        ),
    );
    let submit = achievement.category == AchievementCategory::Core && !repeat;
    session.emit(Event::AchievementTriggered { achievement });

    if submit {
        session.queue_submission(SubmissionKind::Award {
            achievement_id: id,
            hardcore,
        });
    }
    if !repeat {
        session.check_completion(id);
    }
}

fn hide_indicators_for(session: &mut Session, id: u32) {
    if session.challenge_indicators.remove(&id) {
        if let Some(achievement) = session.achievement(id).map(|r| r.info.clone()) {
            session.emit(Event::ChallengeIndicatorHide { achievement });
        }
    }
    if session
        .progress_indicator
        .is_some_and(|p| p.achievement_id == id)
    {
        session.progress_indicator = None;
        session.emit(Event::ProgressIndicatorHide { achievement_id: id });
    }
}

fn show_progress(session: &mut Session, index: usize) {
    let achievement = session.achievements[index].info.clone();
    let frames_left = session.config.progress_indicator_frames;
    let same = session
        .progress_indicator
        .is_some_and(|p| p.achievement_id == achievement.id);
    session.progress_indicator = Some(ProgressIndicator {
        achievement_id: achievement.id,
        frames_left,
    });
    if same {
        session.emit(Event::ProgressIndicatorUpdate { achievement });
    } else {
        session.emit(Event::ProgressIndicatorShow { achievement });
    }
}

fn tick_progress_indicator(session: &mut Session) {
    let Some(indicator) = session.progress_indicator.as_mut() else {
        return;
    };
    if indicator.frames_left > 1 {
        indicator.frames_left -= 1;
        return;
    }
    let achievement_id = indicator.achievement_id;
    session.progress_indicator = None;
    session.emit(Event::ProgressIndicatorHide { achievement_id });
}

fn evaluate_leaderboards(
    session: &mut Session,
    engine: &dyn TriggerEngine,
    reader: &MemoryReader<'_>,
) {
    for index in 0..session.leaderboards.len() {
        if !session.leaderboards[index].is_evaluated() {
            continue;
        }
        let record = &mut session.leaderboards[index];
        let previous = record.status;
        let outcome = engine.evaluate_leaderboard(&record.definition, &mut record.memo, reader);
        record.status = outcome.status;

        match outcome.status {
            LeaderboardStatus::Started if previous != LeaderboardStatus::Started => {
                record.set_value(outcome.value);
                record.update(|lb| lb.state = LeaderboardState::Tracking);
                let leaderboard = record.info.clone();
                let tracker_id = session.next_tracker_id();
                let tracker = LeaderboardTracker {
                    id: tracker_id,
                    display: leaderboard.tracker_value.clone(),
                };
                session.leaderboards[index].tracker = Some(tracker_id);
                session.trackers.insert(tracker_id, tracker.clone());
                session.log(
                    LogLevel::Verbose,
                    format!("Leaderboard attempt started: {}", leaderboard.title),
                );
                session.emit(Event::LeaderboardStarted { leaderboard });
                session.emit(Event::TrackerShow { tracker });
            }
            LeaderboardStatus::Started => {
                if outcome.value != record.value {
                    record.set_value(outcome.value);
                    let display = record.info.tracker_value.clone();
                    if let Some(tracker_id) = record.tracker {
                        let tracker = LeaderboardTracker {
                            id: tracker_id,
                            display,
                        };
                        session.trackers.insert(tracker_id, tracker.clone());
                        session.emit(Event::TrackerUpdate { tracker });
                    }
                }
            }
            LeaderboardStatus::Canceled => {
                if previous == LeaderboardStatus::Started {
                    stop_tracking(session, index);
                    let leaderboard = session.leaderboards[index].info.clone();
                    session.log(
                        LogLevel::Verbose,
                        format!("Leaderboard attempt failed: {}", leaderboard.title),
                    );
                    hide_tracker(session, index, Some(Event::LeaderboardFailed { leaderboard }));
                }
            }
            LeaderboardStatus::Triggered => {
                record.set_value(outcome.value);
                stop_tracking(session, index);
                let leaderboard = session.leaderboards[index].info.clone();
                session.log(
                    LogLevel::Info,
                    format!(
                        "Leaderboard submitted: {} ({})",
                        leaderboard.title, leaderboard.tracker_value
                    ),
                );
                let kind = SubmissionKind::Leaderboard {
                    leaderboard_id: leaderboard.id,
                    score: outcome.value,
                    format: leaderboard.value_format,
                };
                hide_tracker(
                    session,
                    index,
                    Some(Event::LeaderboardSubmitted { leaderboard }),
                );
                session.queue_submission(kind);
            }
            LeaderboardStatus::Disabled => {
                record.update(|lb| lb.state = LeaderboardState::Disabled);
                hide_tracker(session, index, None);
            }
            _ if previous == LeaderboardStatus::Started => {
                // dropped out of an attempt without a cancel
                stop_tracking(session, index);
                hide_tracker(session, index, None);
            }
            _ => {}
        }
    }
}

fn stop_tracking(session: &mut Session, index: usize) {
    session.leaderboards[index].update(|lb| lb.state = LeaderboardState::Active);
}

/// Emit `event` (if any) followed by the tracker hide.
fn hide_tracker(session: &mut Session, index: usize, event: Option<Event>) {
    if let Some(event) = event {
        session.emit(event);
    }
    let Some(tracker_id) = session.leaderboards[index].tracker.take() else {
        return;
    };
    if let Some(tracker) = session.trackers.remove(&tracker_id) {
        session.emit(Event::TrackerHide { tracker });
    }
}

fn evaluate_rich_presence(
    session: &mut Session,
    engine: &dyn TriggerEngine,
    reader: &MemoryReader<'_>,
) {
    let Some(rp) = session.rich_presence.as_mut() else {
        return;
    };
    let message = engine.evaluate_rich_presence(&rp.script, &mut rp.memo, reader);
    if message != rp.message {
        rp.message = message.clone();
        session.emit(Event::RichPresenceChanged { message });
    }
}
