//! Progress capture and restore.
//!
//! Layout (little endian):
//!
//! ```text
//! magic "RCP1" | game id u32 | hash len u8 | hash
//! achievement count u32
//!   id u32 | state u8 | unlocked u8 | status u8 | unlock time i64 (ns, 0 = none)
//!   measured value u32 | measured target u32 | memo len u32 | memo
//! leaderboard count u32
//!   id u32 | status u8 | value i32 | memo len u32 | memo
//! rich presence memo len u32 | memo
//! ```
//!
//! Restore parses the whole blob into staged values before touching the
//! session, so it either applies completely or not at all.

use chrono::DateTime;

use super::Session;
use crate::error::{Error, Result};
use crate::eval::{LeaderboardStatus, Measured, TriggerMemo, TriggerStatus};
use crate::event::Event;
use crate::model::{AchievementState, LeaderboardState, LeaderboardTracker, UnlockedMode};

const MAGIC: &[u8; 4] = b"RCP1";

const ACHIEVEMENT_FIXED_LEN: usize = 4 + 1 + 1 + 1 + 8 + 4 + 4 + 4;
const LEADERBOARD_FIXED_LEN: usize = 4 + 1 + 4 + 4;

struct StagedAchievement {
    id: u32,
    state: AchievementState,
    unlocked: UnlockedMode,
    status: TriggerStatus,
    unlock_time: i64,
    measured: Option<Measured>,
    memo: TriggerMemo,
}

struct StagedLeaderboard {
    id: u32,
    status: LeaderboardStatus,
    value: i32,
    memo: TriggerMemo,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| Error::InvalidState("progress data is truncated".to_string()))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(self.u32()? as i32)
    }

    fn i64(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(i64::from_le_bytes(buf))
    }

    fn memo(&mut self) -> Result<TriggerMemo> {
        let len = self.u32()? as usize;
        Ok(TriggerMemo(self.take(len)?.to_vec()))
    }

    fn finished(&self) -> bool {
        self.pos == self.data.len()
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidState(message.into())
}

fn put_memo(out: &mut Vec<u8>, memo: &TriggerMemo) {
    out.extend_from_slice(&(memo.as_bytes().len() as u32).to_le_bytes());
    out.extend_from_slice(memo.as_bytes());
}

impl Session {
    /// Exact size of the blob `capture_progress` would produce.
    pub fn progress_size(&self) -> usize {
        let hash_len = self.game.as_ref().map(|g| g.hash.len()).unwrap_or(0);
        let achievements: usize = self
            .achievements
            .iter()
            .map(|r| ACHIEVEMENT_FIXED_LEN + r.memo.as_bytes().len())
            .sum();
        let leaderboards: usize = self
            .leaderboards
            .iter()
            .map(|r| LEADERBOARD_FIXED_LEN + r.memo.as_bytes().len())
            .sum();
        let rich_presence = self
            .rich_presence
            .as_ref()
            .map(|rp| rp.memo.as_bytes().len())
            .unwrap_or(0);
        MAGIC.len() + 4 + 1 + hash_len + 4 + achievements + 4 + leaderboards + 4 + rich_presence
    }

    pub fn capture_progress(&self) -> Result<Vec<u8>> {
        let game = self.game.as_ref().ok_or(Error::NoGameLoaded)?;
        let mut out = Vec::with_capacity(self.progress_size());

        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&game.id.to_le_bytes());
        out.push(game.hash.len() as u8);
        out.extend_from_slice(game.hash.as_bytes());

        out.extend_from_slice(&(self.achievements.len() as u32).to_le_bytes());
        for record in &self.achievements {
            let measured = record.measured.unwrap_or_default();
            let unlock_time = record
                .info
                .unlock_time
                .and_then(|t| t.timestamp_nanos_opt())
                .unwrap_or(0);
            out.extend_from_slice(&record.id().to_le_bytes());
            out.push(record.info.state as u8);
            out.push(record.info.unlocked.bits());
            out.push(record.status as u8);
            out.extend_from_slice(&unlock_time.to_le_bytes());
            out.extend_from_slice(&measured.value.to_le_bytes());
            out.extend_from_slice(&measured.target.to_le_bytes());
            put_memo(&mut out, &record.memo);
        }

        out.extend_from_slice(&(self.leaderboards.len() as u32).to_le_bytes());
        for record in &self.leaderboards {
            out.extend_from_slice(&record.id().to_le_bytes());
            out.push(record.status as u8);
            out.extend_from_slice(&record.value.to_le_bytes());
            put_memo(&mut out, &record.memo);
        }

        let empty = TriggerMemo::new();
        let rp_memo = self.rich_presence.as_ref().map(|rp| &rp.memo).unwrap_or(&empty);
        put_memo(&mut out, rp_memo);

        Ok(out)
    }

    /// Replace evaluation state with a captured blob.
    ///
    /// Restored unlocks produce no unlock event and no submission.
    /// Indicators and trackers are reconciled with the restored statuses.
    pub fn restore_progress(&mut self, data: &[u8]) -> Result<()> {
        let game_id = self.game.as_ref().ok_or(Error::NoGameLoaded)?.id;
        let mut reader = Reader { data, pos: 0 };

        if reader.take(MAGIC.len())? != MAGIC {
            return Err(invalid("not a progress blob"));
        }
        let blob_game = reader.u32()?;
        if blob_game != game_id {
            return Err(invalid(format!(
                "progress is for game {blob_game}, loaded game is {game_id}"
            )));
        }
        let hash_len = reader.u8()? as usize;
        reader.take(hash_len)?;

        let count = reader.u32()? as usize;
        let mut achievements = Vec::with_capacity(count.min(self.achievements.len()));
        for _ in 0..count {
            let id = reader.u32()?;
            let state = AchievementState::from_repr(reader.u8()?)
                .ok_or_else(|| invalid("bad achievement state"))?;
            let unlocked = UnlockedMode::from_bits(reader.u8()?);
            let status = TriggerStatus::from_repr(reader.u8()?)
                .ok_or_else(|| invalid("bad trigger status"))?;
            let unlock_time = reader.i64()?;
            let value = reader.u32()?;
            let target = reader.u32()?;
            let memo = reader.memo()?;
            if self.achievement(id).is_none() {
                return Err(invalid(format!("unknown achievement {id}")));
            }
            achievements.push(StagedAchievement {
                id,
                state,
                unlocked,
                status,
                unlock_time,
                measured: (target > 0).then_some(Measured { value, target }),
                memo,
            });
        }

        let count = reader.u32()? as usize;
        let mut leaderboards = Vec::with_capacity(count.min(self.leaderboards.len()));
        for _ in 0..count {
            let id = reader.u32()?;
            let status = LeaderboardStatus::from_repr(reader.u8()?)
                .ok_or_else(|| invalid("bad leaderboard status"))?;
            let value = reader.i32()?;
            let memo = reader.memo()?;
            if self.leaderboard(id).is_none() {
                return Err(invalid(format!("unknown leaderboard {id}")));
            }
            leaderboards.push(StagedLeaderboard {
                id,
                status,
                value,
                memo,
            });
        }

        let rp_memo = reader.memo()?;
        if !reader.finished() {
            return Err(invalid("trailing data after progress"));
        }

        // validated; apply
        self.apply_achievements(achievements);
        self.apply_leaderboards(leaderboards);
        if let Some(rp) = self.rich_presence.as_mut() {
            rp.memo = rp_memo;
        }
        self.log(crate::config::LogLevel::Verbose, "Progress restored");
        Ok(())
    }

    fn apply_achievements(&mut self, staged: Vec<StagedAchievement>) {
        let (hardcore, encore) = (self.modes.hardcore, self.loaded_encore);
        // achievements missing from the blob start over
        for record in &mut self.achievements {
            if !staged.iter().any(|s| s.id == record.id()) {
                record.rearm(hardcore, encore);
            }
        }
        for entry in staged {
            let Some(record) = self.achievement_mut(entry.id) else {
                continue;
            };
            record.memo = entry.memo;
            record.status = entry.status;
            record.measured = entry.measured;
            let unlock_time = (entry.unlock_time != 0)
                .then(|| DateTime::from_timestamp_nanos(entry.unlock_time));
            record.update(|a| {
                a.state = entry.state;
                a.unlocked = entry.unlocked;
                a.unlock_time = unlock_time;
            });
            record.set_measured(entry.measured);
        }

        // reconcile challenge indicators with restored statuses
        let wanted: Vec<u32> = self
            .achievements
            .iter()
            .filter(|r| r.status == TriggerStatus::Primed && r.is_active())
            .map(|r| r.id())
            .collect();
        let visible: Vec<u32> = self.challenge_indicators.iter().copied().collect();
        for id in visible.iter().filter(|id| !wanted.contains(id)) {
            self.challenge_indicators.remove(id);
            if let Some(achievement) = self.achievement(*id).map(|r| r.info.clone()) {
                self.emit(Event::ChallengeIndicatorHide { achievement });
            }
        }
        for id in wanted.iter().filter(|id| !visible.contains(id)) {
            self.challenge_indicators.insert(*id);
            if let Some(achievement) = self.achievement(*id).map(|r| r.info.clone()) {
                self.emit(Event::ChallengeIndicatorShow { achievement });
            }
        }
        if let Some(indicator) = self.progress_indicator.take() {
            self.emit(Event::ProgressIndicatorHide {
                achievement_id: indicator.achievement_id,
            });
        }
    }

    fn apply_leaderboards(&mut self, staged: Vec<StagedLeaderboard>) {
        let hardcore = self.modes.hardcore;
        let mut events = Vec::new();

        for index in 0..self.leaderboards.len() {
            let id = self.leaderboards[index].id();
            let entry = staged.iter().position(|s| s.id == id);
            let old_tracker = self.leaderboards[index].tracker.take();

            match entry {
                Some(pos) => {
                    let entry = &staged[pos];
                    let record = &mut self.leaderboards[index];
                    record.memo = entry.memo.clone();
                    record.status = entry.status;
                    record.set_value(entry.value);
                    let tracking = entry.status == LeaderboardStatus::Started;
                    let state = match (record.valid, tracking) {
                        (false, _) => LeaderboardState::Disabled,
                        (true, true) => LeaderboardState::Tracking,
                        (true, false) if hardcore => LeaderboardState::Active,
                        (true, false) => LeaderboardState::Inactive,
                    };
                    record.update(|lb| lb.state = state);
                    let display = record.info.tracker_value.clone();

                    if tracking {
                        let (id, show) = match old_tracker {
                            Some(id) => (id, false),
                            None => (self.next_tracker_id(), true),
                        };
                        let tracker = LeaderboardTracker { id, display };
                        self.leaderboards[index].tracker = Some(id);
                        let changed = self.trackers.get(&id) != Some(&tracker);
                        self.trackers.insert(id, tracker.clone());
                        if show {
                            events.push(Event::TrackerShow { tracker });
                        } else if changed {
                            events.push(Event::TrackerUpdate { tracker });
                        }
                    } else if let Some(id) = old_tracker {
                        if let Some(tracker) = self.trackers.remove(&id) {
                            events.push(Event::TrackerHide { tracker });
                        }
                    }
                }
                None => {
                    if let Some(id) = old_tracker {
                        if let Some(tracker) = self.trackers.remove(&id) {
                            events.push(Event::TrackerHide { tracker });
                        }
                    }
                    self.leaderboards[index].rearm(hardcore);
                }
            }
        }

        for event in events {
            self.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_truncated() {
        let mut reader = Reader {
            data: &[1, 2, 3],
            pos: 0,
        };
        assert!(matches!(reader.u32(), Err(Error::InvalidState(_))));
        assert_eq!(reader.u8().unwrap(), 1);
        assert!(!reader.finished());
    }

    #[test]
    fn test_reader_memo() {
        let mut out = Vec::new();
        put_memo(&mut out, &TriggerMemo(vec![9, 8]));
        let mut reader = Reader { data: &out, pos: 0 };
        assert_eq!(reader.memo().unwrap(), TriggerMemo(vec![9, 8]));
        assert!(reader.finished());
    }
}
