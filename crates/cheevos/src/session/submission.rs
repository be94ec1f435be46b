use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::model::ValueFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubmissionKind {
    Award {
        achievement_id: u32,
        hardcore: bool,
    },
    Leaderboard {
        leaderboard_id: u32,
        score: i32,
        format: ValueFormat,
    },
}

impl SubmissionKind {
    pub fn related_id(&self) -> u32 {
        match *self {
            SubmissionKind::Award { achievement_id, .. } => achievement_id,
            SubmissionKind::Leaderboard { leaderboard_id, .. } => leaderboard_id,
        }
    }
}

/// An unlock or score waiting to reach the server.
#[derive(Debug, Clone)]
pub(crate) struct Submission {
    pub id: u64,
    pub kind: SubmissionKind,
    pub game_hash: String,
    /// Queue generation the submission was pushed in
    generation: u64,
    pub attempts: u32,
    next_attempt: Instant,
    in_flight: bool,
}

/// Outstanding submissions, oldest first.
#[derive(Debug, Default)]
pub(crate) struct SubmissionQueue {
    items: VecDeque<Submission>,
    next_id: u64,
    generation: u64,
    disconnected: bool,
}

impl SubmissionQueue {
    pub fn push(&mut self, kind: SubmissionKind, game_hash: String) {
        self.next_id += 1;
        self.items.push_back(Submission {
            id: self.next_id,
            kind,
            game_hash,
            generation: self.generation,
            attempts: 0,
            next_attempt: Instant::now(),
            in_flight: false,
        });
    }

    /// Mark every due submission in flight and return copies to send.
    pub fn take_due(&mut self, now: Instant) -> Vec<Submission> {
        self.items
            .iter_mut()
            .filter(|s| !s.in_flight && s.next_attempt <= now)
            .map(|s| {
                s.in_flight = true;
                s.attempts += 1;
                s.clone()
            })
            .collect()
    }

    /// Whether `submission` was taken from this queue since the last
    /// [`clear`](Self::clear) and is still waiting for its response.
    pub fn owns(&self, submission: &Submission) -> bool {
        submission.generation == self.generation
            && self
                .items
                .iter()
                .any(|s| s.id == submission.id && s.in_flight)
    }

    /// Remove a finished submission.
    pub fn remove(&mut self, id: u64) -> Option<Submission> {
        let index = self.items.iter().position(|s| s.id == id)?;
        self.items.remove(index)
    }

    /// Put a failed submission back to wait for `delay`.
    pub fn reschedule(&mut self, id: u64, delay: Duration) -> bool {
        match self.items.iter_mut().find(|s| s.id == id) {
            Some(s) => {
                s.in_flight = false;
                s.next_attempt = Instant::now() + delay;
                true
            }
            None => false,
        }
    }

    /// Drop everything, including submissions in flight; their responses
    /// will find nothing to complete.
    pub fn clear(&mut self) {
        self.items.clear();
        self.generation += 1;
        self.disconnected = false;
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Returns `true` if this call changed the connection state.
    pub fn set_disconnected(&mut self, disconnected: bool) -> bool {
        let changed = self.disconnected != disconnected;
        self.disconnected = disconnected;
        changed
    }
}
