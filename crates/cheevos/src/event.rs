//! Event stream and dispatcher.
//!
//! Mutations queue their events while the session lock is held, so the
//! queue order is the mutation order. Delivery happens after the lock is
//! released: the calling thread drains the queue into the listener before
//! returning. A listener may call back into the client; events produced by
//! such a nested call are delivered after the listener returns.

use std::collections::VecDeque;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::config::LogLevel;
use crate::error::{Error, ErrorCode};
use crate::model::{
    Achievement, GameInfo, Leaderboard, LeaderboardTracker, Scoreboard, Subset,
};

/// Why a game failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
pub enum LoadFailureReason {
    UnsupportedConsole,
    NetworkFailure,
    UnknownGame,
    ServerRejected,
    NotLoggedIn,
    Other,
}

impl From<&Error> for LoadFailureReason {
    fn from(error: &Error) -> Self {
        match error {
            Error::UnsupportedConsole(_) => LoadFailureReason::UnsupportedConsole,
            Error::NetworkFailure(_) => LoadFailureReason::NetworkFailure,
            Error::UnknownGame { .. } => LoadFailureReason::UnknownGame,
            Error::ServerRejected { .. } | Error::AccessDenied(_) => {
                LoadFailureReason::ServerRejected
            }
            Error::NotLoggedIn | Error::InvalidCredentials(_) | Error::ExpiredToken(_) => {
                LoadFailureReason::NotLoggedIn
            }
            _ => LoadFailureReason::Other,
        }
    }
}

/// Everything the runtime reports to the host.
///
/// Achievement and leaderboard payloads are snapshots taken when the event
/// was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
pub enum Event {
    GameLoaded {
        game: GameInfo,
    },
    GameLoadFailed {
        reason: LoadFailureReason,
        code: Option<ErrorCode>,
        message: String,
    },
    AchievementTriggered {
        achievement: Achievement,
    },
    LeaderboardStarted {
        leaderboard: Leaderboard,
    },
    LeaderboardFailed {
        leaderboard: Leaderboard,
    },
    LeaderboardSubmitted {
        leaderboard: Leaderboard,
    },
    LeaderboardScoreboard {
        leaderboard_id: u32,
        scoreboard: Scoreboard,
    },
    TrackerShow {
        tracker: LeaderboardTracker,
    },
    TrackerUpdate {
        tracker: LeaderboardTracker,
    },
    TrackerHide {
        tracker: LeaderboardTracker,
    },
    ChallengeIndicatorShow {
        achievement: Achievement,
    },
    ChallengeIndicatorHide {
        achievement: Achievement,
    },
    ProgressIndicatorShow {
        achievement: Achievement,
    },
    ProgressIndicatorUpdate {
        achievement: Achievement,
    },
    ProgressIndicatorHide {
        achievement_id: u32,
    },
    ResetRequested,
    GameCompleted {
        game: GameInfo,
    },
    SubsetCompleted {
        subset: Subset,
    },
    ServerError {
        api: String,
        message: String,
        related_id: Option<u32>,
    },
    ClientDisconnected,
    ClientReconnected,
    RichPresenceChanged {
        message: String,
    },
    LogMessage {
        level: LogLevel,
        text: String,
    },
}

impl Event {
    /// Variant name, for logging.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Receiver of the event stream.
///
/// Unhandled variants can be ignored with a catch-all arm.
pub trait EventListener: Send {
    fn on_event(&mut self, event: Event);
}

impl<F> EventListener for F
where
    F: FnMut(Event) + Send,
{
    fn on_event(&mut self, event: Event) {
        self(event)
    }
}

#[derive(Default)]
struct ListenerSlot {
    current: Option<Box<dyn EventListener>>,
    /// Set when the listener changed while a flush held it
    replaced: bool,
}

#[derive(Default)]
pub(crate) struct Dispatcher {
    outbox: Mutex<VecDeque<Event>>,
    slot: Mutex<ListenerSlot>,
    /// Serializes delivery across threads
    turn: Mutex<()>,
    delivering: Mutex<Option<ThreadId>>,
}

impl Dispatcher {
    /// Install or remove the listener. Safe to call from inside the
    /// listener: the replacement takes over from the next event.
    pub fn set_listener(&self, listener: Option<Box<dyn EventListener>>) {
        let mut slot = self.slot.lock();
        slot.current = listener;
        slot.replaced = true;
    }

    /// Queue events. Called with the session lock held.
    pub fn enqueue(&self, events: impl IntoIterator<Item = Event>) {
        self.outbox.lock().extend(events);
    }

    /// Deliver everything queued. Must be called without the session lock.
    pub fn flush(&self) {
        let current = thread::current().id();
        if *self.delivering.lock() == Some(current) {
            // nested call from inside the listener; the outer flush delivers
            return;
        }

        let _turn = self.turn.lock();
        *self.delivering.lock() = Some(current);
        let mut listener = {
            let mut slot = self.slot.lock();
            slot.replaced = false;
            slot.current.take()
        };
        loop {
            {
                let mut slot = self.slot.lock();
                if slot.replaced {
                    slot.replaced = false;
                    listener = slot.current.take();
                }
            }
            let next = self.outbox.lock().pop_front();
            let Some(event) = next else { break };
            match listener.as_mut() {
                Some(listener) => listener.on_event(event),
                None => tracing::trace!(event = event.name(), "no listener, dropped"),
            }
        }
        {
            let mut slot = self.slot.lock();
            if slot.replaced {
                slot.replaced = false;
            } else {
                slot.current = listener;
            }
        }
        *self.delivering.lock() = None;
    }
}
