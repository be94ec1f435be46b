//! # cheevos
//!
//! Runtime client for a retro achievement service.
//!
//! This crate provides:
//! - A session state machine for login, game load, media change and unload
//! - A frame driver that evaluates achievements, leaderboards and rich
//!   presence once per emulated frame
//! - Cancelable handles for network operations, completed on an executor
//! - An ordered event stream for the host (unlocks, indicators, trackers,
//!   connectivity, log lines)
//! - Progress capture and restore for save states
//!
//! The trigger language interpreter, content hashing and HTTP are host
//! capabilities: see [`TriggerEngine`], [`ContentHasher`] and [`Transport`].
//!
//! ## Feature Flags
//!
//! - `http`: bundles [`UreqTransport`], a blocking transport built on `ureq`,
//!   and makes it the default for [`ClientBuilder`].

mod api;
mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod eval;
pub mod event;
pub mod executor;
mod frame;
pub mod hash;
pub mod memory;
pub mod model;
pub mod operation;
pub mod prelude;
mod session;
pub mod text;
pub mod transport;

pub use client::{Client, ClientBuilder, Credential};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_HOST, DEFAULT_MEDIA_HOST, LogLevel};
pub use console::ConsoleId;
pub use error::{Error, ErrorCode, Result, describe};
pub use eval::{
    LeaderboardOutcome, LeaderboardStatus, Measured, TriggerEngine, TriggerMemo, TriggerOutcome,
    TriggerStatus,
};
pub use event::{Event, EventListener, LoadFailureReason};
pub use executor::{Executor, InlineExecutor, Task, ThreadExecutor};
pub use frame::RICH_PRESENCE_FRAMES;
pub use hash::{ContentHasher, MediaSource};
pub use memory::{FnMemory, MemoryReader, ReadMemory};
pub use model::{
    Achievement, AchievementBucket, AchievementCategory, AchievementState, BucketType, GameInfo,
    HashEntry, Leaderboard, LeaderboardFormat, LeaderboardState, LeaderboardTracker, ListGrouping,
    LoadGameState, Scoreboard, ScoreboardEntry, Subset, UnlockedMode, UserGameSummary, UserInfo,
    UserProgressEntry, ValueFormat, format_value,
};
pub use operation::AsyncHandle;
pub use session::{LoadState, Mode, Modes, PAUSE_INTERVAL_FRAMES};
pub use text::{BadgeName, BoundedText, GameHash, MeasuredProgress, SubsetBadge, TrackerDisplay};
#[cfg(feature = "http")]
pub use transport::UreqTransport;
pub use transport::{HttpRequest, HttpResponse, Method, Transport};
