//! Prelude module for convenient imports
//!
//! This module re-exports the types most hosts need.
//!
//! # Usage
//!
//! ```ignore
//! use cheevos::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Client: `Client`, `ClientBuilder`, `ClientConfig`, `Credential`
//! - Host capabilities: `ReadMemory`, `Transport`, `TriggerEngine`, `ContentHasher`
//! - Events: `Event`, `EventListener`
//! - Error handling: `Error`, `Result`

// Client
pub use crate::client::{Client, ClientBuilder, Credential};
pub use crate::config::{ClientConfig, LogLevel};
pub use crate::operation::AsyncHandle;
pub use crate::session::{LoadState, Mode};

// Error handling
pub use crate::error::{Error, Result};

// Host capabilities
pub use crate::eval::TriggerEngine;
pub use crate::hash::{ContentHasher, MediaSource};
pub use crate::memory::ReadMemory;
pub use crate::transport::Transport;

// Events and snapshots
pub use crate::console::ConsoleId;
pub use crate::event::{Event, EventListener};
pub use crate::model::{Achievement, GameInfo, Leaderboard};
