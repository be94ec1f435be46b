//! Snapshot types handed to the host.
//!
//! Every value here is self-contained: events and queries return owned
//! copies, so a listener may keep them past the call that produced them.

mod achievement;
mod bucket;
mod format;
mod game;
mod leaderboard;

pub use achievement::*;
pub use bucket::*;
pub use format::*;
pub use game::*;
pub use leaderboard::*;
