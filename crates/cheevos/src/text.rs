//! Length-bounded text fields.
//!
//! Several values exchanged with the service have fixed maximum sizes
//! (badge names, tracker displays, measured progress). `BoundedText<N>`
//! guarantees the UTF-8 encoding never exceeds `N` bytes.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of an achievement badge name.
pub const BADGE_NAME_LEN: usize = 8;
/// Maximum length of a subset badge name.
pub const SUBSET_BADGE_LEN: usize = 16;
/// Maximum length of a measured progress string (e.g. `"12/30"`).
pub const MEASURED_PROGRESS_LEN: usize = 24;
/// Maximum length of a leaderboard tracker display string.
pub const TRACKER_DISPLAY_LEN: usize = 24;
/// Maximum length of a game hash.
pub const HASH_LEN: usize = 32;

pub type BadgeName = BoundedText<BADGE_NAME_LEN>;
pub type SubsetBadge = BoundedText<SUBSET_BADGE_LEN>;
pub type MeasuredProgress = BoundedText<MEASURED_PROGRESS_LEN>;
pub type TrackerDisplay = BoundedText<TRACKER_DISPLAY_LEN>;
pub type GameHash = BoundedText<HASH_LEN>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("text of {len} bytes exceeds limit of {limit} bytes")]
pub struct TextTooLong {
    pub len: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoundedText<const N: usize>(String);

impl<const N: usize> BoundedText<N> {
    pub const LIMIT: usize = N;

    /// Validate `value` against the limit.
    pub fn new(value: impl Into<String>) -> Result<Self, TextTooLong> {
        let value = value.into();
        if value.len() > N {
            return Err(TextTooLong {
                len: value.len(),
                limit: N,
            });
        }
        Ok(Self(value))
    }

    /// Cut `value` down to the limit at a character boundary.
    ///
    /// Used for text received from the server, which is trusted but may be
    /// longer than what the fixed-size fields can carry.
    pub fn truncated(value: &str) -> Self {
        if value.len() <= N {
            return Self(value.to_string());
        }
        let mut end = N;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        Self(value[..end].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> Deref for BoundedText<N> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> fmt::Display for BoundedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: usize> TryFrom<String> for BoundedText<N> {
    type Error = TextTooLong;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const N: usize> From<BoundedText<N>> for String {
    fn from(value: BoundedText<N>) -> Self {
        value.0
    }
}

impl<const N: usize> PartialEq<str> for BoundedText<N> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl<const N: usize> PartialEq<&str> for BoundedText<N> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
