//! Word status vocabulary.
//!
//! Upstream systems speak a four-value vocabulary ([`WireStatus`]) in which
//! `NOT_LEARNED` and `UNKNOWN` mean the same thing. Everything past the
//! boundary works on the three-value canonical [`WordStatus`]; the only
//! place the two meet is [`WireStatus::normalize`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ──────────────────────────────────────────────
// Wire vocabulary
// ──────────────────────────────────────────────

/// A word status as reported by an upstream system or a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum WireStatus {
    Unknown,
    PartiallyKnown,
    Known,
    NotLearned,
}

impl WireStatus {
    /// Every wire value, in declaration order.
    pub const ALL: [WireStatus; 4] = [
        WireStatus::Unknown,
        WireStatus::PartiallyKnown,
        WireStatus::Known,
        WireStatus::NotLearned,
    ];

    /// Collapse onto the canonical status. Total: `NotLearned` and
    /// `Unknown` both become [`WordStatus::Unknown`].
    pub fn normalize(self) -> WordStatus {
        match self {
            WireStatus::Unknown | WireStatus::NotLearned => WordStatus::Unknown,
            WireStatus::PartiallyKnown => WordStatus::PartiallyKnown,
            WireStatus::Known => WordStatus::Known,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WireStatus::Unknown => "UNKNOWN",
            WireStatus::PartiallyKnown => "PARTIALLY_KNOWN",
            WireStatus::Known => "KNOWN",
            WireStatus::NotLearned => "NOT_LEARNED",
        }
    }
}

impl FromStr for WireStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(WireStatus::Unknown),
            "PARTIALLY_KNOWN" => Ok(WireStatus::PartiallyKnown),
            "KNOWN" => Ok(WireStatus::Known),
            "NOT_LEARNED" => Ok(WireStatus::NotLearned),
            other => Err(CoreError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for WireStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for WireStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Canonical status
// ──────────────────────────────────────────────

/// Canonical word mastery.
///
/// Deserializing accepts the full wire vocabulary and normalizes on the way
/// in, so a stored `NOT_LEARNED` is read back as `Unknown`. Serializing
/// always emits one of the three canonical names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum WordStatus {
    #[default]
    Unknown,
    PartiallyKnown,
    Known,
}

impl WordStatus {
    /// Whether the learner has acted on the word (anything but `Unknown`).
    pub fn is_reviewed(self) -> bool {
        !matches!(self, WordStatus::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WordStatus::Unknown => "UNKNOWN",
            WordStatus::PartiallyKnown => "PARTIALLY_KNOWN",
            WordStatus::Known => "KNOWN",
        }
    }
}

impl From<WireStatus> for WordStatus {
    fn from(status: WireStatus) -> Self {
        status.normalize()
    }
}

impl From<WordStatus> for WireStatus {
    fn from(status: WordStatus) -> Self {
        match status {
            WordStatus::Unknown => WireStatus::Unknown,
            WordStatus::PartiallyKnown => WireStatus::PartiallyKnown,
            WordStatus::Known => WireStatus::Known,
        }
    }
}

impl FromStr for WordStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<WireStatus>().map(WireStatus::normalize)
    }
}

impl TryFrom<String> for WordStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for WordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
