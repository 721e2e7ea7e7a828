//! Canonical board columns
//!
//! Every task on the board is rendered in exactly one of three lanes,
//! whatever status string the server reports for it.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three fixed board lanes
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalColumn {
    /// Not started (also the fallback lane)
    #[default]
    ToDo,
    /// In progress or in review
    InProgress,
    /// Finished
    Done,
}

impl CanonicalColumn {
    /// All columns in rendering order
    pub const ALL: [CanonicalColumn; 3] = [Self::ToDo, Self::InProgress, Self::Done];

    /// Position of the column in rendering order
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::ToDo => 0,
            Self::InProgress => 1,
            Self::Done => 2,
        }
    }

    /// Status string written back to the server when a task lands in this column
    #[inline]
    #[must_use]
    pub fn as_status(self) -> &'static str {
        match self {
            Self::ToDo => "TO_DO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_status())
    }
}

/// Strict parse of a column name.
///
/// Unlike [`crate::normalize`], this rejects anything that is not a column
/// name. It is meant for drag coordinates and command-line input, not for
/// server status strings.
impl FromStr for CanonicalColumn {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match crate::status::canonical_key(s).as_str() {
            "todo" => Ok(Self::ToDo),
            "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(ModelError::UnknownColumn(s.to_string())),
        }
    }
}
