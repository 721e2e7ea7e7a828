//! Status normalization
//!
//! Maps the open-ended status strings a server reports onto the closed set of
//! [`CanonicalColumn`]s. The mapping is total: a status nobody taught the
//! client about still lands somewhere visible (the leftmost lane) instead of
//! disappearing from the board.

use crate::column::CanonicalColumn;

const DONE_KEYS: &[&str] = &[
    "done", "completed", "complete", "closed", "resolved", "finished", "shipped",
];

const IN_PROGRESS_KEYS: &[&str] = &[
    "inprogress",
    "doing",
    "started",
    "inreview",
    "review",
    "codereview",
    "testing",
    "qa",
];

const TO_DO_KEYS: &[&str] = &["todo", "open", "new", "backlog", "notstarted", "ready", "planned"];

/// How a raw status was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMatch {
    /// The status is a known synonym of a column
    Known(CanonicalColumn),
    /// The status was not recognized and fell back to [`CanonicalColumn::ToDo`]
    Fallback,
}

impl StatusMatch {
    /// Column the status renders in
    #[inline]
    #[must_use]
    pub fn column(self) -> CanonicalColumn {
        match self {
            Self::Known(column) => column,
            Self::Fallback => CanonicalColumn::ToDo,
        }
    }

    /// Whether the status was recognized
    #[inline]
    #[must_use]
    pub fn is_known(self) -> bool {
        matches!(self, Self::Known(_))
    }
}

/// Lowercase the status and drop whitespace, `-` and `_`.
///
/// `In Progress`, `in-progress`, `IN_PROGRESS` and `InProgress` share a key.
#[must_use]
pub fn canonical_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolve a raw status without logging
#[must_use]
pub fn classify(raw: &str) -> StatusMatch {
    let key = canonical_key(raw);
    let key = key.as_str();

    if DONE_KEYS.contains(&key) {
        StatusMatch::Known(CanonicalColumn::Done)
    } else if IN_PROGRESS_KEYS.contains(&key) {
        StatusMatch::Known(CanonicalColumn::InProgress)
    } else if TO_DO_KEYS.contains(&key) {
        StatusMatch::Known(CanonicalColumn::ToDo)
    } else {
        StatusMatch::Fallback
    }
}

/// Map any server status to its canonical column.
///
/// Total and deterministic. Unrecognized statuses (a newly introduced backend
/// state, `blocked`, the empty string) map to [`CanonicalColumn::ToDo`] and
/// are logged at debug level.
#[must_use]
pub fn normalize(raw: &str) -> CanonicalColumn {
    let matched = classify(raw);
    if !matched.is_known() {
        tracing::debug!(status = raw, "unrecognized task status, placing in TO_DO");
    }
    matched.column()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn done_synonyms() {
        for raw in ["done", "DONE", "Completed", "closed", " resolved "] {
            assert_eq!(normalize(raw), CanonicalColumn::Done, "{raw}");
        }
    }

    #[test]
    fn in_progress_and_review_synonyms() {
        for raw in ["in_progress", "In Progress", "in-progress", "IN_REVIEW", "review", "QA"] {
            assert_eq!(normalize(raw), CanonicalColumn::InProgress, "{raw}");
        }
    }

    #[test]
    fn unknown_statuses_fall_back_to_todo() {
        for raw in ["blocked", "", "   ", "awaiting-legal", "🚧"] {
            assert_eq!(classify(raw), StatusMatch::Fallback, "{raw}");
            assert_eq!(normalize(raw), CanonicalColumn::ToDo, "{raw}");
        }
    }

    #[test]
    fn explicit_todo_is_known() {
        assert_eq!(classify("backlog"), StatusMatch::Known(CanonicalColumn::ToDo));
        assert_eq!(classify("TO_DO"), StatusMatch::Known(CanonicalColumn::ToDo));
    }

    #[test]
    fn column_wire_names_normalize_to_themselves() {
        for column in CanonicalColumn::ALL {
            assert_eq!(classify(column.as_status()), StatusMatch::Known(column));
        }
    }

    proptest! {
        #[test]
        fn prop_normalize_is_total(raw in any::<String>()) {
            let column = normalize(&raw);
            prop_assert!(CanonicalColumn::ALL.contains(&column));
        }

        #[test]
        fn prop_normalize_is_deterministic(raw in "\\PC{0,24}") {
            prop_assert_eq!(normalize(&raw), normalize(&raw));
        }

        #[test]
        fn prop_normalize_ignores_case(raw in "[a-zA-Z _-]{0,16}") {
            prop_assert_eq!(normalize(&raw), normalize(&raw.to_uppercase()));
        }
    }
}
