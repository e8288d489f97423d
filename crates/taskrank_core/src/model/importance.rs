//! Task importance levels and display classification.
//!
//! # Responsibility
//! - Define the fixed, ordered importance scale stored as an ordinal.
//! - Map importance (and overdue state) to a symbolic color class.
//!
//! # Invariants
//! - Ordinals are stable: `Level1` is 0 and the most important level.
//! - Unknown ordinals are never clamped; callers get `None` and must report
//!   the row as corrupt.

use serde::{Deserialize, Serialize};

/// Ordered importance scale. Lower ordinal means more important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    /// Must do.
    Level1,
    /// Should do.
    Level2,
    /// Nice to do.
    Level3,
    /// Whenever.
    Level4,
}

impl Importance {
    /// Level assigned to freshly created tasks.
    pub const DEFAULT: Importance = Importance::Level3;

    /// Every level, in ordinal order.
    pub const ALL: [Importance; 4] = [
        Importance::Level1,
        Importance::Level2,
        Importance::Level3,
        Importance::Level4,
    ];

    pub fn ordinal(self) -> i64 {
        match self {
            Self::Level1 => 0,
            Self::Level2 => 1,
            Self::Level3 => 2,
            Self::Level4 => 3,
        }
    }

    /// Resolves a stored ordinal. Returns `None` for out-of-range values.
    pub fn from_ordinal(value: i64) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Level1 => "must_do",
            Self::Level2 => "should_do",
            Self::Level3 => "nice_to_do",
            Self::Level4 => "whenever",
        }
    }

    /// Display class used when the task is not overdue.
    pub fn color_class(self) -> TaskColorClass {
        TaskColorClass::Importance(self)
    }
}

impl Default for Importance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Symbolic display category for a task row.
///
/// Rendering layers map these to concrete colors; core never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "class", content = "importance")]
pub enum TaskColorClass {
    /// Definite due date has passed.
    Overdue,
    /// Classification inherited from the importance level.
    Importance(Importance),
}
