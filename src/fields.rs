//! Enumerations and field types for task classification.
//!
//! This module defines the two Eisenhower axes (urgency and importance), the
//! quadrant they combine into, recurrence frequencies, and listing options.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Time sensitivity axis of the Eisenhower matrix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    #[serde(alias = "Urgent")]
    Urgent,
    #[serde(alias = "not urgent", alias = "NotUrgent")]
    NotUrgent,
}

/// Importance axis of the Eisenhower matrix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Importance {
    #[serde(alias = "Important")]
    Important,
    #[serde(alias = "not important", alias = "NotImportant")]
    NotImportant,
}

/// How often a task recurs once completed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Whether completing a task with this frequency spawns a successor.
    pub fn is_recurring(self) -> bool {
        self != Frequency::None
    }
}

/// The four cells of the Eisenhower matrix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    /// Urgent and important.
    Do,
    /// Important, not urgent.
    Schedule,
    /// Urgent, not important.
    Delegate,
    /// Neither urgent nor important.
    Eliminate,
}

impl Quadrant {
    /// Display order used by listings and the matrix view.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::Do,
        Quadrant::Schedule,
        Quadrant::Delegate,
        Quadrant::Eliminate,
    ];

    /// Classify a task by its two axes.
    pub fn of(urgency: Urgency, importance: Importance) -> Self {
        match (urgency, importance) {
            (Urgency::Urgent, Importance::Important) => Quadrant::Do,
            (Urgency::NotUrgent, Importance::Important) => Quadrant::Schedule,
            (Urgency::Urgent, Importance::NotImportant) => Quadrant::Delegate,
            (Urgency::NotUrgent, Importance::NotImportant) => Quadrant::Eliminate,
        }
    }
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SortKey {
    Priority,
    Due,
    Id,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrants_cover_every_axis_combination() {
        assert_eq!(Quadrant::of(Urgency::Urgent, Importance::Important), Quadrant::Do);
        assert_eq!(Quadrant::of(Urgency::NotUrgent, Importance::Important), Quadrant::Schedule);
        assert_eq!(Quadrant::of(Urgency::Urgent, Importance::NotImportant), Quadrant::Delegate);
        assert_eq!(
            Quadrant::of(Urgency::NotUrgent, Importance::NotImportant),
            Quadrant::Eliminate
        );
    }

    #[test]
    fn legacy_spellings_deserialize() {
        let u: Urgency = serde_json::from_str("\"not urgent\"").unwrap();
        assert_eq!(u, Urgency::NotUrgent);
        let i: Importance = serde_json::from_str("\"not-important\"").unwrap();
        assert_eq!(i, Importance::NotImportant);
        let f: Frequency = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(f, Frequency::Weekly);
    }

    #[test]
    fn only_none_is_not_recurring() {
        assert!(!Frequency::None.is_recurring());
        assert!(Frequency::Daily.is_recurring());
        assert!(Frequency::Weekly.is_recurring());
        assert!(Frequency::Monthly.is_recurring());
    }
}
