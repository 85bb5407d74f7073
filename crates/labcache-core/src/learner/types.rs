//! Learning and maintenance reports

use serde::{Deserialize, Serialize};

/// What one learning call did to the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningReport {
    /// Patterns created from unknown names
    pub created: Vec<String>,
    /// Existing patterns whose prediction the LLM agreed with
    pub confirmed: Vec<String>,
    /// Existing patterns whose prediction the LLM disagreed with
    pub contradicted: Vec<String>,
    /// Patterns that would have hit but the LLM did not return
    pub omitted: Vec<String>,
    /// Emitted cache hits that turned out wrong
    pub false_positives: u64,
    /// LLM results ignored for low model confidence or a blank name
    pub skipped: usize,
}

impl LearningReport {
    /// Pattern observations recorded
    pub fn events(&self) -> u64 {
        (self.created.len() + self.confirmed.len() + self.contradicted.len() + self.omitted.len())
            as u64
    }

    pub fn is_empty(&self) -> bool {
        self.events() == 0 && self.skipped == 0
    }

    /// Every pattern name touched, sorted and deduplicated
    pub fn touched(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .created
            .iter()
            .chain(&self.confirmed)
            .chain(&self.contradicted)
            .chain(&self.omitted)
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: LearningReport) {
        self.created.extend(other.created);
        self.confirmed.extend(other.confirmed);
        self.contradicted.extend(other.contradicted);
        self.omitted.extend(other.omitted);
        self.false_positives += other.false_positives;
        self.skipped += other.skipped;
    }
}

/// A change maintenance makes to one pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MaintenanceAction {
    /// Reliable pattern: threshold lowered
    Lowered { pattern: String, from: f64, to: f64 },
    /// Degrading pattern: threshold raised
    Raised { pattern: String, from: f64, to: f64 },
    /// Persistently unreliable pattern removed
    Pruned { pattern: String, success_rate: f64 },
}

impl MaintenanceAction {
    pub fn pattern(&self) -> &str {
        match self {
            Self::Lowered { pattern, .. }
            | Self::Raised { pattern, .. }
            | Self::Pruned { pattern, .. } => pattern,
        }
    }
}

/// Outcome of a maintenance pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub actions: Vec<MaintenanceAction>,
    /// Whether the actions were applied or only planned
    pub applied: bool,
}

impl MaintenanceReport {
    pub fn lowered(&self) -> usize {
        self.count(|a| matches!(a, MaintenanceAction::Lowered { .. }))
    }

    pub fn raised(&self) -> usize {
        self.count(|a| matches!(a, MaintenanceAction::Raised { .. }))
    }

    pub fn pruned(&self) -> usize {
        self.count(|a| matches!(a, MaintenanceAction::Pruned { .. }))
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn count(&self, f: impl Fn(&MaintenanceAction) -> bool) -> usize {
        self.actions.iter().filter(|a| f(a)).count()
    }
}
