//! Periodic threshold adjustment and pruning

use super::core::PatternLearner;
use super::types::{MaintenanceAction, MaintenanceReport};
use crate::config::MaintenanceConfig;
use crate::store::BiomarkerPattern;
use std::collections::HashMap;

impl PatternLearner {
    /// What a maintenance pass would do, without doing it
    pub fn plan_maintenance(&self) -> MaintenanceReport {
        let actions = self
            .store
            .with_patterns(|patterns| plan(patterns, &self.settings.maintenance));
        MaintenanceReport {
            actions,
            applied: false,
        }
    }

    /// Lower thresholds of reliable patterns, raise those of degrading
    /// ones, and prune persistently unreliable ones
    pub fn run_maintenance(&self) -> MaintenanceReport {
        if self.plan_maintenance().is_empty() {
            tracing::debug!("maintenance found nothing to change");
            return MaintenanceReport {
                actions: Vec::new(),
                applied: true,
            };
        }

        let actions = self.store.modify(|patterns| {
            let actions = plan(patterns, &self.settings.maintenance);
            for action in &actions {
                apply(patterns, action);
            }
            actions
        });

        let report = MaintenanceReport {
            actions,
            applied: true,
        };
        tracing::info!(
            lowered = report.lowered(),
            raised = report.raised(),
            pruned = report.pruned(),
            "pattern maintenance applied"
        );
        report
    }
}

fn plan(
    patterns: &HashMap<String, BiomarkerPattern>,
    config: &MaintenanceConfig,
) -> Vec<MaintenanceAction> {
    let mut names: Vec<&String> = patterns.keys().collect();
    names.sort();

    names
        .into_iter()
        .filter_map(|name| action_for(&patterns[name], config))
        .collect()
}

fn action_for(pattern: &BiomarkerPattern, config: &MaintenanceConfig) -> Option<MaintenanceAction> {
    let threshold = pattern.confidence_threshold;

    if pattern.frequency_count >= config.prune_min_frequency
        && pattern.success_rate < config.prune_success_floor
    {
        return Some(MaintenanceAction::Pruned {
            pattern: pattern.name.clone(),
            success_rate: pattern.success_rate,
        });
    }

    if pattern.frequency_count < config.min_frequency_for_adjustment {
        return None;
    }

    if pattern.success_rate >= config.high_success_rate && threshold > config.min_threshold {
        let to = round_threshold((threshold - config.threshold_step).max(config.min_threshold));
        return Some(MaintenanceAction::Lowered {
            pattern: pattern.name.clone(),
            from: threshold,
            to,
        });
    }

    if pattern.success_rate < config.degraded_success_rate && threshold < config.max_threshold {
        let to = round_threshold((threshold + config.threshold_step).min(config.max_threshold));
        return Some(MaintenanceAction::Raised {
            pattern: pattern.name.clone(),
            from: threshold,
            to,
        });
    }

    None
}

fn apply(patterns: &mut HashMap<String, BiomarkerPattern>, action: &MaintenanceAction) {
    match action {
        MaintenanceAction::Lowered { pattern, to, .. }
        | MaintenanceAction::Raised { pattern, to, .. } => {
            if let Some(p) = patterns.get_mut(pattern) {
                p.confidence_threshold = *to;
            }
        }
        MaintenanceAction::Pruned { pattern, .. } => {
            patterns.remove(pattern);
            tracing::info!(pattern = %pattern, "pruned unreliable pattern");
        }
    }
}

/// Keep thresholds free of accumulated float noise
fn round_threshold(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MaintenanceConfig {
        MaintenanceConfig::default()
    }

    #[test]
    fn test_reliable_pattern_lowered() {
        let pattern = BiomarkerPattern::new("glucose")
            .with_frequency(12)
            .with_success_rate(0.97)
            .with_threshold(0.9);
        match action_for(&pattern, &config()) {
            Some(MaintenanceAction::Lowered { to, .. }) => assert!((to - 0.88).abs() < 1e-9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_threshold_floor() {
        let pattern = BiomarkerPattern::new("glucose")
            .with_frequency(50)
            .with_success_rate(0.99)
            .with_threshold(0.75);
        assert!(action_for(&pattern, &config()).is_none());

        let near_floor = pattern.with_threshold(0.76);
        match action_for(&near_floor, &config()) {
            Some(MaintenanceAction::Lowered { to, .. }) => assert_eq!(to, 0.75),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_degrading_pattern_raised() {
        let pattern = BiomarkerPattern::new("ldl")
            .with_frequency(15)
            .with_success_rate(0.6)
            .with_threshold(0.98);
        match action_for(&pattern, &config()) {
            Some(MaintenanceAction::Raised { to, .. }) => assert_eq!(to, 0.99),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_young_pattern_untouched() {
        let pattern = BiomarkerPattern::new("tsh")
            .with_frequency(3)
            .with_success_rate(0.5);
        assert!(action_for(&pattern, &config()).is_none());
    }

    #[test]
    fn test_unreliable_pattern_pruned() {
        let pattern = BiomarkerPattern::new("noise")
            .with_frequency(25)
            .with_success_rate(0.1);
        assert!(matches!(
            action_for(&pattern, &config()),
            Some(MaintenanceAction::Pruned { .. })
        ));
    }
}
