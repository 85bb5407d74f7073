//! Threshold maintenance command

use crate::console::{CliConsole, percent};
use colored::*;
use labcache_core::{LabCacheResult, MaintenanceAction, MaintenanceReport, PatternCache};

/// Run maintenance and save, or only show the plan with `dry_run`
pub fn run(cache: &PatternCache, dry_run: bool) -> LabCacheResult<()> {
    let console = CliConsole::new(true);
    console.print_header(if dry_run {
        "Pattern Maintenance (dry run)"
    } else {
        "Pattern Maintenance"
    });

    let report = if dry_run {
        cache.plan_maintenance()
    } else {
        cache.run_maintenance()
    };

    if report.is_empty() {
        console.success("Nothing to change");
        return Ok(());
    }

    for action in &report.actions {
        println!("  {}", describe(action));
    }
    console.print_separator();
    print_summary(&console, &report);

    if dry_run {
        console.warn("Dry run: nothing was saved");
    } else {
        cache.store().save()?;
        tracing::info!(actions = report.actions.len(), "maintenance applied");
        console.success(&format!("Saved {}", cache.store().path().display()));
    }
    Ok(())
}

fn print_summary(console: &CliConsole, report: &MaintenanceReport) {
    console.field("Thresholds lowered", report.lowered());
    console.field("Thresholds raised", report.raised());
    console.field("Patterns pruned", report.pruned());
}

fn describe(action: &MaintenanceAction) -> String {
    match action {
        MaintenanceAction::Lowered { pattern, from, to } => {
            format!("{} {pattern}: threshold {from:.2} → {to:.2}", "↓".green())
        }
        MaintenanceAction::Raised { pattern, from, to } => {
            format!("{} {pattern}: threshold {from:.2} → {to:.2}", "↑".yellow())
        }
        MaintenanceAction::Pruned {
            pattern,
            success_rate,
        } => format!(
            "{} {pattern}: pruned at {} success",
            "✗".red(),
            percent(*success_rate)
        ),
    }
}
