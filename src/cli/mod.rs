//! Ghost Agent CLI
//!
//! Colors and report printing for the operator terminal.

use crate::dispatcher::{DispatchReport, MacroReport, StepOutcome};
use crate::keybinding::ChordSequence;
use crate::macros::MacroTable;
use crate::sentinel::WatchSummary;
use console::style;

pub const BANNER_TEXT: &str = r#"
   ▄▄▄▄ ▄  ▄  ▄▄▄   ▄▄▄ ▄▄▄▄▄
  █     █▄▄█ █   █ ▀▄▄    █
  █  ▀█ █  █ █   █     █  █
   ▀▀▀  ▀  ▀  ▀▀▀  ▀▀▀    ▀
"#;

pub fn print_banner() {
    println!("{}", style(BANNER_TEXT).cyan().bold());
    println!(
        "{}",
        style(format!("        intent -> keystrokes  v{}", env!("CARGO_PKG_VERSION"))).dim()
    );
    println!();
}

pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").cyan(), msg);
}

pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn print_error(msg: &str) {
    println!("{} {}", style("✗").red().bold(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Countdown so the operator can focus the target window.
pub fn print_countdown(secs: u64) {
    println!(
        "{}",
        style(format!("⏳ Executing in {} seconds... FOCUS TARGET WINDOW!", secs))
            .yellow()
            .bold()
    );
}

pub fn print_macro_table(table: &MacroTable) {
    println!("{}", style("MACROS").cyan().bold());
    println!("{}", style("────────────────────────────────────────────────────────────").dim());
    for (i, def) in table.iter().enumerate() {
        println!(
            "{} {} {} {}",
            style(format!("[{}]", i + 1)).dim(),
            def.icon,
            style(&def.key).white().bold(),
            style(format!("- {}", def.name)).dim()
        );
        if !def.description.is_empty() {
            println!("      {}", def.description);
        }
        for step in &def.steps {
            println!("      {} {}", style("→").dim(), step);
        }
    }
}

pub fn print_chords(binding: &str, seq: &ChordSequence) {
    println!("{} {}", style("Binding:").dim(), binding);
    for (i, chord) in seq.iter().enumerate() {
        println!(
            "  {} {}",
            style(format!("chord {}:", i + 1)).dim(),
            style(chord.keys.join(" + ")).white().bold()
        );
    }
}

fn print_step_line(index: usize, total: usize, step: &str, outcome: &StepOutcome) {
    let prefix = style(format!("[{}/{}]", index + 1, total)).dim();
    match outcome {
        StepOutcome::Actuated { keybinding, failures, .. } if failures.is_empty() => {
            println!("{} {} {} {}", prefix, style("✓").green(), step, style(keybinding).dim())
        }
        StepOutcome::Actuated { keybinding, failures, .. } => println!(
            "{} {} {} {} ({} chord(s) failed)",
            prefix,
            style("⚠").yellow(),
            step,
            style(keybinding).dim(),
            failures.len()
        ),
        StepOutcome::MissingKeybinding => {
            println!("{} {} {} (no keybinding, skipped)", prefix, style("⚠").yellow(), step)
        }
        StepOutcome::UnknownCommand => {
            println!("{} {} {} (not in index, skipped)", prefix, style("✗").red(), step)
        }
        StepOutcome::LookupFailed { reason } => {
            println!("{} {} {} ({})", prefix, style("✗").red(), step, reason)
        }
        StepOutcome::InternalSucceeded { detail } => {
            println!("{} {} {} ({})", prefix, style("✓").green(), step, detail)
        }
        StepOutcome::InternalFailed { reason } => {
            println!("{} {} {} ({})", prefix, style("✗").red(), step, reason)
        }
    }
}

pub fn print_macro_report(report: &MacroReport) {
    println!("{} {}", style("🌀 Macro:").cyan().bold(), report.name);
    let total = report.steps.len();
    for (i, step) in report.steps.iter().enumerate() {
        print_step_line(i, total, &step.step.to_string(), &step.outcome);
    }
    if report.fully_succeeded() {
        print_success(&format!("Macro '{}' completed.", report.name));
    } else {
        print_warning(&format!(
            "Macro '{}' completed with {} failed step(s).",
            report.name,
            report.failed_steps()
        ));
    }
}

pub fn print_dispatch_report(report: &DispatchReport) {
    match report {
        DispatchReport::Macro(m) => print_macro_report(m),
        DispatchReport::Command { record, actuation } => {
            println!("{} {} ({})", style("🧠 Matched:").cyan(), record.description, record.command_id);
            println!("{} {}", style("🔑 Keys:").cyan(), record.keybinding);
            if actuation.is_clean() {
                print_success("Done.");
            } else {
                for failure in &actuation.failures {
                    print_error(&format!("{}: {}", failure.chord, failure.error));
                }
            }
        }
        DispatchReport::NotFound { .. } => print_warning("I don't know how to do that yet."),
    }
}

pub fn print_watch_summary(summary: &WatchSummary) {
    print_info(&format!(
        "Harvester stopped after {:.0?}. Archived: {}, failed writes: {}, failed reads: {}",
        summary.elapsed, summary.archived, summary.failures, summary.read_failures
    ));
}
