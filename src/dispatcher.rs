//! Ghost Agent - intention -> keystrokes
//!
//! ```text
//! intent ──► resolver ──► macro ──► for each step ─┬─► command ──► keybinding ──► actuator
//!                │                                 └─► internal ──► action handler
//!                └──────► single command ──► keybinding ──► actuator
//! ```
//!
//! Everything runs on the calling thread and blocks on fixed pauses. A failing
//! step or chord is logged and recorded in the report, never raised: a macro
//! always runs to its last step.

use crate::actions::{ActionOutcome, InternalActionHandler};
use crate::archive::ArchiveLog;
use crate::clipboard::SystemClipboard;
use crate::core::{AgentConfig, GhostError};
use crate::index::{CommandIndex, CommandRecord};
use crate::input::{create_injector, ActuationReport, Actuator, ChordFailure};
use crate::keybinding::parse_keybinding;
use crate::logging::SystemLogger;
use crate::macros::{MacroDefinition, MacroStep, MacroTable};
use crate::resolver::{resolve_intent, Resolution};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happened to one macro step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Actuated {
        keybinding: String,
        chords: usize,
        failures: Vec<ChordFailure>,
    },
    MissingKeybinding,
    UnknownCommand,
    LookupFailed { reason: String },
    InternalSucceeded { detail: String },
    InternalFailed { reason: String },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            StepOutcome::Actuated { failures, .. } => failures.is_empty(),
            StepOutcome::InternalSucceeded { .. } => true,
            StepOutcome::MissingKeybinding
            | StepOutcome::UnknownCommand
            | StepOutcome::LookupFailed { .. }
            | StepOutcome::InternalFailed { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: MacroStep,
    pub outcome: StepOutcome,
}

/// Per-step record of one macro run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroReport {
    pub key: String,
    pub name: String,
    pub steps: Vec<StepReport>,
}

impl MacroReport {
    /// The macro was found and every step was attempted.
    pub fn started(&self) -> bool {
        true
    }

    /// Every step did what it was meant to.
    pub fn fully_succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.outcome.is_success())
    }

    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.outcome.is_success()).count()
    }
}

/// Result of one `act` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchReport {
    Macro(MacroReport),
    Command {
        record: CommandRecord,
        actuation: ActuationReport,
    },
    NotFound {
        intent: String,
    },
}

impl DispatchReport {
    /// Something matched and was executed. Says nothing about individual
    /// steps; see [`DispatchReport::fully_succeeded`].
    pub fn succeeded(&self) -> bool {
        match self {
            DispatchReport::Macro(report) => report.started(),
            DispatchReport::Command { .. } => true,
            DispatchReport::NotFound { .. } => false,
        }
    }

    pub fn fully_succeeded(&self) -> bool {
        match self {
            DispatchReport::Macro(report) => report.fully_succeeded(),
            DispatchReport::Command { actuation, .. } => actuation.is_clean(),
            DispatchReport::NotFound { .. } => false,
        }
    }
}

pub struct GhostAgent {
    index: CommandIndex,
    macros: MacroTable,
    actuator: Actuator,
    actions: InternalActionHandler,
    logger: SystemLogger,
    step_delay: Duration,
}

impl GhostAgent {
    pub fn new(
        index: CommandIndex,
        macros: MacroTable,
        actuator: Actuator,
        actions: InternalActionHandler,
        step_delay: Duration,
    ) -> Self {
        Self {
            index,
            macros,
            actuator,
            actions,
            logger: SystemLogger::new(),
            step_delay,
        }
    }

    /// Wire up the real collaborators. A missing index is fatal.
    pub fn from_config(config: &AgentConfig, dry_run: bool) -> Result<Self, GhostError> {
        let index = CommandIndex::open(&config.db_path)?;
        let actuator = Actuator::new(create_injector(dry_run)?, config.chord_delay());
        tracing::debug!(
            injector = actuator.injector_name(),
            db = %config.db_path.display(),
            "Agent ready"
        );
        let actions = InternalActionHandler::new(
            Box::new(SystemClipboard::new()),
            ArchiveLog::with_separator(&config.archive_path, config.archive_separator.clone()),
            config.archive_settle(),
        );

        Ok(Self::new(
            index,
            config.macro_table(),
            actuator,
            actions,
            config.step_delay(),
        ))
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn index(&self) -> &CommandIndex {
        &self.index
    }

    /// Main entry point: intention -> action.
    pub fn act(&mut self, intent: &str) -> Result<DispatchReport, GhostError> {
        self.logger.dispatch_start(intent);

        let target = match resolve_intent(intent, &self.macros, &self.index)? {
            Resolution::Macro(def) => Ok(def.clone()),
            Resolution::Command(record) => Err(Some(record)),
            Resolution::NotFound => Err(None),
        };

        match target {
            Ok(def) => Ok(DispatchReport::Macro(self.run_macro(&def))),
            Err(Some(record)) => {
                tracing::info!(command = %record.command_id, "Matched: {}", record.description);
                let actuation = self.execute_command(&record);
                Ok(DispatchReport::Command { record, actuation })
            }
            Err(None) => {
                self.logger.intent_not_found(intent);
                Ok(DispatchReport::NotFound {
                    intent: intent.to_string(),
                })
            }
        }
    }

    /// Run a macro by key. `None` when there is no such macro.
    pub fn execute_macro(&mut self, key: &str) -> Option<MacroReport> {
        let def = self.macros.get(key)?.clone();
        Some(self.run_macro(&def))
    }

    /// Press the keybinding of a single command. Search only returns bound
    /// commands; an unbound record here yields an empty report.
    pub fn execute_command(&mut self, record: &CommandRecord) -> ActuationReport {
        if !record.has_keybinding() {
            self.logger.missing_keybinding(&record.command_id);
            return ActuationReport::default();
        }

        let report = self.press(&record.command_id, &record.keybinding);
        self.logger
            .command_actuated(&record.command_id, &record.keybinding);
        report
    }

    fn run_macro(&mut self, def: &MacroDefinition) -> MacroReport {
        self.logger.macro_started(&def.key, &def.name);
        tracing::info!("{} {}", def.icon, def.description);

        let mut steps = Vec::with_capacity(def.steps.len());
        for step in &def.steps {
            tracing::info!(step = %step, "Step");
            let outcome = self.run_step(step);
            steps.push(StepReport {
                step: step.clone(),
                outcome,
            });

            if !self.step_delay.is_zero() {
                std::thread::sleep(self.step_delay);
            }
        }

        let report = MacroReport {
            key: def.key.clone(),
            name: def.name.clone(),
            steps,
        };
        self.logger
            .macro_completed(&def.key, report.steps.len(), report.fully_succeeded());
        report
    }

    fn run_step(&mut self, step: &MacroStep) -> StepOutcome {
        match step {
            MacroStep::Internal(action) => match self.actions.run(action) {
                Ok(ActionOutcome::Archived(entry)) => {
                    let path = self.actions.archive().path().display().to_string();
                    self.logger.clipboard_archived(entry.sequence_number, &path);
                    StepOutcome::InternalSucceeded {
                        detail: format!("archived entry #{}", entry.sequence_number),
                    }
                }
                Err(e) => {
                    self.logger.archive_failed(&step.token(), &e.to_string());
                    StepOutcome::InternalFailed {
                        reason: e.to_string(),
                    }
                }
            },
            MacroStep::KeyCommand(command_id) => match self.index.find_by_id(command_id) {
                Ok(Some(record)) if record.has_keybinding() => {
                    let report = self.press(command_id, &record.keybinding);
                    StepOutcome::Actuated {
                        keybinding: record.keybinding,
                        chords: report.attempted,
                        failures: report.failures,
                    }
                }
                Ok(Some(_)) => {
                    self.logger.missing_keybinding(command_id);
                    StepOutcome::MissingKeybinding
                }
                Ok(None) => {
                    self.logger.unknown_command(command_id);
                    StepOutcome::UnknownCommand
                }
                Err(e) => {
                    tracing::error!(command = %command_id, "Index lookup failed: {}", e);
                    StepOutcome::LookupFailed {
                        reason: e.to_string(),
                    }
                }
            },
        }
    }

    fn press(&mut self, command_id: &str, keybinding: &str) -> ActuationReport {
        let sequence = parse_keybinding(keybinding);
        let report = self.actuator.actuate(&sequence);
        for failure in &report.failures {
            self.logger
                .actuation_failed(command_id, &failure.chord, &failure.error);
        }
        report
    }
}
