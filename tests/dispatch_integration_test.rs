//! Integration tests for the Ghost Agent dispatcher
//!
//! Runs whole intents against a real SQLite index on disk, with a recording
//! key injector and a scripted clipboard in place of the OS.

use ghost_agent::keybinding::Chord;
use ghost_agent::{
    Actuator, ArchiveLog, ClipboardError, ClipboardSource, CommandIndex, DispatchReport,
    GhostAgent, IndexError, InputError, InternalActionHandler, KeyInjector, MacroDefinition,
    MacroStep, MacroTable, StepOutcome,
};
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

/// (command_id, keybinding, description, keywords), in index order
const FIXTURE: &[(&str, Option<&str>, &str, &str)] = &[
    ("workbench.action.closeAllEditors", Some("ctrl+k ctrl+w"), "View: Close All Editors", "close all editors tabs"),
    ("workbench.action.closeSidebar", Some("ctrl+b"), "Close Primary Side Bar", "close sidebar"),
    ("workbench.action.closePanel", Some("ctrl+j"), "Close Panel", "close panel"),
    ("editor.action.formatSelection", None, "Format Selection", "format document selection"),
    ("editor.action.formatDocument", Some("shift+alt+f"), "Format Document", "format document beautify"),
    ("workbench.action.files.save", Some("ctrl+s"), "File: Save", "save file"),
    ("editor.action.clipboardCopyAction", Some("ctrl+c"), "Copy", "copy clipboard"),
    ("workbench.action.toggleZenMode", Some(""), "View: Toggle Zen Mode", "zen focus"),
    ("workbench.action.broken", Some("ctrl+bogus"), "Broken Binding", "broken"),
];

struct Recorder {
    pressed: Rc<RefCell<Vec<String>>>,
}

impl KeyInjector for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn press_chord(&mut self, chord: &Chord) -> Result<(), InputError> {
        if let Some(bad) = chord.keys.iter().find(|k| k.as_str() == "bogus") {
            return Err(InputError::UnknownKey(bad.clone()));
        }
        self.pressed.borrow_mut().push(chord.to_string());
        Ok(())
    }
}

struct ScriptedClipboard(VecDeque<String>);

impl ClipboardSource for ScriptedClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        Ok(self.0.pop_front().unwrap_or_default())
    }
}

struct Harness {
    _dir: TempDir,
    archive_path: PathBuf,
    agent: GhostAgent,
    pressed: Rc<RefCell<Vec<String>>>,
}

fn write_fixture(path: &Path) {
    let conn = Connection::open(path).unwrap();
    CommandIndex::init_schema(&conn).unwrap();
    for (id, keys, description, keywords) in FIXTURE {
        conn.execute(
            "INSERT INTO commands (command_id, keybinding, description, keywords) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id, keys, description, keywords],
        )
        .unwrap();
    }
}

fn harness(macros: MacroTable, clipboard: &[&str]) -> Harness {
    let dir = tempdir().unwrap();
    let db = dir.path().join("commands.db");
    write_fixture(&db);

    let pressed = Rc::new(RefCell::new(Vec::new()));
    let actuator = Actuator::new(
        Box::new(Recorder {
            pressed: pressed.clone(),
        }),
        Duration::ZERO,
    );

    let archive_path = dir.path().join("archive").join("chat.txt");
    let actions = InternalActionHandler::new(
        Box::new(ScriptedClipboard(
            clipboard.iter().map(|s| s.to_string()).collect(),
        )),
        ArchiveLog::new(&archive_path),
        Duration::ZERO,
    );

    let agent = GhostAgent::new(
        CommandIndex::open(&db).unwrap(),
        macros,
        actuator,
        actions,
        Duration::ZERO,
    );

    Harness {
        _dir: dir,
        archive_path,
        agent,
        pressed,
    }
}

fn custom(key: &str, steps: &[&str]) -> MacroDefinition {
    let steps = steps.iter().map(|s| s.parse::<MacroStep>().unwrap()).collect();
    MacroDefinition::new(key, key, "", "", steps).unwrap()
}

#[test]
fn test_clean_slate_presses_every_step() {
    let mut h = harness(MacroTable::builtin(), &[]);

    let report = h.agent.act("clean slate").unwrap();
    let DispatchReport::Macro(m) = &report else {
        panic!("expected a macro, got {:?}", report);
    };

    assert_eq!(m.key, "clean_slate");
    assert_eq!(m.steps.len(), 3);
    assert!(m.fully_succeeded());
    assert_eq!(
        *h.pressed.borrow(),
        vec!["ctrl+k", "ctrl+w", "ctrl+b", "ctrl+j"]
    );
}

#[test]
fn test_macro_keeps_going_past_unknown_step() {
    let table = MacroTable::from_definitions(vec![custom(
        "tidy",
        &[
            "workbench.action.closeSidebar",
            "does.not.exist",
            "workbench.action.files.save",
        ],
    )])
    .unwrap();
    let mut h = harness(table, &[]);

    let report = h.agent.act("tidy").unwrap();
    let DispatchReport::Macro(m) = &report else {
        panic!("expected a macro, got {:?}", report);
    };

    assert!(report.succeeded());
    assert!(!report.fully_succeeded());
    assert_eq!(m.steps.len(), 3);
    assert_eq!(m.steps[1].outcome, StepOutcome::UnknownCommand);
    assert_eq!(m.failed_steps(), 1);
    assert_eq!(*h.pressed.borrow(), vec!["ctrl+b", "ctrl+s"]);
}

#[test]
fn test_unbound_and_broken_steps_are_reported() {
    let table = MacroTable::from_definitions(vec![custom(
        "mixed",
        &[
            "workbench.action.toggleZenMode",
            "workbench.action.broken",
            "workbench.action.closePanel",
        ],
    )])
    .unwrap();
    let mut h = harness(table, &[]);

    let DispatchReport::Macro(m) = h.agent.act("mixed").unwrap() else {
        panic!("expected a macro");
    };

    assert_eq!(m.steps[0].outcome, StepOutcome::MissingKeybinding);
    match &m.steps[1].outcome {
        StepOutcome::Actuated { chords, failures, .. } => {
            assert_eq!(*chords, 1);
            assert_eq!(failures.len(), 1);
            assert!(failures[0].error.contains("bogus"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(m.steps[2].outcome.is_success());
    assert_eq!(*h.pressed.borrow(), vec!["ctrl+j"]);
}

#[test]
fn test_exact_macro_key_beats_command_search() {
    // Normalized to the key before the index is ever searched
    let mut h = harness(MacroTable::builtin(), &[]);
    assert_eq!(h.agent.macros().len(), 5);

    let report = h.agent.act("Smart_Save").unwrap();
    let DispatchReport::Macro(m) = &report else {
        panic!("expected a macro, got {:?}", report);
    };
    assert_eq!(m.key, "smart_save");
    assert_eq!(*h.pressed.borrow(), vec!["shift+alt+f", "ctrl+s"]);
}

#[test]
fn test_spoken_macro_inside_sentence() {
    let mut h = harness(MacroTable::builtin(), &[]);

    let report = h.agent.act("please enter zen mode now").unwrap();
    let DispatchReport::Macro(m) = &report else {
        panic!("expected a macro, got {:?}", report);
    };
    assert_eq!(m.key, "zen_mode");
    // toggleZenMode is unbound in the fixture, closeSidebar is not
    assert_eq!(m.steps[0].outcome, StepOutcome::MissingKeybinding);
    assert!(m.steps[1].outcome.is_success());
}

#[test]
fn test_command_search_skips_unbound_commands() {
    let mut h = harness(MacroTable::new(), &[]);

    let report = h.agent.act("Format Document").unwrap();
    match &report {
        DispatchReport::Command { record, actuation } => {
            assert_eq!(record.command_id, "editor.action.formatDocument");
            assert!(actuation.is_clean());
        }
        other => panic!("expected a command, got {:?}", other),
    }
    assert!(report.fully_succeeded());
    assert_eq!(*h.pressed.borrow(), vec!["shift+alt+f"]);
}

#[test]
fn test_not_found_presses_nothing() {
    let mut h = harness(MacroTable::builtin(), &[]);

    let report = h.agent.act("launch the rockets").unwrap();
    assert_eq!(
        report,
        DispatchReport::NotFound {
            intent: "launch the rockets".into()
        }
    );
    assert!(!report.succeeded());
    assert!(h.pressed.borrow().is_empty());
    assert_eq!(h.agent.index().count().unwrap(), FIXTURE.len());
}

#[test]
fn test_archive_chat_numbers_entries() {
    let mut h = harness(MacroTable::builtin(), &["first answer", "second answer", "third"]);

    for expected in 1..=3 {
        let DispatchReport::Macro(m) = h.agent.act("archive chat").unwrap() else {
            panic!("expected a macro");
        };
        assert!(m.fully_succeeded(), "run {} failed: {:?}", expected, m);
        assert_eq!(
            m.steps[1].outcome,
            StepOutcome::InternalSucceeded {
                detail: format!("archived entry #{}", expected)
            }
        );
    }

    let content = std::fs::read_to_string(&h.archive_path).unwrap();
    assert!(content.contains("[ENTRY #1 | "));
    assert!(content.contains("[ENTRY #2 | "));
    assert!(content.contains("[ENTRY #3 | "));
    assert!(content.find("first answer").unwrap() < content.find("third").unwrap());
    assert_eq!(*h.pressed.borrow(), vec!["ctrl+c", "ctrl+c", "ctrl+c"]);
}

#[test]
fn test_archive_chat_with_empty_clipboard_writes_nothing() {
    let mut h = harness(MacroTable::builtin(), &["  "]);

    let report = h.agent.act("archive chat").unwrap();
    let DispatchReport::Macro(m) = &report else {
        panic!("expected a macro, got {:?}", report);
    };

    assert!(report.succeeded());
    assert!(!m.fully_succeeded());
    assert!(matches!(m.steps[1].outcome, StepOutcome::InternalFailed { .. }));
    assert!(!h.archive_path.exists());
}

#[test]
fn test_unrecognized_internal_step_fails_alone() {
    let table = MacroTable::from_definitions(vec![custom(
        "odd",
        &["__AGENT_INTERNAL_TELEPORT__", "workbench.action.files.save"],
    )])
    .unwrap();
    let mut h = harness(table, &[]);

    let report = h.agent.execute_macro("odd").unwrap();
    assert!(matches!(report.steps[0].outcome, StepOutcome::InternalFailed { .. }));
    assert!(report.steps[1].outcome.is_success());
    assert!(h.agent.execute_macro("missing").is_none());
}

#[test]
fn test_missing_database_is_fatal() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.db");

    match CommandIndex::open(&missing) {
        Err(IndexError::NotFound(path)) => assert_eq!(path, missing),
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("missing database opened"),
    }
    assert!(!missing.exists());
}

#[test]
fn test_database_without_commands_table() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("empty.db");
    Connection::open(&db)
        .unwrap()
        .execute_batch("CREATE TABLE other (x INTEGER);")
        .unwrap();

    assert!(matches!(
        CommandIndex::open(&db),
        Err(IndexError::MissingTable(_))
    ));
}
