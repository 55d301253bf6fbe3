//! Ghost Agent - intent -> keystrokes
//!
//! ```bash
//! ghost-agent "clean slate"
//! ghost-agent format document
//! ghost-agent --watch
//! ghost-agent list-macros
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use ghost_agent::cli::{
    print_banner, print_chords, print_countdown, print_dispatch_report, print_error, print_info,
    print_macro_table, print_success, print_warning, print_watch_summary,
};
use ghost_agent::{
    parse_keybinding, AgentConfig, ArchiveLog, ClipboardSource, CommandIndex, ConfigManager,
    DispatchReport, GhostAgent, Sentinel, SystemClipboard, SystemLogger,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const SELF_TEST_QUERY: &str = "format document";

#[derive(Parser)]
#[command(name = "ghost-agent")]
#[command(version)]
#[command(about = "Intent-to-keystroke macro dispatcher")]
#[command(long_about = r#"
Ghost Agent turns a plain-English intention into editor keystrokes.

It first looks for a macro whose key matches the intention, then searches the
harvested command index for a bound command, and presses the keybinding.

Examples:
  ghost-agent clean slate
  ghost-agent "format document"
  ghost-agent smart save --dry-run
  ghost-agent --watch
"#)]
struct Args {
    /// Intention in plain English. Flags may follow it; use `--` before
    /// words that start with a dash
    #[arg(num_args = 0..)]
    intent: Vec<String>,

    /// Watch the clipboard and archive every new copy until Ctrl+C
    #[arg(short, long)]
    watch: bool,

    /// Command index database
    #[arg(long, env = "GHOST_AGENT_DB", value_name = "PATH")]
    db: Option<PathBuf>,

    /// Archive log file
    #[arg(long, value_name = "PATH")]
    archive: Option<PathBuf>,

    /// Config file (default: <config dir>/ghost-agent/config.toml)
    #[arg(long, env = "GHOST_AGENT_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seconds to wait before the first key press
    #[arg(long, value_name = "SECS")]
    warmup: Option<u64>,

    /// Log chords instead of pressing them
    #[arg(long)]
    dry_run: bool,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Show debug output
    #[arg(long)]
    debug: bool,

    /// Minimal output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List macros in resolution order
    ListMacros,
    /// Search the command index without pressing anything
    FindCommand {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Show how a keybinding string is split into chords
    ParseKeys { binding: String },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.debug);

    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            print_error(&format!("{:#}", e));
            1
        }
    };
    std::process::exit(code);
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "ghost_agent=debug"
    } else {
        "ghost_agent=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> AgentConfig {
    let manager = match &args.config {
        Some(path) => ConfigManager::at(path),
        None => ConfigManager::new(),
    };
    let mut config = manager.load();

    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    if let Some(archive) = &args.archive {
        config.archive_path = archive.clone();
    }
    if let Some(secs) = args.warmup {
        config.warmup_secs = secs;
    }
    config
}

/// Open the index or give up: nothing works without it.
fn open_index(config: &AgentConfig) -> anyhow::Result<CommandIndex> {
    CommandIndex::open(&config.db_path).map_err(|e| {
        SystemLogger::new().index_unavailable(&e.to_string());
        anyhow::Error::new(e).context("Cannot start without the command index")
    })
}

async fn run(args: Args) -> anyhow::Result<i32> {
    let config = load_config(&args);

    if let Some(cmd) = &args.command {
        return match cmd {
            Commands::ListMacros => {
                print_macro_table(&config.macro_table());
                Ok(0)
            }
            Commands::FindCommand { query } => find_command(&config, &query.join(" "), args.json),
            Commands::ParseKeys { binding } => {
                let seq = parse_keybinding(binding);
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&seq.to_key_lists())?);
                } else {
                    print_chords(binding, &seq);
                }
                Ok(0)
            }
        };
    }

    if !args.quiet && !args.json {
        print_banner();
    }

    if args.watch {
        return watch(&config).await;
    }

    let intent = args.intent.join(" ");
    if intent.trim().is_empty() {
        return self_test(&config);
    }

    dispatch(config, intent, args.dry_run, args.json).await
}

fn find_command(config: &AgentConfig, query: &str, json: bool) -> anyhow::Result<i32> {
    let index = open_index(config)?;
    let found = index.search(query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        match &found {
            Some(rec) => print_success(&format!(
                "{} ({}) -> {}",
                rec.description, rec.command_id, rec.keybinding
            )),
            None => print_warning(&format!("No bound command matches '{}'", query)),
        }
    }
    Ok(if found.is_some() { 0 } else { 2 })
}

fn self_test(config: &AgentConfig) -> anyhow::Result<i32> {
    print_info("Usage: ghost-agent <intention>");
    print_info("Running self-test...");

    let index = open_index(config)?;
    print_info(&format!(
        "Index: {} ({} commands)",
        config.db_path.display(),
        index.count()?
    ));

    match index.search(SELF_TEST_QUERY)? {
        Some(rec) => {
            print_success(&format!(
                "Test find '{}': found {} [{}]",
                SELF_TEST_QUERY, rec.command_id, rec.keybinding
            ));
            Ok(0)
        }
        None => {
            print_error(&format!("Test find '{}': not found", SELF_TEST_QUERY));
            Ok(1)
        }
    }
}

async fn dispatch(config: AgentConfig, intent: String, dry_run: bool, json: bool) -> anyhow::Result<i32> {
    // Fail before the countdown, not after it
    drop(open_index(&config)?);

    let warmup = config.warmup();
    if !warmup.is_zero() && !dry_run {
        print_countdown(config.warmup_secs);
        tokio::time::sleep(warmup).await;
    }

    let report: DispatchReport = tokio::task::spawn_blocking(move || {
        let mut agent = GhostAgent::from_config(&config, dry_run)?;
        agent.act(&intent)
    })
    .await
    .context("Dispatcher task panicked")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_dispatch_report(&report);
    }

    Ok(if report.succeeded() { 0 } else { 2 })
}

async fn watch(config: &AgentConfig) -> anyhow::Result<i32> {
    let archive = ArchiveLog::with_separator(&config.archive_path, config.archive_separator.clone());
    print_info(&format!("📋 Clipboard harvester saving to {}", archive.path().display()));
    print_info("Press Ctrl+C to stop.");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let sentinel = Sentinel::new(archive, config.watch_poll());
    let summary = sentinel
        .run(
            || Box::new(SystemClipboard::new()) as Box<dyn ClipboardSource>,
            cancel,
        )
        .await?;

    print_watch_summary(&summary);
    Ok(0)
}
