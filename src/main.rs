//! markfiles - command-line host for the mark engine
//!
//! # Overview
//!
//! Each invocation plays the part of one host session:
//! 1. Load `config.yaml` from the state directory ([`ConfigManager`])
//! 2. Initialize logging -> `<state-dir>/logs/markfiles.<date>`
//! 3. Build a current-thread tokio runtime
//! 4. Open the workspace store (`<state-dir>/state.json`) and construct the [`MarkEngine`]
//! 5. Run the startup load (workspace store, else scope files)
//! 6. Dispatch the subcommand through [`MarkFilesCommands`]
//! 7. Print every change notification, flush pending store writes, log metrics
//!
//! The state directory defaults to `.markfiles` inside the first project root
//! and is never enumerated as part of the workspace.

use anyhow::{Context, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use markfiles::engine::StartupLoad;
use markfiles::services::{
    ExportReport, JsonFileStore, LocalFileSystem, PersistenceAdapter, Prompter, TerminalPrompter,
};
use markfiles::{
    APP_NAME, ConfigManager, MarkChange, MarkEngine, MarkFilesCommands, MarkFilesConfig,
    ReconcileOutcome, VERSION, Workspace,
};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::watch;

const DEFAULT_STATE_DIR: &str = ".markfiles";

#[derive(Parser)]
#[command(
    name = "markfiles",
    version = VERSION,
    about = "Mark files in a project as in scope",
    long_about = "Keeps a durable set of marked files per workspace and syncs it with gitignore-style scope files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root; repeat for multi-root workspaces (defaults to the current directory)
    #[arg(short, long = "workspace", global = true)]
    workspace: Vec<Utf8PathBuf>,

    /// Directory for workspace state, settings and logs
    #[arg(long, global = true)]
    state_dir: Option<Utf8PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark or unmark files; directories toggle every file beneath them
    Toggle {
        #[arg(required = true)]
        paths: Vec<Utf8PathBuf>,
    },

    /// Mark or unmark the file open in the active editor
    Active { path: Utf8PathBuf },

    /// Replace all marks with what the scope files select
    Reload {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Write marked files to a scope file in each project root
    Export {
        /// Scope file base name (prompted for when omitted)
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite existing scope files without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Rename a file or folder and carry its marks along
    Rename { old: Utf8PathBuf, new: Utf8PathBuf },

    /// List marked files
    List,

    /// Show the decoration the host would render for a path
    Decoration { path: Utf8PathBuf },

    /// Show the effective settings
    Config,
}

/// Terminal prompts, short-circuited by `--yes` and `--name`
struct CliPrompter {
    yes: bool,
    name: Option<String>,
    terminal: TerminalPrompter,
}

#[async_trait]
impl Prompter for CliPrompter {
    async fn confirm(&self, message: &str) -> bool {
        self.yes || self.terminal.confirm(message).await
    }

    async fn input(&self, prompt: &str, default: &str) -> Option<String> {
        match &self.name {
            Some(name) => Some(name.clone()),
            None if self.yes => Some(default.to_string()),
            None => self.terminal.input(prompt, default).await,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = Utf8PathBuf::try_from(std::env::current_dir()?)
        .context("Current directory is not valid UTF-8")?;
    let roots: Vec<Utf8PathBuf> = if cli.workspace.is_empty() {
        vec![cwd.clone()]
    } else {
        cli.workspace.iter().map(|p| absolute(&cwd, p)).collect()
    };
    let state_dir = match &cli.state_dir {
        Some(dir) => absolute(&cwd, dir),
        None => roots[0].join(DEFAULT_STATE_DIR),
    };

    let config_manager = ConfigManager::new(&state_dir)?;
    let config = config_manager.load_config()?;

    let _guard = markfiles::logging::setup_logging(
        &state_dir.join("logs"),
        APP_NAME,
        cli.verbose || config.debug_mode,
        cli.verbose,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // Operations interleave cooperatively on one thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .thread_name("markfiles")
        .build()?;

    let result = runtime.block_on(run(cli, cwd, roots, state_dir, config));

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    tracing::info!("Session complete");

    result
}

async fn run(
    cli: Cli,
    cwd: Utf8PathBuf,
    roots: Vec<Utf8PathBuf>,
    state_dir: Utf8PathBuf,
    config: MarkFilesConfig,
) -> Result<()> {
    let store: Option<Arc<dyn PersistenceAdapter>> =
        match JsonFileStore::open(state_dir.join("state.json")).await {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        };

    let fs = LocalFileSystem::new().with_excluded_dir(&state_dir);
    let engine = Arc::new(MarkEngine::new(
        Workspace::new(&roots),
        Arc::new(fs),
        store,
        config,
    ));

    match engine.startup_load().await {
        StartupLoad::Store(n) => tracing::debug!("Startup: {} mark(s) from workspace store", n),
        StartupLoad::Scope(n) => println!("Marked {n} file(s) from scope file(s)"),
        StartupLoad::Empty => tracing::debug!("Startup: nothing to load"),
    }

    let (yes, name) = match &cli.command {
        Commands::Reload { yes } => (*yes, None),
        Commands::Export { name, yes } => (*yes, name.clone()),
        _ => (false, None),
    };
    let prompter = Arc::new(CliPrompter {
        yes,
        name,
        terminal: TerminalPrompter,
    });
    let commands = MarkFilesCommands::new(Arc::clone(&engine), prompter);

    // The render surface: everything that changes from here on gets printed
    let mut changes = engine.subscribe();

    match cli.command {
        Commands::Toggle { paths } => {
            let paths: Vec<Utf8PathBuf> = paths.iter().map(|p| absolute(&cwd, p)).collect();
            commands.mark_unmark_selected_files(None, &paths).await;
        }
        Commands::Active { path } => {
            commands
                .mark_unmark_active_file(Some(&absolute(&cwd, &path)))
                .await;
        }
        Commands::Reload { .. } => match commands.reload_from_scope_file().await {
            ReconcileOutcome::NoProject => println!("No opened project"),
            ReconcileOutcome::Declined => println!("Reload cancelled"),
            ReconcileOutcome::Applied(_) => println!("Loading marked files from scope file(s)"),
        },
        Commands::Export { .. } => match commands.write_marked_files_to_disk().await {
            Some(report) => print_report(&report),
            None => println!("Nothing exported"),
        },
        Commands::Rename { old, new } => {
            let (old, new) = (absolute(&cwd, &old), absolute(&cwd, &new));
            tokio::fs::rename(&old, &new)
                .await
                .with_context(|| format!("Failed to rename {} to {}", old, new))?;
            commands.on_did_rename_files(&[(old, new)]);
        }
        Commands::List => {
            let mut marked = engine.state().marked_files();
            marked.sort();
            for path in marked {
                println!("{path}");
            }
        }
        Commands::Decoration { path } => {
            let (_cancel_tx, cancel) = watch::channel(false);
            let decoration = engine.decoration(&absolute(&cwd, &path), &cancel);
            println!("{}", serde_json::to_string_pretty(&decoration)?);
        }
        Commands::Config => {
            print!("{}", serde_yaml_ng::to_string(&engine.config())?);
        }
    }

    print_changes(&mut changes);

    engine.flush().await;
    engine.metrics().log_summary();
    Ok(())
}

fn print_changes(changes: &mut broadcast::Receiver<MarkChange>) {
    loop {
        match changes.try_recv() {
            Ok(MarkChange::Marked { path }) => println!("marked    {path}"),
            Ok(MarkChange::Unmarked { path }) => println!("unmarked  {path}"),
            Ok(MarkChange::Renamed { from, to }) => println!("renamed   {from} -> {to}"),
            Ok(MarkChange::Refreshed { path }) => println!("refreshed {path}"),
            Err(TryRecvError::Lagged(skipped)) => {
                println!("({skipped} changes not shown; run `markfiles list`)");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn print_report(report: &ExportReport) {
    for path in &report.written {
        println!("wrote     {path}");
    }
    for path in &report.declined {
        println!("kept      {path}");
    }
    for path in &report.failed {
        println!("failed    {path}");
    }
}

fn absolute(cwd: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
