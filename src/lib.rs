// src/lib.rs

pub mod agent;
pub mod cli;
pub mod config;
pub mod engine;
pub mod envision;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod tasks;
pub mod types;
pub mod watch;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch as signal_watch;
use tracing::{debug, error, info};

use crate::agent::ClaudeCliBackend;
use crate::cli::{CliArgs, Command, EnvisionArgs, TasksArgs, WatchArgs};
use crate::config::{load_raw_or_default, ConfigFile, LoadedConfig, RawConfigFile};
use crate::engine::{Monitor, MonitorOptions, TerminalApprover, Toolset};
use crate::envision::EnvisionOptions;
use crate::errors::WatchfixError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::OutputFormat;
use crate::watch::{spawn_watcher, Debouncer, EventIngestor};

/// High-level entry point used by `main.rs`.
///
/// Dispatches to the selected subcommand; `watch` is the default.
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command_or_default() {
        Command::Watch(watch_args) => {
            let loaded = load_raw_or_default(args.config.as_deref())?;
            run_watch(loaded, &watch_args).await
        }
        Command::Tasks(tasks_args) => run_tasks(&tasks_args),
        Command::Envision(envision_args) => {
            let loaded = load_raw_or_default(args.config.as_deref())?;
            run_envision(loaded, &envision_args).await
        }
    }
}

/// Apply `watch` flags on top of the file config, before validation.
pub fn apply_watch_overrides(raw: &mut RawConfigFile, args: &WatchArgs) {
    if let Some(settle) = args.settle_secs {
        raw.watch.settle_secs = settle;
    }
    if let Some(poll) = args.poll_interval_secs {
        raw.watch.poll_interval_secs = poll;
    }
    if args.skip_unchanged {
        raw.watch.skip_unchanged = true;
    }
}

async fn run_watch(loaded: LoadedConfig, args: &WatchArgs) -> Result<()> {
    let LoadedConfig { mut raw, source } = loaded;
    apply_watch_overrides(&mut raw, args);
    let cfg = ConfigFile::try_from(raw)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let root = resolve_root(fs.as_ref(), args.root.as_deref(), &cfg, source.as_deref())?;

    if args.dry_run {
        print_dry_run(&cfg, &root, source.as_deref());
        return Ok(());
    }

    let rules = cfg.watch().ignore_rules()?;
    let debouncer = Arc::new(Debouncer::new(cfg.watch().settle_window));

    let ingestor = EventIngestor::new(root.clone(), rules, Arc::clone(&debouncer));
    let handle = spawn_watcher(ingestor, Arc::clone(&fs))?;

    print_banner(&root);

    let shutdown_rx = shutdown_on(tokio::signal::ctrl_c());

    let monitor = Monitor::new(
        debouncer,
        fs,
        Arc::new(ClaudeCliBackend::from_config(cfg.agent())),
        Arc::new(TerminalApprover),
        Toolset::from_config(&cfg),
        MonitorOptions::from_config(&cfg, &root),
    );

    let outcome = monitor.run(shutdown_rx).await;

    println!("\nShutting down...");
    handle.shutdown().await;

    let stats = outcome?;
    info!(
        batches = stats.batches,
        files = stats.files_analyzed,
        failures = stats.failures,
        "watch session finished"
    );
    Ok(())
}

fn run_tasks(args: &TasksArgs) -> Result<()> {
    let dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("resolving current directory")?,
    };

    let tasks = tasks::get_pending_tasks(&RealFileSystem, &dir)?;
    debug!(count = tasks.len(), ?dir, "pending tasks scanned");

    match args.output {
        OutputFormat::Text => print!("{}", tasks::format_text(&tasks)),
        OutputFormat::Json => println!("{}", tasks::format_json(&tasks)?),
    }
    Ok(())
}

async fn run_envision(loaded: LoadedConfig, args: &EnvisionArgs) -> Result<()> {
    let LoadedConfig { raw, source } = loaded;
    let cfg = ConfigFile::try_from(raw)?;
    let root = resolve_root(&RealFileSystem, args.root.as_deref(), &cfg, source.as_deref())?;

    let mut options = EnvisionOptions::from_config(&cfg, &root);
    options.max_agents = args.max_agents;
    options.max_time = Duration::from_secs(args.max_time);
    options.category = args.category;

    // Progress goes to stderr so `--output json` stays parseable.
    eprintln!("Analyzing codebase: {}", root.display());
    eprintln!("Max agents: {}", options.max_agents);
    eprintln!("Max time: {}s", args.max_time);
    eprintln!("Category: {}", options.category);
    eprintln!("\nStarting analysis (this may take a few minutes)...\n");

    let backend = ClaudeCliBackend::from_config(cfg.agent());
    let result = envision::analyze_codebase(&backend, &options).await?;

    match args.output {
        OutputFormat::Text => println!("{}", envision::format_text(&result)),
        OutputFormat::Json => println!("{}", envision::format_json(&result)?),
    }
    Ok(())
}

/// Flip the returned flag to `true` once `signal` resolves.
///
/// If the signal cannot be listened for, the error is reported and the
/// sender is kept alive, so the session keeps running until the process is
/// stopped some other way.
pub fn shutdown_on<F>(signal: F) -> signal_watch::Receiver<bool>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = signal_watch::channel(false);
    tokio::spawn(async move {
        match signal.await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(err) => {
                error!(error = %err, "failed to listen for Ctrl+C");
                eprintln!("failed to listen for Ctrl+C: {err}");
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });
    shutdown_rx
}

/// Figure out which directory to watch or analyze.
///
/// 1. An explicit `--root`, relative to the current directory.
/// 2. `[watch].root`, relative to the config file's directory.
/// 3. The config file's directory.
/// 4. The current directory.
///
/// The result is canonicalized and must be a directory.
pub fn resolve_root(
    fs: &dyn FileSystem,
    cli_root: Option<&Path>,
    cfg: &ConfigFile,
    config_path: Option<&Path>,
) -> crate::errors::Result<PathBuf> {
    let config_dir = config_path.and_then(|p| match p.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Some(parent.to_path_buf()),
        _ => None,
    });

    let candidate = match (cli_root, &cfg.watch().root, config_dir) {
        (Some(root), _, _) => root.to_path_buf(),
        (None, Some(root), Some(dir)) if root.is_relative() => dir.join(root),
        (None, Some(root), _) => root.clone(),
        (None, None, Some(dir)) => dir,
        (None, None, None) => PathBuf::from("."),
    };

    let root = fs.canonicalize(&candidate).map_err(|err| {
        WatchfixError::ConfigError(format!(
            "watch root {} is not accessible: {err:#}",
            candidate.display()
        ))
    })?;

    if !fs.is_dir(&root) {
        return Err(WatchfixError::ConfigError(format!(
            "watch root {} is not a directory",
            root.display()
        )));
    }
    Ok(root)
}

fn print_banner(root: &Path) {
    let rule = "=".repeat(60);
    println!("{rule}");
    println!("  watchfix: semi-automatic mode (approval required)");
    println!("{rule}");
    println!("Monitoring: {}", root.display());
    println!("Watching for file changes... (Ctrl+C to stop)\n");
}

/// Simple dry-run output: print the effective settings.
fn print_dry_run(cfg: &ConfigFile, root: &Path, source: Option<&Path>) {
    let watch = cfg.watch();
    let agent = cfg.agent();

    println!("watchfix dry-run");
    match source {
        Some(path) => println!("  config file = {}", path.display()),
        None => println!("  config file = (none, using defaults)"),
    }
    println!("  watch.root = {}", root.display());
    println!("  watch.settle_secs = {}", watch.settle_window.as_secs_f64());
    println!(
        "  watch.poll_interval_secs = {}",
        watch.poll_interval.as_secs_f64()
    );
    println!("  watch.ignore_names = {:?}", watch.ignore_names);
    println!("  watch.ignore_suffixes = {:?}", watch.ignore_suffixes);
    if !watch.exclude.is_empty() {
        println!("  watch.exclude = {:?}", watch.exclude);
    }
    println!("  watch.skip_unchanged = {}", watch.skip_unchanged);
    println!();
    println!("  agent.command = {}", agent.command);
    if !agent.extra_args.is_empty() {
        println!("  agent.extra_args = {:?}", agent.extra_args);
    }
    println!("  agent.analysis_tools = {:?}", agent.analysis_tools);
    println!("  agent.fix_tools = {:?}", agent.fix_tools);

    debug!("dry-run complete (no watching)");
}
