//! kdactl CLI entrypoint.
//!
//! This is the main entrypoint for the kdactl command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use kda_reconciler::cli::{Cli, Commands, LogFormat, OutputFormatter, StateCommands};
use kda_reconciler::config::{ConfigParser, ConfigValidator, DeployManifest, find_config_file};
use kda_reconciler::error::{KdaError, Result};
use kda_reconciler::reconciler::Reconciler;
use kda_reconciler::remote::{HttpRemoteClient, PollingWaiter, RemoteClient};
use kda_reconciler::state::{ConfigSource, LocalConfigSource};

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_format);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. Logs go to stderr so stdout stays parseable.
fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Validate { warnings } => cmd_validate(config, warnings, &formatter),
        Commands::Plan => cmd_plan(config, &formatter).await,
        Commands::Apply { yes } => cmd_apply(config, yes, &formatter).await,
        Commands::Status => cmd_status(config, &formatter).await,
        Commands::Start => cmd_lifecycle(config, true, false, &formatter).await,
        Commands::Stop { force } => cmd_lifecycle(config, false, force, &formatter).await,
        Commands::Destroy { yes } => cmd_destroy(config, yes, &formatter).await,
        Commands::State { command } => cmd_state(config, command, &formatter).await,
    }
}

/// Initialize a new manifest.
fn cmd_init(path: &Path, force: bool) -> Result<()> {
    info!("Initializing manifest in: {}", path.display());

    let manifest_path = path.join("kda.deploy.yaml");
    let env_path = path.join(".env.example");
    let gitignore_path = path.join(".gitignore");

    if !force && manifest_path.exists() {
        eprintln!("Manifest already exists: {}", manifest_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    std::fs::write(&manifest_path, include_str!("../templates/kda.deploy.yaml"))?;
    eprintln!("Created: {}", manifest_path.display());

    std::fs::write(&env_path, include_str!("../templates/env.example"))?;
    eprintln!("Created: {}", env_path.display());

    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        let missing: Vec<&str> = [".env", ".kda/"]
            .into_iter()
            .filter(|entry| !existing.lines().any(|line| line.trim() == *entry))
            .collect();
        if !missing.is_empty() {
            let mut file = std::fs::OpenOptions::new().append(true).open(&gitignore_path)?;
            writeln!(file, "\n# kdactl")?;
            for entry in missing {
                writeln!(file, "{entry}")?;
            }
            eprintln!("Updated: {}", gitignore_path.display());
        }
    } else {
        std::fs::write(&gitignore_path, ".env\n.kda/\n")?;
        eprintln!("Created: {}", gitignore_path.display());
    }

    eprintln!("\nNext steps:");
    eprintln!("  1. Edit kda.deploy.yaml with your application");
    eprintln!("  2. Run 'kdactl validate' to check it");
    eprintln!("  3. Run 'kdactl plan' to see what will change");
    eprintln!("  4. Run 'kdactl apply' to converge the application");

    Ok(())
}

/// Validate the manifest.
fn cmd_validate(config: Option<&Path>, show_warnings: bool, formatter: &OutputFormatter) -> Result<()> {
    let manifest_path = resolve_config_path(config)?;
    let manifest = load_manifest(&manifest_path)?;

    let validator = ConfigValidator::new();
    let result = validator.inspect(&manifest);
    emit(&formatter.format_validation(&manifest, &result, show_warnings))?;

    validator.validate(&manifest).map(|_| ())
}

/// Show what a sync would do.
async fn cmd_plan(config: Option<&Path>, formatter: &OutputFormatter) -> Result<()> {
    let manifest_path = resolve_config_path(config)?;
    let manifest = load_manifest(&manifest_path)?;
    let client = create_client(&manifest)?;
    let waiter = PollingWaiter::new(&client).with_interval(manifest.timeouts.poll_interval());
    let reconciler = Reconciler::new(&client, &waiter, manifest.timeouts.clone());

    let preview = reconciler.preview(&manifest).await?;
    emit(&formatter.format_preview(&preview))
}

/// Converge the remote application.
async fn cmd_apply(config: Option<&Path>, auto_approve: bool, formatter: &OutputFormatter) -> Result<()> {
    let manifest_path = resolve_config_path(config)?;
    let manifest = load_manifest(&manifest_path)?;
    let source = create_source(&manifest_path, &manifest);
    let client = create_client(&manifest)?;
    let waiter = PollingWaiter::new(&client).with_interval(manifest.timeouts.poll_interval());

    let cancel = CancellationToken::new();
    let reconciler =
        Reconciler::new(&client, &waiter, manifest.timeouts.clone()).with_cancellation(cancel.clone());

    if !auto_approve {
        let preview = reconciler.preview(&manifest).await?;
        emit(&formatter.format_preview(&preview))?;
        if !confirm("Do you want to apply these changes? [y/N]: ", "y")? {
            eprintln!("Apply cancelled.");
            return Ok(());
        }
    }

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling sync");
            interrupt.cancel();
        }
    });

    let report = reconciler.sync(&source).await?;
    emit(&formatter.format_sync(&report))
}

/// Show the remote application and the last snapshot.
async fn cmd_status(config: Option<&Path>, formatter: &OutputFormatter) -> Result<()> {
    let manifest_path = resolve_config_path(config)?;
    let manifest = load_manifest(&manifest_path)?;
    let source = create_source(&manifest_path, &manifest);
    let client = create_client(&manifest)?;

    let detail = match client.describe_application(&manifest.application.name).await {
        Ok(detail) => Some(detail),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e),
    };
    let snapshot = source.load_snapshot().await?;

    emit(&formatter.format_status(&manifest, detail.as_ref(), snapshot.as_ref()))
}

/// Start or stop the application.
async fn cmd_lifecycle(
    config: Option<&Path>,
    start: bool,
    force: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let manifest_path = resolve_config_path(config)?;
    let manifest = load_manifest(&manifest_path)?;
    let client = create_client(&manifest)?;
    let waiter = PollingWaiter::new(&client).with_interval(manifest.timeouts.poll_interval());
    let reconciler = Reconciler::new(&client, &waiter, manifest.timeouts.clone());

    let mut desired = manifest.application.tree.clone();
    desired.start_application = start;
    desired.force_stop = desired.force_stop || force;

    let name = &manifest.application.name;
    let outcome = reconciler.apply_lifecycle(name, &desired).await?;
    emit(&formatter.format_lifecycle(name, &outcome))
}

/// Delete the remote application.
async fn cmd_destroy(config: Option<&Path>, auto_approve: bool, formatter: &OutputFormatter) -> Result<()> {
    let manifest_path = resolve_config_path(config)?;
    let manifest = load_manifest(&manifest_path)?;
    let source = create_source(&manifest_path, &manifest);
    let client = create_client(&manifest)?;
    let waiter = PollingWaiter::new(&client).with_interval(manifest.timeouts.poll_interval());
    let reconciler = Reconciler::new(&client, &waiter, manifest.timeouts.clone());
    let name = &manifest.application.name;

    if !auto_approve {
        eprintln!("Application '{name}' will be deleted.");
        let prompt = format!("This action is IRREVERSIBLE. Type '{name}' to confirm: ");
        if !confirm(&prompt, name)? {
            eprintln!("Destruction cancelled.");
            return Ok(());
        }
    }

    let lock = source.acquire_lock("", name).await?;
    let result = reconciler.destroy(name).await;
    if result.is_ok() {
        source.delete_snapshot().await?;
    }
    source.release_lock(&lock.lock_id).await?;

    let message = if result? {
        format!("Application '{name}' deleted.")
    } else {
        format!("Application '{name}' does not exist.")
    };
    emit(&formatter.message(&message))
}

/// State management commands.
async fn cmd_state(config: Option<&Path>, command: StateCommands, formatter: &OutputFormatter) -> Result<()> {
    let manifest_path = resolve_config_path(config)?;
    let manifest = load_manifest(&manifest_path)?;
    let source = create_source(&manifest_path, &manifest);

    match command {
        StateCommands::Show => match source.load_snapshot().await? {
            Some(snapshot) => emit(&formatter.format_snapshot(&snapshot)),
            None => emit(&formatter.message("No snapshot found.")),
        },
        StateCommands::Unlock { lock_id, force } => {
            if force {
                source.force_unlock().await?;
                emit(&formatter.message("State forcefully unlocked."))
            } else if let Some(id) = lock_id {
                source.release_lock(&id).await?;
                emit(&formatter.message("State unlocked."))
            } else {
                match source.lock_info().await? {
                    Some(lock) => emit(&formatter.message(&format!(
                        "Locked by {} since {} (expires in {}s). Use --lock-id {} or --force.",
                        lock.holder,
                        lock.acquired_at,
                        lock.remaining_secs(),
                        lock.lock_id
                    ))),
                    None => emit(&formatter.message("State is not locked.")),
                }
            }
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves the manifest path.
fn resolve_config_path(config: Option<&Path>) -> Result<PathBuf> {
    config.map_or_else(|| find_config_file("."), |path| Ok(path.to_path_buf()))
}

/// Loads `.env` beside the manifest, then the manifest with overrides.
fn load_manifest(path: &Path) -> Result<DeployManifest> {
    debug!("Loading manifest from: {}", path.display());
    let parser = ConfigParser::new().with_base_path(path.parent().unwrap_or_else(|| Path::new(".")));
    parser.load_dotenv()?;
    parser.load_with_env(path)
}

/// Creates the local config source, honoring `state.path` (relative to the manifest).
fn create_source(manifest_path: &Path, manifest: &DeployManifest) -> LocalConfigSource {
    let source = LocalConfigSource::new(manifest_path);
    match manifest.state.path.as_deref().map(Path::new) {
        Some(dir) if dir.is_relative() => {
            let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
            source.with_state_dir(base.join(dir))
        }
        Some(dir) => source.with_state_dir(dir),
        None => source,
    }
}

/// Creates the HTTP client for the manifest's endpoint.
fn create_client(manifest: &DeployManifest) -> Result<HttpRemoteClient> {
    let token = ConfigParser::auth_token(manifest)?;
    Ok(
        HttpRemoteClient::with_timeout(&manifest.remote.endpoint, manifest.remote.request_timeout_secs)?
            .with_auth_token(token),
    )
}

/// Asks for confirmation on stderr.
fn confirm(prompt: &str, expected: &str) -> Result<bool> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case(expected))
}

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush().map_err(KdaError::from)
}
