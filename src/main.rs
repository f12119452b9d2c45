use anyhow::Result;
use clap::{Parser, Subcommand};

use audit_trail::cli::{handle_audit_command, AuditCommands};
use audit_trail::config::{paths::AuditPaths, settings::Settings};
use audit_trail::storage::Storage;

/// Environment variable holding the tracing filter
const LOG_ENV: &str = "AUDIT_TRAIL_LOG";

#[derive(Parser)]
#[command(
    name = "audit-trail",
    version,
    about = "Inspect change audits and notifications",
    long_about = "audit-trail reads the audit store written by the audit engine: \
                  per-entity history, reconstructed revisions and the \
                  notifications routed to each receiver."
)]
struct Cli {
    /// Log debug output (overridden by AUDIT_TRAIL_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Audit(AuditCommands),

    /// Write a default settings file
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    // Initialize paths and settings
    let paths = AuditPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Audit(cmd)) => {
            let mut storage = Storage::new(paths.clone())?;
            storage.load_all()?;
            handle_audit_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Init) => {
            if paths.is_initialized() {
                println!(
                    "Settings already exist at: {}",
                    paths.settings_file().display()
                );
                return Ok(());
            }
            settings.save(&paths)?;
            println!("Initialized audit-trail at: {}", paths.base_dir().display());
            println!("Add tracked entity types to {}", paths.settings_file().display());
        }
        Some(Commands::Config) => {
            println!("audit-trail Configuration");
            println!("=========================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Audit store:    {}", paths.audits_file().display());
            println!();
            println!("Settings:");
            println!("  Auditing enabled: {}", settings.auditing_enabled);
            println!("  Entity types:     {}", settings.entity_types.len());
            println!("  Create comment:   {}", settings.comments.create);
            println!("  Update comment:   {}", settings.comments.update);
            println!("  Destroy comment:  {}", settings.comments.destroy);
        }
        None => {
            println!("audit-trail - change auditing and notification routing");
            println!();
            println!("Run 'audit-trail --help' for usage information.");
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
