use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use capsule::audit::AuditLogger;
use capsule::cli::{
    handle_audit_command, handle_export_command, handle_inspect_command, handle_login,
    handle_logout, handle_memory_command, handle_restore_command, handle_whoami, ExportArgs,
    MemoryCommands, RestoreArgs,
};
use capsule::config::{CapsulePaths, LogFormat, Settings};
use capsule::crypto::key_derivation::PBKDF2_ITERATIONS;
use capsule::storage::Storage;
use capsule::CapsuleError;

/// Environment variable holding a tracing filter
const LOG_ENV: &str = "CAPSULE_LOG";

#[derive(Parser)]
#[command(
    name = "capsule",
    version,
    about = "Password-locked export and restore for your memories",
    long_about = "Capsule packages your memories or time-capsule entries into an \
                  encrypted backup file that only your password can open, and \
                  restores such backups into your journal."
)]
struct Cli {
    /// Log pipeline steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and default settings
    Init,

    /// Show current configuration and paths
    Config,

    /// Sign in as a user
    Login {
        /// User id
        user_id: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Memory management commands
    #[command(subcommand, alias = "mem")]
    Memory(MemoryCommands),

    /// Export memories into a password-locked backup file
    Export(ExportArgs),

    /// Restore a backup file into your memories
    Restore(RestoreArgs),

    /// Show the framing of a backup file without decrypting it
    Inspect {
        /// Envelope file
        file: PathBuf,
    },

    /// Show recent exports and restores
    Audit {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<CapsuleError>() {
                Some(err) => err.user_message(),
                None => e.to_string(),
            };
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Initialize paths and settings
    let paths = CapsulePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let level = if cli.verbose {
        "debug"
    } else {
        settings.log_level.as_str()
    };
    init_logging(level, settings.log_format);

    let storage = Storage::open(paths.clone())?;
    let audit = settings
        .audit_enabled
        .then(|| AuditLogger::new(paths.audit_log()));

    match cli.command {
        Some(Commands::Init) => {
            settings.save(&paths)?;
            println!("Initialized capsule at: {}", paths.base_dir().display());
            println!();
            println!("Next steps:");
            println!("  capsule login <user-id>");
            println!("  capsule memory add \"First memory\" --content \"...\"");
            println!("  capsule export --name \"My Memories\"");
        }
        Some(Commands::Config) => {
            println!("Capsule Configuration");
            println!("=====================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Records:           {}", paths.records_file().display());
            println!("Media:             {}", paths.media_dir().display());
            println!("Exports:           {}", settings.output_dir(&paths).display());
            println!("Audit log:         {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Default name:      {}", settings.export.default_container_name);
            println!("  Link lifetime:     {}s", settings.export.signed_url_ttl_secs);
            println!("  Min password:      {} characters", settings.passphrase_min_len());
            println!("  Key derivation:    PBKDF2-HMAC-SHA256, {} iterations", PBKDF2_ITERATIONS);
            println!("  Log level:         {}", settings.log_level);
            println!("  Audit enabled:     {}", settings.audit_enabled);
            if !paths.is_initialized() {
                println!();
                println!("(defaults shown; run 'capsule init' to save them)");
            }
        }
        Some(Commands::Login { user_id }) => handle_login(&storage, &user_id)?,
        Some(Commands::Logout) => handle_logout(&storage)?,
        Some(Commands::Whoami) => handle_whoami(&storage)?,
        Some(Commands::Memory(cmd)) => handle_memory_command(&storage, cmd)?,
        Some(Commands::Export(args)) => {
            handle_export_command(&storage, &settings, audit.as_ref(), args)?
        }
        Some(Commands::Restore(args)) => handle_restore_command(&storage, audit.as_ref(), args)?,
        Some(Commands::Inspect { file }) => handle_inspect_command(&file)?,
        Some(Commands::Audit { limit }) => {
            let logger = AuditLogger::new(paths.audit_log());
            handle_audit_command(&logger, limit)?
        }
        None => {
            println!("Capsule - password-locked backups for your memories");
            println!();
            println!("Run 'capsule --help' for usage information.");
        }
    }

    Ok(())
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
