mod commands;
mod prompt;

use clap::{Args, Parser, Subcommand};
use commands::{Context, ValueSource};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "vstore")]
#[command(version)]
#[command(about = "Encrypted secrets in a git repository", long_about = None)]
struct Cli {
    /// Root directory holding the settings and the repository
    #[arg(long, global = true, env = "VSTORE_ROOT")]
    root: Option<PathBuf>,

    /// Password unlocking the settings (prompted for when absent)
    #[arg(long, global = true, env = "VSTORE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete the root directory with settings and repository
    Reset,

    /// Show where things are stored
    Info,

    /// List objects, optionally fuzzy-matched against a query
    Ls {
        query: Option<String>,
    },

    /// Print a whole object or one of its fields
    Get {
        /// Object path, matched approximately
        path: String,

        /// JSON pointer such as /username
        pointer: Option<String>,
    },

    /// Set one field of an object
    Set {
        /// Object path, matched approximately
        path: String,

        /// JSON pointer such as /username
        pointer: String,

        #[command(flatten)]
        value: ValueArgs,
    },

    /// Create an empty object at exactly this path
    Create {
        path: String,
    },

    /// Remove the object at exactly this path
    Remove {
        path: String,
    },

    /// Re-encrypt the settings under a new password
    Passwd {
        /// New password (prompted for when absent)
        #[arg(long, env = "VSTORE_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
}

#[derive(Args)]
#[group(multiple = false)]
struct ValueArgs {
    /// Use this value
    #[arg(long)]
    value: Option<String>,

    /// Generate a random password
    #[arg(long)]
    generate: bool,

    /// Type the value at a hidden prompt
    #[arg(long)]
    enter: bool,
}

impl From<ValueArgs> for ValueSource {
    fn from(args: ValueArgs) -> Self {
        match args {
            ValueArgs {
                value: Some(value), ..
            } => ValueSource::Literal(value),
            ValueArgs { generate: true, .. } => ValueSource::Generate,
            ValueArgs { enter: true, .. } => ValueSource::Prompt,
            _ => ValueSource::Stdin,
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("VSTORE_LOG").unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let ctx = Context::new(cli.root.as_deref(), cli.password)?;

    match cli.command {
        Commands::Reset => commands::reset(&ctx),
        Commands::Info => commands::info(&ctx),
        Commands::Ls { query } => commands::list(&ctx, query.as_deref()),
        Commands::Get { path, pointer } => commands::get(&ctx, &path, pointer.as_deref()),
        Commands::Set {
            path,
            pointer,
            value,
        } => commands::set(&ctx, &path, &pointer, value.into()),
        Commands::Create { path } => commands::create(&ctx, &path),
        Commands::Remove { path } => commands::remove(&ctx, &path),
        Commands::Passwd { new_password } => commands::passwd(&ctx, new_password),
    }
}
