//! # Kit Catalog CLI (`kitc`)
//!
//! Turns UI component sources into Abstract Technical Specifications and
//! stores them in a per-design-kit catalog.
//!
//! ## Usage
//!
//! ```bash
//! kitc --config ./config/kitc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kitc init` | Create the SQLite database and run schema migrations |
//! | `kitc discover <path>` | List the component files that would be ingested |
//! | `kitc ingest <path>` | Extract, validate, and upsert every component under a path |
//! | `kitc kits create <name>` | Create a design kit (no-op if the name exists) |
//! | `kitc kits list` | List design kits with component counts |
//! | `kitc components list` | List the components of a kit |
//! | `kitc components get <name>` | Show one stored component and its ATS |
//!
//! ## Examples
//!
//! ```bash
//! kitc init
//! kitc kits create "Test Design Kit"
//! GEMINI_API_KEY=... kitc ingest ./src/components/ui --kit-name "Test Design Kit"
//! kitc components get Button --kit-name "Test Design Kit" --json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uuid::Uuid;

use kit_catalog::catalog;
use kit_catalog::config;
use kit_catalog::discovery::Discovery;
use kit_catalog::ingest::{self, KitSelector};
use kit_catalog::migrate;

/// Kit Catalog CLI: ingest UI components into a design-kit catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/kitc.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "kitc",
    about = "Extract component specifications and catalog them per design kit",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kitc.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format. Logs always go to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// List component files under a path without ingesting them.
    Discover {
        /// File or directory to scan.
        path: PathBuf,
    },

    /// Ingest every component file under a path into a design kit.
    ///
    /// Files that fail at any stage are reported and skipped; the command
    /// exits non-zero only if files were found and none were stored.
    Ingest {
        /// File or directory to scan.
        path: PathBuf,

        #[command(flatten)]
        kit: KitArgs,

        /// Category assigned to every component in this run.
        #[arg(long)]
        category: Option<String>,

        /// Run extraction and validation without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage design kits.
    Kits {
        #[command(subcommand)]
        action: KitsAction,
    },

    /// Inspect stored components.
    Components {
        #[command(subcommand)]
        action: ComponentsAction,
    },
}

#[derive(Subcommand)]
enum KitsAction {
    /// Create a design kit, or report the existing one with this name.
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Personality tag; repeat for several.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List all design kits.
    List,
}

#[derive(Subcommand)]
enum ComponentsAction {
    /// List the components of a kit.
    List {
        #[command(flatten)]
        kit: KitArgs,
    },
    /// Show one component.
    Get {
        name: String,

        #[command(flatten)]
        kit: KitArgs,

        /// Print the stored row as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Exactly one of `--kit` or `--kit-name`.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct KitArgs {
    /// Design kit ID.
    #[arg(long)]
    kit: Option<Uuid>,

    /// Design kit name.
    #[arg(long)]
    kit_name: Option<String>,
}

impl KitArgs {
    fn selector(self) -> anyhow::Result<KitSelector> {
        match (self.kit, self.kit_name) {
            (Some(id), _) => Ok(KitSelector::Id(id)),
            (None, Some(name)) if !name.trim().is_empty() => Ok(KitSelector::Name(name)),
            _ => anyhow::bail!("a design kit is required: pass --kit <id> or --kit-name <name>"),
        }
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match cli.verbose {
        0 => "kit_catalog=info,kit_catalog_core=info",
        1 => "kit_catalog=debug,kit_catalog_core=debug",
        _ => "kit_catalog=trace,kit_catalog_core=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Discover { path } => {
            let discovery = Discovery::new(&cfg.discovery)?;
            let mut files = discovery.discover(&path);
            files.sort();
            for file in &files {
                println!("{}", file);
            }
            println!("{} component file(s)", files.len());
        }
        Commands::Ingest {
            path,
            kit,
            category,
            dry_run,
        } => {
            let report =
                ingest::run_ingest(&cfg, &path, &kit.selector()?, category, dry_run).await?;
            if report.is_total_failure() {
                std::process::exit(1);
            }
        }
        Commands::Kits { action } => match action {
            KitsAction::Create {
                name,
                description,
                tags,
            } => {
                catalog::run_kits_create(&cfg, &name, description, tags).await?;
            }
            KitsAction::List => {
                catalog::run_kits_list(&cfg).await?;
            }
        },
        Commands::Components { action } => match action {
            ComponentsAction::List { kit } => {
                catalog::run_components_list(&cfg, &kit.selector()?).await?;
            }
            ComponentsAction::Get { name, kit, json } => {
                catalog::run_components_get(&cfg, &kit.selector()?, &name, json).await?;
            }
        },
    }

    Ok(())
}
