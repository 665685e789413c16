use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use usx_editor::commands::{
    export_book, import_usx_file, paragraph_history, CancelFlag, ImportOutcome, ImportRequest,
};
use usx_editor::config::{load_config, load_config_from, Config};
use usx_editor::database::SqliteStore;
use usx_editor::logger;
use usx_editor::models::BookKey;
use usx_editor::parsers::ParseOptions;

#[derive(Parser, Debug)]
#[command(author, version, about = "Import, export and inspect USX translations", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file to use instead of the one in the user config directory.
    #[arg(long, global = true, value_name = "FILE", env = "USX_EDITOR_CONFIG")]
    config: Option<PathBuf>,

    /// Database file; overrides `database_path` from the config.
    #[arg(long, global = true, value_name = "FILE", env = "USX_EDITOR_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a USX file, reconciling it with earlier imports
    #[command(arg_required_else_help = true)]
    Import {
        #[arg(value_name = "USX_FILE")]
        path: PathBuf,

        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        identifier: Option<String>,
    },

    /// Write the current text of a book as USX
    #[command(arg_required_else_help = true)]
    Export {
        /// Book code, e.g. GEN
        code: String,

        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        identifier: Option<String>,

        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show the version history of a paragraph
    #[command(arg_required_else_help = true)]
    History {
        #[arg(value_name = "PARAGRAPH_ID")]
        id: String,
    },
}

fn options(config: &Config) -> ParseOptions {
    ParseOptions {
        section_heading_styles: config.section_heading_styles.clone(),
    }
}

async fn run(cli: Cli, config: Config) -> Result<i32> {
    let database_path = match cli.database {
        Some(path) => path,
        None => config.resolve_database_path()?,
    };

    match cli.command {
        Commands::Import {
            path,
            language,
            identifier,
        } => {
            let request = ImportRequest {
                database_path,
                usx_path: path,
                language_id: language.unwrap_or_else(|| config.default_language_id.clone()),
                identifier: identifier.unwrap_or_else(|| config.default_identifier.clone()),
                options: options(&config),
            };

            let cancel = CancelFlag::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Cancelling import after the current book");
                    ctrl_c.cancel();
                }
            });

            let report = import_usx_file(request, cancel).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(match report.outcome() {
                ImportOutcome::Clean => 0,
                ImportOutcome::NeedsResolution => 2,
                ImportOutcome::Failed => 1,
            })
        }

        Commands::Export {
            code,
            language,
            identifier,
            output,
        } => {
            let key = BookKey::new(
                language.as_deref().unwrap_or(&config.default_language_id),
                &code,
                identifier.as_deref().unwrap_or(&config.default_identifier),
            );
            let store = SqliteStore::open(&database_path)?;
            let usx = export_book(&store, &key, &options(&config))?;
            match output {
                Some(path) => std::fs::write(&path, usx)
                    .with_context(|| format!("Failed to write {:?}", path))?,
                None => print!("{}", usx),
            }
            Ok(0)
        }

        Commands::History { id } => {
            let store = SqliteStore::open(&database_path)?;
            let history = paragraph_history(&store, &id)?;
            println!("{}", serde_json::to_string_pretty(&history)?);
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            exit(1);
        }
    };

    logger::init_logging(config.log_filter.as_deref());
    tracing::info!("usx-editor starting...");

    match run(cli, config).await {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit(1);
        }
    }
}
