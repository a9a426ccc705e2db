use anyhow::Result;
use clap::{Parser, Subcommand};

use transctl::cli::{self, OutputFormat};
use transctl::client::models::DownloadForm;
use transctl::config;
use transctl::report::ExportKind;
use transctl::storage::NewCorrection;

#[derive(Debug, Parser)]
#[command(name = "transctl")]
#[command(about = "Client, diagnostics, and dashboard for a local translation server")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage translation models on the server
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Translate text and record it in the history
    Translate {
        /// Text to translate
        #[arg(required = true)]
        text: Vec<String>,
        /// Model to use (default: the last used model)
        #[arg(long, short)]
        model: Option<String>,
    },
    /// Show the translation history
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Delete the history instead of showing it
        #[arg(long)]
        clear: bool,
    },
    /// Print the last used model
    LastModel,
    /// Save a correction for a translation
    Correct {
        #[arg(long)]
        model: String,
        #[arg(long)]
        source: String,
        /// The translation the server produced
        #[arg(long)]
        original: String,
        /// The corrected translation
        #[arg(long)]
        corrected: String,
        #[arg(long, default_value = "pt")]
        source_lang: String,
        #[arg(long, default_value = "en")]
        target_lang: String,
    },
    /// List or look up saved corrections
    Corrections {
        #[command(subcommand)]
        action: CorrectionsAction,
    },
    /// Sample server and host metrics, then print a report
    Collect {
        /// How long to sample
        #[arg(long, default_value = "10")]
        seconds: u64,
        /// Report: performance, browser, comparative (default), server
        #[arg(long, default_value = "comparative")]
        report: String,
        /// Also write the report to the export directory
        #[arg(long)]
        export: bool,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Run the diagnostics dashboard
    Web {
        /// Listen address (default from `[dashboard] addr`)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser
        #[arg(long)]
        no_open: bool,
    },
    /// Ping the server periodically so it stays awake
    Keepalive {
        /// Ping once and exit
        #[arg(long)]
        once: bool,
    },
    /// Check config, local store, and server reachability
    Health,
    /// Highlight a log file as HTML
    LogFormat {
        /// Path of the log file
        file: String,
    },
    /// Manage transctl configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ModelAction {
    /// List available models
    List {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show one model's status
    Status { model: String },
    /// Load a model into memory
    Load { model: String },
    /// Unload a model
    Unload { model: String },
    /// Download a model from a repository
    Download {
        #[arg(long)]
        username: String,
        #[arg(long)]
        repo: String,
        #[arg(long, default_value = "")]
        token: String,
        #[arg(long, default_value = "")]
        path: String,
    },
}

#[derive(Debug, Subcommand)]
enum CorrectionsAction {
    /// List all corrections
    List {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the correction for one source text
    Get {
        #[arg(long)]
        model: String,
        #[arg(long)]
        source: String,
    },
    /// Pull corrections collected by the server since the last fetch
    Fetch {
        /// Also append the new corrections to this CSV file
        #[arg(long)]
        csv: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file to ~/.transctl/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `transctl config set server.base_url http://pi.local:5000`
    Set { key: String, value: String },
    /// Reset the global config file to defaults
    Reset,
}

fn init_logging() {
    let level = config::load().logging.level;
    env_logger::Builder::new()
        .parse_filters(&level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let app = App::parse();
    init_logging();

    match app.command {
        Commands::Model { action } => match action {
            ModelAction::List { format } => {
                cli::run_model_list(OutputFormat::from_str_opt(Some(&format)))
            }
            ModelAction::Status { model } => cli::run_model_status(&model),
            ModelAction::Load { model } => cli::run_model_action(&model, true),
            ModelAction::Unload { model } => cli::run_model_action(&model, false),
            ModelAction::Download {
                username,
                repo,
                token,
                path,
            } => cli::run_model_download(DownloadForm {
                username,
                repo,
                token,
                path,
            }),
        },
        Commands::Translate { text, model } => cli::run_translate(&text.join(" "), model.as_deref()),
        Commands::History { format, clear } => {
            cli::run_history(OutputFormat::from_str_opt(Some(&format)), clear)
        }
        Commands::LastModel => cli::run_last_model(),
        Commands::Correct {
            model,
            source,
            original,
            corrected,
            source_lang,
            target_lang,
        } => cli::run_correct(NewCorrection {
            source_text: source,
            original_translation: original,
            corrected_translation: corrected,
            model_id: model,
            source_lang,
            target_lang,
        }),
        Commands::Corrections { action } => match action {
            CorrectionsAction::List { format } => {
                cli::run_corrections_list(OutputFormat::from_str_opt(Some(&format)))
            }
            CorrectionsAction::Get { model, source } => cli::run_corrections_get(&model, &source),
            CorrectionsAction::Fetch { csv } => cli::run_corrections_fetch(csv.as_deref()),
        },
        Commands::Collect {
            seconds,
            report,
            export,
            format,
        } => {
            let kind: ExportKind = report.parse()?;
            cli::run_collect(seconds, kind, export, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Web { addr, no_open } => cli::run_web(addr, no_open),
        Commands::Keepalive { once } => cli::run_keepalive(once),
        Commands::Health => cli::run_health(),
        Commands::LogFormat { file } => cli::run_log_format(&file),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
