use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dataarts_rule::cloud::http::{format_api_error, ApiError};
use dataarts_rule::config::ProviderConfig;
use dataarts_rule::dataarts::RuleResource;
use dataarts_rule::manifest::Manifest;
use dataarts_rule::plan::PlanAction;
use dataarts_rule::reconcile::Reconciler;
use dataarts_rule::state::{StateStore, DEFAULT_STATE_FILE};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage DataArts Studio security data recognition rules
#[derive(Parser, Debug)]
#[command(name = "dataarts-rule", version, about, long_about = None)]
struct Args {
    /// Provider config file (defaults to <config dir>/dataarts-rule/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Region to use when a rule does not declare one
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Project ID for the region
    #[arg(short, long, global = true)]
    project_id: Option<String>,

    /// DataArts Studio endpoint override
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// State file
    #[arg(long, global = true, default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the changes apply would make
    Plan {
        /// Declared rules (YAML)
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Create, update, replace and delete rules to match the declaration
    Apply {
        /// Declared rules (YAML)
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Re-read tracked rules, dropping the ones deleted remotely
    Refresh,
    /// Delete tracked rules
    Destroy {
        /// Only destroy this address
        #[arg(long)]
        target: Option<String>,
    },
    /// Track an existing rule
    Import {
        /// Local address to track the rule under
        address: String,
        /// Rule to import, as <workspace_id>/<id>
        id: String,
    },
    /// Print tracked state as JSON
    Show {
        /// Only show this address
        address: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("dataarts-rule started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("dataarts-rule").join("dataarts-rule.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".dataarts-rule").join("dataarts-rule.log");
    }
    PathBuf::from("dataarts-rule.log")
}

/// Config file, then environment, then flags
fn load_provider_config(args: &Args) -> Result<ProviderConfig> {
    let mut config = match &args.config {
        Some(path) => ProviderConfig::load_from(path)?,
        None => ProviderConfig::load()?,
    };
    config.apply_env();

    if let Some(region) = &args.region {
        config.region = Some(region.clone());
    }
    if let Some(project_id) = &args.project_id {
        config.project_id = Some(project_id.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        config
            .endpoints
            .insert("dataarts".to_string(), endpoint.clone());
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: {err:#}");
            None
        }
    };

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {err:#}");
            if err.chain().any(|e| e.is::<ApiError>()) {
                eprintln!("  {}", format_api_error(&err));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = load_provider_config(args)?;
    let store = StateStore::load(&args.state)?;

    let resource = RuleResource::new(&config)?;
    let mut reconciler = Reconciler::new(resource, store);

    match &args.command {
        Command::Plan { file } => {
            let manifest = Manifest::load(file)?;
            report_refresh(reconciler.refresh().await?.dropped);

            let plans = reconciler.plan(&manifest);
            let changes = plans.iter().filter(|p| p.action.is_change()).count();
            for plan in &plans {
                println!("{}", plan);
            }
            if changes == 0 {
                println!("No changes. Rules match the declaration.");
            } else {
                println!("Plan: {} to change.", changes);
            }
        }
        Command::Apply { file } => {
            let manifest = Manifest::load(file)?;
            let summary = reconciler.apply(&manifest).await?;
            println!("{}", summary);
        }
        Command::Refresh => {
            let report = reconciler.refresh().await?;
            report_refresh(report.dropped);
            println!("Refreshed {} rule(s).", report.refreshed.len());
        }
        Command::Destroy { target } => {
            let count = reconciler.destroy(target.as_deref()).await?;
            println!("Destroy complete! Resources: {} destroyed.", count);
        }
        Command::Import { address, id } => {
            let state = reconciler.import(address, id).await?;
            println!("Imported {} as {} ({})", id, address, state.name);
        }
        Command::Show { address } => show(reconciler.store(), address.as_deref())?,
    }

    Ok(())
}

fn report_refresh(dropped: Vec<String>) {
    for address in dropped {
        println!("{} {} (deleted outside of dataarts-rule, removed from state)", PlanAction::Delete.symbol(), address);
    }
}

fn show(store: &StateStore, address: Option<&str>) -> Result<()> {
    let output = match address {
        Some(address) => {
            let rule = store
                .get(address)
                .with_context(|| format!("{} is not tracked", address))?;
            serde_json::to_string_pretty(rule)?
        }
        None => serde_json::to_string_pretty(store.resources())?,
    };
    println!("{}", output);
    Ok(())
}
