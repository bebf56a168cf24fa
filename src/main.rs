use clap::{Parser, Subcommand};
use lunza::agent::{self, CalendarAgent, Console};
use lunza::config::{LoggingSettings, Settings};
use lunza::core::SelectionMemory;
use lunza::services::{
    EventSource, FileCalendar, GeminiClient, LogNotifier, MockCalendar, ProcessedEvents, TextGenerator,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lunza", version, about = "Calendar-aware lunch recommendations")]
struct Cli {
    /// Configuration file (defaults to config/default.toml + config/local.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Watch a calendar and recommend lunch for upcoming lunch meetings
    Calendar {
        /// Check once and exit
        #[arg(long)]
        once: bool,

        /// Minutes between checks (overrides configuration)
        #[arg(long, conflicts_with = "once")]
        interval: Option<u64>,

        /// Use two built-in demo lunch meetings
        #[arg(long, conflicts_with = "events")]
        demo: bool,

        /// JSON file holding an array of calendar events
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Ask for a recommendation in free text; starts a session without a query
    Ask {
        query: Vec<String>,
    },
}

fn init_tracing(logging: &LoggingSettings) {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn text_service(settings: &Settings) -> Result<Arc<dyn TextGenerator>, Box<dyn std::error::Error>> {
    let api_key = settings
        .gemini
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or("GEMINI_API_KEY or GOOGLE_API_KEY must be set")?;

    let client = GeminiClient::new(
        settings.gemini.endpoint.clone(),
        api_key,
        settings.gemini.model.clone(),
        settings.gemini.temperature,
        Duration::from_secs(settings.gemini.timeout_secs),
    )?;
    info!(model = client.model(), "Text service initialized");
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    init_tracing(&settings.as_ref().map(|s| s.logging.clone()).unwrap_or_default());
    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    let generator = text_service(&settings).map_err(|e| {
        error!("{}", e);
        e
    })?;
    let recommender = agent::build_recommender(&settings, generator)?;
    let mut memory = SelectionMemory::new(settings.agent.memory_cap);

    match cli.command {
        Command::Ask { query } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                agent::run_repl(&recommender, &mut memory).await?;
            } else {
                let mut console = Console::new();
                agent::ask_once(&recommender, &mut memory, &mut console, &query).await?;
            }
        }
        Command::Calendar { once, interval, demo, events } => {
            let source: Arc<dyn EventSource> = match (demo, events) {
                (true, _) => {
                    info!("Using demo calendar");
                    Arc::new(MockCalendar::new(chrono::Local::now().naive_local()))
                }
                (false, Some(path)) => {
                    info!(path = %path.display(), "Using calendar file");
                    Arc::new(FileCalendar::new(path))
                }
                (false, None) => {
                    error!("No calendar source: pass --demo or --events <FILE>");
                    return Err("no calendar source".into());
                }
            };

            let notifier = Arc::new(LogNotifier::new(
                settings.notification.recipient.clone(),
                settings.notification.preview_chars,
            ));
            let tracker = ProcessedEvents::load(&settings.agent.processed_events_file);

            let mut calendar_agent = CalendarAgent::new(source, notifier, recommender, tracker, memory)
                .with_lookahead_hours(settings.agent.lookahead_hours);

            if once {
                agent::run_once(&mut calendar_agent).await;
            } else {
                let minutes = interval.unwrap_or(settings.agent.check_interval_minutes);
                agent::run_every(&mut calendar_agent, agent::interval_from_minutes(minutes)).await;
            }
        }
    }

    Ok(())
}
