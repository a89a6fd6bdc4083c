//! BarBuddy CLI - drive the client core from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Finish onboarding and log tonight's drinks
//! bb profile onboard Alex Kim
//! bb tracker add beers --by 2
//! bb tracker save
//!
//! # Venues, check-ins and chat
//! bb venues specials --day friday
//! bb venues check-in 1 --arrival 21:30
//! bb chat send 1 "anyone here?"
//! ```
//!
//! State lives in `BARBUDDY_DATA_DIR` (default `.barbuddy`). Without
//! `SUPABASE_URL` and `SUPABASE_ANON_KEY` everything runs offline.

#![cfg_attr(not(test), forbid(unsafe_code))]

use barbuddy_client::{AppState, ClientConfig};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;

use commands::{
    AgeAction, AuthAction, BingoAction, ChatAction, PhotoAction, ProfileAction, TermsAction,
    ThemeAction, TrackerAction, VenueAction,
};
use error::CliError;

#[derive(Parser)]
#[command(name = "bb")]
#[command(author, version, about = "BarBuddy command-line client")]
struct Cli {
    /// Run offline even when a backend is configured
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile, XP and friends
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Tonight's drink counters
    Tracker {
        #[command(subcommand)]
        action: TrackerAction,
    },
    /// The bar-crawl bingo card
    Bingo {
        #[command(subcommand)]
        action: BingoAction,
    },
    /// Venue list, specials, check-ins and likes
    Venues {
        #[command(subcommand)]
        action: VenueAction,
    },
    /// Anonymous per-venue chat
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },
    /// Locally saved photos
    Photos {
        #[command(subcommand)]
        action: PhotoAction,
    },
    /// Achievement progress
    Achievements,
    /// Color scheme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// Terms of service acceptance
    Terms {
        #[command(subcommand)]
        action: TermsAction,
    },
    /// Age gate
    Age {
        #[command(subcommand)]
        action: AgeAction,
    },
    /// Account sign-in
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Map tracing levels to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "barbuddy=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        output::error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut config: ClientConfig) -> Result<(), CliError> {
    config.demo_mode |= cli.demo;
    let state = AppState::new(config)?;

    let result = match cli.command {
        Commands::Profile { action } => commands::profile::run(&state, action).await,
        Commands::Tracker { action } => commands::tracker::run(&state, action).await,
        Commands::Bingo { action } => commands::bingo::run(&state, action).await,
        Commands::Venues { action } => commands::venues::run(&state, action),
        Commands::Chat { action } => commands::chat::run(&state, action).await,
        Commands::Photos { action } => commands::photos::run(&state, action),
        Commands::Achievements => commands::profile::achievements(&state),
        Commands::Theme { action } => commands::settings::theme(&state, action),
        Commands::Terms { action } => commands::settings::terms(&state, action),
        Commands::Age { action } => commands::settings::age(&state, action),
        Commands::Auth { action } => commands::auth::run(&state, action).await,
    };

    // Persist whatever changed, even when the command failed halfway
    state.shutdown().await;
    result
}
