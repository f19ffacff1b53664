use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use wastemap::app::{App, AppActions};
use wastemap::cli::CliArgs;
use wastemap::config::AppConfig;
use wastemap::location::LocationProvider;
use wastemap::logging::{init_logging, LogTarget};
use wastemap::store::open_store;
use wastemap::{event, terminal};

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let args = CliArgs::parse();
    args.apply_env_overrides();

    // Missing or invalid configuration stops startup
    let config = AppConfig::from_env().wrap_err("invalid configuration")?;

    let headless = args.wants_headless() || !is_terminal();
    let log_target = if headless {
        LogTarget::Stderr
    } else {
        LogTarget::File(&config.log_file)
    };
    init_logging(log_target, args.debug)
        .wrap_err_with(|| format!("could not open log file {}", config.log_file.display()))?;

    info!(
        backend = ?config.backend_kind(),
        map_style = config.map_style.as_str(),
        headless,
        "starting"
    );

    let store = open_store(&config)
        .await
        .wrap_err("could not open the report store")?;

    if headless {
        return event::run_headless(store.as_ref(), args.json).await;
    }

    let location = Arc::new(LocationProvider::from_config(&config));
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut app = App::new(
        AppActions::new(store, location, events_tx),
        config.map_style,
    );

    // Setup terminal
    let mut terminal = terminal::setup()?;

    let result = event::run(&mut terminal, &mut app, &mut events_rx).await;

    // Restore terminal
    terminal::cleanup(true, true);

    result
}

// Check if we're running in a terminal
fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
