use chrono::Utc;
use clap::Parser;
use onair_app::cli::{Cli, Command};
use onair_app::controller::Controller;
use onair_core::config::load_config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let controller = Controller::new(&config, cli.filter.clone())?;

    match cli.command() {
        Command::Now => println!("{}", controller.home_page(Utc::now()).await?),
        Command::Timeline => println!("{}", controller.timeline_page(Utc::now()).await?),
        Command::Player {
            event,
            occ,
            channel,
        } => println!(
            "{}",
            controller
                .player_page(&event, occ.as_deref(), channel.as_deref(), Utc::now())
                .await?
        ),
        Command::Watch => controller.watch().await?,
    }

    Ok(())
}
