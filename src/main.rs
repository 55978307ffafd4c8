use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::HttpStudentClient;
use crate::app::App;
use crate::config::KeyResolver;

mod api;
mod app;
mod cli;
mod config;
mod model;
mod notify;
mod store;
mod theme;
mod tui;
mod ui;
mod view;

pub use theme::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = initialize_logging()?;
    info!("Starting lazyroster");

    let args = cli::Args::parse();

    let mut config = config::load(args.config.as_deref())?;
    args.apply(&mut config);

    let resolver = Arc::new(KeyResolver::new(Arc::new(config.keybindings.clone())));
    let theme = theme::theme_from_name(&config.theme.name);

    let client = HttpStudentClient::new(&config.api)?;
    info!("Using API at {}", client.base_url());
    let endpoint = client.base_url().to_string();

    let mut app = App::new(&config, resolver, theme, Arc::new(client), endpoint);
    app.run().await?;

    Ok(())
}

fn initialize_logging() -> Result<WorkerGuard> {
    let directory = dirs::data_local_dir().map_or_else(
        || std::path::PathBuf::from("logs"),
        |path| path.join("lazyroster").join("logs"),
    );
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::daily(&directory, "lazyroster.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}
