use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use codigo_core::Config;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

/// The terminal owns stderr, so logs go to `<config dir>/codigo/codigo.log`.
fn init_logging() -> Result<()> {
    let log_dir = Config::config_dir()?;
    std::fs::create_dir_all(&log_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("codigo.log"))
        .context("opening log file")?;

    let filter = EnvFilter::try_from_env("CODIGO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = Config::load().context("loading configuration")?;
    tracing::info!(chat = %config.chat_url, compare = %config.compare_url, "starting");

    let mut app = App::new(config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(Duration::from_millis(300));

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}
