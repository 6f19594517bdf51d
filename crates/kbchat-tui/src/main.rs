use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kbchat_core::{Config, HttpChatClient};

mod app;
mod cli;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use cli::Cli;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let file_config = Config::load().context("failed to read config file")?;
    let config = cli.apply(file_config);

    if cli.save_config {
        config.save().context("failed to save config file")?;
    }

    logging::init(config.log_file.as_deref())?;
    tracing::info!(
        server_url = config.server_url(),
        endpoint = config.endpoint().as_str(),
        "starting kbchat"
    );

    let transport = HttpChatClient::with_timeout(config.server_url(), config.request_timeout())
        .with_context(|| format!("invalid server url: {}", config.server_url()))?;
    let mut app = App::new(&config, Arc::new(transport));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    if let Err(err) = &result {
        tracing::error!(error = %err, "kbchat exited with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event),
                None => break,
            },
            Some(completion) = app.controller.next_completion() => {
                app.controller.apply_completion(completion);
            }
        }
    }

    Ok(())
}
