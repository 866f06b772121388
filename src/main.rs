use anyhow::Result;

mod app;
mod client;
mod config;
mod handler;
mod render;
mod store;
mod tui;
mod ui;

use app::App;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|_| Config::new());
    // Materialize the config file on first run so the endpoint override is
    // discoverable; ignore failures, the defaults still work.
    let _ = config.save();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(&config)?;

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        app.poll_response().await;
        terminal.draw(|frame| ui::draw(frame, app))?;
        if let Some(event) = events.next().await {
            handler::handle_event(app, event).await?;
        }
    }
    Ok(())
}
