mod audio;
mod config;
mod controller;
mod error;
mod logging;
mod model;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, Mutex};

use audio::RodioElement;
use config::{Cli, Settings};
use controller::AppController;
use model::{AppModel, Catalog};
use view::AppView;

const FRAME_INTERVAL: Duration = Duration::from_millis(50);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;

    if let Err(e) = logging::init_logging(&settings.log_dir) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== Mixtape Starting ===");
    tracing::debug!(?settings, "Resolved settings");

    let catalog = match &settings.catalog {
        Some(path) => Catalog::load(path).with_context(|| format!("Failed to load catalog {:?}", path))?,
        None => Catalog::builtin(),
    };
    let catalog = Arc::new(catalog);
    tracing::info!(playlists = catalog.len(), "Catalog ready");

    let model = Arc::new(Mutex::new(AppModel::new(
        Arc::clone(&catalog),
        settings.volume,
        settings.previous_fallback,
    )));

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let element = RodioElement::spawn(settings.audio, event_tx)?;

    let controller = AppController::new(model.clone(), Arc::new(element), settings.steps);
    controller.prime().await;
    if let Some(song) = model.lock().await.playback().state().current_song() {
        tracing::info!(song_id = %song.id, title = %song.title, "Primed initial song");
    }
    controller.start_media_event_listener(event_rx);

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model, controller, catalog).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("Mixtape shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<Mutex<AppModel>>,
    controller: AppController,
    catalog: Arc<Catalog>,
) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut frame_tick = tokio::time::interval(FRAME_INTERVAL);

    loop {
        let (playback, ui_state, should_quit) = {
            let mut model_guard = model.lock().await;

            // Auto-clear old errors (after 5 seconds)
            model_guard.auto_clear_old_errors();

            (
                model_guard.get_playback_info(),
                model_guard.get_ui_state(),
                model_guard.should_quit(),
            )
        };

        if should_quit {
            break;
        }

        terminal.draw(|f| {
            AppView::render(f, &playback, &ui_state, &catalog);
        })?;

        // Yield to spawned tasks while waiting for input or the next frame
        tokio::select! {
            _ = frame_tick.tick() => {}
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    if let Err(e) = controller.handle_key_event(key).await {
                        tracing::warn!(error = %e, "Key handling failed");
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => break,
            },
        }
    }

    Ok(())
}
