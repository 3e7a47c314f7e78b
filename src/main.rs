mod api;
mod app;
mod config;
mod constants;
mod display;
mod fetcher;
mod graphics;
mod input;
mod model;
mod search;
mod theme;
mod ui;
mod video;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use constants::constants;
use display::{CliPosterMode, PosterMode};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Poster rendering: 'auto', 'kitty', 'sixel', 'halfblock', or 'ascii' (default: auto-detect)
  #[arg(short, long, default_value = "auto")]
  poster_mode: CliPosterMode,

  /// Catalog server base URL (overrides the saved preference)
  #[arg(short, long)]
  api_url: Option<String>,

  /// Generate shell completions and exit
  #[arg(long, value_enum, hide = true)]
  completions: Option<clap_complete::Shell>,
}

// --- Logging ---

/// Log to a file under the data dir — the terminal itself belongs to the UI.
/// Returns the appender guard, which must stay alive for the process.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let proj_dirs = directories::ProjectDirs::from("", "", "mym")?;
  let log_dir = proj_dirs.data_local_dir();
  std::fs::create_dir_all(log_dir).ok()?;
  let appender = tracing_appender::rolling::never(log_dir, &constants().log_file);
  let (writer, guard) = tracing_appender::non_blocking(appender);
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "mym", &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = init_logging();

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, args).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, args: Args) -> Result<()> {
  let poster_mode = display::resolve_poster_mode(args.poster_mode);
  let mut app = App::new(poster_mode, args.api_url)?;
  info!(poster_mode = poster_mode.label(), "dashboard starting");

  // First mount of the list page.
  app.trigger_movies();

  loop {
    app.check_pending();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if poster_mode.uses_escape_protocol() {
      sync_poster(&mut app, poster_mode)?;
    }

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key)?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  if poster_mode == PosterMode::Kitty {
    graphics::kitty_clear()?;
  }
  Ok(())
}

/// Keep the terminal's pixel-protocol poster in step with the drawn frame:
/// send when the movie or pane changed, clear when the pane went away.
fn sync_poster(app: &mut App, poster_mode: PosterMode) -> Result<()> {
  if let Some(area) = app.gfx.area {
    if let Some((ref id, ref image)) = app.poster {
      let key = (id.clone(), area);
      if app.gfx.last_sent.as_ref() != Some(&key) {
        if poster_mode == PosterMode::Kitty {
          graphics::kitty_clear()?;
        }
        match poster_mode {
          PosterMode::Kitty => graphics::kitty_draw(image, area)?,
          PosterMode::Sixel => graphics::sixel_draw(image, area)?,
          _ => {}
        }
        app.gfx.last_sent = Some(key);
      }
    }
  } else if app.gfx.last_sent.is_some() {
    if poster_mode == PosterMode::Kitty {
      graphics::kitty_clear()?;
    }
    app.gfx.last_sent = None;
  }
  Ok(())
}
