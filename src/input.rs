use anyhow::Result;
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::info;

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return Ok(());
  }

  match app.mode {
    AppMode::Browse => handle_browse_key(app, key),
    AppMode::Search => handle_search_key(app, key),
    AppMode::Detail => handle_detail_key(app, key),
  }
  Ok(())
}

fn select_next(app: &mut App) {
  let count = app.filtered_indices.len();
  if count > 0 {
    let i = app.list_state.selected().map_or(0, |i| (i + 1) % count);
    app.list_state.select(Some(i));
  }
}

fn select_prev(app: &mut App) {
  let count = app.filtered_indices.len();
  if count > 0 {
    let i =
      app.list_state.selected().map_or(0, |i| if i == 0 { count.saturating_sub(1) } else { i.saturating_sub(1) });
    app.list_state.select(Some(i));
  }
}

fn handle_browse_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      app.open_selected();
    }
    KeyCode::Char('/') => {
      app.mode = AppMode::Search;
    }
    KeyCode::Char('r') => {
      app.refresh();
    }
    KeyCode::Down | KeyCode::Char('j') => select_next(app),
    KeyCode::Up | KeyCode::Char('k') => select_prev(app),
    KeyCode::Char('q') => {
      app.should_quit = true;
    }
    KeyCode::Esc => {
      if !app.query.is_empty() {
        app.query.clear();
        app.query_cursor = 0;
        app.query_scroll = 0;
        app.recompute_filter();
      } else {
        app.should_quit = true;
      }
    }
    _ => {}
  }
}

fn handle_search_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.query, app.query_cursor);
      app.query.insert(byte_idx, c);
      app.query_cursor += 1;
      // Live filtering: each edit re-runs the pure filter, never the fetch.
      app.recompute_filter();
    }
    KeyCode::Backspace => {
      if app.query_cursor > 0 {
        app.query_cursor -= 1;
        let byte_idx = char_to_byte_index(&app.query, app.query_cursor);
        app.query.remove(byte_idx);
        app.recompute_filter();
      }
    }
    KeyCode::Delete => {
      if app.query_cursor < app.query.chars().count() {
        let byte_idx = char_to_byte_index(&app.query, app.query_cursor);
        app.query.remove(byte_idx);
        app.recompute_filter();
      }
    }
    KeyCode::Left => {
      app.query_cursor = app.query_cursor.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.query_cursor < app.query.chars().count() {
        app.query_cursor += 1;
      }
    }
    KeyCode::Home => {
      app.query_cursor = 0;
    }
    KeyCode::End => {
      app.query_cursor = app.query.chars().count();
    }
    KeyCode::Down => select_next(app),
    KeyCode::Up => select_prev(app),
    KeyCode::Enter => {
      // Keep the query applied and go back to row navigation.
      app.mode = AppMode::Browse;
    }
    KeyCode::Esc => {
      app.query.clear();
      app.query_cursor = 0;
      app.query_scroll = 0;
      app.recompute_filter();
      app.mode = AppMode::Browse;
    }
    _ => {}
  }
}

fn handle_detail_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Char('o') => open_trailer(app),
    KeyCode::Char('r') => {
      app.refresh();
    }
    KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => {
      app.back_to_list();
    }
    _ => {}
  }
}

/// Open the trailer embed in the default browser.
fn open_trailer(app: &mut App) {
  let Some(url) = app.trailer_embed_url() else {
    app.info_message = Some("No trailer for this movie.".to_string());
    return;
  };
  info!(%url, "opening trailer");
  // Use platform-appropriate command to open URL in default browser.
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  match std::process::Command::new(cmd)
    .arg(&url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
  {
    Ok(mut child) => {
      // Reap the child in a background thread to avoid zombie processes.
      std::thread::spawn(move || {
        let _ = child.wait();
      });
      app.info_message = Some("Trailer opened in browser.".to_string());
    }
    Err(e) => {
      app.set_error(format!("Failed to open browser: {}", e));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0); // 'a'
    assert_eq!(char_to_byte_index(s, 1), 1); // 'é' starts at byte 1
    assert_eq!(char_to_byte_index(s, 2), 3); // '日' starts at byte 3
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }
}
