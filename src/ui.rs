use image::imageops::FilterType;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode, PageState};
use crate::constants::constants;
use crate::display::PosterMode;
use crate::graphics::PosterWidget;
use crate::model::Movie;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Comma-joined display names, or the dash placeholder for an empty list.
fn joined_names<'a, I: Iterator<Item = &'a str>>(names: I) -> String {
  let joined: Vec<&str> = names.collect();
  if joined.is_empty() { "-".to_string() } else { joined.join(", ") }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  app.gfx.area = None;

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  match app.mode {
    AppMode::Browse | AppMode::Search => {
      let [header_area, input_area, main_area, status_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
      ])
      .areas(frame.area());

      render_header(frame, theme, header_area);
      render_search_input(frame, app, input_area);
      render_list(frame, app, main_area);
      render_status(frame, app, status_area);
      render_footer(frame, app, footer_area);
    }
    AppMode::Detail => {
      let [header_area, main_area, status_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
      ])
      .areas(frame.area());

      render_header(frame, theme, header_area);
      render_detail(frame, app, main_area);
      render_status(frame, app, status_area);
      render_footer(frame, app, footer_area);
    }
  }
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ▣ mym ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

// --- List page ---

fn render_list(frame: &mut Frame, app: &mut App, area: Rect) {
  match app.list_page() {
    PageState::Loading => render_list_placeholders(frame, app.theme(), area),
    PageState::Failed(_) => render_failed(frame, app.theme(), area),
    PageState::Ready(movies) => render_list_rows(frame, app, &movies, area),
  }
}

/// Shimmer-analog rows shown while the collection retrieval is pending.
fn render_list_placeholders(frame: &mut Frame, theme: &Theme, area: Rect) {
  let inner_w = area.width.saturating_sub(4) as usize;
  let bar_w = inner_w.min(36);
  let items: Vec<ListItem> = (0..constants().placeholder_rows)
    .map(|_| ListItem::new(Line::from(Span::styled("▒".repeat(bar_w), Style::default().fg(theme.stripe_bg)))))
    .collect();
  let list = List::new(items).block(list_block(" Movies ", theme));
  frame.render_widget(list, area);
}

/// The list page's single failure affordance: one static message, no detail
/// rows, no retry loop.
fn render_failed(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("Failed to load", Style::default().fg(theme.error).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Press r to retry.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(list_block("", theme));
  frame.render_widget(paragraph, area);
}

fn list_block(title: &str, theme: &Theme) -> Block<'static> {
  Block::bordered()
    .title(title.to_string())
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
}

fn render_list_rows(frame: &mut Frame, app: &mut App, movies: &[Movie], area: Rect) {
  let theme = app.theme();

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = app
    .filtered_indices
    .iter()
    .enumerate()
    .filter_map(|(row, &idx)| movies.get(idx).map(|movie| (row, movie)))
    .map(|(row, movie)| {
      let is_selected = Some(row) == app.list_state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if row % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let date = movie.release_date_display().unwrap_or_else(|| "-".to_string());
      let date_w = date.chars().count();
      let name_max = inner_w.saturating_sub(date_w + 2);
      let name = truncate_str(&movie.name, name_max);
      let gap = inner_w.saturating_sub(name.chars().count() + date_w);

      let line = Line::from(vec![
        Span::styled(name, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(date, Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let title = if app.query.is_empty() {
    format!(" Movies — {} ", movies.len())
  } else {
    format!(" Movies — {}/{} ", app.filtered_indices.len(), movies.len())
  };

  let list = List::new(items)
    .block(list_block(&title, theme))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

// --- Detail page ---

fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
  match app.detail_page() {
    None | Some(PageState::Loading) => render_detail_placeholders(frame, app.theme(), area),
    Some(PageState::Failed(_)) => render_failed(frame, app.theme(), area),
    Some(PageState::Ready(movie)) => render_detail_ready(frame, app, &movie, area),
  }
}

/// Placeholder panes while the record retrieval is pending — the same
/// split the ready view uses, so nothing jumps when data lands.
fn render_detail_placeholders(frame: &mut Frame, theme: &Theme, area: Rect) {
  let [poster_area, info_area] = detail_split(area);
  frame.render_widget(pane_block(" Poster ", theme), poster_area);
  let body = Paragraph::new(vec![
    Line::from(""),
    Line::from(Span::styled("Loading…", Style::default().fg(theme.muted))),
  ])
  .alignment(Alignment::Center)
  .block(pane_block(" Movie ", theme));
  frame.render_widget(body, info_area);
}

fn detail_split(area: Rect) -> [Rect; 2] {
  let pct = constants().poster_width_pct;
  Layout::horizontal([Constraint::Percentage(pct), Constraint::Percentage(100 - pct)]).areas(area)
}

fn pane_block(title: &str, theme: &Theme) -> Block<'static> {
  Block::bordered()
    .title(title.to_string())
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1))
}

fn render_detail_ready(frame: &mut Frame, app: &mut App, movie: &Movie, area: Rect) {
  let [poster_area, info_area] = detail_split(area);
  render_poster(frame, app, movie, poster_area);
  render_movie_info(frame, app, movie, info_area);
}

fn render_poster(frame: &mut Frame, app: &mut App, movie: &Movie, area: Rect) {
  let theme = app.theme();
  let block = pane_block(" Poster ", theme);
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let has_poster = app.poster.as_ref().is_some_and(|(id, _)| *id == movie.id);
  if !has_poster {
    // Either no artwork URL at all, or the download hasn't landed yet.
    let label = if movie.image_url.as_deref().is_some_and(|u| u.starts_with("http")) { "…" } else { "-" };
    let placeholder = Paragraph::new(vec![
      Line::from(""),
      Line::from(Span::styled(label, Style::default().fg(theme.muted))),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(placeholder, inner);
    return;
  }

  if app.poster_mode.uses_escape_protocol() {
    app.gfx.area = Some(inner);
    return;
  }

  // Buffer-drawn backends resize here (cached per movie and pane size).
  if let Some((ref id, ref image)) = app.poster {
    let needs_resize = match &app.gfx.resized {
      Some((cached_id, w, h, _)) => cached_id != id || *w != inner.width || *h != inner.height,
      None => true,
    };
    if needs_resize {
      let target_w = inner.width as u32;
      let target_h = match app.poster_mode {
        PosterMode::HalfBlock => inner.height as u32 * 2,
        _ => inner.height as u32,
      };
      let resized = image.resize(target_w.max(1), target_h.max(1), FilterType::Lanczos3);
      app.gfx.resized = Some((id.clone(), inner.width, inner.height, resized));
    }
    if let Some((_, _, _, ref resized)) = app.gfx.resized {
      let widget = PosterWidget { image: resized, mode: app.poster_mode };
      frame.render_widget(widget, inner);
    }
  }
}

fn render_movie_info(frame: &mut Frame, app: &App, movie: &Movie, area: Rect) {
  let theme = app.theme();
  let inner_w = area.width.saturating_sub(4) as usize;

  let heading = |label: &str| {
    Line::from(Span::styled(label.to_string(), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)))
  };
  let value = |text: String| Line::from(Span::styled(text, Style::default().fg(theme.fg)));
  let labeled = |label: &'static str, text: String| {
    Line::from(vec![
      Span::styled(label, Style::default().fg(theme.muted)),
      Span::styled(text, Style::default().fg(theme.fg)),
    ])
  };
  let dash = |opt: Option<String>| opt.filter(|s| !s.is_empty()).unwrap_or_else(|| "-".to_string());

  let title_style = Style::default().fg(theme.fg).add_modifier(Modifier::BOLD);
  let mut lines = vec![
    Line::from(Span::styled(truncate_str(&movie.name, inner_w), title_style)),
    Line::from(""),
    heading("Overview"),
    value(dash(movie.description.clone())),
    Line::from(""),
    heading("Categories"),
    value(joined_names(movie.categories.iter().map(|c| c.name.as_str()))),
    Line::from(""),
    labeled("Release Date  ", dash(movie.release_date_display())),
    labeled("Language      ", dash(movie.language.clone())),
    labeled("Status        ", movie.status.label().to_string()),
    labeled("Studio        ", dash(movie.studios.as_ref().map(|s| s.name.clone()))),
    Line::from(""),
    heading("Actors"),
    value(joined_names(movie.actors.iter().map(|a| a.name.as_str()))),
    Line::from(""),
    heading("Director"),
    value(dash(movie.directors.as_ref().map(|d| d.name.clone()))),
    Line::from(""),
    heading("Trailer"),
  ];

  match app.trailer_embed_url() {
    Some(url) => {
      lines.push(Line::from(Span::styled(
        truncate_str(&url, inner_w),
        Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
      )));
      lines.push(Line::from(Span::styled("o to open in browser", Style::default().fg(theme.muted))));
    }
    None => lines.push(value("-".to_string())),
  }

  let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(pane_block(" Movie ", theme));
  frame.render_widget(paragraph, area);
}

// --- Chrome ---

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ {}", info), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_search_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Search { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search Movie ")
    .title_style(Style::default().fg(border_color))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.query, app.query_cursor);

  if cursor_col < app.query_scroll {
    app.query_scroll = cursor_col;
  } else if cursor_col >= app.query_scroll + inner_w {
    app.query_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .query
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.query_scroll)
    .take_while(|(start, _, _)| *start < app.query_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Search {
    let cursor_x = area.x + 2 + (cursor_col - app.query_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Browse => {
      vec![("j/k", "Navigate"), ("Enter", "Detail"), ("/", "Search"), ("r", "Refresh"), ("^t", "Theme"), ("q", "Quit")]
    }
    AppMode::Search => vec![("↓/↑", "Navigate"), ("Enter", "Apply"), ("Esc", "Clear")],
    AppMode::Detail => vec![("o", "Trailer"), ("r", "Refresh"), ("^t", "Theme"), ("Esc", "Back")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- truncate_str ---

  #[test]
  fn truncate_short_string_unchanged() {
    assert_eq!(truncate_str("Dune", 10), "Dune");
  }

  #[test]
  fn truncate_long_string_adds_ellipsis() {
    assert_eq!(truncate_str("Inception", 6), "Incep…");
  }

  // --- joined_names ---

  #[test]
  fn joined_names_empty_is_dash() {
    assert_eq!(joined_names(std::iter::empty::<&str>()), "-");
  }

  #[test]
  fn joined_names_comma_separates() {
    assert_eq!(joined_names(["Sci-Fi", "Thriller"].into_iter()), "Sci-Fi, Thriller");
  }

  // --- display_width ---

  #[test]
  fn display_width_counts_wide_chars() {
    assert_eq!(display_width("ab", 2), 2);
    assert_eq!(display_width("日本", 2), 4);
  }
}
