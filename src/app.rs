use anyhow::Result;
use image::DynamicImage;
use ratatui::{layout::Rect, widgets::ListState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::config::Config;
use crate::constants::constants;
use crate::display::PosterMode;
use crate::fetcher::{Snapshot, SwrCache};
use crate::model::Movie;
use crate::search;
use crate::theme::THEMES;
use crate::video;

// --- Types ---

/// Which page is showing and where key input goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// List page, navigating rows.
  Browse,
  /// List page, editing the search query.
  Search,
  /// Detail page for one movie.
  Detail,
}

/// Render state of a page, derived from the fetch cache every frame.
#[derive(Debug)]
pub enum PageState<T> {
  Loading,
  Failed(String),
  Ready(Arc<T>),
}

/// Collapse a cache snapshot into what the page renders. Error wins over
/// stale data — the pages treat the two as exclusive — and anything else
/// without data is the loading state.
fn page_state<T>(snap: &Snapshot<T>) -> PageState<T> {
  if let Some(err) = &snap.error {
    return PageState::Failed(err.clone());
  }
  if let Some(data) = &snap.data {
    return PageState::Ready(Arc::clone(data));
  }
  PageState::Loading
}

/// Escape-protocol bookkeeping for the detail page's poster pane.
#[derive(Default)]
pub struct PosterPane {
  /// Cell area the poster occupied in the last drawn frame, if any.
  pub area: Option<Rect>,
  /// (movie id, area) of the image most recently sent to the terminal.
  pub last_sent: Option<(String, Rect)>,
  /// Resize cache for the buffer-drawn backends: (movie id, cols, rows, image).
  pub resized: Option<(String, u16, u16, DynamicImage)>,
}

// --- App State ---

pub struct App {
  pub mode: AppMode,
  pub theme_index: usize,
  pub poster_mode: PosterMode,
  pub api: ApiClient,
  /// The movie collection, keyed by the collection URL.
  pub movies: SwrCache<Vec<Movie>>,
  /// Single records for the detail page, keyed by the detail URL.
  pub movie: SwrCache<Movie>,
  /// Search query on the list page. Transient: cleared when navigating away.
  pub query: String,
  pub query_cursor: usize,
  pub query_scroll: usize,
  /// Indices into the cached collection that match the current query.
  pub filtered_indices: Vec<usize>,
  pub list_state: ListState,
  /// Movie id the detail page is showing.
  pub detail_id: Option<String>,
  /// Decoded poster artwork, keyed by movie id. Cosmetic only: until it
  /// arrives the detail page renders a placeholder box.
  pub poster: Option<(String, DynamicImage)>,
  pub(crate) poster_rx: Option<oneshot::Receiver<Result<(String, DynamicImage)>>>,
  pub gfx: PosterPane,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message — lower priority than status/error.
  pub info_message: Option<String>,
  pub should_quit: bool,
  /// API base url from prefs, round-tripped on save.
  pref_api_url: Option<String>,
  /// When the last error was set — used for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(poster_mode: PosterMode, api_url_flag: Option<String>) -> Result<Self> {
    let config = Config::load();
    let theme_index =
      if let Some(ref name) = config.theme_name { THEMES.iter().position(|t| t.name == name).unwrap_or(0) } else { 0 };
    let pref_api_url = config.api_url.clone();
    let base_url = api_url_flag.or(config.api_url).unwrap_or_else(|| constants().api_base_url.clone());
    let api = ApiClient::new(&base_url)?;
    info!(%base_url, "catalog client ready");

    Ok(Self {
      mode: AppMode::Browse,
      theme_index,
      poster_mode,
      api,
      movies: SwrCache::new(),
      movie: SwrCache::new(),
      query: String::new(),
      query_cursor: 0,
      query_scroll: 0,
      filtered_indices: Vec::new(),
      list_state: ListState::default(),
      detail_id: None,
      poster: None,
      poster_rx: None,
      gfx: PosterPane::default(),
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      pref_api_url,
      error_time: None,
    })
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // Safety: theme_index is always bounded by modular arithmetic in next_theme()
    // and clamped on initialization.
    &THEMES[self.theme_index]
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages once they have been on screen long enough.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  fn save_config(&self) {
    let config = Config { theme_name: Some(self.theme().name.to_string()), api_url: self.pref_api_url.clone() };
    config.save();
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  // --- Pages ---

  /// List page state, derived from the collection cache.
  pub fn list_page(&self) -> PageState<Vec<Movie>> {
    page_state(&self.movies.lookup(&self.api.collection_url()))
  }

  /// Detail page state for the movie being shown, if any.
  pub fn detail_page(&self) -> Option<PageState<Movie>> {
    let id = self.detail_id.as_ref()?;
    Some(page_state(&self.movie.lookup(&self.api.detail_url(id))))
  }

  /// Rebuild `filtered_indices` from the cached collection and the current
  /// query, clamping the selection to the filtered range.
  pub fn recompute_filter(&mut self) {
    let PageState::Ready(movies) = self.list_page() else {
      self.filtered_indices.clear();
      self.list_state.select(None);
      return;
    };
    self.filtered_indices = search::filter_indices(&movies, &self.query);
    if self.filtered_indices.is_empty() {
      self.list_state.select(None);
    } else {
      match self.list_state.selected() {
        Some(sel) if sel >= self.filtered_indices.len() => {
          self.list_state.select(Some(self.filtered_indices.len() - 1));
        }
        Some(_) => {}
        None => self.list_state.select(Some(0)),
      }
    }
  }

  /// The movie under the cursor on the list page.
  pub fn selected_movie(&self) -> Option<Movie> {
    let PageState::Ready(movies) = self.list_page() else { return None };
    let selected = self.list_state.selected()?;
    let &idx = self.filtered_indices.get(selected)?;
    movies.get(idx).cloned()
  }

  // --- Retrievals ---

  /// (Re)issue the collection retrieval. Cached data keeps rendering while
  /// the refresh is in flight; overlapping calls deduplicate in the cache.
  pub fn trigger_movies(&mut self) {
    let key = self.api.collection_url();
    let api = self.api.clone();
    self.movies.revalidate(&key, async move { api.list_movies().await });
  }

  /// (Re)issue the single-record retrieval for the detail page.
  pub fn trigger_movie(&mut self, id: &str) {
    let key = self.api.detail_url(id);
    let api = self.api.clone();
    let id = id.to_string();
    self.movie.revalidate(&key, async move { api.get_movie(&id).await });
  }

  /// Force a refetch of whatever the current page shows.
  pub fn refresh(&mut self) {
    self.clear_error();
    match self.mode {
      AppMode::Browse | AppMode::Search => {
        let key = self.api.collection_url();
        self.movies.invalidate(&key);
        self.trigger_movies();
        self.info_message = Some("Refreshing movies…".to_string());
      }
      AppMode::Detail => {
        if let Some(id) = self.detail_id.clone() {
          let key = self.api.detail_url(&id);
          self.movie.invalidate(&key);
          self.trigger_movie(&id);
          self.info_message = Some("Refreshing movie…".to_string());
        }
      }
    }
  }

  // --- Navigation ---

  /// Enter the detail page for the movie under the cursor.
  pub fn open_selected(&mut self) {
    let Some(movie) = self.selected_movie() else { return };
    info!(id = %movie.id, name = %movie.name, "opening detail page");
    self.detail_id = Some(movie.id.clone());
    self.mode = AppMode::Detail;
    // The query is transient list-page state; navigating away resets it.
    self.query.clear();
    self.query_cursor = 0;
    self.query_scroll = 0;
    self.clear_error();
    self.info_message = None;
    self.trigger_movie(&movie.id);
  }

  /// Leave the detail page. The collection usually re-renders instantly
  /// from cache while a background refresh runs (remount semantics).
  pub fn back_to_list(&mut self) {
    self.mode = AppMode::Browse;
    self.detail_id = None;
    self.poster = None;
    self.poster_rx = None;
    self.gfx.area = None;
    self.gfx.last_sent = None;
    self.gfx.resized = None;
    self.info_message = None;
    self.recompute_filter();
    self.trigger_movies();
  }

  /// Embed URL for the current movie's trailer, when it has a resolvable one.
  pub fn trailer_embed_url(&self) -> Option<String> {
    let PageState::Ready(movie) = self.detail_page()? else { return None };
    let id = video::resolve_video_id(movie.video_url.as_deref())?;
    Some(video::embed_url(&id))
  }

  // --- Background work ---

  /// Drain every pending async result into app state. Called once per tick.
  pub fn check_pending(&mut self) {
    if self.movies.poll() {
      self.recompute_filter();
      self.info_message = None;
    }
    if self.movie.poll() {
      self.info_message = None;
    }
    self.maybe_trigger_poster();

    if let Some(mut rx) = self.poster_rx.take() {
      match rx.try_recv() {
        Ok(Ok((id, image))) => {
          debug!(%id, "poster decoded");
          self.poster = Some((id, image));
        }
        Ok(Err(e)) => {
          // Poster is cosmetic; the placeholder box just stays.
          debug!(err = %e, "poster fetch failed");
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.poster_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }

    self.expire_error();
  }

  /// Kick off the poster download once the detail record is ready.
  fn maybe_trigger_poster(&mut self) {
    if self.mode != AppMode::Detail || self.poster_rx.is_some() {
      return;
    }
    let Some(PageState::Ready(movie)) = self.detail_page() else { return };
    if self.poster.as_ref().is_some_and(|(id, _)| *id == movie.id) {
      return;
    }
    // Matches the page's own guard: anything that isn't an http(s) URL gets
    // the placeholder box, no request.
    let Some(url) = movie.image_url.clone().filter(|u| u.starts_with("http")) else { return };
    let id = movie.id.clone();
    let api = self.api.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.fetch_poster(&url).await.map(|image| (id, image)));
    });
    self.poster_rx = Some(rx);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use anyhow::anyhow;

  fn test_app() -> App {
    App::new(PosterMode::Ascii, Some("http://catalog.test".to_string())).unwrap()
  }

  fn movie_named(id: u64, name: &str) -> Movie {
    serde_json::from_value(serde_json::json!({ "id": id, "name": name })).unwrap()
  }

  /// Drive the caches until nothing is in flight.
  async fn settle(app: &mut App) {
    for _ in 0..100 {
      app.check_pending();
      let collection_idle = !app.movies.lookup(&app.api.collection_url()).is_validating;
      let detail_idle = match &app.detail_id {
        Some(id) => !app.movie.lookup(&app.api.detail_url(id)).is_validating,
        None => true,
      };
      if collection_idle && detail_idle {
        return;
      }
      tokio::task::yield_now().await;
    }
    panic!("caches never settled");
  }

  fn seed_collection(app: &mut App, movies: Vec<Movie>) {
    let key = app.api.collection_url();
    app.movies.revalidate(&key, async move { Ok(movies) });
  }

  #[tokio::test(flavor = "current_thread")]
  async fn list_page_starts_loading() {
    let app = test_app();
    assert!(matches!(app.list_page(), PageState::Loading));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn list_page_becomes_ready_and_selects_first_row() {
    let mut app = test_app();
    seed_collection(&mut app, vec![movie_named(1, "Up"), movie_named(2, "Dune")]);
    settle(&mut app).await;

    assert!(matches!(app.list_page(), PageState::Ready(_)));
    assert_eq!(app.filtered_indices, vec![0, 1]);
    assert_eq!(app.list_state.selected(), Some(0));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn query_narrows_without_refetching() {
    let mut app = test_app();
    let names = ["A", "B", "C", "D", "Inception", "E", "F", "G", "H", "I"];
    seed_collection(&mut app, names.iter().enumerate().map(|(i, n)| movie_named(i as u64, n)).collect());
    settle(&mut app).await;

    app.query = "inception".to_string();
    app.recompute_filter();
    assert_eq!(app.filtered_indices, vec![4]);
    // Filtering is pure; nothing new went in flight.
    assert!(!app.movies.lookup(&app.api.collection_url()).is_validating);
  }

  #[tokio::test(flavor = "current_thread")]
  async fn unmatched_query_is_empty_but_not_an_error() {
    let mut app = test_app();
    seed_collection(&mut app, vec![movie_named(1, "Up")]);
    settle(&mut app).await;

    app.query = "zzz".to_string();
    app.recompute_filter();
    assert!(app.filtered_indices.is_empty());
    assert_eq!(app.list_state.selected(), None);
    assert!(matches!(app.list_page(), PageState::Ready(_)));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn list_fetch_failure_is_the_failed_state() {
    let mut app = test_app();
    let key = app.api.collection_url();
    app.movies.revalidate(&key, async { Err(anyhow!("connection refused")) });
    settle(&mut app).await;

    let PageState::Failed(msg) = app.list_page() else {
      panic!("expected failed state");
    };
    assert!(msg.contains("connection refused"));
    assert!(app.filtered_indices.is_empty());
  }

  #[tokio::test(flavor = "current_thread")]
  async fn detail_fetch_failure_shows_no_fields() {
    let mut app = test_app();
    app.detail_id = Some("9".to_string());
    let key = app.api.detail_url("9");
    app.movie.revalidate(&key, async { Err(anyhow!("boom")) });
    settle(&mut app).await;

    assert!(matches!(app.detail_page(), Some(PageState::Failed(_))));
    assert!(app.trailer_embed_url().is_none());
  }

  #[tokio::test(flavor = "current_thread")]
  async fn opening_detail_resets_the_query() {
    let mut app = test_app();
    seed_collection(&mut app, vec![movie_named(1, "Up"), movie_named(2, "Dune")]);
    settle(&mut app).await;

    app.query = "du".to_string();
    app.recompute_filter();
    assert_eq!(app.filtered_indices, vec![1]);

    app.open_selected();
    assert_eq!(app.mode, AppMode::Detail);
    assert_eq!(app.detail_id.as_deref(), Some("2"));
    assert!(app.query.is_empty());
    // Abort the detail retrieval; this test has no server behind it.
    app.movie.invalidate(&app.api.detail_url("2"));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn returning_to_list_serves_cache_and_revalidates() {
    let mut app = test_app();
    seed_collection(&mut app, vec![movie_named(1, "Up")]);
    settle(&mut app).await;

    app.mode = AppMode::Detail;
    app.detail_id = Some("1".to_string());
    app.back_to_list();

    // Stale-while-revalidate: the cached collection renders immediately
    // while the remount refresh is in flight.
    assert!(matches!(app.list_page(), PageState::Ready(_)));
    assert!(app.movies.lookup(&app.api.collection_url()).is_validating);
    // Abort the remount retrieval; this test has no server behind it.
    app.movies.invalidate(&app.api.collection_url());
  }

  #[tokio::test(flavor = "current_thread")]
  async fn trailer_embed_url_resolves_both_shapes() {
    let mut app = test_app();
    app.detail_id = Some("1".to_string());
    let key = app.api.detail_url("1");
    let movie: Movie = serde_json::from_value(serde_json::json!({
      "id": 1, "name": "X", "video_url": "https://youtu.be/qSqVVswa420"
    }))
    .unwrap();
    app.movie.revalidate(&key, async move { Ok(movie) });
    settle(&mut app).await;
    assert_eq!(app.trailer_embed_url().as_deref(), Some("https://www.youtube.com/embed/qSqVVswa420"));
  }
}
