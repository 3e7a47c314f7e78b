//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available —
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Catalog API
  pub api_base_url: String,
  pub movie_path: String,
  pub request_timeout_secs: u64,

  // Trailer embeds
  pub embed_url_prefix: String,

  // List page
  pub placeholder_rows: usize,

  // Status line
  pub error_dismiss_secs: u64,

  // Detail page poster pane (percent of the detail width)
  pub poster_width_pct: u16,

  // Logging
  pub log_file: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
