//! Trailer URL handling.
//!
//! The catalog stores trailers as one of two YouTube URL shapes:
//!
//!   short: `https://youtu.be/<ID>`
//!   watch: `https://www.youtube.com/watch?v=<ID>`
//!
//! The extracted ID is not validated — whatever the split yields is passed
//! through to the embed URL. Known limitation: a watch URL carrying other
//! query parameters before `v=` (or a mobile short link) extracts the wrong
//! ID. Adding a shape means adding a `UrlShape` variant, not another ad-hoc
//! string test.

use crate::constants::constants;

/// Recognized trailer URL shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlShape {
  /// `https://youtu.be/<ID>` — ID is the 4th `/`-delimited segment.
  Short,
  /// Anything containing "watch" — ID is everything after the first `=`.
  Watch,
}

/// Classify a trailer URL, or `None` when it isn't a secure YouTube link.
fn classify(url: &str) -> Option<UrlShape> {
  if !url.starts_with("https") {
    return None;
  }
  if url.contains("watch") { Some(UrlShape::Watch) } else { Some(UrlShape::Short) }
}

/// Extract the platform video id from a trailer URL.
///
/// Absent URL or an unrecognized scheme yields `None` (the caller renders
/// a dash).
pub fn resolve_video_id(url: Option<&str>) -> Option<String> {
  let url = url?;
  match classify(url)? {
    UrlShape::Watch => url.split_once('=').map(|(_, id)| id.to_string()),
    UrlShape::Short => url.split('/').nth(3).map(|segment| segment.to_string()),
  }
}

/// Embeddable player URL for a resolved video id.
pub fn embed_url(video_id: &str) -> String {
  format!("{}{}", constants().embed_url_prefix, video_id)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_form_extracts_fourth_segment() {
    assert_eq!(resolve_video_id(Some("https://youtu.be/qSqVVswa420")), Some("qSqVVswa420".to_string()));
  }

  #[test]
  fn watch_form_extracts_after_equals() {
    assert_eq!(resolve_video_id(Some("https://www.youtube.com/watch?v=2m1drlOZSDw")), Some("2m1drlOZSDw".to_string()));
  }

  #[test]
  fn absent_url_is_none() {
    assert_eq!(resolve_video_id(None), None);
  }

  #[test]
  fn non_secure_scheme_is_none() {
    assert_eq!(resolve_video_id(Some("ftp://x")), None);
    assert_eq!(resolve_video_id(Some("http://youtu.be/abc123")), None);
  }

  #[test]
  fn short_form_without_id_segment_is_none() {
    assert_eq!(resolve_video_id(Some("https://youtu.be")), None);
  }

  #[test]
  fn malformed_watch_url_passes_through_unvalidated() {
    // Documented fragility: extra parameters ride along with the id.
    assert_eq!(
      resolve_video_id(Some("https://www.youtube.com/watch?v=abc&t=10")),
      Some("abc&t=10".to_string())
    );
  }

  #[test]
  fn embed_url_prefixes_id() {
    assert_eq!(embed_url("2m1drlOZSDw"), "https://www.youtube.com/embed/2m1drlOZSDw");
  }
}
