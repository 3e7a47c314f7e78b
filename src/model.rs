//! Record types returned by the catalog API.
//!
//! Everything here is read-only from the dashboard's perspective: records
//! are deserialized fresh per fetch and never mutated or persisted locally.
//! Associated records (categories, actors, director, studio) are foreign
//! references carried inline by the movie payload.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// One movie record, as served by `GET /api/movie`.
#[derive(Debug, Clone, Deserialize)]
pub struct Movie {
  #[serde(deserialize_with = "flex_id")]
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub release_date: Option<String>,
  #[serde(default)]
  pub language: Option<String>,
  #[serde(default)]
  pub status: MovieStatus,
  #[serde(default)]
  pub video_url: Option<String>,
  #[serde(default)]
  pub categories: Vec<Category>,
  #[serde(default)]
  pub actors: Vec<Actor>,
  /// The API nests a single optional record under a plural key.
  #[serde(default)]
  pub directors: Option<Director>,
  #[serde(default)]
  pub studios: Option<Studio>,
}

impl Movie {
  /// Release date formatted for display ("16 Jul 2010"), falling back to
  /// the raw API string when it isn't an ISO date.
  pub fn release_date_display(&self) -> Option<String> {
    let raw = self.release_date.as_deref()?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
      Ok(date) => Some(date.format("%-d %b %Y").to_string()),
      Err(_) => Some(raw.to_string()),
    }
  }
}

/// Production status, stored numerically by the API: 1 means still in
/// production, anything else means released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "i64")]
pub enum MovieStatus {
  Production,
  #[default]
  Released,
}

impl From<i64> for MovieStatus {
  fn from(raw: i64) -> Self {
    if raw == 1 { MovieStatus::Production } else { MovieStatus::Released }
  }
}

impl MovieStatus {
  pub fn label(self) -> &'static str {
    match self {
      MovieStatus::Production => "Production",
      MovieStatus::Released => "Released",
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
  #[serde(deserialize_with = "flex_id")]
  pub id: String,
  pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
  #[serde(deserialize_with = "flex_id")]
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Director {
  #[serde(deserialize_with = "flex_id")]
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Studio {
  #[serde(deserialize_with = "flex_id")]
  pub id: String,
  pub name: String,
}

/// The backend serves numeric ids, but the dashboard treats them as opaque
/// strings (they only ever travel back into URLs). Accept either form.
fn flex_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawId {
    Num(i64),
    Str(String),
  }
  Ok(match RawId::deserialize(deserializer)? {
    RawId::Num(n) => n.to_string(),
    RawId::Str(s) => s,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  const FULL_RECORD: &str = r#"{
    "id": 7,
    "name": "Inception",
    "description": "A thief who steals corporate secrets.",
    "image_url": "https://img.example.com/inception.jpg",
    "release_date": "2010-07-16",
    "language": "English",
    "status": 2,
    "video_url": "https://youtu.be/qSqVVswa420",
    "categories": [{ "id": 1, "name": "Sci-Fi" }],
    "actors": [{ "id": 3, "name": "Leonardo DiCaprio", "image_url": "https://img.example.com/leo.jpg" }],
    "directors": { "id": 4, "name": "Christopher Nolan", "image_url": null },
    "studios": { "id": 5, "name": "Warner Bros." }
  }"#;

  #[test]
  fn full_record_decodes() {
    let movie: Movie = serde_json::from_str(FULL_RECORD).unwrap();
    assert_eq!(movie.id, "7");
    assert_eq!(movie.name, "Inception");
    assert_eq!(movie.status, MovieStatus::Released);
    assert_eq!(movie.categories.len(), 1);
    assert_eq!(movie.actors[0].name, "Leonardo DiCaprio");
    assert_eq!(movie.directors.as_ref().unwrap().name, "Christopher Nolan");
    assert_eq!(movie.studios.as_ref().unwrap().name, "Warner Bros.");
  }

  #[test]
  fn sparse_record_decodes_with_defaults() {
    let movie: Movie = serde_json::from_str(r#"{ "id": "abc", "name": "Bare" }"#).unwrap();
    assert_eq!(movie.id, "abc");
    assert!(movie.description.is_none());
    assert!(movie.video_url.is_none());
    assert!(movie.categories.is_empty());
    assert!(movie.directors.is_none());
    assert_eq!(movie.status, MovieStatus::Released);
  }

  #[test]
  fn status_one_is_production() {
    let movie: Movie = serde_json::from_str(r#"{ "id": 1, "name": "X", "status": 1 }"#).unwrap();
    assert_eq!(movie.status, MovieStatus::Production);
    assert_eq!(movie.status.label(), "Production");
  }

  #[test]
  fn status_other_values_are_released() {
    for raw in [0, 2, -1, 99] {
      assert_eq!(MovieStatus::from(raw), MovieStatus::Released);
    }
  }

  #[test]
  fn release_date_formats_iso() {
    let movie: Movie = serde_json::from_str(r#"{ "id": 1, "name": "X", "release_date": "2010-07-16" }"#).unwrap();
    assert_eq!(movie.release_date_display().unwrap(), "16 Jul 2010");
  }

  #[test]
  fn release_date_passes_through_non_iso() {
    let movie: Movie = serde_json::from_str(r#"{ "id": 1, "name": "X", "release_date": "mid 2010" }"#).unwrap();
    assert_eq!(movie.release_date_display().unwrap(), "mid 2010");
  }

  #[test]
  fn release_date_absent() {
    let movie: Movie = serde_json::from_str(r#"{ "id": 1, "name": "X" }"#).unwrap();
    assert!(movie.release_date_display().is_none());
  }
}
