//! HTTP client for the MyMovie catalog API.
//!
//! Two endpoints, one path: `GET {base}/api/movie` returns the full
//! collection, `GET {base}/api/movie?id=<id>` returns a single record.

use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::Client;
use std::time::Duration;

use crate::constants::constants;
use crate::model::Movie;

#[derive(Clone)]
pub struct ApiClient {
  http: Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: &str) -> Result<Self> {
    let http = Client::builder()
      .timeout(Duration::from_secs(constants().request_timeout_secs))
      .build()
      .context("Failed to build HTTP client")?;
    Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
  }

  /// Cache key / URL for the whole collection.
  pub fn collection_url(&self) -> String {
    format!("{}{}", self.base_url, constants().movie_path)
  }

  /// Cache key / URL for one movie record.
  pub fn detail_url(&self, id: &str) -> String {
    format!("{}{}?id={}", self.base_url, constants().movie_path, id)
  }

  pub async fn list_movies(&self) -> Result<Vec<Movie>> {
    self.get_json(&self.collection_url()).await
  }

  pub async fn get_movie(&self, id: &str) -> Result<Movie> {
    self.get_json(&self.detail_url(id)).await
  }

  async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
    let response = self.http.get(url).send().await.with_context(|| format!("Request to {url} failed"))?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(anyhow!("Server returned {}{}", status, server_message(&body)));
    }
    response.json::<T>().await.with_context(|| format!("Malformed response from {url}"))
  }

  /// Download and decode a poster image. Purely cosmetic — callers keep
  /// rendering the placeholder box when this fails.
  pub async fn fetch_poster(&self, url: &str) -> Result<DynamicImage> {
    let response = self.http.get(url).send().await.with_context(|| format!("Poster request to {url} failed"))?;
    if !response.status().is_success() {
      return Err(anyhow!("Poster fetch returned {}", response.status()));
    }
    let bytes = response.bytes().await.with_context(|| format!("Failed to read poster bytes from {url}"))?;
    image::load_from_memory(&bytes).with_context(|| format!("Failed to decode poster image (URL: {url})"))
  }
}

/// Pull a human-readable message out of a JSON error body, if there is one.
fn server_message(body: &str) -> String {
  let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
    return String::new();
  };
  ["message", "error"]
    .iter()
    .find_map(|k| value.get(k).and_then(|v| v.as_str()))
    .map(|msg| format!(": {msg}"))
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn urls_are_built_from_base() {
    let api = ApiClient::new("http://localhost:3000").unwrap();
    assert_eq!(api.collection_url(), "http://localhost:3000/api/movie");
    assert_eq!(api.detail_url("42"), "http://localhost:3000/api/movie?id=42");
  }

  #[test]
  fn trailing_slash_is_trimmed() {
    let api = ApiClient::new("https://movies.example.com/").unwrap();
    assert_eq!(api.collection_url(), "https://movies.example.com/api/movie");
  }

  #[test]
  fn server_message_extracts_known_keys() {
    assert_eq!(server_message(r#"{"message":"no such movie"}"#), ": no such movie");
    assert_eq!(server_message(r#"{"error":"forbidden"}"#), ": forbidden");
    assert_eq!(server_message("not json"), "");
    assert_eq!(server_message(r#"{"detail":"other"}"#), "");
  }
}
