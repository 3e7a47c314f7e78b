//! Client-side search over the fetched movie collection.
//!
//! Filtering is pure and order-preserving: it narrows the cached list,
//! never reorders it, and never touches the network. The list page maps
//! its selection through the indices this module produces.

use crate::model::Movie;

/// Normalize for matching: lowercase with all whitespace removed.
fn normalize(s: &str) -> String {
  s.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect()
}

/// True when `name` contains `query` under normalization.
/// An empty (or all-whitespace) query matches everything.
pub fn matches(name: &str, query: &str) -> bool {
  let needle = normalize(query);
  if needle.is_empty() {
    return true;
  }
  normalize(name).contains(&needle)
}

/// Indices into `movies` whose names match `query`, in original order.
pub fn filter_indices(movies: &[Movie], query: &str) -> Vec<usize> {
  if query.is_empty() {
    return (0..movies.len()).collect();
  }
  movies
    .iter()
    .enumerate()
    .filter(|(_, movie)| matches(&movie.name, query))
    .map(|(i, _)| i)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn movie(name: &str) -> Movie {
    serde_json::from_value(serde_json::json!({ "id": 1, "name": name })).unwrap()
  }

  fn names(list: &[&str]) -> Vec<Movie> {
    list.iter().map(|n| movie(n)).collect()
  }

  #[test]
  fn empty_query_is_identity() {
    let movies = names(&["Up", "Inception", "Dune"]);
    assert_eq!(filter_indices(&movies, ""), vec![0, 1, 2]);
  }

  #[test]
  fn result_is_an_order_preserving_subsequence() {
    let movies = names(&["Dune", "Dune: Part Two", "Up", "Dungeon"]);
    assert_eq!(filter_indices(&movies, "dun"), vec![0, 1, 3]);
  }

  #[test]
  fn matching_is_case_insensitive() {
    let movies = names(&["Inception"]);
    assert_eq!(filter_indices(&movies, "iNcEpTiOn"), vec![0]);
  }

  #[test]
  fn whitespace_is_ignored_on_both_sides() {
    let movies = names(&["Up in the Air"]);
    assert_eq!(filter_indices(&movies, "  Up  "), filter_indices(&movies, "up"));
    // "upintheair" matches because the name is normalized too.
    assert_eq!(filter_indices(&movies, "in the air"), vec![0]);
  }

  #[test]
  fn ten_movies_one_inception() {
    let movies = names(&["A", "B", "C", "D", "Inception", "E", "F", "G", "H", "I"]);
    assert_eq!(movies.len(), 10);
    assert_eq!(filter_indices(&movies, "inception"), vec![4]);
  }

  #[test]
  fn no_match_is_empty_not_an_error() {
    let movies = names(&["Up", "Inception"]);
    assert!(filter_indices(&movies, "zzz").is_empty());
  }
}
