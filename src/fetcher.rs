//! Keyed stale-while-revalidate fetch cache.
//!
//! Pages never talk to the network directly. They issue `revalidate` for a
//! resource key when they (re)enter, observe the key with `lookup` every
//! frame, and the main loop drains resolved retrievals with `poll` — the
//! same try_recv cadence the rest of the app uses for background work.
//!
//! Invariants:
//!   - At most one retrieval is in flight per key; overlapping `revalidate`
//!     calls are deduplicated and their futures dropped unexecuted.
//!   - Last-known data stays visible while a refresh is in flight.
//!   - A superseded retrieval can never overwrite newer data: `invalidate`
//!     bumps the entry's generation and aborts the in-flight task, and
//!     `poll` refuses any resolution whose stamp no longer matches.
//!
//! The cache is a plain owned value, not ambient state — the app owns one
//! per record type and tests construct their own isolated instances.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What an observer sees for a resource key at one instant.
///
/// `error` and `data` can coexist (a failed refresh keeps the stale value
/// cached); the pages in this app check `error` first and treat the two as
/// exclusive.
#[derive(Debug)]
pub struct Snapshot<T> {
  pub data: Option<Arc<T>>,
  pub error: Option<String>,
  /// A retrieval is in flight. Loading in the page sense means validating
  /// with neither data nor error to show.
  pub is_validating: bool,
}

impl<T> Clone for Snapshot<T> {
  fn clone(&self) -> Self {
    Self { data: self.data.clone(), error: self.error.clone(), is_validating: self.is_validating }
  }
}

impl<T> Snapshot<T> {
  /// Nothing known and nothing in flight — the state of a never-requested key.
  fn empty() -> Self {
    Self { data: None, error: None, is_validating: false }
  }
}

struct Inflight<T> {
  rx: oneshot::Receiver<Result<T>>,
  handle: JoinHandle<()>,
  /// Generation at issue time; checked against the entry before applying.
  generation: u64,
}

struct Entry<T> {
  data: Option<Arc<T>>,
  error: Option<String>,
  /// Bumped on every issued retrieval and on invalidation. A resolution
  /// stamped with an older generation is discarded.
  generation: u64,
  inflight: Option<Inflight<T>>,
}

impl<T> Default for Entry<T> {
  fn default() -> Self {
    Self { data: None, error: None, generation: 0, inflight: None }
  }
}

impl<T> Drop for Entry<T> {
  fn drop(&mut self) {
    if let Some(inflight) = self.inflight.take() {
      inflight.handle.abort();
    }
  }
}

/// Owned, injectable stale-while-revalidate cache keyed by resource URL.
pub struct SwrCache<T> {
  entries: HashMap<String, Entry<T>>,
}

impl<T: Send + 'static> SwrCache<T> {
  pub fn new() -> Self {
    Self { entries: HashMap::new() }
  }

  /// Observe a key. Missing keys read as empty, not as loading.
  pub fn lookup(&self, key: &str) -> Snapshot<T> {
    match self.entries.get(key) {
      Some(entry) => Snapshot {
        data: entry.data.clone(),
        error: entry.error.clone(),
        is_validating: entry.inflight.is_some(),
      },
      None => Snapshot::empty(),
    }
  }

  /// Issue a retrieval for `key` unless one is already in flight.
  ///
  /// When deduplicated the future is dropped without ever being polled, so
  /// a transport mock observes exactly one call per in-flight window.
  /// Returns whether a new retrieval was issued.
  pub fn revalidate<F>(&mut self, key: &str, fetch: F) -> bool
  where
    F: Future<Output = Result<T>> + Send + 'static,
  {
    let entry = self.entries.entry(key.to_string()).or_default();
    if entry.inflight.is_some() {
      debug!(%key, "revalidate deduplicated, retrieval already in flight");
      return false;
    }
    entry.generation += 1;
    let generation = entry.generation;
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      let _ = tx.send(fetch.await);
    });
    entry.inflight = Some(Inflight { rx, handle, generation });
    debug!(%key, generation, "retrieval issued");
    true
  }

  /// Supersede the key's in-flight retrieval, if any: the task is aborted,
  /// its channel dropped, and the generation bumped so even an
  /// already-buffered resolution can no longer be applied. Cached data
  /// stays; the next `revalidate` issues a fresh retrieval.
  pub fn invalidate(&mut self, key: &str) {
    if let Some(entry) = self.entries.get_mut(key) {
      entry.generation += 1;
      entry.error = None;
      if let Some(inflight) = entry.inflight.take() {
        inflight.handle.abort();
        debug!(%key, "superseded in-flight retrieval aborted");
      }
    }
  }

  /// Drain resolved retrievals into the cache. Returns true when any entry's
  /// data or error changed, so callers know to recompute derived state.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    for (key, entry) in &mut self.entries {
      let Some(mut inflight) = entry.inflight.take() else { continue };
      match inflight.rx.try_recv() {
        Ok(result) => {
          if inflight.generation != entry.generation {
            debug!(%key, "discarded resolution of a superseded retrieval");
            continue;
          }
          match result {
            Ok(data) => {
              entry.data = Some(Arc::new(data));
              entry.error = None;
            }
            Err(e) => {
              let msg = format!("{e:#}");
              warn!(%key, err = %msg, "retrieval failed");
              // Last-known data stays cached; pages decide what to show.
              entry.error = Some(msg);
            }
          }
          changed = true;
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          entry.inflight = Some(inflight);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          if inflight.generation == entry.generation {
            entry.error = Some("retrieval task failed".to_string());
            changed = true;
          }
        }
      }
    }
    changed
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use anyhow::anyhow;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Poll until the key settles (no retrieval in flight), yielding between
  /// polls so spawned tasks get scheduled on the current-thread runtime.
  async fn settle(cache: &mut SwrCache<u32>, key: &str) {
    for _ in 0..100 {
      cache.poll();
      if !cache.lookup(key).is_validating {
        return;
      }
      tokio::task::yield_now().await;
    }
    panic!("retrieval for {key} never settled");
  }

  #[tokio::test]
  async fn unknown_key_reads_empty() {
    let cache: SwrCache<u32> = SwrCache::new();
    let snap = cache.lookup("nope");
    assert!(snap.data.is_none());
    assert!(snap.error.is_none());
    assert!(!snap.is_validating);
  }

  #[tokio::test(flavor = "current_thread")]
  async fn success_populates_data() {
    let mut cache = SwrCache::new();
    assert!(cache.revalidate("k", async { Ok(7) }));
    settle(&mut cache, "k").await;
    let snap = cache.lookup("k");
    assert_eq!(snap.data.as_deref(), Some(&7));
    assert!(snap.error.is_none());
  }

  #[tokio::test(flavor = "current_thread")]
  async fn concurrent_revalidations_issue_one_transport_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut cache = SwrCache::new();
    let (gate_tx, gate_rx) = oneshot::channel::<()>();

    let counter = Arc::clone(&calls);
    assert!(cache.revalidate("k", async move {
      counter.fetch_add(1, Ordering::SeqCst);
      let _ = gate_rx.await;
      Ok(1)
    }));
    tokio::task::yield_now().await;

    // Second observer of the same key while the first is still in flight.
    let counter = Arc::clone(&calls);
    let issued = cache.revalidate("k", async move {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(2)
    });
    assert!(!issued);
    assert!(cache.lookup("k").is_validating);

    let _ = gate_tx.send(());
    settle(&mut cache, "k").await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.lookup("k").data.as_deref(), Some(&1));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn stale_data_served_while_revalidating() {
    let mut cache = SwrCache::new();
    cache.revalidate("k", async { Ok(1) });
    settle(&mut cache, "k").await;

    let (gate_tx, gate_rx) = oneshot::channel::<()>();
    cache.revalidate("k", async move {
      let _ = gate_rx.await;
      Ok(2)
    });
    tokio::task::yield_now().await;
    cache.poll();

    // Old value stays visible while the refresh runs.
    let snap = cache.lookup("k");
    assert_eq!(snap.data.as_deref(), Some(&1));
    assert!(snap.is_validating);

    let _ = gate_tx.send(());
    settle(&mut cache, "k").await;
    assert_eq!(cache.lookup("k").data.as_deref(), Some(&2));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn failed_refresh_keeps_prior_data() {
    let mut cache = SwrCache::new();
    cache.revalidate("k", async { Ok(1) });
    settle(&mut cache, "k").await;

    cache.revalidate("k", async { Err(anyhow!("connection refused")) });
    settle(&mut cache, "k").await;

    let snap = cache.lookup("k");
    assert_eq!(snap.data.as_deref(), Some(&1));
    assert!(snap.error.as_deref().unwrap().contains("connection refused"));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn superseded_retrieval_never_overwrites() {
    let mut cache = SwrCache::new();
    let (gate_tx, gate_rx) = oneshot::channel::<()>();

    // Slow retrieval that would resolve to 1.
    cache.revalidate("k", async move {
      let _ = gate_rx.await;
      Ok(1)
    });
    tokio::task::yield_now().await;

    // Supersede it and issue a fresh retrieval resolving to 2.
    cache.invalidate("k");
    cache.revalidate("k", async { Ok(2) });
    settle(&mut cache, "k").await;
    assert_eq!(cache.lookup("k").data.as_deref(), Some(&2));

    // Release the superseded task; its resolution must never be applied.
    let _ = gate_tx.send(());
    for _ in 0..10 {
      tokio::task::yield_now().await;
      cache.poll();
    }
    assert_eq!(cache.lookup("k").data.as_deref(), Some(&2));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn stale_generation_stamp_is_discarded() {
    let mut cache = SwrCache::new();
    cache.revalidate("k", async { Ok(1) });
    settle(&mut cache, "k").await;

    // Forge a resolved in-flight retrieval carrying an outdated stamp, as
    // if issued before the entry's current generation.
    let (tx, rx) = oneshot::channel();
    tx.send(Ok(9)).unwrap();
    let handle = tokio::spawn(async {});
    let entry = cache.entries.get_mut("k").unwrap();
    entry.inflight = Some(Inflight { rx, handle, generation: entry.generation - 1 });

    assert!(!cache.poll());
    assert_eq!(cache.lookup("k").data.as_deref(), Some(&1));
    assert!(!cache.lookup("k").is_validating);
  }

  #[tokio::test(flavor = "current_thread")]
  async fn dead_retrieval_task_surfaces_as_error() {
    let mut cache = SwrCache::new();
    cache.revalidate("k", async {
      panic!("transport blew up");
    });
    settle(&mut cache, "k").await;
    let snap = cache.lookup("k");
    assert!(snap.data.is_none());
    assert_eq!(snap.error.as_deref(), Some("retrieval task failed"));
  }
}
