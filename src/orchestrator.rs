//! Query orchestration: gating, staleness, and single-flight coordination.
//!
//! This layer sits between typed query surfaces and the network client.
//! For every read it decides, in order:
//!
//! 1. **Enabled gate** - no fetch runs without a valid credential and the
//!    query's own precondition. A gated read reports `Disabled`: no data,
//!    no error.
//! 2. **Staleness gate** - a cached payload younger than the query's
//!    staleness window is returned without touching the network.
//! 3. **Single-flight** - at most one fetch per cache key is outstanding
//!    at any time; concurrent reads of the same key subscribe to the
//!    in-flight result instead of issuing duplicate calls.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::api::ApiError;
use crate::auth::AuthState;
use crate::cache::{CacheStore, QueryKey};

/// Per-query configuration, fixed at the call site.
#[derive(Clone, Debug)]
pub struct QuerySpec {
  pub key: QueryKey,
  /// How long a cached payload stays fresh. Zero means always revalidate.
  pub stale_time: Duration,
}

impl QuerySpec {
  pub fn new(key: QueryKey, stale_time: Duration) -> Self {
    Self { key, stale_time }
  }
}

/// Where a query result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data fetched by this read
  Network,
  /// Cached data still within its staleness window
  Cache,
  /// Result of a fetch another consumer already had in flight
  Shared,
}

/// A resolved query payload and its provenance.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
  pub data: T,
  pub source: CacheSource,
}

/// Outcome of a gated read.
///
/// `Disabled` is not an error: it is the idle state of a query whose gate
/// is closed (no credential, or a precondition such as a zero id failed).
#[derive(Debug, Clone)]
pub enum QueryOutcome<T> {
  Disabled,
  Ready(QueryResult<T>),
}

impl<T> QueryOutcome<T> {
  pub fn is_disabled(&self) -> bool {
    matches!(self, Self::Disabled)
  }

  pub fn data(self) -> Option<T> {
    match self {
      Self::Ready(result) => Some(result.data),
      Self::Disabled => None,
    }
  }

  pub fn source(&self) -> Option<CacheSource> {
    match self {
      Self::Ready(result) => Some(result.source),
      Self::Disabled => None,
    }
  }
}

type FetchResult = Result<Value, ApiError>;

/// Orchestrates cached, gated, deduplicated reads.
///
/// Payloads cross this layer in canonical serialized form so one instance
/// serves every query type; typed surfaces deserialize at the edge.
pub struct QueryOrchestrator<S: CacheStore> {
  auth: Arc<dyn AuthState>,
  store: Arc<S>,
  in_flight: Mutex<HashMap<String, broadcast::Sender<FetchResult>>>,
}

impl<S: CacheStore> QueryOrchestrator<S> {
  pub fn new(auth: Arc<dyn AuthState>, store: S) -> Self {
    Self {
      auth,
      store: Arc::new(store),
      in_flight: Mutex::new(HashMap::new()),
    }
  }

  /// Both gates must hold for a fetch to be permitted. Re-evaluated on
  /// every attempt and again when an awaited result arrives.
  fn gate_open(&self, precondition: bool) -> bool {
    precondition && self.auth.has_valid_credential()
  }

  /// Read a query through the full policy: gate, staleness, single-flight.
  pub async fn read<T, F, Fut>(
    &self,
    spec: &QuerySpec,
    precondition: bool,
    fetch: F,
  ) -> Result<QueryOutcome<T>, ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    if !self.gate_open(precondition) {
      return Ok(QueryOutcome::Disabled);
    }

    let hash = spec.key.cache_hash();
    if let Some(entry) = self.store.get(&hash) {
      if entry.fetched_at.elapsed() < spec.stale_time {
        debug!(query = %spec.key.description(), "serving fresh cache entry");
        let data = deserialize_payload(entry.value)?;
        return Ok(QueryOutcome::Ready(QueryResult {
          data,
          source: CacheSource::Cache,
        }));
      }
    }

    self.fetch_through(spec, precondition, fetch).await
  }

  /// Read a query bypassing the staleness gate.
  ///
  /// The enabled gate and single-flight coordination still apply, and a
  /// successful fetch refreshes the cache slot. Used for always-revalidate
  /// reads such as follow-up pages of an infinite list.
  pub async fn revalidate<T, F, Fut>(
    &self,
    spec: &QuerySpec,
    precondition: bool,
    fetch: F,
  ) -> Result<QueryOutcome<T>, ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    if !self.gate_open(precondition) {
      return Ok(QueryOutcome::Disabled);
    }

    self.fetch_through(spec, precondition, fetch).await
  }

  async fn fetch_through<T, F, Fut>(
    &self,
    spec: &QuerySpec,
    precondition: bool,
    fetch: F,
  ) -> Result<QueryOutcome<T>, ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let hash = spec.key.cache_hash();

    // Join an in-flight fetch for this key if one exists, otherwise
    // register ourselves as the one doing the fetching. The map lock is
    // never held across an await.
    let tx = {
      let mut in_flight = self.in_flight.lock().await;
      match in_flight.get(&hash) {
        Some(tx) => {
          let rx = tx.subscribe();
          drop(in_flight);
          debug!(query = %spec.key.description(), "joining in-flight fetch");
          return self.await_shared(rx, precondition).await;
        }
        None => {
          let (tx, _rx) = broadcast::channel(1);
          in_flight.insert(hash.clone(), tx.clone());
          tx
        }
      }
    };

    debug!(query = %spec.key.description(), "fetching from network");
    let outcome = match fetch().await {
      Ok(data) => match serde_json::to_value(&data) {
        Ok(value) => {
          self.store.put(&hash, value.clone());
          Ok((data, value))
        }
        Err(e) => Err(ApiError::Decode(e.to_string())),
      },
      Err(e) => Err(e),
    };

    // Release the key before publishing, so readers arriving after the
    // broadcast see the cache write instead of a dangling sender.
    {
      let mut in_flight = self.in_flight.lock().await;
      in_flight.remove(&hash);
    }
    let _ = tx.send(match &outcome {
      Ok((_, value)) => Ok(value.clone()),
      Err(e) => Err(e.clone()),
    });

    match outcome {
      Ok((data, _)) => {
        // The query may have become disabled while the fetch was in
        // flight; the result must not reach visible state in that case.
        if !self.gate_open(precondition) {
          return Ok(QueryOutcome::Disabled);
        }
        Ok(QueryOutcome::Ready(QueryResult {
          data,
          source: CacheSource::Network,
        }))
      }
      Err(e) => Err(e),
    }
  }

  async fn await_shared<T: DeserializeOwned>(
    &self,
    mut rx: broadcast::Receiver<FetchResult>,
    precondition: bool,
  ) -> Result<QueryOutcome<T>, ApiError> {
    match rx.recv().await {
      Ok(Ok(value)) => {
        if !self.gate_open(precondition) {
          return Ok(QueryOutcome::Disabled);
        }
        let data = deserialize_payload(value)?;
        Ok(QueryOutcome::Ready(QueryResult {
          data,
          source: CacheSource::Shared,
        }))
      }
      Ok(Err(e)) => Err(e),
      Err(_) => Err(ApiError::Network(
        "shared fetch dropped before completing".to_string(),
      )),
    }
  }
}

fn deserialize_payload<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
  serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}
