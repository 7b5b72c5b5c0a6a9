//! Poll-based query and mutation handles for UI consumers.
//!
//! A `Query<T>` encapsulates one read: its fetching logic, its enabled
//! gate, and the loading/success/error state the UI renders from. The
//! fetch itself runs on a spawned task; the consumer drives the handle
//! from its event loop:
//!
//! ```ignore
//! let mut query = queries::stats_query(&client);
//!
//! // Start fetching
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match query.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Success(stats) => render_stats(stats),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::api::ApiError;
use crate::orchestrator::QueryOutcome;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not produced anything: never started, or currently disabled
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(ApiError),
}

impl<T> QueryState<T> {
  pub fn is_idle(&self) -> bool {
    matches!(self, QueryState::Idle)
  }

  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&ApiError> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A boxed future resolving to a gated query outcome
pub(crate) type QueryFuture<T> = Pin<Box<dyn Future<Output = Result<QueryOutcome<T>, ApiError>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> QueryFuture<T> + Send + Sync>;

/// The enabled predicate: pure function of credential presence and any
/// query-specific precondition, re-evaluated on every state change
pub(crate) type EnabledFn = Box<dyn Fn() -> bool + Send + Sync>;

/// A read handle for one query.
///
/// Encapsulates the fetching logic (via a closure), the enabled gate, and
/// loading/success/error state, with async results delivered over a
/// channel and applied on `poll()`.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  enabled: EnabledFn,
  receiver: Option<mpsc::UnboundedReceiver<Result<QueryOutcome<T>, ApiError>>>,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is called each time `fetch()` or `refetch()` is invoked;
  /// it is expected to route through the query orchestrator, which applies
  /// caching and single-flight coordination.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<QueryOutcome<T>, ApiError>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      enabled: Box::new(|| true),
      receiver: None,
    }
  }

  /// Gate this query on a predicate evaluated before every fetch attempt
  /// and again when a result arrives.
  pub fn with_enabled<E>(mut self, enabled: E) -> Self
  where
    E: Fn() -> bool + Send + Sync + 'static,
  {
    self.enabled = Box::new(enabled);
    self
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Get the data if the query succeeded.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// Check if the query is currently loading.
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Check if the query succeeded.
  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  /// Check if the query failed.
  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Get the error if the query failed.
  pub fn error(&self) -> Option<&ApiError> {
    self.state.error()
  }

  /// Start fetching data if permitted.
  ///
  /// No-op while a fetch is in flight or while the enabled gate is closed.
  pub fn fetch(&mut self) {
    if self.state.is_loading() || !(self.enabled)() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, dropping any pending fetch. Still gated.
  pub fn refetch(&mut self) {
    if !(self.enabled)() {
      return;
    }
    // Cancel any pending fetch by dropping the receiver
    self.receiver = None;
    self.start_fetch();
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed. A result arriving after the
  /// query became disabled is discarded, not applied to visible state.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        self.state = match result {
          Ok(QueryOutcome::Ready(res)) if (self.enabled)() => QueryState::Success(res.data),
          Ok(QueryOutcome::Ready(_)) | Ok(QueryOutcome::Disabled) => QueryState::Idle,
          Err(e) => QueryState::Error(e),
        };
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending - treat as error
        self.state = QueryState::Error(ApiError::Network("fetch task dropped".to_string()));
        self.receiver = None;
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

/// The state of a mutation
#[derive(Debug, Clone)]
pub enum MutationState<T> {
  /// Mutation has not been dispatched
  Idle,
  /// Mutation is in flight
  Pending,
  /// Mutation completed successfully
  Success(T),
  /// Mutation failed with an error
  Error(ApiError),
}

type MutationFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;
type MutationFn<I, O> = Box<dyn Fn(I) -> MutationFuture<O> + Send + Sync>;

/// A trigger handle for one mutation.
///
/// Mutations are one-shot calls that bypass the cache entirely; cached
/// query data is untouched whatever the outcome.
pub struct Mutation<I, O> {
  state: MutationState<O>,
  op: MutationFn<I, O>,
  receiver: Option<mpsc::UnboundedReceiver<Result<O, ApiError>>>,
}

impl<I: Send + 'static, O: Send + 'static> Mutation<I, O> {
  pub fn new<F, Fut>(op: F) -> Self
  where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
  {
    Self {
      state: MutationState::Idle,
      op: Box::new(move |input| Box::pin(op(input))),
      receiver: None,
    }
  }

  /// Dispatch the mutation with the given input.
  ///
  /// Dispatching while a previous call is pending drops the pending
  /// result; the latest dispatch wins.
  pub fn dispatch(&mut self, input: I) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = MutationState::Pending;

    let future = (self.op)(input);
    tokio::spawn(async move {
      let result = future.await;
      let _ = tx.send(result);
    });
  }

  /// Poll for the result of a pending dispatch.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = MutationState::Success(data);
        self.receiver = None;
        true
      }
      Ok(Err(e)) => {
        self.state = MutationState::Error(e);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = MutationState::Error(ApiError::Network("mutation task dropped".to_string()));
        self.receiver = None;
        true
      }
    }
  }

  pub fn state(&self) -> &MutationState<O> {
    &self.state
  }

  pub fn is_pending(&self) -> bool {
    matches!(self.state, MutationState::Pending)
  }

  pub fn is_error(&self) -> bool {
    matches!(self.state, MutationState::Error(_))
  }

  pub fn data(&self) -> Option<&O> {
    match &self.state {
      MutationState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&ApiError> {
    match &self.state {
      MutationState::Error(e) => Some(e),
      _ => None,
    }
  }
}
