//! Infinite-list pagination: page assembly and the consumer handle.

use std::future::Future;

use tokio::sync::mpsc;

use crate::api::{ApiError, Transaction, TransactionsPage};
use crate::orchestrator::QueryOutcome;
use crate::query::{EnabledFn, QueryFuture};

/// Fall back to page 1 when no usable page parameter is supplied.
pub(crate) fn normalize_page(page: Option<u32>) -> u32 {
  match page {
    Some(p) if p >= 1 => p,
    _ => 1,
  }
}

/// Ordered accumulation of fetched pages.
///
/// Pages are held in the order they were fetched, ascending by page number
/// with no gaps or duplicates: the assembler is the only thing choosing
/// page numbers, and it only ever offers the page after the last one it
/// recorded. Malformed page metadata from the server makes the list
/// terminal instead of raising an error.
#[derive(Debug)]
pub struct PaginationAssembler {
  pages: Vec<TransactionsPage>,
  next_page: Option<u32>,
}

impl PaginationAssembler {
  pub fn new() -> Self {
    Self {
      pages: Vec::new(),
      next_page: Some(1),
    }
  }

  /// The pages recorded so far, in fetch order.
  pub fn pages(&self) -> &[TransactionsPage] {
    &self.pages
  }

  /// All records across pages, in page order.
  pub fn records(&self) -> impl Iterator<Item = &Transaction> {
    self.pages.iter().flat_map(|p| p.transactions.iter())
  }

  /// The next fetchable page number, or None once terminal.
  pub fn next_page(&self) -> Option<u32> {
    self.next_page
  }

  /// Whether another page is on offer.
  pub fn has_more(&self) -> bool {
    self.next_page.is_some()
  }

  /// Record a fetched page and advance the cursor.
  ///
  /// `has more = page < total_pages`; a page whose number or total failed
  /// numeric coercion parks the list in its terminal state.
  pub fn record(&mut self, page: TransactionsPage) {
    let next = match (page.page, page.total_pages) {
      (Some(n), Some(total)) if n < total => Some(n + 1),
      _ => None,
    };
    self.pages.push(page);
    self.next_page = next;
  }
}

impl Default for PaginationAssembler {
  fn default() -> Self {
    Self::new()
  }
}

/// An infinite-list handle over the transactions listing.
///
/// Drives a [`PaginationAssembler`] with fetches routed through the cached
/// client, one outstanding page fetch at a time, and exposes the
/// assembled pages plus `has_next_page` to the UI.
pub struct InfiniteTransactions {
  assembler: PaginationAssembler,
  fetcher: Box<dyn Fn(u32) -> QueryFuture<TransactionsPage> + Send + Sync>,
  enabled: EnabledFn,
  loading: bool,
  error: Option<ApiError>,
  receiver: Option<mpsc::UnboundedReceiver<Result<QueryOutcome<TransactionsPage>, ApiError>>>,
}

impl InfiniteTransactions {
  /// Create a new handle with the given page fetcher.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<QueryOutcome<TransactionsPage>, ApiError>> + Send + 'static,
  {
    Self {
      assembler: PaginationAssembler::new(),
      fetcher: Box::new(move |page| Box::pin(fetcher(page))),
      enabled: Box::new(|| true),
      loading: false,
      error: None,
      receiver: None,
    }
  }

  /// Gate this list on a predicate evaluated before every fetch attempt
  /// and again when a page arrives.
  pub fn with_enabled<E>(mut self, enabled: E) -> Self
  where
    E: Fn() -> bool + Send + Sync + 'static,
  {
    self.enabled = Box::new(enabled);
    self
  }

  pub fn pages(&self) -> &[TransactionsPage] {
    self.assembler.pages()
  }

  pub fn records(&self) -> impl Iterator<Item = &Transaction> {
    self.assembler.records()
  }

  pub fn has_next_page(&self) -> bool {
    self.assembler.has_more()
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn is_error(&self) -> bool {
    self.error.is_some()
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  /// Fetch the next page, if one is on offer.
  ///
  /// No-op while a page fetch is outstanding, while the gate is closed,
  /// or once the list is terminal - a loaded page is never re-requested.
  pub fn fetch_next_page(&mut self) {
    if self.loading || !(self.enabled)() {
      return;
    }
    let Some(page) = self.assembler.next_page() else {
      return;
    };

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.loading = true;
    self.error = None;

    let future = (self.fetcher)(page);
    tokio::spawn(async move {
      let result = future.await;
      let _ = tx.send(result);
    });
  }

  /// Poll for an arriving page. Returns `true` if state changed.
  ///
  /// A page arriving after the list became disabled is discarded.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        self.loading = false;
        match result {
          Ok(QueryOutcome::Ready(res)) => {
            if (self.enabled)() {
              self.assembler.record(res.data);
            }
          }
          Ok(QueryOutcome::Disabled) => {}
          Err(e) => self.error = Some(e),
        }
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.loading = false;
        self.error = Some(ApiError::Network("fetch task dropped".to_string()));
        self.receiver = None;
        true
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::orchestrator::{CacheSource, QueryResult};
  use crate::testutil::page_fixture;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  async fn settle(list: &mut InfiniteTransactions) {
    for _ in 0..100 {
      if list.poll() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("page never arrived");
  }

  fn ready(page: TransactionsPage) -> Result<QueryOutcome<TransactionsPage>, ApiError> {
    Ok(QueryOutcome::Ready(QueryResult {
      data: page,
      source: CacheSource::Network,
    }))
  }

  #[test]
  fn test_normalize_page_falls_back_to_one() {
    assert_eq!(normalize_page(None), 1);
    assert_eq!(normalize_page(Some(0)), 1);
    assert_eq!(normalize_page(Some(7)), 7);
  }

  #[test]
  fn test_assembler_walks_pages_in_order() {
    let mut assembler = PaginationAssembler::new();
    assert_eq!(assembler.next_page(), Some(1));

    assembler.record(page_fixture(1, 3));
    assert_eq!(assembler.next_page(), Some(2));
    assert!(assembler.has_more());

    assembler.record(page_fixture(2, 3));
    assert_eq!(assembler.next_page(), Some(3));

    assembler.record(page_fixture(3, 3));
    assert_eq!(assembler.next_page(), None);
    assert!(!assembler.has_more());

    let numbers: Vec<Option<u32>> = assembler.pages().iter().map(|p| p.page).collect();
    assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);
  }

  #[test]
  fn test_assembler_single_page_list_is_terminal() {
    let mut assembler = PaginationAssembler::new();
    assembler.record(page_fixture(1, 1));
    assert!(!assembler.has_more());
  }

  #[test]
  fn test_assembler_malformed_metadata_is_terminal() {
    let mut assembler = PaginationAssembler::new();

    let mut page = page_fixture(1, 3);
    page.total_pages = None;
    assembler.record(page);

    assert!(!assembler.has_more());
    assert_eq!(assembler.pages().len(), 1);
  }

  #[test]
  fn test_assembler_collects_records_across_pages() {
    let mut assembler = PaginationAssembler::new();
    assembler.record(page_fixture(1, 2));
    assembler.record(page_fixture(2, 2));

    let ids: Vec<u64> = assembler.records().map(|t| t.id).collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
  }

  #[tokio::test]
  async fn test_infinite_list_walks_to_terminal_state() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();

    let mut list = InfiniteTransactions::new(move |page| {
      let calls = calls_in.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        ready(page_fixture(page, 3))
      }
    });

    while list.has_next_page() {
      list.fetch_next_page();
      settle(&mut list).await;
      assert!(!list.is_error());
    }

    assert_eq!(list.pages().len(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Terminal: further requests are not offered.
    list.fetch_next_page();
    assert!(!list.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_infinite_list_disabled_gate_blocks_fetches() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();

    let mut list = InfiniteTransactions::new(move |page| {
      let calls = calls_in.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        ready(page_fixture(page, 3))
      }
    })
    .with_enabled(|| false);

    list.fetch_next_page();
    assert!(!list.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_infinite_list_error_keeps_loaded_pages() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();

    let mut list = InfiniteTransactions::new(move |page| {
      let calls = calls_in.clone();
      async move {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
          ready(page_fixture(page, 3))
        } else {
          Err(ApiError::Network("down".to_string()))
        }
      }
    });

    list.fetch_next_page();
    settle(&mut list).await;
    assert_eq!(list.pages().len(), 1);

    list.fetch_next_page();
    settle(&mut list).await;

    assert!(list.is_error());
    assert_eq!(list.pages().len(), 1);
    // The failed page is still on offer for a consumer-triggered retry.
    assert!(list.has_next_page());
  }

  #[tokio::test]
  async fn test_malformed_server_total_parks_list_terminal() {
    let mut list = InfiniteTransactions::new(|page| async move {
      let mut fixture = page_fixture(page, 3);
      fixture.total_pages = None;
      ready(fixture)
    });

    list.fetch_next_page();
    settle(&mut list).await;

    assert_eq!(list.pages().len(), 1);
    assert!(!list.has_next_page());
  }
}
