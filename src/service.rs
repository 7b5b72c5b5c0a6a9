//! Cached transactions client: the typed surface over the orchestrator.
//!
//! This binds the remote API to the query policy: every read goes through
//! the auth gate, its configured staleness window, and per-key
//! single-flight; mutations go straight to the API with no cache
//! involvement.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::api::{
  ApiError, BankCode, Category, CreateTransactionRequest, CsvUpload, ImportReport, Transaction,
  TransactionsApi, TransactionsPage, TransactionsStats,
};
use crate::auth::{AuthState, TokenStore};
use crate::cache::{CacheStore, MemoryStore, QueryKey};
use crate::config::Config;
use crate::orchestrator::{QueryOrchestrator, QueryOutcome, QuerySpec};
use crate::pagination::normalize_page;

/// Staleness window for transaction listings, recents, and stats.
const TRANSACTIONS_STALE: Duration = Duration::from_secs(120);
/// Categories change rarely; give them a longer window.
const CATEGORIES_STALE: Duration = Duration::from_secs(600);
/// Detail reads revalidate on every consumer read.
const ALWAYS_REVALIDATE: Duration = Duration::ZERO;

/// Transactions client with transparent caching support.
///
/// Wraps a [`TransactionsApi`] implementation and provides the same data,
/// but routed through the query orchestration policy.
pub struct CachedTransactionsClient<A: TransactionsApi, S: CacheStore> {
  api: Arc<A>,
  auth: Arc<dyn AuthState>,
  queries: QueryOrchestrator<S>,
}

impl CachedTransactionsClient<crate::api::HttpTransactionsClient, MemoryStore> {
  /// Build the production client: HTTP transport plus in-memory cache.
  pub fn from_config(config: &Config, tokens: Arc<TokenStore>) -> color_eyre::Result<Self> {
    let api = crate::api::HttpTransactionsClient::new(config, Arc::clone(&tokens))?;
    Ok(Self::new(api, tokens, MemoryStore::new()))
  }
}

impl<A: TransactionsApi, S: CacheStore> CachedTransactionsClient<A, S> {
  pub fn new(api: A, auth: Arc<dyn AuthState>, store: S) -> Self {
    Self {
      api: Arc::new(api),
      auth: Arc::clone(&auth),
      queries: QueryOrchestrator::new(auth, store),
    }
  }

  /// The auth state this client is gated on.
  pub fn auth(&self) -> Arc<dyn AuthState> {
    Arc::clone(&self.auth)
  }

  #[cfg(test)]
  pub(crate) fn api(&self) -> &A {
    &self.api
  }

  /// One page of the transactions listing.
  ///
  /// All pages share the list cache slot: within the staleness window the
  /// most recently fetched page is served regardless of the page argument.
  pub async fn transactions(
    &self,
    page: u32,
  ) -> Result<QueryOutcome<TransactionsPage>, ApiError> {
    let spec = QuerySpec::new(QueryKey::TransactionsList, TRANSACTIONS_STALE);
    let api = Arc::clone(&self.api);
    let page = normalize_page(Some(page));

    self
      .queries
      .read(&spec, true, move || async move {
        api.transactions(page).await
      })
      .await
  }

  /// A page read for the infinite list.
  ///
  /// The first page consults the shared list slot through the normal
  /// staleness gate; follow-up pages always revalidate, since the slot
  /// cannot distinguish them.
  pub async fn transactions_page(
    &self,
    page: Option<u32>,
  ) -> Result<QueryOutcome<TransactionsPage>, ApiError> {
    let spec = QuerySpec::new(QueryKey::TransactionsList, TRANSACTIONS_STALE);
    let api = Arc::clone(&self.api);
    let page = normalize_page(page);
    let fetch = move || async move { api.transactions(page).await };

    if page == 1 {
      self.queries.read(&spec, true, fetch).await
    } else {
      self.queries.revalidate(&spec, true, fetch).await
    }
  }

  /// The most recent transactions, capped at `limit`.
  pub async fn recent_transactions(
    &self,
    limit: u32,
  ) -> Result<QueryOutcome<Vec<Transaction>>, ApiError> {
    let spec = QuerySpec::new(
      QueryKey::RecentTransactions { limit },
      TRANSACTIONS_STALE,
    );
    let api = Arc::clone(&self.api);

    self
      .queries
      .read(&spec, true, move || async move {
        api.recent_transactions(limit).await
      })
      .await
  }

  /// A single transaction by id.
  ///
  /// A zero id disables the query entirely: no fetch, no data, no error.
  pub async fn transaction(&self, id: u64) -> Result<QueryOutcome<Transaction>, ApiError> {
    let spec = QuerySpec::new(QueryKey::TransactionDetail { id }, ALWAYS_REVALIDATE);
    let api = Arc::clone(&self.api);

    self
      .queries
      .read(&spec, id != 0, move || async move {
        api.transaction(id).await
      })
      .await
  }

  /// Aggregate stats over the whole history.
  pub async fn stats(&self) -> Result<QueryOutcome<TransactionsStats>, ApiError> {
    let spec = QuerySpec::new(QueryKey::TransactionStats, TRANSACTIONS_STALE);
    let api = Arc::clone(&self.api);

    self
      .queries
      .read(&spec, true, move || async move { api.stats().await })
      .await
  }

  /// The category list.
  pub async fn categories(&self) -> Result<QueryOutcome<Vec<Category>>, ApiError> {
    let spec = QuerySpec::new(QueryKey::TransactionCategories, CATEGORIES_STALE);
    let api = Arc::clone(&self.api);

    self
      .queries
      .read(&spec, true, move || async move { api.categories().await })
      .await
  }

  /// Create a transaction (write operation - bypasses the cache).
  ///
  /// Cached lists are left as they are; coherence after a create is the
  /// caller's responsibility.
  pub async fn create_transaction(
    &self,
    payload: CreateTransactionRequest,
  ) -> Result<Transaction, ApiError> {
    info!(amount = payload.amount, category = %payload.category, "creating transaction");
    self.api.create_transaction(payload).await
  }

  /// Upload a bank CSV export for server-side import (bypasses the cache).
  pub async fn import_csv(
    &self,
    bank: BankCode,
    file: CsvUpload,
  ) -> Result<ImportReport, ApiError> {
    info!(bank = %bank, file = %file.file_name, "importing transactions CSV");
    self.api.import_csv(bank, file).await
  }
}
