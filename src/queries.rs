//! Per-resource query and mutation constructors.
//!
//! Each function builds a UI handle bound to a shared
//! [`CachedTransactionsClient`], carrying the query's enabled predicate.
//! Staleness windows and cache keys are fixed inside the client; the
//! handles only decide when to ask.

use std::sync::Arc;

use crate::api::{
  Category, CreateTransactionRequest, CsvImportRequest, ImportReport, Transaction,
  TransactionsApi, TransactionsPage, TransactionsStats,
};
use crate::cache::CacheStore;
use crate::pagination::InfiniteTransactions;
use crate::query::{Mutation, Query};
use crate::service::CachedTransactionsClient;

/// How many records the "recent transactions" strip shows by default.
pub const DEFAULT_RECENT_LIMIT: u32 = 4;

/// One page of the transactions listing.
pub fn transactions_query<A, S>(
  client: &Arc<CachedTransactionsClient<A, S>>,
  page: u32,
) -> Query<TransactionsPage>
where
  A: TransactionsApi + 'static,
  S: CacheStore + 'static,
{
  let c = Arc::clone(client);
  let auth = client.auth();

  Query::new(move || {
    let c = Arc::clone(&c);
    async move { c.transactions(page).await }
  })
  .with_enabled(move || auth.has_valid_credential())
}

/// The most recent transactions, `limit` defaulting to
/// [`DEFAULT_RECENT_LIMIT`].
pub fn recent_transactions_query<A, S>(
  client: &Arc<CachedTransactionsClient<A, S>>,
  limit: Option<u32>,
) -> Query<Vec<Transaction>>
where
  A: TransactionsApi + 'static,
  S: CacheStore + 'static,
{
  let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT);
  let c = Arc::clone(client);
  let auth = client.auth();

  Query::new(move || {
    let c = Arc::clone(&c);
    async move { c.recent_transactions(limit).await }
  })
  .with_enabled(move || auth.has_valid_credential())
}

/// The infinite transactions list.
pub fn infinite_transactions<A, S>(
  client: &Arc<CachedTransactionsClient<A, S>>,
) -> InfiniteTransactions
where
  A: TransactionsApi + 'static,
  S: CacheStore + 'static,
{
  let c = Arc::clone(client);
  let auth = client.auth();

  InfiniteTransactions::new(move |page| {
    let c = Arc::clone(&c);
    async move { c.transactions_page(Some(page)).await }
  })
  .with_enabled(move || auth.has_valid_credential())
}

/// A single transaction by id.
///
/// A zero id disables the query: it reports neither data nor error.
pub fn transaction_query<A, S>(
  client: &Arc<CachedTransactionsClient<A, S>>,
  id: u64,
) -> Query<Transaction>
where
  A: TransactionsApi + 'static,
  S: CacheStore + 'static,
{
  let c = Arc::clone(client);
  let auth = client.auth();

  Query::new(move || {
    let c = Arc::clone(&c);
    async move { c.transaction(id).await }
  })
  .with_enabled(move || id != 0 && auth.has_valid_credential())
}

/// Aggregate stats over the whole history.
pub fn stats_query<A, S>(
  client: &Arc<CachedTransactionsClient<A, S>>,
) -> Query<TransactionsStats>
where
  A: TransactionsApi + 'static,
  S: CacheStore + 'static,
{
  let c = Arc::clone(client);
  let auth = client.auth();

  Query::new(move || {
    let c = Arc::clone(&c);
    async move { c.stats().await }
  })
  .with_enabled(move || auth.has_valid_credential())
}

/// The category list.
pub fn categories_query<A, S>(
  client: &Arc<CachedTransactionsClient<A, S>>,
) -> Query<Vec<Category>>
where
  A: TransactionsApi + 'static,
  S: CacheStore + 'static,
{
  let c = Arc::clone(client);
  let auth = client.auth();

  Query::new(move || {
    let c = Arc::clone(&c);
    async move { c.categories().await }
  })
  .with_enabled(move || auth.has_valid_credential())
}

/// Create-transaction mutation.
pub fn create_transaction_mutation<A, S>(
  client: &Arc<CachedTransactionsClient<A, S>>,
) -> Mutation<CreateTransactionRequest, Transaction>
where
  A: TransactionsApi + 'static,
  S: CacheStore + 'static,
{
  let c = Arc::clone(client);

  Mutation::new(move |payload| {
    let c = Arc::clone(&c);
    async move { c.create_transaction(payload).await }
  })
}

/// CSV-import mutation.
pub fn import_csv_mutation<A, S>(
  client: &Arc<CachedTransactionsClient<A, S>>,
) -> Mutation<CsvImportRequest, ImportReport>
where
  A: TransactionsApi + 'static,
  S: CacheStore + 'static,
{
  let c = Arc::clone(client);

  Mutation::new(move |req: CsvImportRequest| {
    let c = Arc::clone(&c);
    async move { c.import_csv(req.bank, req.file).await }
  })
}
