//! Client-side sync layer for Fintrack transaction data.
//!
//! Mediates all reads and writes of transaction records between UI
//! consumers and the remote API:
//!
//! - **Caching** - each logical query has a canonical cache key and a
//!   staleness window; fresh cached data is served without touching the
//!   network.
//! - **Auth gating** - no query fetches without a valid credential; gated
//!   queries sit idle, reporting neither data nor error.
//! - **Single-flight** - concurrent reads of one key share a single
//!   in-flight fetch.
//! - **Pagination** - the infinite transactions list assembles pages in
//!   order and goes terminal when the server reports no more (or reports
//!   page metadata that doesn't parse).
//! - **Mutations** - create and CSV import are direct one-shot calls;
//!   cached lists are deliberately left untouched.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod orchestrator;
pub mod pagination;
pub mod queries;
pub mod query;
pub mod service;

#[cfg(test)]
mod testutil;

pub use api::{
  ApiError, BankCode, Category, CreateTransactionRequest, CsvImportRequest, CsvUpload,
  HttpTransactionsClient, ImportReport, Transaction, TransactionsApi, TransactionsPage,
  TransactionsStats,
};
pub use auth::{AuthState, TokenStore};
pub use cache::{CacheStore, MemoryStore, NoopStore, QueryKey};
pub use config::Config;
pub use orchestrator::{CacheSource, QueryOrchestrator, QueryOutcome, QueryResult, QuerySpec};
pub use pagination::{InfiniteTransactions, PaginationAssembler};
pub use query::{Mutation, MutationState, Query, QueryState};
pub use service::CachedTransactionsClient;
