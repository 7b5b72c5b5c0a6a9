//! Shared test doubles: a scriptable in-memory API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::{
  ApiError, BankCode, Category, CreateTransactionRequest, CsvUpload, ImportReport, Transaction,
  TransactionsApi, TransactionsPage, TransactionsStats,
};

/// Install a test subscriber so `RUST_LOG=debug cargo test` surfaces the
/// query layer's tracing output.
pub(crate) fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

pub(crate) fn tx_fixture(id: u64) -> Transaction {
  Transaction {
    id,
    amount: -(id as f64) * 10.0,
    category: "groceries".to_string(),
    description: None,
    date: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
  }
}

pub(crate) fn page_fixture(page: u32, total_pages: u32) -> TransactionsPage {
  TransactionsPage {
    transactions: vec![tx_fixture(page as u64)],
    page: Some(page),
    total_pages: Some(total_pages),
  }
}

/// In-memory [`TransactionsApi`] that counts calls and can be told to fail.
pub(crate) struct MockApi {
  calls: AtomicU32,
  total_pages: u32,
  fail_next: Mutex<Option<ApiError>>,
}

impl MockApi {
  pub fn new() -> Self {
    Self {
      calls: AtomicU32::new(0),
      total_pages: 3,
      fail_next: Mutex::new(None),
    }
  }

  /// Total network calls made so far, across all endpoints.
  pub fn calls(&self) -> u32 {
    self.calls.load(Ordering::SeqCst)
  }

  /// Make the next call fail with the given error.
  pub fn fail_next(&self, error: ApiError) {
    *self
      .fail_next
      .lock()
      .unwrap_or_else(PoisonError::into_inner) = Some(error);
  }

  fn record_call(&self) -> Result<(), ApiError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    match self
      .fail_next
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take()
    {
      Some(error) => Err(error),
      None => Ok(()),
    }
  }
}

#[async_trait]
impl TransactionsApi for MockApi {
  async fn transactions(&self, page: u32) -> Result<TransactionsPage, ApiError> {
    self.record_call()?;
    Ok(page_fixture(page, self.total_pages))
  }

  async fn recent_transactions(&self, limit: u32) -> Result<Vec<Transaction>, ApiError> {
    self.record_call()?;
    Ok((1..=limit as u64).map(tx_fixture).collect())
  }

  async fn transaction(&self, id: u64) -> Result<Transaction, ApiError> {
    self.record_call()?;
    Ok(tx_fixture(id))
  }

  async fn stats(&self) -> Result<TransactionsStats, ApiError> {
    self.record_call()?;
    Ok(TransactionsStats {
      total_income: 1200.0,
      total_expenses: 450.0,
      balance: 750.0,
      transaction_count: 12,
    })
  }

  async fn categories(&self) -> Result<Vec<Category>, ApiError> {
    self.record_call()?;
    Ok(vec![
      Category {
        id: 1,
        name: "groceries".to_string(),
      },
      Category {
        id: 2,
        name: "salary".to_string(),
      },
    ])
  }

  async fn create_transaction(
    &self,
    payload: CreateTransactionRequest,
  ) -> Result<Transaction, ApiError> {
    self.record_call()?;
    Ok(Transaction {
      id: 999,
      amount: payload.amount,
      category: payload.category,
      description: payload.description,
      date: payload.date,
    })
  }

  async fn import_csv(&self, _bank: BankCode, _file: CsvUpload) -> Result<ImportReport, ApiError> {
    self.record_call()?;
    Ok(ImportReport {
      imported: 5,
      skipped: 1,
    })
  }
}
