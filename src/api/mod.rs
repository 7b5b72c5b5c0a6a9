//! Remote transactions API: wire types, error taxonomy, and clients.

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpTransactionsClient, TransactionsApi};
pub use error::ApiError;
pub use types::{
  BankCode, Category, CreateTransactionRequest, CsvImportRequest, CsvUpload, ImportReport,
  Transaction, TransactionsPage, TransactionsStats,
};
