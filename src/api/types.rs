//! Wire types for the remote transactions API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::ApiError;

/// A single transaction record as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
  pub id: u64,
  pub amount: f64,
  pub category: String,
  #[serde(default)]
  pub description: Option<String>,
  pub date: DateTime<Utc>,
}

/// One page of the paginated transactions listing.
///
/// `page` and `total_pages` are coerced leniently: the server has been seen
/// returning them as numbers or numeric strings. Anything else deserializes
/// to `None`, which the pagination assembler treats as a terminal state
/// rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsPage {
  pub transactions: Vec<Transaction>,
  #[serde(default, deserialize_with = "lenient_page_number")]
  pub page: Option<u32>,
  #[serde(default, deserialize_with = "lenient_page_number")]
  pub total_pages: Option<u32>,
}

/// Aggregate figures for the whole transaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsStats {
  pub total_income: f64,
  pub total_expenses: f64,
  pub balance: f64,
  pub transaction_count: u32,
}

/// A spending category descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub id: u64,
  pub name: String,
}

/// Payload for creating a new transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
  pub amount: f64,
  pub category: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub date: DateTime<Utc>,
}

/// Supported institutions for CSV import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankCode {
  Tbc,
  Bog,
}

impl BankCode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Tbc => "tbc",
      Self::Bog => "bog",
    }
  }
}

impl fmt::Display for BankCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for BankCode {
  type Err = ApiError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "tbc" => Ok(Self::Tbc),
      "bog" => Ok(Self::Bog),
      other => Err(ApiError::Validation(format!(
        "unsupported bank code: {other}"
      ))),
    }
  }
}

/// Opaque file handle produced by an external file picker.
///
/// The picker decides what goes in here; this crate only forwards it to the
/// import endpoint.
#[derive(Debug, Clone)]
pub struct CsvUpload {
  pub file_name: String,
  pub bytes: Vec<u8>,
}

/// Input for the CSV import mutation.
#[derive(Debug, Clone)]
pub struct CsvImportRequest {
  pub bank: BankCode,
  pub file: CsvUpload,
}

/// Server acknowledgment of a CSV import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
  pub imported: u32,
  pub skipped: u32,
}

fn lenient_page_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Value::deserialize(deserializer)?;
  Ok(coerce_page_number(&raw))
}

/// Coerce a page-number field to numeric form.
pub(crate) fn coerce_page_number(raw: &Value) -> Option<u32> {
  match raw {
    Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
    Value::String(s) => s.trim().parse::<u32>().ok(),
    _ => None,
  }
}
