//! Transactions API trait and the reqwest-backed production client.

use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::multipart;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::auth::TokenStore;
use crate::config::Config;

use super::error::ApiError;
use super::types::{
  BankCode, Category, CreateTransactionRequest, CsvUpload, ImportReport, Transaction,
  TransactionsPage, TransactionsStats,
};

/// The remote transactions API, as consumed by the sync layer.
///
/// The orchestration core only ever talks to this trait; the HTTP transport
/// below is one implementation of it.
#[async_trait]
pub trait TransactionsApi: Send + Sync {
  /// Fetch one page of the transactions listing.
  async fn transactions(&self, page: u32) -> Result<TransactionsPage, ApiError>;

  /// Fetch the most recent transactions, capped at `limit`.
  async fn recent_transactions(&self, limit: u32) -> Result<Vec<Transaction>, ApiError>;

  /// Fetch a single transaction by id.
  async fn transaction(&self, id: u64) -> Result<Transaction, ApiError>;

  /// Fetch aggregate stats over the whole history.
  async fn stats(&self) -> Result<TransactionsStats, ApiError>;

  /// Fetch the list of spending categories.
  async fn categories(&self) -> Result<Vec<Category>, ApiError>;

  /// Create a new transaction.
  async fn create_transaction(
    &self,
    payload: CreateTransactionRequest,
  ) -> Result<Transaction, ApiError>;

  /// Upload a bank CSV export for server-side parsing and import.
  async fn import_csv(&self, bank: BankCode, file: CsvUpload) -> Result<ImportReport, ApiError>;
}

/// HTTP client for the Fintrack API.
#[derive(Clone)]
pub struct HttpTransactionsClient {
  http: reqwest::Client,
  base: Url,
  tokens: Arc<TokenStore>,
}

impl HttpTransactionsClient {
  pub fn new(config: &Config, tokens: Arc<TokenStore>) -> Result<Self> {
    let mut base = Url::parse(&config.api.url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.api.url, e))?;

    // Url::join drops the last path segment unless the base ends with '/'.
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    Ok(Self {
      http: reqwest::Client::new(),
      base,
      tokens,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
    self
      .base
      .join(path)
      .map_err(|e| ApiError::Network(format!("invalid endpoint {path}: {e}")))
  }

  fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match self.tokens.token() {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, ApiError> {
    let req = self.authorize(self.http.get(self.endpoint(path)?)).query(query);
    let resp = req
      .send()
      .await
      .map_err(|e| ApiError::Network(e.to_string()))?;
    decode_response(resp).await
  }

  async fn post_json<B: Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let req = self.authorize(self.http.post(self.endpoint(path)?)).json(body);
    let resp = req
      .send()
      .await
      .map_err(|e| ApiError::Network(e.to_string()))?;
    decode_response(resp).await
  }
}

#[async_trait]
impl TransactionsApi for HttpTransactionsClient {
  async fn transactions(&self, page: u32) -> Result<TransactionsPage, ApiError> {
    self
      .get_json("transactions", &[("page", page.to_string())])
      .await
  }

  async fn recent_transactions(&self, limit: u32) -> Result<Vec<Transaction>, ApiError> {
    self
      .get_json("transactions/recent", &[("limit", limit.to_string())])
      .await
  }

  async fn transaction(&self, id: u64) -> Result<Transaction, ApiError> {
    self.get_json(&format!("transactions/{id}"), &[]).await
  }

  async fn stats(&self) -> Result<TransactionsStats, ApiError> {
    self.get_json("transactions/stats", &[]).await
  }

  async fn categories(&self) -> Result<Vec<Category>, ApiError> {
    self.get_json("transactions/categories", &[]).await
  }

  async fn create_transaction(
    &self,
    payload: CreateTransactionRequest,
  ) -> Result<Transaction, ApiError> {
    self.post_json("transactions", &payload).await
  }

  async fn import_csv(&self, bank: BankCode, file: CsvUpload) -> Result<ImportReport, ApiError> {
    let part = multipart::Part::bytes(file.bytes)
      .file_name(file.file_name)
      .mime_str("text/csv")
      .map_err(|e| ApiError::Validation(e.to_string()))?;
    let form = multipart::Form::new().part("file", part);

    let path = format!("transactions/import/{bank}");
    let req = self.authorize(self.http.post(self.endpoint(&path)?)).multipart(form);
    let resp = req
      .send()
      .await
      .map_err(|e| ApiError::Network(e.to_string()))?;
    decode_response(resp).await
  }
}

async fn decode_response<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
  let status = resp.status();
  if status.is_success() {
    return resp
      .json::<T>()
      .await
      .map_err(|e| ApiError::Decode(e.to_string()));
  }

  let body = resp.text().await.unwrap_or_default();
  let message = error_message(status, &body);

  tracing::warn!(%status, "API request failed: {message}");

  Err(match status {
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth(message),
    StatusCode::NOT_FOUND => ApiError::NotFound(message),
    StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
    _ => ApiError::Network(message),
  })
}

/// Pull a human-readable message out of an error body, falling back to the
/// status line when the body isn't the usual `{"message": ...}` shape.
fn error_message(status: StatusCode, body: &str) -> String {
  #[derive(Deserialize)]
  struct ErrorBody {
    message: String,
  }

  serde_json::from_str::<ErrorBody>(body)
    .map(|b| b.message)
    .unwrap_or_else(|_| format!("HTTP {status}"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_message_prefers_server_message() {
    let msg = error_message(StatusCode::BAD_REQUEST, r#"{"message": "bad csv"}"#);
    assert_eq!(msg, "bad csv");
  }

  #[test]
  fn test_error_message_falls_back_to_status() {
    let msg = error_message(StatusCode::BAD_GATEWAY, "<html>oops</html>");
    assert_eq!(msg, "HTTP 502 Bad Gateway");
  }

  #[test]
  fn test_endpoint_joins_relative_to_base_path() {
    let config = Config::for_url("https://api.fintrack.example/v1");
    let client = HttpTransactionsClient::new(&config, Arc::new(TokenStore::new())).unwrap();

    let url = client.endpoint("transactions/stats").unwrap();
    assert_eq!(url.as_str(), "https://api.fintrack.example/v1/transactions/stats");
  }
}
