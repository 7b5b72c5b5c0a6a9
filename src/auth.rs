//! Authentication state shared between the HTTP client and the query layer.

use std::sync::{PoisonError, RwLock};

use crate::config::Config;

/// Read-only view of authentication state.
///
/// The query layer only ever asks one question: is a usable credential
/// currently held? Token acquisition and refresh are external flows.
pub trait AuthState: Send + Sync {
  fn has_valid_credential(&self) -> bool;
}

/// Shared slot holding the current API token.
///
/// Login stores a token, logout clears it. The HTTP client reads it per
/// request, so a token swap takes effect without rebuilding any client.
#[derive(Debug, Default)]
pub struct TokenStore {
  token: RwLock<Option<String>>,
}

impl TokenStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed the store from the environment, starting logged out when no
  /// token variable is set.
  pub fn from_env() -> Self {
    let store = Self::new();
    if let Ok(token) = Config::get_api_token() {
      store.set_token(token);
    }
    store
  }

  /// Store a token. An empty token counts as logged out.
  pub fn set_token(&self, token: impl Into<String>) {
    let token = token.into();
    let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
    *slot = if token.is_empty() { None } else { Some(token) };
  }

  /// Drop the current token (logout).
  pub fn clear(&self) {
    let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
    *slot = None;
  }

  /// The current token, if one is held.
  pub fn token(&self) -> Option<String> {
    self
      .token
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}

impl AuthState for TokenStore {
  fn has_valid_credential(&self) -> bool {
    self
      .token
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .is_some()
  }
}
