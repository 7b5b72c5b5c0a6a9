//! Cache keys for transaction queries.

use sha2::{Digest, Sha256};

/// Cache key for every query the sync layer exposes.
///
/// Keys are an ordered token sequence: resource class, sub-resource, and any
/// disambiguating parameters. Identical logical requests produce equal
/// sequences; distinct configured queries never collide. The list key
/// deliberately carries no page number, so every page of the listing shares
/// one cache slot; the "recent" variant is a materially different query
/// result and is disambiguated by its limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryKey {
  /// The paginated transactions listing (all pages share this slot)
  TransactionsList,
  /// The "recent transactions" strip, keyed by its limit
  RecentTransactions { limit: u32 },
  /// A single transaction by id
  TransactionDetail { id: u64 },
  /// Aggregate stats over the whole history
  TransactionStats,
  /// The category list
  TransactionCategories,
}

impl QueryKey {
  /// The canonical token sequence for this key.
  pub fn segments(&self) -> Vec<String> {
    match self {
      Self::TransactionsList => vec!["transactions".into(), "list".into()],
      Self::RecentTransactions { limit } => vec![
        "transactions".into(),
        "list".into(),
        "recent".into(),
        limit.to_string(),
      ],
      Self::TransactionDetail { id } => {
        vec!["transactions".into(), "detail".into(), id.to_string()]
      }
      Self::TransactionStats => vec!["transactions".into(), "stats".into()],
      Self::TransactionCategories => vec!["transactions".into(), "categories".into()],
    }
  }

  /// Stable, fixed-length storage key: SHA256 over the canonical
  /// serialization of the token sequence.
  pub fn cache_hash(&self) -> String {
    let canonical = self.segments().join(":");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
  }

  /// Human-readable form for log lines.
  pub fn description(&self) -> String {
    match self {
      Self::TransactionsList => "transactions list".to_string(),
      Self::RecentTransactions { limit } => format!("recent transactions (limit {limit})"),
      Self::TransactionDetail { id } => format!("transaction {id}"),
      Self::TransactionStats => "transaction stats".to_string(),
      Self::TransactionCategories => "transaction categories".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn test_identical_keys_hash_equal() {
    assert_eq!(
      QueryKey::TransactionsList.cache_hash(),
      QueryKey::TransactionsList.cache_hash()
    );
    assert_eq!(
      QueryKey::RecentTransactions { limit: 4 }.cache_hash(),
      QueryKey::RecentTransactions { limit: 4 }.cache_hash()
    );
  }

  #[test]
  fn test_configured_keys_never_collide() {
    let hashes: HashSet<String> = [
      QueryKey::TransactionsList,
      QueryKey::RecentTransactions { limit: 4 },
      QueryKey::RecentTransactions { limit: 10 },
      QueryKey::TransactionDetail { id: 1 },
      QueryKey::TransactionDetail { id: 2 },
      QueryKey::TransactionStats,
      QueryKey::TransactionCategories,
    ]
    .iter()
    .map(QueryKey::cache_hash)
    .collect();

    assert_eq!(hashes.len(), 7);
  }

  #[test]
  fn test_recent_limit_disambiguates() {
    let a = QueryKey::RecentTransactions { limit: 4 };
    let b = QueryKey::RecentTransactions { limit: 5 };
    assert_ne!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn test_list_key_carries_no_page() {
    // The listing shares one slot regardless of the page being displayed.
    assert_eq!(
      QueryKey::TransactionsList.segments(),
      vec!["transactions".to_string(), "list".to_string()]
    );
  }

  #[test]
  fn test_detail_key_stringifies_id() {
    let segments = QueryKey::TransactionDetail { id: 42 }.segments();
    assert_eq!(segments.last().map(String::as_str), Some("42"));
  }
}
