//! Query cache
//!
//! Keyed cache of query results. Entries are keyed by entity, operation,
//! cluster and (optionally) account address, and are dropped or refetched
//! after any mutation that can change the chain state they mirror.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use solana_sdk::pubkey::Pubkey;

use crate::state_structs::{ProgramAccountInfo, TokenVestingAccount, TokenVestingRecord};

pub const TOKEN_VESTING_ENTITY: &str = "token_vesting";
pub const PROGRAM_ACCOUNT_ENTITY: &str = "get-program-account";

/// Identity of a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Every token_vesting account on the cluster.
    All { cluster: String },
    /// A single account by address.
    Fetch { cluster: String, account: Pubkey },
    /// Raw account info of the program itself.
    ProgramAccount { cluster: String },
}

impl QueryKey {
    pub fn all(cluster: &str) -> Self {
        QueryKey::All {
            cluster: cluster.to_string(),
        }
    }

    pub fn fetch(cluster: &str, account: Pubkey) -> Self {
        QueryKey::Fetch {
            cluster: cluster.to_string(),
            account,
        }
    }

    pub fn program_account(cluster: &str) -> Self {
        QueryKey::ProgramAccount {
            cluster: cluster.to_string(),
        }
    }

    pub fn entity(&self) -> &'static str {
        match self {
            QueryKey::All { .. } | QueryKey::Fetch { .. } => TOKEN_VESTING_ENTITY,
            QueryKey::ProgramAccount { .. } => PROGRAM_ACCOUNT_ENTITY,
        }
    }

    pub fn operation(&self) -> Option<&'static str> {
        match self {
            QueryKey::All { .. } => Some("all"),
            QueryKey::Fetch { .. } => Some("fetch"),
            QueryKey::ProgramAccount { .. } => None,
        }
    }

    pub fn cluster(&self) -> &str {
        match self {
            QueryKey::All { cluster }
            | QueryKey::Fetch { cluster, .. }
            | QueryKey::ProgramAccount { cluster } => cluster,
        }
    }

    pub fn account(&self) -> Option<Pubkey> {
        match self {
            QueryKey::Fetch { account, .. } => Some(*account),
            _ => None,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity())?;
        if let Some(operation) = self.operation() {
            write!(f, "/{}", operation)?;
        }
        write!(f, "/{}", self.cluster())?;
        if let Some(account) = self.account() {
            write!(f, "/{}", account)?;
        }
        Ok(())
    }
}

/// Cached result of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Accounts(Vec<TokenVestingRecord>),
    /// `None` is a valid terminal state: the account does not exist.
    Account(Option<TokenVestingAccount>),
    ProgramAccount(Option<ProgramAccountInfo>),
}

#[derive(Debug, Clone)]
pub struct CachedQuery {
    pub value: QueryValue,
    pub fetched_at: DateTime<Utc>,
}

impl CachedQuery {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at < ttl
    }
}

/// Concurrent query cache shared by every data-access handle.
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: Arc<DashMap<QueryKey, CachedQuery>>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Cached value for `key` if it was fetched within the TTL.
    pub fn get(&self, key: &QueryKey) -> Option<QueryValue> {
        let entry = self.entries.get(key)?;
        entry.is_fresh(Utc::now(), self.ttl).then(|| entry.value.clone())
    }

    /// Cached entry for `key` regardless of age.
    pub fn peek(&self, key: &QueryKey) -> Option<CachedQuery> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    /// Store `value` under `key`, evicting every entry past the TTL.
    pub fn insert(&self, key: QueryKey, value: QueryValue) {
        let now = Utc::now();
        self.entries.retain(|_, entry| entry.is_fresh(now, self.ttl));
        self.entries.insert(
            key,
            CachedQuery {
                value,
                fetched_at: now,
            },
        );
    }

    /// Drop `key`; returns whether an entry was present.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(count: u8) -> QueryValue {
        QueryValue::Account(Some(TokenVestingAccount { count }))
    }

    #[test]
    fn test_keys_distinguish_cluster_and_account() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();

        assert_ne!(QueryKey::fetch("devnet", a), QueryKey::fetch("devnet", b));
        assert_ne!(QueryKey::fetch("devnet", a), QueryKey::fetch("testnet", a));
        assert_ne!(QueryKey::all("devnet"), QueryKey::program_account("devnet"));
        assert_eq!(QueryKey::all("devnet"), QueryKey::all("devnet"));
    }

    #[test]
    fn test_key_display() {
        let a = Pubkey::new_unique();
        assert_eq!(QueryKey::all("devnet").to_string(), "token_vesting/all/devnet");
        assert_eq!(
            QueryKey::fetch("devnet", a).to_string(),
            format!("token_vesting/fetch/devnet/{}", a)
        );
        assert_eq!(
            QueryKey::program_account("local").to_string(),
            "get-program-account/local"
        );
    }

    #[test]
    fn test_insert_get_invalidate() {
        let cache = QueryCache::new(Duration::seconds(30));
        let key = QueryKey::fetch("devnet", Pubkey::new_unique());

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), account(3));
        assert_eq!(cache.get(&key), Some(account(3)));

        cache.insert(key.clone(), account(4));
        assert_eq!(cache.get(&key), Some(account(4)));
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_stale_entries_are_not_served() {
        let cache = QueryCache::new(Duration::zero());
        let key = QueryKey::all("devnet");

        cache.insert(key.clone(), QueryValue::Accounts(vec![]));
        assert!(cache.get(&key).is_none());
        assert!(cache.peek(&key).is_some());
    }

    #[test]
    fn test_insert_evicts_expired_entries() {
        let cache = QueryCache::new(Duration::zero());
        for _ in 0..100 {
            cache.insert(QueryKey::fetch("devnet", Pubkey::new_unique()), account(1));
        }
        assert_eq!(cache.len(), 1);

        let cache = QueryCache::new(Duration::seconds(30));
        let a = QueryKey::fetch("devnet", Pubkey::new_unique());
        let b = QueryKey::fetch("devnet", Pubkey::new_unique());
        cache.insert(a.clone(), account(1));
        cache.insert(b.clone(), account(2));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&a), Some(account(1)));
    }

    #[test]
    fn test_not_found_is_cached() {
        let cache = QueryCache::new(Duration::seconds(30));
        let key = QueryKey::fetch("devnet", Pubkey::new_unique());

        cache.insert(key.clone(), QueryValue::Account(None));
        assert_eq!(cache.get(&key), Some(QueryValue::Account(None)));
    }
}
