//! token_vesting data access
//!
//! Queries and mutations over the program binding. Queries go through the
//! `QueryCache`; each mutation lists the queries it invalidates, refetches
//! them after success and reports the outcome on the notification channel.

use std::sync::Arc;

use futures::future::join_all;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::onchain_instance::cluster::ClusterConfig;
use crate::onchain_instance::instance::TokenVestingProgram;
use crate::services::notifications::Notifier;
use crate::services::query_cache::{QueryCache, QueryKey, QueryValue};
use crate::state_structs::{ProgramAccountInfo, TokenVestingAccount, TokenVestingRecord};

/// State-changing calls against the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Initialize,
    Close,
    Decrement,
    Increment,
    Set,
}

impl MutationKind {
    pub fn name(&self) -> &'static str {
        match self {
            MutationKind::Initialize => "initialize",
            MutationKind::Close => "close",
            MutationKind::Decrement => "decrement",
            MutationKind::Increment => "increment",
            MutationKind::Set => "set",
        }
    }

    /// Queries whose results can change when this mutation succeeds on `account`.
    pub fn invalidates(&self, cluster: &str, account: Pubkey) -> Vec<QueryKey> {
        match self {
            MutationKind::Initialize => vec![QueryKey::all(cluster)],
            MutationKind::Decrement | MutationKind::Increment | MutationKind::Set => {
                vec![QueryKey::fetch(cluster, account)]
            }
            MutationKind::Close => vec![QueryKey::all(cluster), QueryKey::fetch(cluster, account)],
        }
    }
}

/// Collection-level access to token_vesting accounts on one cluster.
#[derive(Clone)]
pub struct TokenVestingProgramAccess {
    program: Arc<dyn TokenVestingProgram>,
    cluster: ClusterConfig,
    cache: QueryCache,
    notifier: Notifier,
}

impl TokenVestingProgramAccess {
    pub fn new(
        program: Arc<dyn TokenVestingProgram>,
        cluster: ClusterConfig,
        cache: QueryCache,
        notifier: Notifier,
    ) -> Self {
        Self {
            program,
            cluster,
            cache,
            notifier,
        }
    }

    pub fn program_id(&self) -> Pubkey {
        self.program.program_id()
    }

    pub fn cluster(&self) -> &ClusterConfig {
        &self.cluster
    }

    #[cfg(test)]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Handle for a single account.
    pub fn account(&self, account: Pubkey) -> TokenVestingAccountAccess<'_> {
        TokenVestingAccountAccess { program: self, account }
    }

    /// Every token_vesting account, served from cache while fresh.
    pub async fn accounts(&self) -> Result<Vec<TokenVestingRecord>> {
        let key = QueryKey::all(&self.cluster.name);
        if let Some(QueryValue::Accounts(accounts)) = self.cache.get(&key) {
            debug!("query cache hit: {}", key);
            return Ok(accounts);
        }
        self.fetch_accounts(key).await
    }

    /// Raw account info of the program account.
    pub async fn get_program_account(&self) -> Result<Option<ProgramAccountInfo>> {
        let key = QueryKey::program_account(&self.cluster.name);
        if let Some(QueryValue::ProgramAccount(info)) = self.cache.get(&key) {
            debug!("query cache hit: {}", key);
            return Ok(info);
        }
        self.fetch_program_account(key).await
    }

    /// Create a new account at `keypair`.
    pub async fn initialize(&self, keypair: &Keypair) -> Result<Signature> {
        let account = keypair.pubkey();
        match self.program.initialize(keypair).await {
            Ok(signature) => {
                self.on_success(MutationKind::Initialize, account, &signature).await;
                Ok(signature)
            }
            Err(e) => {
                warn!("token_vesting initialize failed for {}: {}", account, e);
                self.notifier.error("Failed to initialize account");
                Err(e)
            }
        }
    }

    /// Run the query behind `key` and store the result.
    pub async fn refetch(&self, key: QueryKey) -> Result<QueryValue> {
        let value = match key {
            QueryKey::All { .. } => QueryValue::Accounts(self.fetch_accounts(key).await?),
            QueryKey::Fetch { account, .. } => {
                QueryValue::Account(self.fetch_account(key, account).await?)
            }
            QueryKey::ProgramAccount { .. } => {
                QueryValue::ProgramAccount(self.fetch_program_account(key).await?)
            }
        };
        Ok(value)
    }

    async fn fetch_accounts(&self, key: QueryKey) -> Result<Vec<TokenVestingRecord>> {
        let accounts = self.program.all().await?;
        debug!("query fetched: {} ({} accounts)", key, accounts.len());
        self.cache.insert(key, QueryValue::Accounts(accounts.clone()));
        Ok(accounts)
    }

    async fn fetch_account(
        &self,
        key: QueryKey,
        account: Pubkey,
    ) -> Result<Option<TokenVestingAccount>> {
        let record = self.program.fetch_nullable(account).await?;
        debug!("query fetched: {}", key);
        self.cache.insert(key, QueryValue::Account(record));
        Ok(record)
    }

    async fn fetch_program_account(&self, key: QueryKey) -> Result<Option<ProgramAccountInfo>> {
        let info = self.program.program_account_info().await?;
        debug!("query fetched: {}", key);
        self.cache.insert(key, QueryValue::ProgramAccount(info.clone()));
        Ok(info)
    }

    async fn on_success(&self, kind: MutationKind, account: Pubkey, signature: &Signature) {
        info!(
            "token_vesting {} confirmed on {} for {}: {}",
            kind.name(),
            self.cluster.name,
            account,
            signature
        );
        self.notifier.transaction(signature, &self.cluster);

        // Refetch is best-effort; a failure only drops the stale entry.
        let keys = kind.invalidates(&self.cluster.name, account);
        let results = join_all(keys.iter().map(|key| self.refetch(key.clone()))).await;
        for (key, result) in keys.iter().zip(results) {
            if let Err(e) = result {
                warn!("Failed to refetch {} after {}: {}", key, kind.name(), e);
                if let Some(stale) = self.cache.peek(key) {
                    debug!("dropping {} fetched at {}", key, stale.fetched_at);
                }
                self.cache.invalidate(key);
            }
        }
        debug!("query cache holds {} entries", self.cache.len());
    }
}

/// Access to a single token_vesting account.
pub struct TokenVestingAccountAccess<'a> {
    program: &'a TokenVestingProgramAccess,
    account: Pubkey,
}

impl TokenVestingAccountAccess<'_> {
    /// `Ok(None)` once the account is closed or was never created.
    pub async fn account_query(&self) -> Result<Option<TokenVestingAccount>> {
        let key = QueryKey::fetch(&self.program.cluster.name, self.account);
        if let Some(QueryValue::Account(account)) = self.program.cache.get(&key) {
            debug!("query cache hit: {}", key);
            return Ok(account);
        }
        self.program.fetch_account(key, self.account).await
    }

    pub async fn close(&self) -> Result<Signature> {
        let signature = self.program.program.close(self.account).await?;
        self.program.on_success(MutationKind::Close, self.account, &signature).await;
        Ok(signature)
    }

    pub async fn decrement(&self) -> Result<Signature> {
        let signature = self.program.program.decrement(self.account).await?;
        self.program.on_success(MutationKind::Decrement, self.account, &signature).await;
        Ok(signature)
    }

    pub async fn increment(&self) -> Result<Signature> {
        let signature = self.program.program.increment(self.account).await?;
        self.program.on_success(MutationKind::Increment, self.account, &signature).await;
        Ok(signature)
    }

    pub async fn set(&self, value: u8) -> Result<Signature> {
        let signature = self.program.program.set(self.account, value).await?;
        self.program.on_success(MutationKind::Set, self.account, &signature).await;
        Ok(signature)
    }
}
