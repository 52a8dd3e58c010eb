//! In-memory token_vesting program standing in for a local validator.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};

use crate::error::{Result, TokenVestingError};
use crate::onchain_instance::instance::{TOKEN_VESTING_PROGRAM_ID, TokenVestingProgram};
use crate::state_structs::{ProgramAccountInfo, TokenVestingAccount, TokenVestingRecord};

/// Failed call as the RPC client reports it.
fn rpc_error(message: &str) -> TokenVestingError {
    ClientError::from(ClientErrorKind::Custom(message.to_string())).into()
}

#[derive(Default)]
pub struct MemoryTokenVesting {
    accounts: Mutex<BTreeMap<Pubkey, u8>>,
    offline: AtomicBool,
    undeployed: AtomicBool,
}

impl MemoryTokenVesting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the RPC endpoint were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_undeployed(&self, undeployed: bool) {
        self.undeployed.store(undeployed, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(rpc_error("connection refused"));
        }
        Ok(())
    }

    fn update(&self, address: Pubkey, f: impl FnOnce(u8) -> Option<u8>) -> Result<Signature> {
        self.check_online()?;
        let mut accounts = self.accounts.lock().unwrap();
        let count = accounts
            .get_mut(&address)
            .ok_or_else(|| rpc_error("AccountNotInitialized"))?;
        *count = f(*count).ok_or_else(|| rpc_error("arithmetic overflow"))?;
        Ok(Signature::new_unique())
    }
}

#[async_trait]
impl TokenVestingProgram for MemoryTokenVesting {
    fn program_id(&self) -> Pubkey {
        TOKEN_VESTING_PROGRAM_ID
    }

    async fn initialize(&self, token_vesting: &Keypair) -> Result<Signature> {
        self.check_online()?;
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&token_vesting.pubkey()) {
            return Err(rpc_error("account already in use"));
        }
        accounts.insert(token_vesting.pubkey(), 0);
        Ok(Signature::new_unique())
    }

    async fn increment(&self, token_vesting: Pubkey) -> Result<Signature> {
        self.update(token_vesting, |count| count.checked_add(1))
    }

    async fn decrement(&self, token_vesting: Pubkey) -> Result<Signature> {
        self.update(token_vesting, |count| count.checked_sub(1))
    }

    async fn set(&self, token_vesting: Pubkey, value: u8) -> Result<Signature> {
        self.update(token_vesting, |_| Some(value))
    }

    async fn close(&self, token_vesting: Pubkey) -> Result<Signature> {
        self.check_online()?;
        self.accounts
            .lock()
            .unwrap()
            .remove(&token_vesting)
            .ok_or_else(|| rpc_error("AccountNotInitialized"))?;
        Ok(Signature::new_unique())
    }

    async fn all(&self) -> Result<Vec<TokenVestingRecord>> {
        self.check_online()?;
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .map(|(public_key, count)| TokenVestingRecord {
                public_key: *public_key,
                account: TokenVestingAccount { count: *count },
            })
            .collect())
    }

    async fn fetch_nullable(&self, address: Pubkey) -> Result<Option<TokenVestingAccount>> {
        self.check_online()?;
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&address)
            .map(|count| TokenVestingAccount { count: *count }))
    }

    async fn program_account_info(&self) -> Result<Option<ProgramAccountInfo>> {
        self.check_online()?;
        if self.undeployed.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(ProgramAccountInfo {
            lamports: 1_141_440,
            owner: solana_sdk::bpf_loader_upgradeable::ID,
            executable: true,
            data_len: 36,
        }))
    }
}
