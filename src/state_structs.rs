// --- On-chain account structs matching the token_vesting IDL ---
use serde::{Deserialize, Serialize, Serializer};
use solana_sdk::{account::Account, pubkey::Pubkey};

use crate::onchain_instance::instance::token_vesting;

fn pubkey_as_string<S: Serializer>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(pubkey)
}

/// Decoded `TokenVesting` account: a single counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenVestingAccount {
    pub count: u8,
}

impl From<token_vesting::accounts::TokenVesting> for TokenVestingAccount {
    fn from(src: token_vesting::accounts::TokenVesting) -> Self {
        TokenVestingAccount { count: src.count }
    }
}

/// An account together with its address, as returned by the list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenVestingRecord {
    #[serde(serialize_with = "pubkey_as_string")]
    pub public_key: Pubkey,
    pub account: TokenVestingAccount,
}

/// Raw account info of the program account itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramAccountInfo {
    pub lamports: u64,
    #[serde(serialize_with = "pubkey_as_string")]
    pub owner: Pubkey,
    pub executable: bool,
    pub data_len: usize,
}

impl From<Account> for ProgramAccountInfo {
    fn from(account: Account) -> Self {
        ProgramAccountInfo {
            lamports: account.lamports,
            owner: account.owner,
            executable: account.executable,
            data_len: account.data.len(),
        }
    }
}

// --- Request structs ---
#[derive(Debug, Deserialize)]
pub struct SetRequest {
    pub value: u8,
}

// --- Response structs ---
#[derive(Debug, Serialize)]
pub struct TxResponse {
    pub signature: String,
    pub explorer_url: String,
}

#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub account: String,
    pub signature: String,
    pub explorer_url: String,
}
