use std::sync::Arc;

use anchor_client::{Client, ClientError, Program};
use anchor_lang::{InstructionData, ToAccountMetas, declare_program, system_program};
use async_trait::async_trait;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, read_keypair_file},
    signer::Signer,
    transaction::Transaction,
};
use tracing::{debug, info};

use crate::error::{Result, TokenVestingError};
use crate::onchain_instance::cluster::{ClusterConfig, ClusterNetwork};
use crate::state_structs::{ProgramAccountInfo, TokenVestingAccount, TokenVestingRecord};

// Generated from idls/token_vesting.json
declare_program!(token_vesting);

use token_vesting::client::{accounts, args};

/// Program ID embedded in the IDL, used on mainnet-beta and as the fallback.
pub const TOKEN_VESTING_PROGRAM_ID: Pubkey = token_vesting::ID;

/// Program ID deployed on devnet and testnet.
pub const TOKEN_VESTING_TEST_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("CounNZdmsQmWh7uVngV9FXW2dZ6zAgbJyYsvBpqbykg");

/// Resolve the program ID for a network.
pub fn program_id_for_network(network: ClusterNetwork) -> Pubkey {
    match network {
        ClusterNetwork::Devnet | ClusterNetwork::Testnet => TOKEN_VESTING_TEST_PROGRAM_ID,
        ClusterNetwork::Mainnet | ClusterNetwork::Custom => TOKEN_VESTING_PROGRAM_ID,
    }
}

pub fn initialize_ix(program_id: Pubkey, payer: Pubkey, token_vesting: Pubkey) -> Instruction {
    Instruction {
        program_id,
        accounts: accounts::Initialize {
            payer,
            token_vesting,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: args::Initialize.data(),
    }
}

pub fn increment_ix(program_id: Pubkey, token_vesting: Pubkey) -> Instruction {
    Instruction {
        program_id,
        accounts: accounts::Increment { token_vesting }.to_account_metas(None),
        data: args::Increment.data(),
    }
}

pub fn decrement_ix(program_id: Pubkey, token_vesting: Pubkey) -> Instruction {
    Instruction {
        program_id,
        accounts: accounts::Decrement { token_vesting }.to_account_metas(None),
        data: args::Decrement.data(),
    }
}

pub fn set_ix(program_id: Pubkey, token_vesting: Pubkey, value: u8) -> Instruction {
    Instruction {
        program_id,
        accounts: accounts::Set { token_vesting }.to_account_metas(None),
        data: args::Set { value }.data(),
    }
}

/// Closes the account and returns its rent to `payer`.
pub fn close_ix(program_id: Pubkey, payer: Pubkey, token_vesting: Pubkey) -> Instruction {
    Instruction {
        program_id,
        accounts: accounts::Close { payer, token_vesting }.to_account_metas(None),
        data: args::Close.data(),
    }
}

/// Load a wallet keypair from a JSON keypair file.
pub fn load_wallet(path: &str) -> Result<Keypair> {
    read_keypair_file(path).map_err(|e| TokenVestingError::Keypair {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Callable handle for the token_vesting program: one method per instruction
/// plus the account readers.
#[async_trait]
pub trait TokenVestingProgram: Send + Sync {
    fn program_id(&self) -> Pubkey;

    /// Create a record at `token_vesting`, which must sign.
    async fn initialize(&self, token_vesting: &Keypair) -> Result<Signature>;

    async fn increment(&self, token_vesting: Pubkey) -> Result<Signature>;

    async fn decrement(&self, token_vesting: Pubkey) -> Result<Signature>;

    async fn set(&self, token_vesting: Pubkey, value: u8) -> Result<Signature>;

    async fn close(&self, token_vesting: Pubkey) -> Result<Signature>;

    async fn all(&self) -> Result<Vec<TokenVestingRecord>>;

    /// `Ok(None)` when no account exists at `address`.
    async fn fetch_nullable(&self, address: Pubkey) -> Result<Option<TokenVestingAccount>>;

    /// Raw account info of the program account, `None` when not deployed.
    async fn program_account_info(&self) -> Result<Option<ProgramAccountInfo>>;
}

/// token_vesting client backed by anchor-client and an RPC endpoint.
pub struct AnchorTokenVesting {
    program: Program<Arc<Keypair>>,
    payer: Arc<Keypair>,
    commitment: CommitmentConfig,
}

impl AnchorTokenVesting {
    pub fn new(
        cluster: &ClusterConfig,
        payer: Arc<Keypair>,
        commitment: CommitmentConfig,
    ) -> Result<Self> {
        let program_id = program_id_for_network(cluster.network);
        let client = Client::new_with_options(cluster.anchor_cluster(), payer.clone(), commitment);
        let program = client.program(program_id)?;

        info!(
            "token_vesting program {} on {} ({})",
            program_id, cluster.name, cluster.endpoint
        );

        Ok(Self {
            program,
            payer,
            commitment,
        })
    }

    async fn send(
        &self,
        instruction: Instruction,
        extra_signers: &[&Keypair],
    ) -> Result<Signature> {
        let rpc = self.program.rpc();
        let recent_blockhash = rpc.get_latest_blockhash().await?;

        let mut signers: Vec<&Keypair> = vec![self.payer.as_ref()];
        signers.extend_from_slice(extra_signers);

        let tx = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.payer.pubkey()),
            &signers,
            recent_blockhash,
        );

        let signature = rpc.send_and_confirm_transaction(&tx).await?;
        debug!("token_vesting transaction confirmed: {}", signature);
        Ok(signature)
    }
}

#[async_trait]
impl TokenVestingProgram for AnchorTokenVesting {
    fn program_id(&self) -> Pubkey {
        self.program.id()
    }

    async fn initialize(&self, token_vesting: &Keypair) -> Result<Signature> {
        let ix = initialize_ix(self.program_id(), self.payer.pubkey(), token_vesting.pubkey());
        self.send(ix, &[token_vesting]).await
    }

    async fn increment(&self, token_vesting: Pubkey) -> Result<Signature> {
        self.send(increment_ix(self.program_id(), token_vesting), &[]).await
    }

    async fn decrement(&self, token_vesting: Pubkey) -> Result<Signature> {
        self.send(decrement_ix(self.program_id(), token_vesting), &[]).await
    }

    async fn set(&self, token_vesting: Pubkey, value: u8) -> Result<Signature> {
        self.send(set_ix(self.program_id(), token_vesting, value), &[]).await
    }

    async fn close(&self, token_vesting: Pubkey) -> Result<Signature> {
        let ix = close_ix(self.program_id(), self.payer.pubkey(), token_vesting);
        self.send(ix, &[]).await
    }

    async fn all(&self) -> Result<Vec<TokenVestingRecord>> {
        let accounts = self
            .program
            .accounts::<token_vesting::accounts::TokenVesting>(vec![])
            .await?;

        Ok(accounts
            .into_iter()
            .map(|(public_key, account)| TokenVestingRecord {
                public_key,
                account: account.into(),
            })
            .collect())
    }

    async fn fetch_nullable(&self, address: Pubkey) -> Result<Option<TokenVestingAccount>> {
        match self
            .program
            .account::<token_vesting::accounts::TokenVesting>(address)
            .await
        {
            Ok(account) => Ok(Some(account.into())),
            Err(ClientError::AccountNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn program_account_info(&self) -> Result<Option<ProgramAccountInfo>> {
        let response = self
            .program
            .rpc()
            .get_account_with_commitment(&self.program_id(), self.commitment)
            .await?;
        Ok(response.value.map(ProgramAccountInfo::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_program_id_resolution() {
        let test_id = Pubkey::from_str("CounNZdmsQmWh7uVngV9FXW2dZ6zAgbJyYsvBpqbykg").unwrap();
        let idl_id = Pubkey::from_str("AsjZ3kWAUSQRNt2pZVeJkywhZ6gpLpHZmJjduPmKZDZZ").unwrap();

        for network in ["devnet", "testnet"] {
            let network = ClusterNetwork::from_str(network).unwrap();
            assert_eq!(program_id_for_network(network), test_id);
        }
        for network in ["mainnet-beta", "localnet", "something-else", "Devnet", "TESTNET"] {
            let network = ClusterNetwork::from_str(network).unwrap();
            assert_eq!(program_id_for_network(network), idl_id);
        }
    }

    #[test]
    fn test_initialize_ix_layout() {
        let program_id = TOKEN_VESTING_PROGRAM_ID;
        let payer = Pubkey::new_unique();
        let record = Pubkey::new_unique();

        let ix = initialize_ix(program_id, payer, record);
        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.data, vec![175, 175, 109, 31, 13, 152, 155, 237]);

        assert_eq!(ix.accounts.len(), 3);
        assert_eq!(ix.accounts[0].pubkey, payer);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, record);
        assert!(ix.accounts[1].is_signer && ix.accounts[1].is_writable);
        assert_eq!(ix.accounts[2].pubkey, system_program::ID);
        assert!(!ix.accounts[2].is_signer && !ix.accounts[2].is_writable);
    }

    #[test]
    fn test_set_ix_encodes_value() {
        let record = Pubkey::new_unique();
        let ix = set_ix(TOKEN_VESTING_PROGRAM_ID, record, 42);

        assert_eq!(ix.data, vec![198, 51, 53, 241, 116, 29, 126, 194, 42]);
        assert_eq!(ix.accounts.len(), 1);
        assert_eq!(ix.accounts[0].pubkey, record);
        assert!(ix.accounts[0].is_writable && !ix.accounts[0].is_signer);
    }

    #[test]
    fn test_counter_ix_discriminators() {
        let record = Pubkey::new_unique();
        assert_eq!(
            increment_ix(TOKEN_VESTING_PROGRAM_ID, record).data,
            vec![11, 18, 104, 9, 104, 174, 59, 33]
        );
        assert_eq!(
            decrement_ix(TOKEN_VESTING_PROGRAM_ID, record).data,
            vec![106, 227, 168, 59, 248, 27, 150, 101]
        );
    }

    #[test]
    fn test_close_ix_returns_rent_to_payer() {
        let payer = Pubkey::new_unique();
        let record = Pubkey::new_unique();
        let ix = close_ix(TOKEN_VESTING_PROGRAM_ID, payer, record);

        assert_eq!(ix.data, vec![98, 165, 201, 177, 108, 65, 206, 96]);
        assert_eq!(ix.accounts[0].pubkey, payer);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, record);
        assert!(ix.accounts[1].is_writable);
    }

    #[test]
    fn test_load_wallet_missing_file() {
        let err = load_wallet("/nonexistent/wallet.json").unwrap_err();
        assert!(matches!(err, TokenVestingError::Keypair { .. }));
    }
}
