//! # token_vesting Routes
//!
//! Feature view and the query/mutation endpoints for token_vesting accounts.
//! Mutations need a connected wallet; queries do not.

use std::str::FromStr;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};
use tracing::info;

use crate::error::{Result, TokenVestingError};
use crate::server::AppState;
use crate::services::{Notification, TokenVestingProgramAccess};
use crate::state_structs::{
    InitializeResponse, ProgramAccountInfo, SetRequest, TokenVestingRecord, TxResponse,
};

const FEATURE_TITLE: &str = "TokenVesting";
const FEATURE_SUBTITLE: &str = "Create a new account by clicking the \"Create\" button. \
    The state of a account is stored on-chain and can be manipulated by calling the \
    program's methods (increment, decrement, set, and close).";
const CONNECT_WALLET_MESSAGE: &str = "Select Wallet";
const PROGRAM_NOT_FOUND_MESSAGE: &str = "Program account not found. \
    Make sure you have deployed the program and are on the correct cluster.";
const NO_ACCOUNTS_MESSAGE: &str = "No accounts. Create one above to get started.";

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

fn error_status(error: &TokenVestingError) -> StatusCode {
    match error {
        TokenVestingError::WalletNotConnected => StatusCode::UNAUTHORIZED,
        TokenVestingError::InvalidPubkey(_) => StatusCode::BAD_REQUEST,
        TokenVestingError::Keypair { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        TokenVestingError::Anchor(_) | TokenVestingError::Rpc(_) => StatusCode::BAD_GATEWAY,
    }
}

fn respond<T>(result: Result<T>) -> ApiResult<T> {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))),
        Err(e) => (error_status(&e), Json(ApiResponse::error(e.to_string()))),
    }
}

/// Shorten long labels to `first..last` with `len` characters on each side.
pub fn ellipsify(s: &str, len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 30 {
        let len = len.min(chars.len());
        let head: String = chars[..len].iter().collect();
        let tail: String = chars[chars.len() - len..].iter().collect();
        format!("{}..{}", head, tail)
    } else {
        s.to_string()
    }
}

/// Rendered feature view: a connect prompt until a wallet is present.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeatureView {
    ConnectWallet {
        message: String,
    },
    Ready {
        title: String,
        subtitle: String,
        program_id: String,
        program_label: String,
        explorer_url: String,
        list: ListView,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ListView {
    ProgramNotFound { message: String },
    Empty { message: String },
    Accounts { accounts: Vec<AccountCard> },
}

/// One account as shown in the list.
#[derive(Debug, Serialize)]
pub struct AccountCard {
    pub address: String,
    pub label: String,
    pub explorer_url: String,
    /// `None` when the account does not exist.
    pub count: Option<u8>,
}

impl AccountCard {
    fn new(access: &TokenVestingProgramAccess, address: Pubkey, count: Option<u8>) -> Self {
        let address = address.to_string();
        Self {
            label: ellipsify(&address, 4),
            explorer_url: access.cluster().explorer_url(&format!("account/{}", address)),
            address,
            count,
        }
    }
}

pub async fn render_feature(
    access: &TokenVestingProgramAccess,
    wallet_connected: bool,
) -> Result<FeatureView> {
    if !wallet_connected {
        return Ok(FeatureView::ConnectWallet {
            message: CONNECT_WALLET_MESSAGE.to_string(),
        });
    }

    let program_id = access.program_id().to_string();
    let list = if access.get_program_account().await?.is_none() {
        ListView::ProgramNotFound {
            message: PROGRAM_NOT_FOUND_MESSAGE.to_string(),
        }
    } else {
        let accounts = access.accounts().await?;
        if accounts.is_empty() {
            ListView::Empty {
                message: NO_ACCOUNTS_MESSAGE.to_string(),
            }
        } else {
            ListView::Accounts {
                accounts: accounts
                    .into_iter()
                    .map(|record| {
                        AccountCard::new(access, record.public_key, Some(record.account.count))
                    })
                    .collect(),
            }
        }
    };

    Ok(FeatureView::Ready {
        title: FEATURE_TITLE.to_string(),
        subtitle: FEATURE_SUBTITLE.to_string(),
        program_label: ellipsify(&program_id, 4),
        explorer_url: access.cluster().explorer_url(&format!("account/{}", program_id)),
        program_id,
        list,
    })
}

fn require_wallet(state: &AppState) -> Result<()> {
    if state.wallet.is_none() {
        return Err(TokenVestingError::WalletNotConnected);
    }
    Ok(())
}

enum AccountAction {
    Close,
    Decrement,
    Increment,
    Set(u8),
}

async fn run_account_action(
    state: &AppState,
    account: &str,
    action: AccountAction,
) -> Result<TxResponse> {
    require_wallet(state)?;
    let account = Pubkey::from_str(account)?;
    let access = state.token_vesting.account(account);

    let signature = match action {
        AccountAction::Close => access.close().await?,
        AccountAction::Decrement => access.decrement().await?,
        AccountAction::Increment => access.increment().await?,
        AccountAction::Set(value) => access.set(value).await?,
    };

    Ok(TxResponse {
        signature: signature.to_string(),
        explorer_url: state.token_vesting.cluster().explorer_url(&format!("tx/{}", signature)),
    })
}

/// GET /api/v1/token_vesting
pub async fn get_feature(State(state): State<AppState>) -> ApiResult<FeatureView> {
    respond(render_feature(&state.token_vesting, state.wallet.is_some()).await)
}

/// GET /api/v1/token_vesting/accounts
pub async fn list_accounts(State(state): State<AppState>) -> ApiResult<Vec<TokenVestingRecord>> {
    respond(state.token_vesting.accounts().await)
}

/// GET /api/v1/token_vesting/program-account
pub async fn get_program_account(
    State(state): State<AppState>,
) -> ApiResult<Option<ProgramAccountInfo>> {
    respond(state.token_vesting.get_program_account().await)
}

async fn create_account(state: &AppState) -> Result<InitializeResponse> {
    require_wallet(state)?;
    let keypair = Keypair::new();
    let signature = state.token_vesting.initialize(&keypair).await?;
    info!("Created token_vesting account {}", keypair.pubkey());

    Ok(InitializeResponse {
        account: keypair.pubkey().to_string(),
        signature: signature.to_string(),
        explorer_url: state.token_vesting.cluster().explorer_url(&format!("tx/{}", signature)),
    })
}

async fn account_card(state: &AppState, account: &str) -> Result<AccountCard> {
    let address = Pubkey::from_str(account)?;
    let record = state.token_vesting.account(address).account_query().await?;
    Ok(AccountCard::new(&state.token_vesting, address, record.map(|r| r.count)))
}

/// POST /api/v1/token_vesting/initialize
///
/// Creates a record at a freshly generated keypair.
pub async fn initialize(State(state): State<AppState>) -> ApiResult<InitializeResponse> {
    respond(create_account(&state).await)
}

/// GET /api/v1/token_vesting/{account}
///
/// `count` is null once the account is closed.
pub async fn get_account(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> ApiResult<AccountCard> {
    respond(account_card(&state, &account).await)
}

/// POST /api/v1/token_vesting/{account}/close
pub async fn close(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> ApiResult<TxResponse> {
    respond(run_account_action(&state, &account, AccountAction::Close).await)
}

/// POST /api/v1/token_vesting/{account}/decrement
pub async fn decrement(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> ApiResult<TxResponse> {
    respond(run_account_action(&state, &account, AccountAction::Decrement).await)
}

/// POST /api/v1/token_vesting/{account}/increment
pub async fn increment(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> ApiResult<TxResponse> {
    respond(run_account_action(&state, &account, AccountAction::Increment).await)
}

/// POST /api/v1/token_vesting/{account}/set
pub async fn set(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Json(request): Json<SetRequest>,
) -> ApiResult<TxResponse> {
    respond(run_account_action(&state, &account, AccountAction::Set(request.value)).await)
}

/// GET /api/v1/notifications
pub async fn list_notifications(State(state): State<AppState>) -> ApiResult<Vec<Notification>> {
    respond(Ok(state.toaster.recent().await))
}

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/token_vesting", get(get_feature))
        .route("/api/v1/token_vesting/accounts", get(list_accounts))
        .route("/api/v1/token_vesting/program-account", get(get_program_account))
        .route("/api/v1/token_vesting/initialize", post(initialize))
        .route("/api/v1/token_vesting/{account}", get(get_account))
        .route("/api/v1/token_vesting/{account}/close", post(close))
        .route("/api/v1/token_vesting/{account}/decrement", post(decrement))
        .route("/api/v1/token_vesting/{account}/increment", post(increment))
        .route("/api/v1/token_vesting/{account}/set", post(set))
        .route("/api/v1/notifications", get(list_notifications))
}
