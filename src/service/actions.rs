//! State-changing operations: approvals, swaps, liquidity and faucet requests.
//!
//! Each one builds the router/token call, sends it from the caller's account
//! and hands the outcome to the client's [`MutationPolicy`]. Input that cannot
//! be converted and pool reads needed to build a call fail before anything is
//! sent and always propagate.
//!
//! [`MutationPolicy`]: crate::service::client::MutationPolicy

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolValue;
use tracing::instrument;

use crate::repository::{
    BatchSwapStep, ExitPoolRequest, FundManagement, JoinPoolRequest, SingleSwap,
};
use crate::service::client::{ChainConfig, HedgeClient};
use crate::service::route::Route;
use crate::service::utils::to_minimal_unit;
use crate::service::{ServiceError, ServiceResult};

/// Router deadlines are this far past the current time, in milliseconds.
pub const DEADLINE_WINDOW_MS: i64 = 15 * 60 * 1000;

/// Join kind understood by the pool: add exact token amounts.
const JOIN_KIND_EXACT_TOKENS_IN: u64 = 1;

/// Minimum amount of each token accepted when exiting, in human units.
const EXIT_MIN_AMOUNT_OUT: &str = "0.001";

/// Result of [`HedgeClient::approve_token`].
#[derive(Debug, Clone)]
pub struct Approval {
    pub tx_hash: Option<TxHash>,
    /// Allowance re-read after the transaction, as a decimal string.
    pub allowance: String,
}

fn deadline() -> U256 {
    let deadline = chrono::Utc::now().timestamp_millis() + DEADLINE_WINDOW_MS;
    U256::from(deadline.max(0) as u64)
}

fn funds(account: Address) -> FundManagement {
    FundManagement {
        sender: account,
        recipient: account,
    }
}

/// Scales a minimal-unit amount by 1.2, the slack allowed on join amounts.
fn with_join_slack(amount: U256) -> U256 {
    amount * U256::from(12) / U256::from(10)
}

/// `(kind, amountsIn, minimumLpOut)` payload for joins.
pub fn encode_join_user_data(amounts_in: [U256; 2]) -> Bytes {
    let payload = (
        U256::from(JOIN_KIND_EXACT_TOKENS_IN),
        amounts_in.to_vec(),
        U256::ZERO,
    );
    Bytes::from(payload.abi_encode_params())
}

/// `(totalAmount, ratio)` payload for exits.
pub fn encode_exit_user_data(total_amount: U256, ratio: U256) -> Bytes {
    Bytes::from((total_amount, ratio).abi_encode_params())
}

/// Steps, assets and limits of a batch swap along `path`.
///
/// The first step spends `amount`; every later step spends the previous
/// step's output, signalled by a zero amount.
pub fn batch_swap_plan(path: &[Address], amount: U256) -> (Vec<BatchSwapStep>, Vec<U256>) {
    let steps = (0..path.len().saturating_sub(1))
        .map(|i| BatchSwapStep {
            assetInIndex: U256::from(i),
            assetOutIndex: U256::from(i + 1),
            amount: if i == 0 { amount } else { U256::ZERO },
        })
        .collect();

    let limits = (0..path.len())
        .map(|i| if i == 0 { amount } else { U256::ZERO })
        .collect();

    (steps, limits)
}

impl HedgeClient {
    /// Raises `spender`'s allowance by `amount` and returns the new allowance.
    ///
    /// Under the log-and-discard policy a malformed amount is logged along with
    /// send failures, and the current allowance is still returned.
    #[instrument(skip(self), err)]
    pub async fn approve_token(
        &self,
        account: Address,
        token: Address,
        amount: &str,
        spender: Address,
    ) -> ServiceResult<Approval> {
        let outcome = match to_minimal_unit(amount) {
            Ok(value) => self
                .repository
                .increase_allowance(token, spender, value, account)
                .await
                .map_err(ServiceError::from),
            Err(e) => Err(e),
        };
        let tx_hash = self.settle("increaseAllowance", outcome)?;

        let allowance = self.get_allowance(token, account, spender).await?;
        Ok(Approval { tx_hash, allowance })
    }

    /// Single-pool swap of `amount` through the router, accepting at least
    /// `limit` out (both human units).
    #[instrument(skip(self, chain), err)]
    pub async fn swap_tokens(
        &self,
        chain: &ChainConfig,
        token_in: Address,
        token_out: Address,
        amount: &str,
        limit: &str,
        account: Address,
    ) -> ServiceResult<Option<TxHash>> {
        let amount = to_minimal_unit(amount)?;
        let limit = to_minimal_unit(limit)?;

        let single_swap = SingleSwap {
            tokenIn: token_in,
            tokenOut: token_out,
            amount,
        };

        let outcome = self
            .repository
            .swap(
                chain.router,
                single_swap,
                funds(account),
                limit,
                deadline(),
                account,
            )
            .await
            .map_err(ServiceError::from);

        self.settle("swap", outcome)
    }

    /// Multi-hop swap of `amount` along a bridged route.
    ///
    /// Intermediate limits are zero, so only the input amount is bounded.
    #[instrument(skip(self, chain), err)]
    pub async fn batch_swap_tokens(
        &self,
        chain: &ChainConfig,
        token_in: Address,
        token_out: Address,
        route: &Route,
        amount: &str,
        account: Address,
    ) -> ServiceResult<Option<TxHash>> {
        if route.is_direct() {
            return Err(ServiceError::InvalidRoute(
                "a batch swap needs at least one bridge token".to_string(),
            ));
        }

        let amount = to_minimal_unit(amount)?;
        let assets = route.path(token_in, token_out);
        let (swaps, limits) = batch_swap_plan(&assets, amount);

        let outcome = self
            .repository
            .batch_swap(
                chain.router,
                swaps,
                assets,
                funds(account),
                limits,
                deadline(),
                account,
            )
            .await
            .map_err(ServiceError::from);

        self.settle("batchSwap", outcome)
    }

    /// Adds `amount1` of `token1` and `amount2` of `token2` to their pool.
    ///
    /// Tokens and amounts are reordered to the pool's own token order; the
    /// maximum amounts allow 20% over the requested ones.
    #[instrument(skip(self, chain), err)]
    pub async fn join_pool(
        &self,
        chain: &ChainConfig,
        account: Address,
        token1: Address,
        token2: Address,
        amount1: &str,
        amount2: &str,
    ) -> ServiceResult<Option<TxHash>> {
        let pool = self.get_pair_pool(token1, token2, chain).await?;

        let (assets, amounts) = if pool.is_first(token1) {
            ([token1, token2], [amount1, amount2])
        } else {
            ([token2, token1], [amount2, amount1])
        };

        let amounts_in = [to_minimal_unit(amounts[0])?, to_minimal_unit(amounts[1])?];

        let request = JoinPoolRequest {
            assets: assets.to_vec(),
            maxAmountsIn: amounts_in.iter().map(|a| with_join_slack(*a)).collect(),
            userData: encode_join_user_data(amounts_in),
        };

        tracing::info!("joining pool {} with {:?}", pool.address, amounts_in);

        let outcome = self
            .repository
            .join_pool(chain.router, account, request)
            .await
            .map_err(ServiceError::from);

        self.settle("joinPool", outcome)
    }

    /// Burns `amount` LP shares of the `token1`/`token2` pool, splitting the
    /// proceeds by `ratio`.
    #[instrument(skip(self, chain), err)]
    pub async fn exit_pool(
        &self,
        chain: &ChainConfig,
        account: Address,
        amount: &str,
        ratio: &str,
        token1: Address,
        token2: Address,
    ) -> ServiceResult<Option<TxHash>> {
        let total_amount = to_minimal_unit(amount)?;
        let ratio = to_minimal_unit(ratio)?;
        let min_out = to_minimal_unit(EXIT_MIN_AMOUNT_OUT)?;

        let request = ExitPoolRequest {
            assets: vec![token1, token2],
            minAmountsOut: vec![min_out, min_out],
            userData: encode_exit_user_data(total_amount, ratio),
        };

        let outcome = self
            .repository
            .exit_pool(chain.router, account, request)
            .await
            .map_err(ServiceError::from);

        self.settle("exitPool", outcome)
    }

    /// Asks the faucet to send its allotment to `account`.
    #[instrument(skip(self, chain), err)]
    pub async fn request_tokens(
        &self,
        chain: &ChainConfig,
        account: Address,
    ) -> ServiceResult<Option<TxHash>> {
        let faucet = chain.faucet()?;

        let outcome = self
            .repository
            .request_tokens(faucet, account)
            .await
            .map_err(ServiceError::from);

        self.settle("requestTokens", outcome)
    }
}
