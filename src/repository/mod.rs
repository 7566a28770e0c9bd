pub mod alloy;
pub mod contract;
pub mod error;

use ::alloy::primitives::{Address, TxHash, U256};
pub use alloy::AlloyHedgeRepository;
use async_trait::async_trait;
pub use contract::IHedgeRouter::{
    BatchSwapStep, ExitPoolRequest, FundManagement, JoinPoolRequest, SingleSwap,
};
pub use error::RepositoryError;

pub(crate) type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Raw pool state as returned by the pool contract, in the pool's token order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolTokensAndBalances {
    pub tokens: Vec<Address>,
    pub balances: Vec<U256>,
}

/// Trait for blockchain access against the exchange contracts.
///
/// Every method is a single contract interaction. Reads are plain `eth_call`s
/// and never need a signer. Writes are sent with `from` as the transaction
/// sender and resolve once the transaction is mined; a mined-but-reverted
/// transaction is reported as an error.
///
/// All amounts are in minimal units (18 decimals).
#[async_trait]
pub trait HedgeRepository: Send + Sync {
    /// Retrieves the ERC20 balance of `owner`.
    ///
    /// # Arguments
    ///
    /// * `token` - The ERC20 token contract address
    /// * `owner` - The address of the token holder
    ///
    /// # Returns
    ///
    /// * `Ok(U256)` - The balance in minimal units
    /// * `Err(RepositoryError)` - If the call fails or the address is not an ERC20 contract
    async fn get_token_balance(&self, token: Address, owner: Address) -> RepoResult<U256>;

    /// Retrieves how much `spender` may still transfer on behalf of `owner`.
    async fn get_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> RepoResult<U256>;

    /// Sends `increaseAllowance(spender, amount)` from `from`.
    async fn increase_allowance(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        from: Address,
    ) -> RepoResult<TxHash>;

    /// Asks the factory for the pool of an unordered token pair.
    ///
    /// # Returns
    ///
    /// * `Ok(Address)` - The pool address, or `Address::ZERO` if no pool exists
    /// * `Err(RepositoryError)` - If the factory call fails
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let pool = repository.get_pool_address(factory, dai, weth).await?;
    /// if pool.is_zero() {
    ///     println!("no pool for this pair");
    /// }
    /// ```
    async fn get_pool_address(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> RepoResult<Address>;

    /// Retrieves the pool's tokens and their balances.
    async fn get_pool_tokens_and_balances(&self, pool: Address)
    -> RepoResult<PoolTokensAndBalances>;

    /// Retrieves the pool's normalized weights, in token order.
    async fn get_pool_weights(&self, pool: Address) -> RepoResult<Vec<U256>>;

    /// Retrieves the LP share balance of `account` in `pool`.
    async fn get_pool_share_balance(&self, pool: Address, account: Address) -> RepoResult<U256>;

    /// Retrieves the total LP share supply of `pool`.
    async fn get_pool_total_supply(&self, pool: Address) -> RepoResult<U256>;

    /// Retrieves the swap fee of `pool` as an 18-decimal fraction.
    async fn get_swap_fee_percentage(&self, pool: Address) -> RepoResult<U256>;

    /// Sends a single-pool swap through the router.
    async fn swap(
        &self,
        router: Address,
        single_swap: SingleSwap,
        funds: FundManagement,
        limit: U256,
        deadline: U256,
        from: Address,
    ) -> RepoResult<TxHash>;

    /// Sends a multi-step swap through the router.
    #[allow(clippy::too_many_arguments)]
    async fn batch_swap(
        &self,
        router: Address,
        swaps: Vec<BatchSwapStep>,
        assets: Vec<Address>,
        funds: FundManagement,
        limits: Vec<U256>,
        deadline: U256,
        from: Address,
    ) -> RepoResult<TxHash>;

    /// Adds liquidity on behalf of `account`, which is also the sender.
    async fn join_pool(
        &self,
        router: Address,
        account: Address,
        request: JoinPoolRequest,
    ) -> RepoResult<TxHash>;

    /// Removes liquidity on behalf of `account`, which is also the sender.
    async fn exit_pool(
        &self,
        router: Address,
        account: Address,
        request: ExitPoolRequest,
    ) -> RepoResult<TxHash>;

    /// Sends `requestTokens()` to the faucet from `from`.
    async fn request_tokens(&self, faucet: Address, from: Address) -> RepoResult<TxHash>;

    /// Whether the faucet would currently pay out to `account`.
    async fn allowed_to_withdraw(&self, faucet: Address, account: Address) -> RepoResult<bool>;
}
