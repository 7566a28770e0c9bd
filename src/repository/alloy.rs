use std::str::FromStr;
use std::sync::Arc;

use alloy::network::{Ethereum, EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use tracing::instrument;

use super::error::RepositoryError;
use crate::repository::contract::{IERC20, IFaucet, IHedgeFactory, IHedgeRouter, IWeightedPool};
use crate::repository::{
    BatchSwapStep, ExitPoolRequest, FundManagement, HedgeRepository, JoinPoolRequest,
    PoolTokensAndBalances, RepoResult, SingleSwap,
};

pub struct AlloyHedgeRepository<P> {
    provider: Arc<P>,
    signer: Option<Address>,
}

impl<P: Provider + Clone + 'static> AlloyHedgeRepository<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            signer: None,
        }
    }

    /// Address of the local signer, if the provider signs transactions itself.
    /// Without one, `from` accounts must be unlocked on the node.
    pub fn signer_address(&self) -> Option<Address> {
        self.signer
    }
}

impl AlloyHedgeRepository<DynProvider> {
    /// Connects an HTTP provider, attaching a local wallet when a private key is given.
    pub fn connect(rpc_url: &str, private_key: Option<&str>) -> Result<Self, RepositoryError> {
        let url = Url::parse(rpc_url)
            .map_err(|e| RepositoryError::ParseError(format!("Invalid RPC URL: {e}")))?;

        match private_key.filter(|key| !key.is_empty()) {
            Some(key) => {
                let signer = PrivateKeySigner::from_str(key)
                    .map_err(|e| RepositoryError::ParseError(format!("Invalid private key: {e}")))?;
                let address = signer.address();

                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(url)
                    .erased();

                Ok(Self {
                    provider: Arc::new(provider),
                    signer: Some(address),
                })
            }
            None => {
                let provider = ProviderBuilder::new().connect_http(url).erased();
                Ok(Self::new(Arc::new(provider)))
            }
        }
    }
}

/// Waits for the transaction to be mined and checks its status.
async fn confirm(pending: PendingTransactionBuilder<Ethereum>) -> RepoResult<TxHash> {
    let tx_hash = *pending.tx_hash();
    tracing::debug!("waiting for transaction {tx_hash}");

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| RepositoryError::RpcError(format!("Failed to get receipt: {e}")))?;

    if !ReceiptResponse::status(&receipt) {
        return Err(RepositoryError::Reverted(tx_hash.to_string()));
    }

    tracing::info!(
        "transaction {} mined in block {:?}",
        tx_hash,
        receipt.block_number
    );
    Ok(tx_hash)
}

fn send_error(method: &str, e: impl std::fmt::Display) -> RepositoryError {
    let msg = e.to_string();
    if msg.contains("429") {
        tracing::warn!("Rate limited while sending {method}");
    }
    RepositoryError::ContractError(format!("Failed to send {method}: {msg}"))
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> HedgeRepository for AlloyHedgeRepository<P> {
    #[instrument(skip(self), err)]
    async fn get_token_balance(&self, token: Address, owner: Address) -> RepoResult<U256> {
        let contract = IERC20::new(token, self.provider.clone());

        contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))
    }

    #[instrument(skip(self), err)]
    async fn get_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> RepoResult<U256> {
        let contract = IERC20::new(token, self.provider.clone());

        contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))
    }

    #[instrument(skip(self), err)]
    async fn increase_allowance(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        from: Address,
    ) -> RepoResult<TxHash> {
        let contract = IERC20::new(token, self.provider.clone());

        let pending = contract
            .increaseAllowance(spender, amount)
            .from(from)
            .send()
            .await
            .map_err(|e| send_error("increaseAllowance", e))?;

        confirm(pending).await
    }

    #[instrument(skip(self), err)]
    async fn get_pool_address(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> RepoResult<Address> {
        let factory = IHedgeFactory::new(factory, self.provider.clone());

        factory
            .getPool(token_a, token_b)
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(format!("Failed to get pool: {e}")))
    }

    #[instrument(skip(self), err)]
    async fn get_pool_tokens_and_balances(
        &self,
        pool: Address,
    ) -> RepoResult<PoolTokensAndBalances> {
        let contract = IWeightedPool::new(pool, self.provider.clone());

        let result = contract
            .getPoolTokensAndBalances()
            .call()
            .await
            .map_err(|e| {
                RepositoryError::ContractError(format!("Failed to get pool tokens: {e}"))
            })?;

        Ok(PoolTokensAndBalances {
            tokens: result.tokens,
            balances: result.balances,
        })
    }

    #[instrument(skip(self), err)]
    async fn get_pool_weights(&self, pool: Address) -> RepoResult<Vec<U256>> {
        let contract = IWeightedPool::new(pool, self.provider.clone());

        contract
            .getWeights()
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(format!("Failed to get weights: {e}")))
    }

    #[instrument(skip(self), err)]
    async fn get_pool_share_balance(&self, pool: Address, account: Address) -> RepoResult<U256> {
        let contract = IWeightedPool::new(pool, self.provider.clone());

        contract
            .balanceOf(account)
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))
    }

    #[instrument(skip(self), err)]
    async fn get_pool_total_supply(&self, pool: Address) -> RepoResult<U256> {
        let contract = IWeightedPool::new(pool, self.provider.clone());

        contract
            .totalSupply()
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))
    }

    #[instrument(skip(self), err)]
    async fn get_swap_fee_percentage(&self, pool: Address) -> RepoResult<U256> {
        let contract = IWeightedPool::new(pool, self.provider.clone());

        contract
            .getSwapFeePercentage()
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(format!("Failed to get swap fee: {e}")))
    }

    #[instrument(skip(self), err)]
    async fn swap(
        &self,
        router: Address,
        single_swap: SingleSwap,
        funds: FundManagement,
        limit: U256,
        deadline: U256,
        from: Address,
    ) -> RepoResult<TxHash> {
        let router = IHedgeRouter::new(router, self.provider.clone());

        let pending = router
            .swap(single_swap, funds, limit, deadline)
            .from(from)
            .send()
            .await
            .map_err(|e| send_error("swap", e))?;

        confirm(pending).await
    }

    #[instrument(skip(self), err)]
    async fn batch_swap(
        &self,
        router: Address,
        swaps: Vec<BatchSwapStep>,
        assets: Vec<Address>,
        funds: FundManagement,
        limits: Vec<U256>,
        deadline: U256,
        from: Address,
    ) -> RepoResult<TxHash> {
        let router = IHedgeRouter::new(router, self.provider.clone());

        let pending = router
            .batchSwap(swaps, assets, funds, limits, deadline)
            .from(from)
            .send()
            .await
            .map_err(|e| send_error("batchSwap", e))?;

        confirm(pending).await
    }

    #[instrument(skip(self), err)]
    async fn join_pool(
        &self,
        router: Address,
        account: Address,
        request: JoinPoolRequest,
    ) -> RepoResult<TxHash> {
        let router = IHedgeRouter::new(router, self.provider.clone());

        let pending = router
            .joinPool(account, request)
            .from(account)
            .send()
            .await
            .map_err(|e| send_error("joinPool", e))?;

        confirm(pending).await
    }

    #[instrument(skip(self), err)]
    async fn exit_pool(
        &self,
        router: Address,
        account: Address,
        request: ExitPoolRequest,
    ) -> RepoResult<TxHash> {
        let router = IHedgeRouter::new(router, self.provider.clone());

        let pending = router
            .exitPool(account, request)
            .from(account)
            .send()
            .await
            .map_err(|e| send_error("exitPool", e))?;

        confirm(pending).await
    }

    #[instrument(skip(self), err)]
    async fn request_tokens(&self, faucet: Address, from: Address) -> RepoResult<TxHash> {
        let faucet = IFaucet::new(faucet, self.provider.clone());

        let pending = faucet
            .requestTokens()
            .from(from)
            .send()
            .await
            .map_err(|e| send_error("requestTokens", e))?;

        confirm(pending).await
    }

    #[instrument(skip(self), err)]
    async fn allowed_to_withdraw(&self, faucet: Address, account: Address) -> RepoResult<bool> {
        let faucet = IFaucet::new(faucet, self.provider.clone());

        faucet
            .allowedToWithdraw(account)
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))
    }
}
