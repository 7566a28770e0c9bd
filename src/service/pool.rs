use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::service::client::{ChainConfig, HedgeClient};
use crate::service::utils::{fraction_to_percent, from_minimal_unit};
use crate::service::{ServiceError, ServiceResult};

/// Snapshot of a two-token weighted pool, in the pool's own token order.
///
/// Balances and weights are 18-decimal fixed point. Reserves and weights come
/// from two separate calls and may belong to different blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedPool {
    pub address: Address,
    pub tokens: [Address; 2],
    pub balances: [U256; 2],
    pub weights: [U256; 2],
}

impl WeightedPool {
    /// Whether `token` is the pool's first token. Address equality is
    /// case-insensitive by construction.
    pub fn is_first(&self, token: Address) -> bool {
        self.tokens[0] == token
    }
}

fn pair<T: Copy>(pool: Address, what: &str, values: &[T]) -> ServiceResult<[T; 2]> {
    match values {
        [a, b] => Ok([*a, *b]),
        _ => Err(ServiceError::UnsupportedPool {
            pool: pool.to_string(),
            reason: format!("expected 2 {what}, got {}", values.len()),
        }),
    }
}

impl HedgeClient {
    /// Pool of the unordered pair, or `Address::ZERO` if the factory has none.
    #[instrument(skip(self), err)]
    pub async fn get_pool_address(
        &self,
        token_a: Address,
        token_b: Address,
        chain: &ChainConfig,
    ) -> ServiceResult<Address> {
        Ok(self
            .repository
            .get_pool_address(chain.factory, token_a, token_b)
            .await?)
    }

    /// Reads tokens, balances and weights of `pool`.
    ///
    /// Errors from either call propagate, including the revert a nonexistent
    /// pool produces.
    #[instrument(skip(self), err)]
    pub async fn get_pool_data(&self, pool: Address) -> ServiceResult<WeightedPool> {
        let state = self.repository.get_pool_tokens_and_balances(pool).await?;
        let weights = self.repository.get_pool_weights(pool).await?;

        Ok(WeightedPool {
            address: pool,
            tokens: pair(pool, "tokens", &state.tokens)?,
            balances: pair(pool, "balances", &state.balances)?,
            weights: pair(pool, "weights", &weights)?,
        })
    }

    /// Resolves the pool of a pair and reads it, failing if the factory has none.
    #[instrument(skip(self), err)]
    pub async fn get_pair_pool(
        &self,
        token_a: Address,
        token_b: Address,
        chain: &ChainConfig,
    ) -> ServiceResult<WeightedPool> {
        let pool = self.get_pool_address(token_a, token_b, chain).await?;
        if pool.is_zero() {
            return Err(ServiceError::LiquidityPoolNotFound {
                token0: token_a.to_string(),
                token1: token_b.to_string(),
            });
        }
        self.get_pool_data(pool).await
    }

    /// LP share balance of `account`, as a decimal string.
    #[instrument(skip(self), err)]
    pub async fn get_pool_balance(&self, account: Address, pool: Address) -> ServiceResult<String> {
        let balance = self.repository.get_pool_share_balance(pool, account).await?;
        Ok(from_minimal_unit(balance))
    }

    /// Total LP share supply, as a decimal string.
    #[instrument(skip(self), err)]
    pub async fn get_pool_supply(&self, pool: Address) -> ServiceResult<String> {
        let supply = self.repository.get_pool_total_supply(pool).await?;
        Ok(from_minimal_unit(supply))
    }

    /// Swap fee as a percentage (0.003 on chain reads as 0.3).
    #[instrument(skip(self), err)]
    pub async fn get_swap_fee_percent(&self, pool: Address) -> ServiceResult<Decimal> {
        let fee = self.repository.get_swap_fee_percentage(pool).await?;
        fraction_to_percent(fee)
    }
}
