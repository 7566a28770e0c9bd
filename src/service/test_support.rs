use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::repository::{
    BatchSwapStep, ExitPoolRequest, FundManagement, HedgeRepository, JoinPoolRequest,
    PoolTokensAndBalances, RepoResult, RepositoryError, SingleSwap,
};
use crate::service::client::{ChainConfig, HedgeClient};
use crate::service::token_registry::TokenInfo;
use crate::service::utils::to_minimal_unit;

pub const FACTORY: Address = Address::with_last_byte(0xF0);
pub const ROUTER: Address = Address::with_last_byte(0xB0);
pub const FAUCET: Address = Address::with_last_byte(0xFA);

pub fn chain() -> ChainConfig {
    ChainConfig {
        chain_id: 31337,
        factory: FACTORY,
        router: ROUTER,
        faucet: Some(FAUCET),
    }
}

pub fn token(n: u8) -> Address {
    Address::with_last_byte(n)
}

pub fn token_info(n: u8, symbol: &str) -> TokenInfo {
    TokenInfo::new(token(n)).with_symbol(symbol)
}

pub fn units(amount: &str) -> U256 {
    to_minimal_unit(amount).unwrap()
}

/// A transaction the mock accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum SentTransaction {
    IncreaseAllowance {
        token: Address,
        spender: Address,
        amount: U256,
        from: Address,
    },
    Swap {
        router: Address,
        single_swap: SingleSwap,
        funds: FundManagement,
        limit: U256,
        deadline: U256,
        from: Address,
    },
    BatchSwap {
        router: Address,
        swaps: Vec<BatchSwapStep>,
        assets: Vec<Address>,
        funds: FundManagement,
        limits: Vec<U256>,
        deadline: U256,
        from: Address,
    },
    JoinPool {
        router: Address,
        account: Address,
        request: JoinPoolRequest,
    },
    ExitPool {
        router: Address,
        account: Address,
        request: ExitPoolRequest,
    },
    RequestTokens {
        faucet: Address,
        from: Address,
    },
}

#[derive(Debug, Clone, Default)]
struct MockPool {
    tokens: Vec<Address>,
    balances: Vec<U256>,
    weights: Vec<U256>,
    swap_fee: U256,
    total_supply: U256,
    shares: HashMap<Address, U256>,
}

#[derive(Debug, Default)]
struct MockState {
    pools_by_pair: HashMap<(Address, Address), Address>,
    pools: HashMap<Address, MockPool>,
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    faucet_allowed: HashSet<Address>,
    sent: Vec<SentTransaction>,
    fail_sends: bool,
    pool_reads: usize,
}

/// In-memory exchange: one factory, two-token weighted pools and ERC20 ledgers.
///
/// Unknown pairs resolve to `Address::ZERO` and reads of unknown pools fail,
/// like calls against an address with no code.
#[derive(Debug, Default)]
pub struct MockHedgeRepository {
    state: Mutex<MockState>,
}

fn pair_key(a: Address, b: Address) -> (Address, Address) {
    if a < b { (a, b) } else { (b, a) }
}

impl MockHedgeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a two-token pool with human-unit balances and weights.
    pub fn with_pool(
        self,
        pool: Address,
        tokens: [Address; 2],
        balances: [&str; 2],
        weights: [&str; 2],
    ) -> Self {
        self.with_raw_pool(
            pool,
            tokens.to_vec(),
            balances.iter().map(|b| units(b)).collect(),
            weights.iter().map(|w| units(w)).collect(),
        )
    }

    /// Registers a pool of any layout. Only the first two tokens are paired in
    /// the factory.
    pub fn with_raw_pool(
        self,
        pool: Address,
        tokens: Vec<Address>,
        balances: Vec<U256>,
        weights: Vec<U256>,
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state
                .pools_by_pair
                .insert(pair_key(tokens[0], tokens[1]), pool);
            state.pools.insert(
                pool,
                MockPool {
                    tokens,
                    balances,
                    weights,
                    swap_fee: units("0.003"),
                    ..Default::default()
                },
            );
        }
        self
    }

    pub fn with_pool_shares(self, pool: Address, account: Address, shares: &str, supply: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let entry = state.pools.entry(pool).or_default();
            entry.shares.insert(account, units(shares));
            entry.total_supply = units(supply);
        }
        self
    }

    pub fn with_balance(self, token: Address, owner: Address, amount: U256) -> Self {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert((token, owner), amount);
        self
    }

    pub fn with_faucet_allowed(self, account: Address) -> Self {
        self.state.lock().unwrap().faucet_allowed.insert(account);
        self
    }

    pub fn failing_sends(self) -> Self {
        self.state.lock().unwrap().fail_sends = true;
        self
    }

    pub fn sent(&self) -> Vec<SentTransaction> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn pool_reads(&self) -> usize {
        self.state.lock().unwrap().pool_reads
    }

    pub fn into_client(self) -> (Arc<Self>, HedgeClient) {
        let mock = Arc::new(self);
        let client = HedgeClient::new(mock.clone());
        (mock, client)
    }

    fn pool(&self, pool: Address) -> RepoResult<MockPool> {
        let mut state = self.state.lock().unwrap();
        state.pool_reads += 1;
        state
            .pools
            .get(&pool)
            .cloned()
            .ok_or_else(|| RepositoryError::ContractError(format!("no contract at {pool}")))
    }

    fn record(&self, tx: SentTransaction) -> RepoResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        let hash = TxHash::with_last_byte(state.sent.len() as u8 + 1);
        if state.fail_sends {
            return Err(RepositoryError::Reverted(hash.to_string()));
        }
        state.sent.push(tx);
        Ok(hash)
    }
}

#[async_trait]
impl HedgeRepository for MockHedgeRepository {
    async fn get_token_balance(&self, token: Address, owner: Address) -> RepoResult<U256> {
        let state = self.state.lock().unwrap();
        Ok(state
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn get_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> RepoResult<U256> {
        let state = self.state.lock().unwrap();
        Ok(state
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn increase_allowance(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        from: Address,
    ) -> RepoResult<TxHash> {
        let hash = self.record(SentTransaction::IncreaseAllowance {
            token,
            spender,
            amount,
            from,
        })?;
        *self
            .state
            .lock()
            .unwrap()
            .allowances
            .entry((token, from, spender))
            .or_default() += amount;
        Ok(hash)
    }

    async fn get_pool_address(
        &self,
        _factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> RepoResult<Address> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pools_by_pair
            .get(&pair_key(token_a, token_b))
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn get_pool_tokens_and_balances(
        &self,
        pool: Address,
    ) -> RepoResult<PoolTokensAndBalances> {
        let pool = self.pool(pool)?;
        Ok(PoolTokensAndBalances {
            tokens: pool.tokens,
            balances: pool.balances,
        })
    }

    async fn get_pool_weights(&self, pool: Address) -> RepoResult<Vec<U256>> {
        Ok(self.pool(pool)?.weights)
    }

    async fn get_pool_share_balance(&self, pool: Address, account: Address) -> RepoResult<U256> {
        Ok(self
            .pool(pool)?
            .shares
            .get(&account)
            .copied()
            .unwrap_or_default())
    }

    async fn get_pool_total_supply(&self, pool: Address) -> RepoResult<U256> {
        Ok(self.pool(pool)?.total_supply)
    }

    async fn get_swap_fee_percentage(&self, pool: Address) -> RepoResult<U256> {
        Ok(self.pool(pool)?.swap_fee)
    }

    async fn swap(
        &self,
        router: Address,
        single_swap: SingleSwap,
        funds: FundManagement,
        limit: U256,
        deadline: U256,
        from: Address,
    ) -> RepoResult<TxHash> {
        self.record(SentTransaction::Swap {
            router,
            single_swap,
            funds,
            limit,
            deadline,
            from,
        })
    }

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
        self.record(SentTransaction::BatchSwap {
            router,
            swaps,
            assets,
            funds,
            limits,
            deadline,
            from,
        })
    }

    async fn join_pool(
        &self,
        router: Address,
        account: Address,
        request: JoinPoolRequest,
    ) -> RepoResult<TxHash> {
        self.record(SentTransaction::JoinPool {
            router,
            account,
            request,
        })
    }

    async fn exit_pool(
        &self,
        router: Address,
        account: Address,
        request: ExitPoolRequest,
    ) -> RepoResult<TxHash> {
        self.record(SentTransaction::ExitPool {
            router,
            account,
            request,
        })
    }

    async fn request_tokens(&self, faucet: Address, from: Address) -> RepoResult<TxHash> {
        self.record(SentTransaction::RequestTokens { faucet, from })
    }

    async fn allowed_to_withdraw(&self, _faucet: Address, account: Address) -> RepoResult<bool> {
        Ok(self.state.lock().unwrap().faucet_allowed.contains(&account))
    }
}
