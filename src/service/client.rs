use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use tracing::instrument;

use crate::config::ChainSettings;
use crate::repository::HedgeRepository;
use crate::service::utils::{format_token_amount, from_minimal_unit};
use crate::service::{ServiceError, ServiceResult};

/// Contract addresses of one deployment of the exchange.
///
/// Passed explicitly to every operation that touches a factory, router or
/// faucet. There is no default deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub factory: Address,
    pub router: Address,
    pub faucet: Option<Address>,
}

impl ChainConfig {
    pub fn faucet(&self) -> ServiceResult<Address> {
        self.faucet.ok_or_else(|| {
            ServiceError::ConfigError(format!("no faucet configured for chain {}", self.chain_id))
        })
    }
}

impl TryFrom<&ChainSettings> for ChainConfig {
    type Error = ServiceError;

    fn try_from(settings: &ChainSettings) -> Result<Self, Self::Error> {
        let faucet = match settings.faucet_address.as_deref() {
            None | Some("") => None,
            Some(address) => Some(parse_address(address)?),
        };

        Ok(Self {
            chain_id: settings.chain_id,
            factory: parse_address(&settings.factory_address)?,
            router: parse_address(&settings.router_address)?,
            faucet,
        })
    }
}

pub fn parse_address(address: &str) -> ServiceResult<Address> {
    Address::from_str(address.trim())
        .map_err(|e| ServiceError::InvalidAddress(format!("{address}: {e}")))
}

/// What state-changing operations do when the transaction fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Log the failure and report no result. Callers only learn the outcome by
    /// re-reading chain state.
    #[default]
    LogAndDiscard,
    /// Return the failure to the caller.
    Propagate,
}

/// Stateless client for the exchange contracts.
///
/// Holds no chain state between calls; every operation re-reads what it needs.
#[derive(Clone)]
pub struct HedgeClient {
    pub(crate) repository: Arc<dyn HedgeRepository>,
    pub(crate) mutation_policy: MutationPolicy,
}

impl HedgeClient {
    pub fn new(repository: Arc<dyn HedgeRepository>) -> Self {
        Self {
            repository,
            mutation_policy: MutationPolicy::default(),
        }
    }

    pub fn with_mutation_policy(mut self, policy: MutationPolicy) -> Self {
        self.mutation_policy = policy;
        self
    }

    pub fn mutation_policy(&self) -> MutationPolicy {
        self.mutation_policy
    }

    /// Token balance of `account`, formatted for display (see [`format_token_amount`]).
    #[instrument(skip(self), err)]
    pub async fn get_token_balance(&self, token: Address, account: Address) -> ServiceResult<String> {
        let balance = self.repository.get_token_balance(token, account).await?;
        Ok(format_token_amount(balance))
    }

    /// Remaining allowance of `spender` over `owner`'s tokens, as a decimal string.
    #[instrument(skip(self), err)]
    pub async fn get_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> ServiceResult<String> {
        let remaining = self.repository.get_allowance(token, owner, spender).await?;
        Ok(from_minimal_unit(remaining))
    }

    /// Whether the faucet would pay out to `account` right now.
    #[instrument(skip(self), err)]
    pub async fn allowed_to_withdraw(
        &self,
        chain: &ChainConfig,
        account: Address,
    ) -> ServiceResult<bool> {
        let faucet = chain.faucet()?;
        Ok(self.repository.allowed_to_withdraw(faucet, account).await?)
    }

    /// Applies the mutation policy to the outcome of a sent transaction.
    ///
    /// `Ok(Some(hash))` when mined, `Ok(None)` for a discarded failure.
    pub(crate) fn settle(
        &self,
        operation: &str,
        outcome: ServiceResult<TxHash>,
    ) -> ServiceResult<Option<TxHash>> {
        match (outcome, self.mutation_policy) {
            (Ok(tx_hash), _) => {
                tracing::info!("{operation} confirmed: {tx_hash}");
                Ok(Some(tx_hash))
            }
            (Err(e), MutationPolicy::LogAndDiscard) => {
                tracing::error!("{operation} failed: {e}");
                Ok(None)
            }
            (Err(e), MutationPolicy::Propagate) => Err(e),
        }
    }
}
