use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::service::ServiceError;

// Response types that include error handling
#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum GetTokenBalanceResult {
    Success(GetTokenBalanceResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum GetAllowanceResult {
    Success(GetAllowanceResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum GetPoolInfoResult {
    Success(GetPoolInfoResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum GetPoolPositionResult {
    Success(GetPoolPositionResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum FindRouteResult {
    Success(FindRouteResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum ApproveTokenResult {
    Success(ApproveTokenResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum TransactionResult {
    Success(TransactionResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum SwapBestRouteResult {
    Success(SwapBestRouteResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum GetFaucetStatusResult {
    Success(GetFaucetStatusResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct GetTokenBalanceRequest {
    /// Token contract address or whitelisted symbol (e.g., "WETH")
    pub token: String,
    /// Account to query the balance of
    pub account: String,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct GetTokenBalanceResponse {
    /// Token contract address
    pub token: String,
    /// Balance with two decimals and thousands separators (e.g., "1,234.50")
    pub balance: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct GetAllowanceRequest {
    /// Token contract address or whitelisted symbol
    pub token: String,
    /// Token holder
    pub owner: String,
    /// Spender. Defaults to the router
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spender: Option<String>,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct GetAllowanceResponse {
    pub spender: String,
    /// Remaining allowance in token units
    pub allowance: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct GetPoolInfoRequest {
    /// First token address or symbol
    pub token_a: String,
    /// Second token address or symbol
    pub token_b: String,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct PoolTokenInfo {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Pool reserve in token units
    pub balance: String,
    /// Normalized weight (e.g., "0.5")
    pub weight: String,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct GetPoolInfoResponse {
    pub pool_address: String,
    /// Tokens in the pool's own order
    pub tokens: Vec<PoolTokenInfo>,
    /// Swap fee in percent (e.g., "0.3")
    pub swap_fee_percent: String,
    /// Total LP share supply
    pub total_supply: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct GetPoolPositionRequest {
    /// Liquidity provider account
    pub account: String,
    pub token_a: String,
    pub token_b: String,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct GetPoolPositionResponse {
    pub pool_address: String,
    /// LP shares held by the account
    pub shares: String,
    /// Total LP share supply
    pub total_supply: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct FindRouteRequest {
    /// Token to sell, address or symbol
    pub token_in: String,
    /// Token to buy, address or symbol
    pub token_out: String,
    /// Amount to sell in token units (e.g., "1.5")
    pub amount: String,
    /// Optional per-hop fee as a fraction (e.g., 0.003). Defaults to the configured fee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_fee: Option<f64>,
}

#[derive(Debug, Clone, JsonSchema, Serialize)]
pub struct RouteInfo {
    /// "direct" or "bridged"
    pub kind: String,
    /// Bridge token addresses in hop order
    pub bridges: Vec<String>,
    /// Every token the swap passes through
    pub path: Vec<String>,
    /// Estimated output in token units, -1 when no route is usable
    pub estimated_output: f64,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct FindRouteResponse {
    pub route: RouteInfo,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct ApproveTokenRequest {
    /// Account granting the allowance
    pub account: String,
    pub token: String,
    /// Amount to add to the allowance, in token units
    pub amount: String,
    /// Spender. Defaults to the router
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spender: Option<String>,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct ApproveTokenResponse {
    /// Hash of the mined transaction, absent if it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Allowance after the transaction, in token units
    pub allowance: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct SwapTokensRequest {
    /// Sending and receiving account
    pub account: String,
    pub token_in: String,
    pub token_out: String,
    /// Amount to sell in token units
    pub amount: String,
    /// Minimum amount to receive in token units
    pub limit: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct BatchSwapTokensRequest {
    pub account: String,
    pub token_in: String,
    pub token_out: String,
    /// One or two bridge tokens, in hop order
    pub bridges: Vec<String>,
    /// Amount to sell in token units
    pub amount: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct SwapBestRouteRequest {
    pub account: String,
    pub token_in: String,
    pub token_out: String,
    /// Amount to sell in token units
    pub amount: String,
    /// Minimum amount to receive when the direct pool is used. Defaults to 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct SwapBestRouteResponse {
    pub route: RouteInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct JoinPoolParams {
    pub account: String,
    pub token_a: String,
    pub token_b: String,
    /// Amount of `token_a` to add, in token units
    pub amount_a: String,
    /// Amount of `token_b` to add, in token units
    pub amount_b: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct ExitPoolParams {
    pub account: String,
    pub token_a: String,
    pub token_b: String,
    /// LP shares to burn
    pub amount: String,
    /// Split between the two tokens, as a fraction
    pub ratio: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct FaucetRequest {
    /// Account receiving the faucet tokens
    pub account: String,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct TransactionResponse {
    /// Hash of the mined transaction, absent if it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct GetFaucetStatusResponse {
    /// Whether the faucet would pay out to the account now
    pub allowed: bool,
}
