use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{Json, ServerHandler, tool, tool_handler, tool_router};
use tracing::instrument;

use crate::config::Config;
use crate::repository::AlloyHedgeRepository;
use crate::service::client::{ChainConfig, HedgeClient, MutationPolicy, parse_address};
use crate::service::route::{Route, RouteSelection};
use crate::service::token_registry::{TokenInfo, TokenRegistry};
use crate::service::types::{
    ApproveTokenRequest, ApproveTokenResponse, ApproveTokenResult, BatchSwapTokensRequest,
    ExitPoolParams, FaucetRequest, FindRouteRequest, FindRouteResponse, FindRouteResult,
    GetAllowanceRequest, GetAllowanceResponse, GetAllowanceResult, GetFaucetStatusResponse,
    GetFaucetStatusResult, GetPoolInfoRequest, GetPoolInfoResponse, GetPoolInfoResult,
    GetPoolPositionRequest, GetPoolPositionResponse, GetPoolPositionResult,
    GetTokenBalanceRequest, GetTokenBalanceResponse, GetTokenBalanceResult, JoinPoolParams,
    PoolTokenInfo, RouteInfo, SwapBestRouteRequest, SwapBestRouteResponse, SwapBestRouteResult,
    SwapTokensRequest, TransactionResponse, TransactionResult,
};
use crate::service::utils::from_minimal_unit;
use crate::service::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct HedgeSwapService {
    tool_router: ToolRouter<Self>,
    client: HedgeClient,
    chain: ChainConfig,
    registry: TokenRegistry,
    swap_fee: f64,
}

// MCP Tool Layer
#[tool_router]
impl HedgeSwapService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let rpc_url = &config.rpc.url;
        let private_key = Some(config.wallet.private_key.as_str()).filter(|k| !k.is_empty());

        let repository = match AlloyHedgeRepository::connect(rpc_url, private_key) {
            Ok(repo) => {
                match repo.signer_address() {
                    Some(address) => tracing::info!("Initialized with wallet address: {address}"),
                    None => tracing::info!(
                        "No private key provided. Transactions are signed by the node."
                    ),
                }
                repo
            }
            Err(e) if private_key.is_some() => {
                tracing::warn!("Failed to initialize wallet: {e}. Transactions are signed by the node.");
                AlloyHedgeRepository::connect(rpc_url, None)?
            }
            Err(e) => return Err(e.into()),
        };

        let policy = if config.mutations.propagate_errors {
            MutationPolicy::Propagate
        } else {
            MutationPolicy::LogAndDiscard
        };
        let client = HedgeClient::new(Arc::new(repository)).with_mutation_policy(policy);
        tracing::info!("mutation policy: {:?}", client.mutation_policy());

        let chain = ChainConfig::try_from(&config.chain)?;
        let registry = TokenRegistry::from_settings(&config.routing.bridge_tokens)?;
        tracing::info!(
            "chain {} with {} bridge tokens: {}",
            chain.chain_id,
            registry.len(),
            registry.supported_tokens().join(", ")
        );

        Ok(Self::with_client(client, chain, registry, config.routing.swap_fee))
    }

    pub fn with_client(
        client: HedgeClient,
        chain: ChainConfig,
        registry: TokenRegistry,
        swap_fee: f64,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            client,
            chain,
            registry,
            swap_fee,
        }
    }

    #[instrument(skip(self))]
    #[tool(description = "Query an account's token balance, formatted with two decimals")]
    pub async fn get_token_balance(
        &self,
        Parameters(req): Parameters<GetTokenBalanceRequest>,
    ) -> Json<GetTokenBalanceResult> {
        match self.get_token_balance_impl(req).await {
            Ok(response) => Json(GetTokenBalanceResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to get token balance: {e}");
                Json(GetTokenBalanceResult::Error { error: e })
            }
        }
    }

    #[instrument(skip(self))]
    #[tool(description = "Query how much a spender (the router by default) may transfer for an owner")]
    pub async fn get_allowance(
        &self,
        Parameters(req): Parameters<GetAllowanceRequest>,
    ) -> Json<GetAllowanceResult> {
        match self.get_allowance_impl(req).await {
            Ok(response) => Json(GetAllowanceResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to get allowance: {e}");
                Json(GetAllowanceResult::Error { error: e })
            }
        }
    }

    #[instrument(skip(self))]
    #[tool(description = "Get reserves, weights, swap fee and LP supply of a token pair's pool")]
    pub async fn get_pool_info(
        &self,
        Parameters(req): Parameters<GetPoolInfoRequest>,
    ) -> Json<GetPoolInfoResult> {
        match self.get_pool_info_impl(req).await {
            Ok(response) => Json(GetPoolInfoResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to get pool info: {e}");
                Json(GetPoolInfoResult::Error { error: e })
            }
        }
    }

    #[instrument(skip(self))]
    #[tool(description = "Get an account's LP shares in a token pair's pool")]
    pub async fn get_pool_position(
        &self,
        Parameters(req): Parameters<GetPoolPositionRequest>,
    ) -> Json<GetPoolPositionResult> {
        match self.get_pool_position_impl(req).await {
            Ok(response) => Json(GetPoolPositionResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to get pool position: {e}");
                Json(GetPoolPositionResult::Error { error: e })
            }
        }
    }

    #[instrument(skip(self))]
    #[tool(
        description = "Find the swap route with the largest estimated output, directly or through up to two bridge tokens"
    )]
    pub async fn find_route(
        &self,
        Parameters(req): Parameters<FindRouteRequest>,
    ) -> Json<FindRouteResult> {
        match self.find_route_impl(req).await {
            Ok(response) => Json(FindRouteResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to find route: {e}");
                Json(FindRouteResult::Error { error: e })
            }
        }
    }

    #[instrument(skip(self))]
    #[tool(description = "Increase a spender's allowance (the router by default) and return the new allowance")]
    pub async fn approve_token(
        &self,
        Parameters(req): Parameters<ApproveTokenRequest>,
    ) -> Json<ApproveTokenResult> {
        match self.approve_token_impl(req).await {
            Ok(response) => Json(ApproveTokenResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to approve token: {e}");
                Json(ApproveTokenResult::Error { error: e })
            }
        }
    }

    #[instrument(skip(self))]
    #[tool(description = "Swap tokens through their direct pool")]
    pub async fn swap_tokens(
        &self,
        Parameters(req): Parameters<SwapTokensRequest>,
    ) -> Json<TransactionResult> {
        transaction_result("swap", self.swap_tokens_impl(req).await)
    }

    #[instrument(skip(self))]
    #[tool(description = "Swap tokens through one or two bridge tokens")]
    pub async fn batch_swap_tokens(
        &self,
        Parameters(req): Parameters<BatchSwapTokensRequest>,
    ) -> Json<TransactionResult> {
        transaction_result("batch swap", self.batch_swap_tokens_impl(req).await)
    }

    #[instrument(skip(self))]
    #[tool(description = "Find the best route and execute the swap along it")]
    pub async fn swap_best_route(
        &self,
        Parameters(req): Parameters<SwapBestRouteRequest>,
    ) -> Json<SwapBestRouteResult> {
        match self.swap_best_route_impl(req).await {
            Ok(response) => Json(SwapBestRouteResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to swap along best route: {e}");
                Json(SwapBestRouteResult::Error { error: e })
            }
        }
    }

    #[instrument(skip(self))]
    #[tool(description = "Add liquidity to a token pair's pool")]
    pub async fn join_pool(
        &self,
        Parameters(req): Parameters<JoinPoolParams>,
    ) -> Json<TransactionResult> {
        transaction_result("join pool", self.join_pool_impl(req).await)
    }

    #[instrument(skip(self))]
    #[tool(description = "Remove liquidity from a token pair's pool")]
    pub async fn exit_pool(
        &self,
        Parameters(req): Parameters<ExitPoolParams>,
    ) -> Json<TransactionResult> {
        transaction_result("exit pool", self.exit_pool_impl(req).await)
    }

    #[instrument(skip(self))]
    #[tool(description = "Request test tokens from the faucet")]
    pub async fn request_faucet_tokens(
        &self,
        Parameters(req): Parameters<FaucetRequest>,
    ) -> Json<TransactionResult> {
        transaction_result("faucet request", self.request_faucet_tokens_impl(req).await)
    }

    #[instrument(skip(self))]
    #[tool(description = "Check whether the faucet would currently pay out to an account")]
    pub async fn get_faucet_status(
        &self,
        Parameters(req): Parameters<FaucetRequest>,
    ) -> Json<GetFaucetStatusResult> {
        match self.get_faucet_status_impl(req).await {
            Ok(response) => Json(GetFaucetStatusResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to get faucet status: {e}");
                Json(GetFaucetStatusResult::Error { error: e })
            }
        }
    }
}

fn transaction_result(
    operation: &str,
    outcome: ServiceResult<Option<TxHash>>,
) -> Json<TransactionResult> {
    match outcome {
        Ok(tx_hash) => Json(TransactionResult::Success(TransactionResponse {
            tx_hash: tx_hash.map(|h| h.to_string()),
        })),
        Err(e) => {
            tracing::error!("Failed to {operation}: {e}");
            Json(TransactionResult::Error { error: e })
        }
    }
}

fn route_info(selection: &RouteSelection, token_in: Address, token_out: Address) -> RouteInfo {
    let kind = if selection.route.is_direct() {
        "direct"
    } else {
        "bridged"
    };

    RouteInfo {
        kind: kind.to_string(),
        bridges: selection
            .route
            .bridges()
            .iter()
            .map(|t| t.address.to_string())
            .collect(),
        path: selection
            .route
            .path(token_in, token_out)
            .iter()
            .map(Address::to_string)
            .collect(),
        estimated_output: selection.quote.to_legacy(),
    }
}

fn parse_estimate_amount(amount: &str) -> ServiceResult<f64> {
    match amount.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        Ok(_) => Err(ServiceError::InvalidAmount(format!(
            "{amount}: amount must be positive"
        ))),
        Err(e) => Err(ServiceError::InvalidAmount(format!("{amount}: {e}"))),
    }
}

// Business Logic - Core implementation
impl HedgeSwapService {
    #[instrument(skip(self), err)]
    async fn get_token_balance_impl(
        &self,
        req: GetTokenBalanceRequest,
    ) -> ServiceResult<GetTokenBalanceResponse> {
        let token = self.parse_token_address_or_symbol(&req.token)?;
        let account = parse_address(&req.account)?;

        let balance = self.client.get_token_balance(token, account).await?;

        Ok(GetTokenBalanceResponse {
            token: token.to_string(),
            balance,
        })
    }

    #[instrument(skip(self), err)]
    async fn get_allowance_impl(
        &self,
        req: GetAllowanceRequest,
    ) -> ServiceResult<GetAllowanceResponse> {
        let token = self.parse_token_address_or_symbol(&req.token)?;
        let owner = parse_address(&req.owner)?;
        let spender = self.spender_or_router(req.spender.as_deref())?;

        let allowance = self.client.get_allowance(token, owner, spender).await?;

        Ok(GetAllowanceResponse {
            spender: spender.to_string(),
            allowance,
        })
    }

    #[instrument(skip(self), err)]
    async fn get_pool_info_impl(&self, req: GetPoolInfoRequest) -> ServiceResult<GetPoolInfoResponse> {
        let token_a = self.parse_token_address_or_symbol(&req.token_a)?;
        let token_b = self.parse_token_address_or_symbol(&req.token_b)?;

        let pool = self.client.get_pair_pool(token_a, token_b, &self.chain).await?;
        let swap_fee = self.client.get_swap_fee_percent(pool.address).await?;
        let total_supply = self.client.get_pool_supply(pool.address).await?;

        let tokens = (0..2)
            .map(|i| PoolTokenInfo {
                address: pool.tokens[i].to_string(),
                symbol: self.registry.resolve(pool.tokens[i]).symbol,
                balance: from_minimal_unit(pool.balances[i]),
                weight: from_minimal_unit(pool.weights[i]),
            })
            .collect();

        Ok(GetPoolInfoResponse {
            pool_address: pool.address.to_string(),
            tokens,
            swap_fee_percent: swap_fee.normalize().to_string(),
            total_supply,
        })
    }

    #[instrument(skip(self), err)]
    async fn get_pool_position_impl(
        &self,
        req: GetPoolPositionRequest,
    ) -> ServiceResult<GetPoolPositionResponse> {
        let account = parse_address(&req.account)?;
        let token_a = self.parse_token_address_or_symbol(&req.token_a)?;
        let token_b = self.parse_token_address_or_symbol(&req.token_b)?;

        let pool = self
            .client
            .get_pool_address(token_a, token_b, &self.chain)
            .await?;
        if pool.is_zero() {
            return Err(ServiceError::LiquidityPoolNotFound {
                token0: token_a.to_string(),
                token1: token_b.to_string(),
            });
        }

        let shares = self.client.get_pool_balance(account, pool).await?;
        let total_supply = self.client.get_pool_supply(pool).await?;

        Ok(GetPoolPositionResponse {
            pool_address: pool.to_string(),
            shares,
            total_supply,
        })
    }

    #[instrument(skip(self), err)]
    async fn find_route_impl(&self, req: FindRouteRequest) -> ServiceResult<FindRouteResponse> {
        let token_in = self.parse_token_address_or_symbol(&req.token_in)?;
        let token_out = self.parse_token_address_or_symbol(&req.token_out)?;
        let amount = parse_estimate_amount(&req.amount)?;
        let fee_rate = req.swap_fee.unwrap_or(self.swap_fee);

        let selection = self
            .client
            .find_route(
                amount,
                token_in,
                token_out,
                self.registry.tokens(),
                &self.chain,
                fee_rate,
            )
            .await;

        Ok(FindRouteResponse {
            route: route_info(&selection, token_in, token_out),
        })
    }

    #[instrument(skip(self), err)]
    async fn approve_token_impl(
        &self,
        req: ApproveTokenRequest,
    ) -> ServiceResult<ApproveTokenResponse> {
        let account = parse_address(&req.account)?;
        let token = self.parse_token_address_or_symbol(&req.token)?;
        let spender = self.spender_or_router(req.spender.as_deref())?;

        let approval = self
            .client
            .approve_token(account, token, &req.amount, spender)
            .await?;

        Ok(ApproveTokenResponse {
            tx_hash: approval.tx_hash.map(|h| h.to_string()),
            allowance: approval.allowance,
        })
    }

    #[instrument(skip(self), err)]
    async fn swap_tokens_impl(&self, req: SwapTokensRequest) -> ServiceResult<Option<TxHash>> {
        let account = parse_address(&req.account)?;
        let token_in = self.parse_token_address_or_symbol(&req.token_in)?;
        let token_out = self.parse_token_address_or_symbol(&req.token_out)?;

        self.client
            .swap_tokens(
                &self.chain,
                token_in,
                token_out,
                &req.amount,
                &req.limit,
                account,
            )
            .await
    }

    #[instrument(skip(self), err)]
    async fn batch_swap_tokens_impl(
        &self,
        req: BatchSwapTokensRequest,
    ) -> ServiceResult<Option<TxHash>> {
        let account = parse_address(&req.account)?;
        let token_in = self.parse_token_address_or_symbol(&req.token_in)?;
        let token_out = self.parse_token_address_or_symbol(&req.token_out)?;

        let bridges = req
            .bridges
            .iter()
            .map(|b| Ok(self.registry.resolve(self.parse_token_address_or_symbol(b)?)))
            .collect::<ServiceResult<Vec<TokenInfo>>>()?;

        let route = match bridges.as_slice() {
            [bridge] => Route::Bridge(bridge.clone()),
            [first, second] => Route::BridgePair(first.clone(), second.clone()),
            _ => {
                return Err(ServiceError::InvalidRoute(format!(
                    "expected one or two bridge tokens, got {}",
                    bridges.len()
                )));
            }
        };

        self.client
            .batch_swap_tokens(&self.chain, token_in, token_out, &route, &req.amount, account)
            .await
    }

    #[instrument(skip(self), err)]
    async fn swap_best_route_impl(
        &self,
        req: SwapBestRouteRequest,
    ) -> ServiceResult<SwapBestRouteResponse> {
        let account = parse_address(&req.account)?;
        let token_in = self.parse_token_address_or_symbol(&req.token_in)?;
        let token_out = self.parse_token_address_or_symbol(&req.token_out)?;
        let amount = parse_estimate_amount(&req.amount)?;

        let selection = self
            .client
            .find_route(
                amount,
                token_in,
                token_out,
                self.registry.tokens(),
                &self.chain,
                self.swap_fee,
            )
            .await;

        if selection.quote.amount().is_none() {
            return Err(ServiceError::LiquidityPoolNotFound {
                token0: token_in.to_string(),
                token1: token_out.to_string(),
            });
        }

        let tx_hash = if selection.route.is_direct() {
            let limit = req.limit.as_deref().unwrap_or("0");
            self.client
                .swap_tokens(&self.chain, token_in, token_out, &req.amount, limit, account)
                .await?
        } else {
            self.client
                .batch_swap_tokens(
                    &self.chain,
                    token_in,
                    token_out,
                    &selection.route,
                    &req.amount,
                    account,
                )
                .await?
        };

        Ok(SwapBestRouteResponse {
            route: route_info(&selection, token_in, token_out),
            tx_hash: tx_hash.map(|h| h.to_string()),
        })
    }

    #[instrument(skip(self), err)]
    async fn join_pool_impl(&self, req: JoinPoolParams) -> ServiceResult<Option<TxHash>> {
        let account = parse_address(&req.account)?;
        let token_a = self.parse_token_address_or_symbol(&req.token_a)?;
        let token_b = self.parse_token_address_or_symbol(&req.token_b)?;

        self.client
            .join_pool(
                &self.chain,
                account,
                token_a,
                token_b,
                &req.amount_a,
                &req.amount_b,
            )
            .await
    }

    #[instrument(skip(self), err)]
    async fn exit_pool_impl(&self, req: ExitPoolParams) -> ServiceResult<Option<TxHash>> {
        let account = parse_address(&req.account)?;
        let token_a = self.parse_token_address_or_symbol(&req.token_a)?;
        let token_b = self.parse_token_address_or_symbol(&req.token_b)?;

        self.client
            .exit_pool(&self.chain, account, &req.amount, &req.ratio, token_a, token_b)
            .await
    }

    #[instrument(skip(self), err)]
    async fn request_faucet_tokens_impl(&self, req: FaucetRequest) -> ServiceResult<Option<TxHash>> {
        let account = parse_address(&req.account)?;
        self.client.request_tokens(&self.chain, account).await
    }

    #[instrument(skip(self), err)]
    async fn get_faucet_status_impl(
        &self,
        req: FaucetRequest,
    ) -> ServiceResult<GetFaucetStatusResponse> {
        let account = parse_address(&req.account)?;
        let allowed = self.client.allowed_to_withdraw(&self.chain, account).await?;
        Ok(GetFaucetStatusResponse { allowed })
    }

    fn spender_or_router(&self, spender: Option<&str>) -> ServiceResult<Address> {
        match spender {
            Some(spender) => parse_address(spender),
            None => Ok(self.chain.router),
        }
    }

    /// Parse a token address, or look it up by symbol in the bridge whitelist
    fn parse_token_address_or_symbol(&self, token: &str) -> ServiceResult<Address> {
        // First try to parse as an address
        if let Ok(addr) = Address::from_str(token.trim()) {
            return Ok(addr);
        }

        // If not a valid address, try to lookup as a symbol
        self.registry.lookup(token).map(|t| t.address).ok_or_else(|| {
            tracing::warn!("Token symbol not found in registry: {}", token);
            ServiceError::TokenNotFound(format!(
                "{} (Supported tokens: {})",
                token,
                self.registry.supported_tokens().join(", ")
            ))
        })
    }
}

#[tool_handler]
impl ServerHandler for HedgeSwapService {}
