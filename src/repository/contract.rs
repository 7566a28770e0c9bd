use alloy::sol;

// Smart contract ABI definitions for the weighted-pool exchange
sol! {
    /// ERC20 token interface.
    ///
    /// Only the calls the client needs: balance and allowance queries plus the
    /// allowance increase sent before router interactions.
    #[sol(rpc)]
    interface IERC20 {
        /// Returns the token balance of the specified account in minimal units.
        function balanceOf(address account) external view returns (uint256);

        /// Returns the remaining amount `spender` may pull from `owner`.
        function allowance(address owner, address spender) external view returns (uint256);

        /// Atomically increases the allowance granted to `spender`.
        function increaseAllowance(address spender, uint256 addedValue) external returns (bool);
    }

    /// Pool factory. Pools are keyed by an unordered token pair.
    #[sol(rpc)]
    interface IHedgeFactory {
        /// Returns the pool for two tokens, or the zero address if none exists.
        function getPool(address tokenA, address tokenB) external view returns (address pool);
    }

    /// Two-token weighted pool. The pool is also the ERC20 of its LP share.
    #[sol(rpc)]
    interface IWeightedPool {
        /// Returns the pool tokens and their balances, in the pool's token order.
        function getPoolTokensAndBalances()
            external
            view
            returns (address[] memory tokens, uint256[] memory balances);

        /// Returns the normalized weights (18-decimal fixed point), in token order.
        function getWeights() external view returns (uint256[] memory);

        /// Returns the LP share balance of `account`.
        function balanceOf(address account) external view returns (uint256);

        /// Returns the total LP share supply.
        function totalSupply() external view returns (uint256);

        /// Returns the swap fee as an 18-decimal fraction.
        function getSwapFeePercentage() external view returns (uint256);
    }

    /// Router through which every swap, join and exit is executed.
    #[sol(rpc, all_derives)]
    interface IHedgeRouter {
        /// Single pool swap of an exact input amount.
        struct SingleSwap {
            address tokenIn;
            address tokenOut;
            uint256 amount;
        }

        /// Where funds are taken from and sent to.
        struct FundManagement {
            address sender;
            address recipient;
        }

        /// One leg of a batch swap; indexes point into the `assets` array.
        /// An amount of zero means "use the output of the previous step".
        struct BatchSwapStep {
            uint256 assetInIndex;
            uint256 assetOutIndex;
            uint256 amount;
        }

        struct JoinPoolRequest {
            address[] assets;
            uint256[] maxAmountsIn;
            bytes userData;
        }

        struct ExitPoolRequest {
            address[] assets;
            uint256[] minAmountsOut;
            bytes userData;
        }

        function swap(
            SingleSwap calldata singleSwap,
            FundManagement calldata funds,
            uint256 limit,
            uint256 deadline
        ) external returns (uint256 amountCalculated);

        function batchSwap(
            BatchSwapStep[] calldata swaps,
            address[] calldata assets,
            FundManagement calldata funds,
            uint256[] calldata limits,
            uint256 deadline
        ) external returns (uint256[] memory assetDeltas);

        function joinPool(address recipient, JoinPoolRequest calldata request) external;

        function exitPool(address recipient, ExitPoolRequest calldata request) external;
    }

    /// Test-token faucet.
    #[sol(rpc)]
    interface IFaucet {
        /// Sends the faucet allotment to the caller.
        function requestTokens() external;

        /// Whether `account` is currently allowed to withdraw.
        function allowedToWithdraw(address account) external view returns (bool);
    }
}
