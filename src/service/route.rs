//! Multi-hop route selection through a whitelist of bridge tokens.
//!
//! Candidates are quoted one after another with [`calculate_swap`] over live
//! pool state. Single bridges come first in whitelist order, then ordered pairs;
//! the first strictly positive quote becomes the best and is only replaced by a
//! strictly larger one. The direct pool is quoted separately and wins only when
//! strictly better.

use alloy::primitives::Address;
use tracing::instrument;

use crate::service::ServiceResult;
use crate::service::client::{ChainConfig, HedgeClient};
use crate::service::estimator::calculate_swap;
use crate::service::token_registry::TokenInfo;

/// Value returned by [`HedgeClient::calc_output_legacy`] for an unusable route.
pub const INVALID_ROUTE: f64 = -1.0;

/// Path from the input token to the output token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `in -> out` through one pool.
    Direct,
    /// `in -> bridge -> out`.
    Bridge(TokenInfo),
    /// `in -> first -> second -> out`.
    BridgePair(TokenInfo, TokenInfo),
}

impl Route {
    /// Bridge tokens in hop order; empty for the direct route.
    pub fn bridges(&self) -> Vec<&TokenInfo> {
        match self {
            Route::Direct => Vec::new(),
            Route::Bridge(bridge) => vec![bridge],
            Route::BridgePair(first, second) => vec![first, second],
        }
    }

    /// Every token the swap passes through, endpoints included.
    pub fn path(&self, token_in: Address, token_out: Address) -> Vec<Address> {
        let mut path = vec![token_in];
        path.extend(self.bridges().into_iter().map(|t| t.address));
        path.push(token_out);
        path
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Route::Direct)
    }
}

/// Estimated output of a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quote {
    /// The estimate, which may still be zero, negative or NaN for degenerate pools.
    Valid(f64),
    /// A hop had no pool or its state could not be read.
    Invalid,
}

impl Quote {
    pub fn amount(self) -> Option<f64> {
        match self {
            Quote::Valid(amount) => Some(amount),
            Quote::Invalid => None,
        }
    }

    /// The numeric form used by existing integrations, `-1` when invalid.
    pub fn to_legacy(self) -> f64 {
        self.amount().unwrap_or(INVALID_ROUTE)
    }
}

/// Outcome of route search.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSelection {
    pub route: Route,
    /// Quote of the chosen route. For [`Route::Direct`] this is the direct
    /// quote, `Invalid` when no direct pool exists either.
    pub quote: Quote,
}

/// Every ordered pair of distinct tokens: `(x, y)` and `(y, x)` both appear.
///
/// Pairs are produced in nested order over `tokens`.
pub fn ordered_pairs(tokens: &[TokenInfo]) -> impl Iterator<Item = (&TokenInfo, &TokenInfo)> {
    tokens.iter().flat_map(move |x| {
        tokens
            .iter()
            .filter(move |y| x.address != y.address)
            .map(move |y| (x, y))
    })
}

/// Whitelist entries usable as bridges between `token_in` and `token_out`.
pub fn bridge_candidates(
    whitelist: &[TokenInfo],
    token_in: Address,
    token_out: Address,
) -> Vec<TokenInfo> {
    whitelist
        .iter()
        .filter(|t| t.address != token_in && t.address != token_out)
        .cloned()
        .collect()
}

/// Best-so-far tracking with the first-positive, strictly-greater rule.
#[derive(Debug, Default)]
struct BestRoute {
    best: Option<(Route, f64)>,
}

impl BestRoute {
    fn offer(&mut self, route: Route, quote: Quote) {
        let Some(amount) = quote.amount() else {
            return;
        };

        let improves = match &self.best {
            None => amount > 0.0,
            Some((_, best)) => amount > *best,
        };

        if improves {
            tracing::debug!("new best route {:?} with quote {amount}", route.bridges());
            self.best = Some((route, amount));
        }
    }
}

/// Settles the best bridged route against the direct quote.
///
/// The direct pool wins only with a strictly greater quote, so ties and NaN
/// keep the bridged route. An invalid direct quote keeps the bridged route
/// too. Without a bridged route the direct quote is returned as is.
pub fn choose_route(best: Option<(Route, f64)>, direct: Quote) -> RouteSelection {
    match (best, direct) {
        (Some((_, bridged)), Quote::Valid(direct)) if direct > bridged => RouteSelection {
            route: Route::Direct,
            quote: Quote::Valid(direct),
        },
        (Some((route, bridged)), _) => RouteSelection {
            route,
            quote: Quote::Valid(bridged),
        },
        (None, direct) => RouteSelection {
            route: Route::Direct,
            quote: direct,
        },
    }
}

impl HedgeClient {
    /// Estimated output of `amount` (human units) of `token_in` along `route`.
    ///
    /// Each hop's pool is resolved through the factory and read fresh; the fee
    /// is charged once per hop on that hop's input. Any lookup or read failure
    /// yields [`Quote::Invalid`] rather than an error.
    #[instrument(skip(self, route, chain), fields(bridges = ?route.bridges()))]
    pub async fn calc_output(
        &self,
        route: &Route,
        amount: f64,
        token_in: Address,
        token_out: Address,
        chain: &ChainConfig,
        fee_rate: f64,
    ) -> Quote {
        match self
            .estimate_path(&route.path(token_in, token_out), amount, chain, fee_rate)
            .await
        {
            Ok(output) => Quote::Valid(output),
            Err(e) => {
                tracing::debug!("route rejected: {e}");
                Quote::Invalid
            }
        }
    }

    /// [`calc_output`](Self::calc_output) with the `-1` sentinel for invalid routes.
    pub async fn calc_output_legacy(
        &self,
        route: &Route,
        amount: f64,
        token_in: Address,
        token_out: Address,
        chain: &ChainConfig,
        fee_rate: f64,
    ) -> f64 {
        self.calc_output(route, amount, token_in, token_out, chain, fee_rate)
            .await
            .to_legacy()
    }

    async fn estimate_path(
        &self,
        path: &[Address],
        amount: f64,
        chain: &ChainConfig,
        fee_rate: f64,
    ) -> ServiceResult<f64> {
        let mut pools = Vec::with_capacity(path.len() - 1);
        for hop in path.windows(2) {
            pools.push(self.get_pair_pool(hop[0], hop[1], chain).await?);
        }

        let mut output = amount;
        for (hop, pool) in path.windows(2).zip(&pools) {
            output = calculate_swap(hop[0], pool, output * (1.0 - fee_rate));
        }
        Ok(output)
    }

    /// Direct quote, without the per-hop fee discount applied to bridged routes.
    async fn direct_quote(
        &self,
        amount: f64,
        token_in: Address,
        token_out: Address,
        chain: &ChainConfig,
    ) -> Quote {
        match self.get_pair_pool(token_in, token_out, chain).await {
            Ok(pool) => Quote::Valid(calculate_swap(token_in, &pool, amount)),
            Err(e) => {
                tracing::debug!("no direct quote: {e}");
                Quote::Invalid
            }
        }
    }

    /// Picks the route with the largest estimated output.
    ///
    /// Returns [`Route::Direct`] when the direct quote is strictly greater than
    /// the best bridged quote, or when no bridged route is usable. A bridged
    /// route is returned without comparison when the direct pool cannot be read.
    #[instrument(skip(self, whitelist, chain))]
    pub async fn find_route(
        &self,
        amount: f64,
        token_in: Address,
        token_out: Address,
        whitelist: &[TokenInfo],
        chain: &ChainConfig,
        fee_rate: f64,
    ) -> RouteSelection {
        let candidates = bridge_candidates(whitelist, token_in, token_out);
        let mut best = BestRoute::default();

        for bridge in &candidates {
            let route = Route::Bridge(bridge.clone());
            let quote = self
                .calc_output(&route, amount, token_in, token_out, chain, fee_rate)
                .await;
            best.offer(route, quote);
        }

        for (first, second) in ordered_pairs(&candidates) {
            let route = Route::BridgePair(first.clone(), second.clone());
            let quote = self
                .calc_output(&route, amount, token_in, token_out, chain, fee_rate)
                .await;
            best.offer(route, quote);
        }

        let direct = self.direct_quote(amount, token_in, token_out, chain).await;

        let selection = choose_route(best.best, direct);

        tracing::info!(
            "selected route {:?} with quote {:?}",
            selection.route.bridges(),
            selection.quote
        );
        selection
    }

    /// Bridge tokens of the best route, or `None` when a direct swap should be used.
    pub async fn get_middle_token(
        &self,
        amount: f64,
        token_in: Address,
        token_out: Address,
        whitelist: &[TokenInfo],
        chain: &ChainConfig,
        fee_rate: f64,
    ) -> Option<Vec<TokenInfo>> {
        let selection = self
            .find_route(amount, token_in, token_out, whitelist, chain, fee_rate)
            .await;

        match selection.route {
            Route::Direct => None,
            route => Some(route.bridges().into_iter().cloned().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(n: u8) -> TokenInfo {
        TokenInfo::new(Address::with_last_byte(n)).with_symbol(format!("T{n}"))
    }

    fn labels(pairs: Vec<(&TokenInfo, &TokenInfo)>) -> Vec<(String, String)> {
        pairs
            .into_iter()
            .map(|(a, b)| (a.label(), b.label()))
            .collect()
    }

    #[test]
    fn test_ordered_pairs_cover_both_orders() {
        let tokens = vec![token(1), token(2), token(3)];
        let pairs = labels(ordered_pairs(&tokens).collect());

        let expected = [
            ("T1", "T2"),
            ("T1", "T3"),
            ("T2", "T1"),
            ("T2", "T3"),
            ("T3", "T1"),
            ("T3", "T2"),
        ]
        .map(|(a, b)| (a.to_string(), b.to_string()));
        assert_eq!(pairs, expected.to_vec());
    }

    #[test]
    fn test_ordered_pairs_small_inputs() {
        assert_eq!(ordered_pairs(&[]).count(), 0);
        assert_eq!(ordered_pairs(&[token(1)]).count(), 0);
        // duplicates never pair with themselves
        assert_eq!(ordered_pairs(&[token(1), token(1)]).count(), 0);
    }

    #[test]
    fn test_bridge_candidates_exclude_endpoints() {
        let whitelist = vec![token(1), token(2), token(3), token(4)];
        let candidates = bridge_candidates(&whitelist, token(1).address, token(3).address);

        assert_eq!(candidates, vec![token(2), token(4)]);
    }

    #[test]
    fn test_route_path() {
        let (a, b) = (token(1).address, token(9).address);

        assert_eq!(Route::Direct.path(a, b), vec![a, b]);
        assert_eq!(
            Route::Bridge(token(2)).path(a, b),
            vec![a, token(2).address, b]
        );
        assert_eq!(
            Route::BridgePair(token(3), token(2)).path(a, b),
            vec![a, token(3).address, token(2).address, b]
        );
    }

    #[test]
    fn test_quote_legacy_sentinel() {
        assert_eq!(Quote::Invalid.to_legacy(), INVALID_ROUTE);
        assert_eq!(Quote::Valid(12.5).to_legacy(), 12.5);
    }

    #[test]
    fn test_best_route_rules() {
        let mut best = BestRoute::default();

        best.offer(Route::Bridge(token(1)), Quote::Valid(0.0));
        best.offer(Route::Bridge(token(2)), Quote::Valid(f64::NAN));
        best.offer(Route::Bridge(token(3)), Quote::Invalid);
        assert!(best.best.is_none(), "non-positive quotes never qualify");

        best.offer(Route::Bridge(token(4)), Quote::Valid(5.0));
        best.offer(Route::Bridge(token(5)), Quote::Valid(5.0));
        assert_eq!(best.best.as_ref().map(|(r, _)| r), Some(&Route::Bridge(token(4))));

        best.offer(Route::BridgePair(token(5), token(6)), Quote::Valid(5.5));
        assert_eq!(
            best.best.as_ref().map(|(r, q)| (r, *q)),
            Some((&Route::BridgePair(token(5), token(6)), 5.5))
        );
    }

    #[test]
    fn test_choose_route_tie_keeps_bridge() {
        let selection = choose_route(Some((Route::Bridge(token(1)), 90.0)), Quote::Valid(90.0));

        assert_eq!(selection.route, Route::Bridge(token(1)));
        assert_eq!(selection.quote, Quote::Valid(90.0));
    }

    #[test]
    fn test_choose_route_larger_direct_wins() {
        let selection = choose_route(Some((Route::Bridge(token(1)), 90.0)), Quote::Valid(92.0));

        assert_eq!(selection.route, Route::Direct);
        assert_eq!(selection.quote, Quote::Valid(92.0));
    }

    #[test]
    fn test_choose_route_nan_direct_keeps_bridge() {
        let best = Some((Route::BridgePair(token(1), token(2)), 3.0));
        let selection = choose_route(best, Quote::Valid(f64::NAN));

        assert_eq!(selection.route, Route::BridgePair(token(1), token(2)));
        assert_eq!(selection.quote, Quote::Valid(3.0));
    }

    #[test]
    fn test_choose_route_invalid_direct_keeps_bridge() {
        let selection = choose_route(Some((Route::Bridge(token(4)), 0.5)), Quote::Invalid);

        assert_eq!(selection.route, Route::Bridge(token(4)));
        assert_eq!(selection.quote, Quote::Valid(0.5));
    }

    #[test]
    fn test_choose_route_without_bridge() {
        let selection = choose_route(None, Quote::Valid(1.5));
        assert_eq!(selection.route, Route::Direct);
        assert_eq!(selection.quote, Quote::Valid(1.5));

        let selection = choose_route(None, Quote::Invalid);
        assert_eq!(selection.route, Route::Direct);
        assert_eq!(selection.quote, Quote::Invalid);
    }
}
