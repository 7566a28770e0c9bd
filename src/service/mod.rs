pub mod actions;
pub mod client;
pub mod error;
pub mod estimator;
pub mod pool;
pub mod route;
pub mod token_registry;
pub mod trading;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use actions::Approval;
pub use client::{ChainConfig, HedgeClient, MutationPolicy};
pub use error::ServiceError;
pub use pool::WeightedPool;
pub use route::{Quote, Route, RouteSelection};
pub use token_registry::{TokenInfo, TokenRegistry};
pub use trading::HedgeSwapService;
pub use types::*;

pub(crate) type ServiceResult<T> = std::result::Result<T, ServiceError>;
