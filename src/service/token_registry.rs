use std::collections::HashMap;

use alloy::primitives::Address;

use crate::config::TokenSettings;
use crate::service::ServiceResult;
use crate::service::client::parse_address;

/// A token known to the client. Identity is the address.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: Option<String>,
    /// Informational; every exchange token uses 18 decimals.
    pub decimals: Option<u8>,
}

impl TokenInfo {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            symbol: None,
            decimals: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl ToString) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    /// Symbol if known, otherwise the address.
    pub fn label(&self) -> String {
        self.symbol
            .clone()
            .unwrap_or_else(|| self.address.to_string())
    }
}

impl PartialEq for TokenInfo {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for TokenInfo {}

/// Token whitelist used as bridge candidates, in configuration order.
///
/// Order matters: route search breaks ties by whitelist position.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: Vec<TokenInfo>,
    by_symbol: HashMap<String, usize>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<TokenInfo>) -> Self {
        let by_symbol = tokens
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.symbol.as_ref().map(|s| (s.to_uppercase(), i)))
            .collect();

        Self { tokens, by_symbol }
    }

    /// Build the registry from configuration, rejecting malformed addresses.
    pub fn from_settings(settings: &[TokenSettings]) -> ServiceResult<Self> {
        let tokens = settings
            .iter()
            .map(|t| {
                Ok(TokenInfo {
                    address: parse_address(&t.address)?,
                    symbol: t.symbol.clone(),
                    decimals: t.decimals,
                })
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(Self::new(tokens))
    }

    /// Lookup a token by symbol (case-insensitive)
    pub fn lookup(&self, symbol: &str) -> Option<&TokenInfo> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .map(|&i| &self.tokens[i])
    }

    /// Find a token by address
    pub fn find(&self, address: Address) -> Option<&TokenInfo> {
        self.tokens.iter().find(|t| t.address == address)
    }

    /// Resolve an address, falling back to a bare entry for unknown tokens
    pub fn resolve(&self, address: Address) -> TokenInfo {
        self.find(address)
            .cloned()
            .unwrap_or_else(|| TokenInfo::new(address))
    }

    pub fn tokens(&self) -> &[TokenInfo] {
        &self.tokens
    }

    /// Get list of all supported token symbols
    pub fn supported_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.by_symbol.keys().cloned().collect();
        tokens.sort();
        tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
