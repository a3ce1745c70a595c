use async_trait::async_trait;
use ethers::{
    contract::abigen,
    providers::{Http, Middleware, Provider, ProviderError as EthersProviderError},
    types::{Address, U256},
};
use sha3::{Digest, Keccak256};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};

use crate::{
    config::Config,
    constants::{L2_RESOLVER_RETRY_BASE_MS, L2_RESOLVER_RETRY_COUNT, L2_RESOLVER_TIMEOUT_SECS},
    error::{AppError, ProviderError, Result},
    models::CardDetails,
    services::{
        identifier::parse_address,
        recipient_resolver::{BasenameLookup, EnsLookup},
    },
};

abigen!(
    GreetingCards,
    r#"[
        function getCardsSent(address sender) view returns (uint256[])
        function getCardsReceived(address recipient) view returns (uint256[])
        function getCardDetails(uint256 tokenId) view returns (address, address, address, string)
        function tokenURI(uint256 tokenId) view returns (string)
    ]"#
);

abigen!(
    L2Resolver,
    r#"[
        function addr(bytes32 node) view returns (address)
    ]"#
);

pub fn http_provider(rpc_url: &str) -> Result<Provider<Http>> {
    Provider::<Http>::try_from(rpc_url)
        .map_err(|e| AppError::Internal(format!("Invalid RPC URL {}: {}", rpc_url, e)))
}

/// ENS namehash (EIP-137) over an already-normalized name.
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = Keccak256::digest(label.as_bytes());
        let mut hasher = Keccak256::new();
        hasher.update(node);
        hasher.update(label_hash);
        node.copy_from_slice(&hasher.finalize());
    }
    node
}

// ==================== CARD CONTRACT ====================

/// Read access to the greeting-card NFT contract.
#[async_trait]
pub trait CardContract: Send + Sync {
    async fn cards_sent(&self, wallet: Address) -> std::result::Result<Vec<U256>, ProviderError>;
    async fn cards_received(
        &self,
        wallet: Address,
    ) -> std::result::Result<Vec<U256>, ProviderError>;
    async fn card_details(&self, token_id: U256)
        -> std::result::Result<CardDetails, ProviderError>;
    async fn token_uri(&self, token_id: U256) -> std::result::Result<String, ProviderError>;
}

pub struct EthersCardContract {
    contract: GreetingCards<Provider<Http>>,
}

impl EthersCardContract {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = http_provider(&config.base_rpc_url)?;
        let address = parse_address(&config.card_contract_address).ok_or_else(|| {
            AppError::Internal("CARD_CONTRACT_ADDRESS is not a valid address".to_string())
        })?;
        Ok(Self {
            contract: GreetingCards::new(address, Arc::new(provider)),
        })
    }
}

fn contract_error(err: impl std::fmt::Display) -> ProviderError {
    ProviderError::Rpc(err.to_string())
}

#[async_trait]
impl CardContract for EthersCardContract {
    async fn cards_sent(&self, wallet: Address) -> std::result::Result<Vec<U256>, ProviderError> {
        self.contract
            .get_cards_sent(wallet)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn cards_received(
        &self,
        wallet: Address,
    ) -> std::result::Result<Vec<U256>, ProviderError> {
        self.contract
            .get_cards_received(wallet)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn card_details(
        &self,
        token_id: U256,
    ) -> std::result::Result<CardDetails, ProviderError> {
        let (sender, recipient, owner, uri) = self
            .contract
            .get_card_details(token_id)
            .call()
            .await
            .map_err(contract_error)?;
        Ok(CardDetails {
            sender,
            recipient,
            owner,
            uri,
        })
    }

    async fn token_uri(&self, token_id: U256) -> std::result::Result<String, ProviderError> {
        self.contract
            .token_uri(token_id)
            .call()
            .await
            .map_err(contract_error)
    }
}

// ==================== BASENAME (L2 RESOLVER) ====================

/// Reads `addr(namehash(name))` from the Base L2 resolver, retrying transient
/// failures with exponential backoff.
pub struct L2BasenameResolver {
    resolver: L2Resolver<Provider<Http>>,
    attempt_timeout: Duration,
    retries: u32,
}

impl L2BasenameResolver {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = http_provider(&config.base_rpc_url)?;
        let address = parse_address(&config.basename_l2_resolver_address).ok_or_else(|| {
            AppError::Internal("BASENAME_L2_RESOLVER_ADDRESS is not a valid address".to_string())
        })?;
        Ok(Self {
            resolver: L2Resolver::new(address, Arc::new(provider)),
            attempt_timeout: Duration::from_secs(L2_RESOLVER_TIMEOUT_SECS),
            retries: L2_RESOLVER_RETRY_COUNT,
        })
    }

    async fn read_addr(&self, node: [u8; 32]) -> std::result::Result<Address, ProviderError> {
        let call = self.resolver.addr(node);
        timeout(self.attempt_timeout, call.call())
            .await
            .map_err(|_| ProviderError::Timeout(self.attempt_timeout))?
            .map_err(contract_error)
    }
}

#[async_trait]
impl BasenameLookup for L2BasenameResolver {
    fn source(&self) -> &'static str {
        "l2_resolver"
    }

    async fn resolve_basename(
        &self,
        name: &str,
    ) -> std::result::Result<Option<Address>, ProviderError> {
        let node = namehash(name);
        let mut attempt = 0;
        loop {
            match self.read_addr(node).await {
                Ok(address) => return Ok(Some(address).filter(|a| !a.is_zero())),
                Err(err) if attempt < self.retries => {
                    let backoff = Duration::from_millis(L2_RESOLVER_RETRY_BASE_MS << attempt);
                    tracing::debug!(
                        "l2 resolver attempt {} failed for {}: {}; retrying in {:?}",
                        attempt + 1,
                        name,
                        err,
                        backoff
                    );
                    attempt += 1;
                    sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// ==================== ENS (MAINNET) ====================

pub struct EthersEnsLookup {
    provider: Provider<Http>,
}

impl EthersEnsLookup {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            provider: http_provider(&config.ethereum_rpc_url)?,
        })
    }
}

#[async_trait]
impl EnsLookup for EthersEnsLookup {
    async fn resolve_ens(&self, name: &str) -> std::result::Result<Option<Address>, ProviderError> {
        match self.provider.resolve_name(name).await {
            Ok(address) => Ok(Some(address).filter(|a| !a.is_zero())),
            // Unregistered names surface as ENS errors rather than a zero address.
            Err(EthersProviderError::EnsError(_)) | Err(EthersProviderError::EnsNotOwned(_)) => {
                Ok(None)
            }
            Err(err) => Err(ProviderError::Rpc(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namehash_of_empty_name_is_zero() {
        assert_eq!(namehash(""), [0u8; 32]);
    }

    #[test]
    fn namehash_matches_eip137_vectors() {
        assert_eq!(
            hex::encode(namehash("eth")),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            hex::encode(namehash("foo.eth")),
            "de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn http_provider_rejects_garbage_url() {
        assert!(http_provider("not a url").is_err());
    }

    #[tokio::test]
    async fn l2_resolver_construction_uses_config_address() {
        let config = crate::config::test_config();
        assert!(L2BasenameResolver::from_config(&config).is_ok());
        assert!(EthersCardContract::from_config(&config).is_ok());
        assert!(EthersEnsLookup::from_config(&config).is_ok());
    }
}
