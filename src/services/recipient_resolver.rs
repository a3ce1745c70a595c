use async_trait::async_trait;
use ethers::types::Address;
use std::sync::Arc;

use crate::{
    error::ProviderError,
    models::{RecipientResolutionResult, ResolvedFrom},
    services::{
        identifier::{
            basename_candidate, ens_candidate, farcaster_handle, parse_address,
            unresolved_message,
        },
        resolution_cache::ResolutionCache,
    },
};

// ==================== PROVIDER TRAITS ====================

#[async_trait]
pub trait BasenameLookup: Send + Sync {
    /// Short name used in logs.
    fn source(&self) -> &'static str;

    /// `name` is always fully qualified (`label.base.eth`).
    async fn resolve_basename(&self, name: &str) -> Result<Option<Address>, ProviderError>;
}

#[async_trait]
pub trait FarcasterLookup: Send + Sync {
    async fn address_for_username(&self, username: &str)
        -> Result<Option<Address>, ProviderError>;
}

#[async_trait]
pub trait EnsLookup: Send + Sync {
    async fn resolve_ens(&self, name: &str) -> Result<Option<Address>, ProviderError>;
}

fn non_zero(address: Option<Address>) -> Option<Address> {
    address.filter(|a| !a.is_zero())
}

// ==================== RESOLVER ====================

/// Turns a user-supplied recipient string into an address.
///
/// Order: address literal, basename (on-chain first, then each fallback
/// source), Farcaster username, ENS. Every provider failure counts as a
/// miss and the chain continues.
pub struct RecipientResolver {
    basename_sources: Vec<Arc<dyn BasenameLookup>>,
    farcaster: Option<Arc<dyn FarcasterLookup>>,
    ens: Option<Arc<dyn EnsLookup>>,
    cache: ResolutionCache,
}

impl RecipientResolver {
    pub fn new(cache: ResolutionCache) -> Self {
        Self {
            basename_sources: Vec::new(),
            farcaster: None,
            ens: None,
            cache,
        }
    }

    pub fn with_basename_source(mut self, source: Arc<dyn BasenameLookup>) -> Self {
        self.basename_sources.push(source);
        self
    }

    pub fn with_farcaster(mut self, farcaster: Arc<dyn FarcasterLookup>) -> Self {
        self.farcaster = Some(farcaster);
        self
    }

    pub fn with_ens(mut self, ens: Arc<dyn EnsLookup>) -> Self {
        self.ens = Some(ens);
        self
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub async fn resolve(&self, input: &str) -> RecipientResolutionResult {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return RecipientResolutionResult::failed(input, "Recipient is required");
        }

        if let Some(address) = parse_address(trimmed) {
            return RecipientResolutionResult::resolved(input, address, ResolvedFrom::Address);
        }

        if let Some(cached) = self.cache.get(trimmed).await {
            tracing::debug!("recipient cache hit input={}", trimmed);
            return match (cached.address, cached.resolved_from) {
                (Some(address), Some(from)) => {
                    RecipientResolutionResult::resolved(input, address, from)
                }
                _ => RecipientResolutionResult::failed(input, unresolved_message(trimmed)),
            };
        }

        let resolved = self.resolve_uncached(trimmed).await;
        match resolved {
            Some((address, from)) => {
                self.cache.insert(trimmed, Some(address), Some(from)).await;
                tracing::info!(
                    "recipient_resolved input={} from={:?} address={:?}",
                    trimmed,
                    from,
                    address
                );
                RecipientResolutionResult::resolved(input, address, from)
            }
            None => {
                self.cache.insert(trimmed, None, None).await;
                tracing::info!("recipient_unresolved input={}", trimmed);
                RecipientResolutionResult::failed(input, unresolved_message(trimmed))
            }
        }
    }

    async fn resolve_uncached(&self, input: &str) -> Option<(Address, ResolvedFrom)> {
        if let Some(name) = basename_candidate(input) {
            if let Some(address) = self.try_basename(&name).await {
                return Some((address, ResolvedFrom::Basename));
            }
        }

        if let Some(handle) = farcaster_handle(input) {
            if let Some(address) = self.try_farcaster(&handle).await {
                return Some((address, ResolvedFrom::Farcaster));
            }
        }

        if let Some(name) = ens_candidate(input) {
            if let Some(address) = self.try_ens(&name).await {
                return Some((address, ResolvedFrom::Ens));
            }
        }

        None
    }

    /// Basename resolution on its own, used by the resolve-basename endpoint.
    ///
    /// Cached under the fully qualified name; for such a name the full chain
    /// only ever consults basename sources, so entries agree with `resolve`.
    pub async fn resolve_basename_only(&self, input: &str) -> RecipientResolutionResult {
        let Some(name) = basename_candidate(input) else {
            return RecipientResolutionResult::failed(
                input,
                format!("\"{}\" is not a valid basename", input.trim()),
            );
        };

        if let Some(cached) = self.cache.get(&name).await {
            tracing::debug!("basename cache hit name={}", name);
            return match cached.address {
                Some(address) => {
                    RecipientResolutionResult::resolved(input, address, ResolvedFrom::Basename)
                }
                None => RecipientResolutionResult::failed(input, unresolved_message(&name)),
            };
        }

        match self.try_basename(&name).await {
            Some(address) => {
                self.cache
                    .insert(&name, Some(address), Some(ResolvedFrom::Basename))
                    .await;
                RecipientResolutionResult::resolved(input, address, ResolvedFrom::Basename)
            }
            None => {
                self.cache.insert(&name, None, None).await;
                RecipientResolutionResult::failed(input, unresolved_message(&name))
            }
        }
    }

    async fn try_basename(&self, name: &str) -> Option<Address> {
        for source in &self.basename_sources {
            match source.resolve_basename(name).await {
                Ok(found) => {
                    if let Some(address) = non_zero(found) {
                        return Some(address);
                    }
                    tracing::debug!("basename miss source={} name={}", source.source(), name);
                }
                Err(err) => {
                    tracing::warn!(
                        "basename lookup failed source={} name={} error={}",
                        source.source(),
                        name,
                        err
                    );
                }
            }
        }
        None
    }

    async fn try_farcaster(&self, handle: &str) -> Option<Address> {
        let farcaster = self.farcaster.as_ref()?;
        match farcaster.address_for_username(handle).await {
            Ok(found) => {
                let address = non_zero(found);
                if address.is_none() {
                    tracing::debug!("farcaster miss username={}", handle);
                }
                address
            }
            Err(err) => {
                tracing::warn!("farcaster lookup failed username={} error={}", handle, err);
                None
            }
        }
    }

    async fn try_ens(&self, name: &str) -> Option<Address> {
        let ens = self.ens.as_ref()?;
        match ens.resolve_ens(name).await {
            Ok(found) => {
                let address = non_zero(found);
                if address.is_none() {
                    tracing::debug!("ens miss name={}", name);
                }
                address
            }
            Err(err) => {
                tracing::warn!("ens lookup failed name={} error={}", name, err);
                None
            }
        }
    }
}
