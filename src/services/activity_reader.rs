use ethers::types::{Address, U256};
use futures_util::future::join_all;
use std::sync::Arc;

use crate::{
    constants::{DEFAULT_CARD_TITLE, PLACEHOLDER_CARD_IMAGE},
    error::{AppError, Result},
    models::{ActivityDirection, CardActivityItem, CardMetadata},
    services::{
        identifier::parse_address,
        metadata::{ipfs_to_gateway, looks_like_image, MetadataSource},
        onchain::CardContract,
    },
};

/// Rebuilds the sent / received card lists of a wallet from contract reads.
pub struct ActivityReader {
    contract: Arc<dyn CardContract>,
    metadata: Option<Arc<dyn MetadataSource>>,
    gateway: String,
}

impl ActivityReader {
    pub fn new(contract: Arc<dyn CardContract>, gateway: String) -> Self {
        Self {
            contract,
            metadata: None,
            gateway,
        }
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataSource>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub async fn sent_cards(&self, wallet: &str) -> Result<Vec<CardActivityItem>> {
        self.read(ActivityDirection::Sent, wallet).await
    }

    pub async fn received_cards(&self, wallet: &str) -> Result<Vec<CardActivityItem>> {
        self.read(ActivityDirection::Received, wallet).await
    }

    /// Items come back in the same order as the contract's token-ID list.
    /// Only a failed enumeration call is an error; per-token failures degrade
    /// to placeholder items.
    pub async fn read(
        &self,
        direction: ActivityDirection,
        wallet: &str,
    ) -> Result<Vec<CardActivityItem>> {
        let Some(wallet) = parse_address(wallet) else {
            tracing::debug!("card activity requested for invalid address {:?}", wallet);
            return Ok(Vec::new());
        };

        let enumeration = match direction {
            ActivityDirection::Sent => self.contract.cards_sent(wallet).await,
            ActivityDirection::Received => self.contract.cards_received(wallet).await,
        };
        let token_ids = enumeration.map_err(|e| {
            tracing::error!(
                "card enumeration failed direction={:?} wallet={:?} error={}",
                direction,
                wallet,
                e
            );
            AppError::BlockchainRPC(format!("Could not load cards: {}", e))
        })?;

        if token_ids.is_empty() {
            return Ok(Vec::new());
        }

        let lookups = token_ids
            .iter()
            .map(|token_id| self.load_item(direction, *token_id));
        Ok(join_all(lookups).await)
    }

    async fn load_item(&self, direction: ActivityDirection, token_id: U256) -> CardActivityItem {
        let (counterparty, uri) = match self.contract.card_details(token_id).await {
            Ok(details) => (details.counterparty(direction), details.uri),
            Err(err) => {
                tracing::warn!(
                    "getCardDetails failed token_id={} error={}; falling back to tokenURI",
                    token_id,
                    err
                );
                match self.contract.token_uri(token_id).await {
                    Ok(uri) => (Address::zero(), uri),
                    Err(err) => {
                        tracing::warn!("tokenURI failed token_id={} error={}", token_id, err);
                        return placeholder_item(token_id);
                    }
                }
            }
        };

        let metadata = self.metadata_for(&uri).await;
        let image = metadata
            .image
            .or_else(|| (!uri.trim().is_empty()).then_some(uri))
            .map(|image| ipfs_to_gateway(&image, &self.gateway))
            .unwrap_or_else(|| PLACEHOLDER_CARD_IMAGE.to_string());

        CardActivityItem {
            token_id,
            card_image: image,
            counterparty_address: counterparty,
            card_title: metadata
                .title
                .unwrap_or_else(|| DEFAULT_CARD_TITLE.to_string()),
            tags: metadata.tags,
        }
    }

    async fn metadata_for(&self, uri: &str) -> CardMetadata {
        let Some(source) = &self.metadata else {
            return CardMetadata::default();
        };
        if uri.trim().is_empty() || looks_like_image(uri) {
            return CardMetadata::default();
        }
        match source.fetch(uri).await {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::debug!("metadata fetch failed uri={} error={}", uri, err);
                CardMetadata::default()
            }
        }
    }
}

fn placeholder_item(token_id: U256) -> CardActivityItem {
    CardActivityItem {
        token_id,
        card_image: PLACEHOLDER_CARD_IMAGE.to_string(),
        counterparty_address: Address::zero(),
        card_title: DEFAULT_CARD_TITLE.to_string(),
        tags: Vec::new(),
    }
}
