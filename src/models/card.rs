use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize, Serializer};

fn serialize_checksummed<S: Serializer>(address: &Address, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&to_checksum(address, None))
}

fn serialize_decimal<S: Serializer>(value: &U256, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string())
}

// ==================== RECIPIENT ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedFrom {
    Address,
    Basename,
    Ens,
    Farcaster,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientResolutionResult {
    pub success: bool,
    pub address: Option<String>,
    pub original_input: String,
    pub resolved_from: Option<ResolvedFrom>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecipientResolutionResult {
    pub fn resolved(input: &str, address: Address, from: ResolvedFrom) -> Self {
        Self {
            success: true,
            address: Some(to_checksum(&address, None)),
            original_input: input.to_string(),
            resolved_from: Some(from),
            error: None,
        }
    }

    pub fn failed(input: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            address: None,
            original_input: input.to_string(),
            resolved_from: None,
            error: Some(error.into()),
        }
    }

    /// Parsed address of a successful resolution.
    pub fn parsed_address(&self) -> Option<Address> {
        self.address.as_deref().and_then(|a| a.parse().ok())
    }
}

// ==================== CARD ACTIVITY ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityDirection {
    Sent,
    Received,
}

/// Tuple returned by `getCardDetails(uint256)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDetails {
    pub sender: Address,
    pub recipient: Address,
    pub owner: Address,
    pub uri: String,
}

impl CardDetails {
    /// The other party of the card from the querying wallet's point of view.
    pub fn counterparty(&self, direction: ActivityDirection) -> Address {
        match direction {
            ActivityDirection::Sent => self.recipient,
            ActivityDirection::Received => self.sender,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardActivityItem {
    #[serde(serialize_with = "serialize_decimal")]
    pub token_id: U256,
    pub card_image: String,
    #[serde(serialize_with = "serialize_checksummed")]
    pub counterparty_address: Address,
    pub card_title: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardMetadata {
    pub title: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
}

// ==================== MINT ====================
/// Body forwarded to the minting service.
#[derive(Debug, Clone, Serialize)]
pub struct MintRequest {
    #[serde(rename = "tokenURI")]
    pub token_uri: String,
    pub recipient: String,
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub transaction_hash: String,
    pub token_id: Option<String>,
    pub mint_price: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CardMintRequest {
    pub recipient: String,
    #[serde(rename = "tokenURI")]
    pub token_uri: String,
    /// Notified after a successful mint when it has a stored token.
    #[serde(rename = "recipientFid", default)]
    pub recipient_fid: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMintResponse {
    pub recipient: RecipientResolutionResult,
    pub transaction_hash: String,
    pub token_id: Option<String>,
    pub mint_price: Option<String>,
}

// ==================== WEBHOOK ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDetails {
    pub url: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WebhookEvent {
    #[serde(rename = "miniapp_added", alias = "frame_added")]
    MiniappAdded {
        #[serde(rename = "notificationDetails", default)]
        notification_details: Option<NotificationDetails>,
    },
    #[serde(rename = "miniapp_removed", alias = "frame_removed")]
    MiniappRemoved,
    NotificationsEnabled {
        #[serde(rename = "notificationDetails")]
        notification_details: NotificationDetails,
    },
    NotificationsDisabled,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookPayload {
    pub fid: u64,
    #[serde(flatten)]
    pub event: WebhookEvent,
}

// ==================== API RESPONSE ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
