// src/models/mod.rs
pub mod card;

// Re-export commonly used types from card.rs so other modules can use `crate::models::X`
pub use card::{
    ActivityDirection,
    ApiResponse,
    CardActivityItem,
    CardDetails,
    CardMetadata,
    CardMintRequest,
    CardMintResponse,
    MintReceipt,
    MintRequest,
    NotificationDetails,
    RecipientResolutionResult,
    ResolvedFrom,
    WebhookEvent,
    WebhookPayload,
};
