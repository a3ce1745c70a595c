// src/api/mod.rs

pub mod cards;
pub mod health;
pub mod recipients;
pub mod webhooks;

use axum::http::HeaderMap;
use redis::aio::ConnectionManager;
use std::sync::Arc;

// AppState definition
use crate::config::Config;
use crate::integrations::{MintClient, PinataClient};
use crate::services::{
    ActivityReader, NotificationService, RecipientResolver, WebhookService,
};

pub const WALLET_HEADER: &str = "x-wallet-address";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub redis: ConnectionManager,
    pub resolver: Arc<RecipientResolver>,
    /// On-chain only; backs the resolve-basename endpoint.
    pub basename_resolver: Arc<RecipientResolver>,
    pub activity: Arc<ActivityReader>,
    pub mint: MintClient,
    pub pinata: PinataClient,
    pub notifications: Arc<NotificationService>,
    pub webhooks: Arc<WebhookService>,
}

/// Wallet the client says it is connected with, if any.
pub fn connected_wallet(headers: &HeaderMap) -> Option<String> {
    headers
        .get(WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn connected_wallet_reads_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(connected_wallet(&headers), None);
        headers.insert(WALLET_HEADER, HeaderValue::from_static(" 0xabc "));
        assert_eq!(connected_wallet(&headers).as_deref(), Some("0xabc"));
    }
}
