// All service modules
pub mod activity_reader;
pub mod debounce;
pub mod identifier;
pub mod metadata;
pub mod notification_service;
pub mod notification_store;
pub mod onchain;
pub mod recipient_resolver;
pub mod resolution_cache;
pub mod webhook_service;

// Re-export for convenience
pub use activity_reader::ActivityReader;
pub use notification_service::NotificationService;
pub use recipient_resolver::RecipientResolver;
pub use webhook_service::WebhookService;

use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Start all background services
pub async fn start_background_services(resolver: Arc<RecipientResolver>) {
    tracing::info!("Starting background services...");

    let period = resolver.cache().ttl().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = resolver.cache().purge_expired().await;
            if removed > 0 {
                tracing::debug!("Purged {} expired recipient resolutions", removed);
            }
        }
    });

    tracing::info!("All background services started successfully");
}
