use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};

use crate::{
    constants::NOTIFICATION_KEY_PREFIX,
    error::{AppError, Result},
    models::NotificationDetails,
};

/// Mini-app notification tokens, keyed by Farcaster FID.
#[async_trait]
pub trait NotificationTokenStore: Send + Sync {
    async fn get(&self, fid: u64) -> Result<Option<NotificationDetails>>;
    async fn set(&self, fid: u64, details: &NotificationDetails) -> Result<()>;
    async fn delete(&self, fid: u64) -> Result<()>;
}

fn notification_key(fid: u64) -> String {
    format!("{}:{}", NOTIFICATION_KEY_PREFIX, fid)
}

#[derive(Clone)]
pub struct RedisNotificationStore {
    redis: ConnectionManager,
}

impl RedisNotificationStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl NotificationTokenStore for RedisNotificationStore {
    async fn get(&self, fid: u64) -> Result<Option<NotificationDetails>> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(notification_key(fid)).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(details) => Ok(Some(details)),
            Err(e) => {
                tracing::warn!("dropping unreadable notification details fid={}: {}", fid, e);
                Ok(None)
            }
        }
    }

    async fn set(&self, fid: u64, details: &NotificationDetails) -> Result<()> {
        let payload = serde_json::to_string(details)
            .map_err(|e| AppError::Internal(format!("Serialize notification details: {}", e)))?;
        let mut conn = self.redis.clone();
        let _: () = conn.set(notification_key(fid), payload).await?;
        Ok(())
    }

    async fn delete(&self, fid: u64) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: () = conn.del(notification_key(fid)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryNotificationStore {
    entries: tokio::sync::RwLock<std::collections::HashMap<u64, NotificationDetails>>,
}

#[cfg(test)]
#[async_trait]
impl NotificationTokenStore for MemoryNotificationStore {
    async fn get(&self, fid: u64) -> Result<Option<NotificationDetails>> {
        Ok(self.entries.read().await.get(&fid).cloned())
    }

    async fn set(&self, fid: u64, details: &NotificationDetails) -> Result<()> {
        self.entries.write().await.insert(fid, details.clone());
        Ok(())
    }

    async fn delete(&self, fid: u64) -> Result<()> {
        self.entries.write().await.remove(&fid);
        Ok(())
    }
}
