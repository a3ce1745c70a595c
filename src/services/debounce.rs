use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::{models::RecipientResolutionResult, services::recipient_resolver::RecipientResolver};

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedResolution {
    pub generation: u64,
    pub result: RecipientResolutionResult,
}

/// Debounced recipient resolution for interactive input.
///
/// Each `submit` bumps the generation counter. A submission resolves only if
/// no newer one arrived during the quiet period, and its result is published
/// only if it is still the latest generation when resolution finishes.
pub struct DebouncedResolver {
    resolver: Arc<RecipientResolver>,
    delay: Duration,
    latest: Arc<AtomicU64>,
    tx: watch::Sender<Option<TaggedResolution>>,
}

impl DebouncedResolver {
    pub fn new(resolver: Arc<RecipientResolver>, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            resolver,
            delay,
            latest: Arc::new(AtomicU64::new(0)),
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<TaggedResolution>> {
        self.tx.subscribe()
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn submit(&self, input: String) -> u64 {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let resolver = self.resolver.clone();
        let latest = self.latest.clone();
        let tx = self.tx.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            sleep(delay).await;
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }

            let result = resolver.resolve(&input).await;
            let published = tx.send_if_modified(|current| {
                if latest.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *current = Some(TaggedResolution { generation, result });
                true
            });
            if !published {
                tracing::debug!("discarding stale resolution generation={}", generation);
            }
        });

        generation
    }
}
