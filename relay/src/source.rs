use anyhow::Result;
use chrono::{DateTime, Utc};
use shared::entity::signals;
use shared::repositories::SignalRepository;
use shared::{ChangeEvent, ChangeFeed, ChangeKind};
use std::future::Future;

/// Where the relay reads pending signals from and reports execution to.
pub trait SignalSource: Send + Sync + 'static {
    /// Pending signals, most recently received first.
    fn pending(&self, limit: u64) -> impl Future<Output = Result<Vec<signals::Model>>> + Send;

    fn report_executed(
        &self,
        id: i32,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<signals::Model>>> + Send;

    fn report_failed(
        &self,
        id: i32,
        reason: Option<String>,
    ) -> impl Future<Output = Result<Option<signals::Model>>> + Send;
}

/// The signal table, announcing status changes on the change feed.
#[derive(Clone)]
pub struct SignalStore {
    signals: SignalRepository,
    feed: ChangeFeed,
}

impl SignalStore {
    pub fn new(signals: SignalRepository, feed: ChangeFeed) -> Self {
        Self { signals, feed }
    }

    async fn announce(&self, updated: &Option<signals::Model>) {
        if let Some(signal) = updated {
            self.feed
                .publish(&ChangeEvent::new("signals", ChangeKind::Update, Some(signal.id), None))
                .await;
        }
    }
}

impl SignalSource for SignalStore {
    async fn pending(&self, limit: u64) -> Result<Vec<signals::Model>> {
        self.signals.find_pending(limit).await
    }

    async fn report_executed(&self, id: i32, at: DateTime<Utc>) -> Result<Option<signals::Model>> {
        let updated = self.signals.mark_executed(id, at).await?;
        self.announce(&updated).await;
        Ok(updated)
    }

    async fn report_failed(&self, id: i32, reason: Option<String>) -> Result<Option<signals::Model>> {
        let updated = self.signals.mark_failed(id, reason).await?;
        self.announce(&updated).await;
        Ok(updated)
    }
}
