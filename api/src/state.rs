use sea_orm::DatabaseConnection;
use shared::repositories::*;
use shared::{ChangeEvent, ChangeFeed, ChangeKind, Config, PushGateway, PushPayload};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

const CHANGE_BUFFER: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub alerts: AlertRepository,
    pub favorites: FavoriteRepository,
    pub journal: JournalRepository,
    pub goals: GoalRepository,
    pub trades: TradeRepository,
    pub subscriptions: PushSubscriptionRepository,
    pub signals: SignalRepository,
    pub push: PushGateway,
    pub feed: ChangeFeed,
    /// Fan-out to realtime subscribers.
    pub changes: broadcast::Sender<ChangeEvent>,
    pub vapid_public_key: Option<String>,
    pub alert_hook_secret: Option<String>,
    pub default_locale: String,
}

impl AppState {
    pub fn new(config: &Config, db: Arc<DatabaseConnection>, push: PushGateway, feed: ChangeFeed) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        AppState {
            alerts: AlertRepository::new(db.clone()),
            favorites: FavoriteRepository::new(db.clone()),
            journal: JournalRepository::new(db.clone()),
            goals: GoalRepository::new(db.clone()),
            trades: TradeRepository::new(db.clone(), config.initial_wallet_balance),
            subscriptions: PushSubscriptionRepository::new(db.clone()),
            signals: SignalRepository::new(db),
            push,
            feed,
            changes,
            vapid_public_key: config.vapid_public_key.clone(),
            alert_hook_secret: config.alert_hook_secret.clone(),
            default_locale: config.default_locale.clone(),
        }
    }

    /// Announce a row change. An event that reached Redis comes back through
    /// the subscribed feed; anything else is delivered locally.
    pub async fn publish(&self, table: &str, event: ChangeKind, id: Option<i32>, user_id: Option<Uuid>) {
        let event = ChangeEvent::new(table, event, id, user_id);
        if !self.feed.publish(&event).await {
            // No receivers is fine.
            let _ = self.changes.send(event);
        }
    }

    /// Best-effort push to every device of one user, in the background.
    pub fn notify_user(&self, user_id: Uuid, payload: PushPayload) {
        if !self.push.is_enabled() {
            return;
        }
        let push = self.push.clone();
        let subscriptions = self.subscriptions.clone();
        tokio::spawn(async move {
            match subscriptions.list_for_user(user_id).await {
                Ok(subs) => {
                    let delivered = push.broadcast(&subscriptions, &subs, &payload).await;
                    debug!("Delivered {:?} notification to {} devices of {}", payload.data.kind, delivered, user_id);
                }
                Err(e) => warn!("Could not load push subscriptions of {}: {}", user_id, e),
            }
        });
    }
}
