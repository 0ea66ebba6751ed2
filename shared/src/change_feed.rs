//! Row change events shared between processes over Redis pub/sub

use anyhow::Result;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, OnceCell};
use tracing::{debug, warn};
use uuid::Uuid;

pub const CHANNEL: &str = "changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub event: ChangeKind,
    pub id: Option<i32>,
    /// Owner of the row; `None` for global tables such as `signals`.
    pub user_id: Option<Uuid>,
}

impl ChangeEvent {
    pub fn new(table: &str, event: ChangeKind, id: Option<i32>, user_id: Option<Uuid>) -> Self {
        Self {
            table: table.to_string(),
            event,
            id,
            user_id,
        }
    }

    /// Whether a subscriber identified by `user_id` may see this event.
    pub fn visible_to(&self, user_id: Uuid) -> bool {
        self.user_id.map_or(true, |owner| owner == user_id)
    }
}

pub fn get_redis_client(redis_url: &str) -> Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

#[derive(Clone)]
pub struct ChangeFeed {
    client: Option<Client>,
    conn: std::sync::Arc<OnceCell<MultiplexedConnection>>,
}

impl ChangeFeed {
    pub fn new(redis_url: &str) -> Result<Self> {
        Ok(Self {
            client: Some(get_redis_client(redis_url)?),
            conn: Default::default(),
        })
    }

    /// Open the feed and make sure Redis answers. An unreachable server gives
    /// a disabled feed so that callers deliver events locally.
    pub async fn connect(redis_url: &str) -> Self {
        let feed = match Self::new(redis_url) {
            Ok(feed) => feed,
            Err(e) => {
                warn!("Invalid REDIS_URL ({}), change feed disabled", e);
                return Self::disabled();
            }
        };
        let reachable = match feed.client.as_ref() {
            Some(client) => feed
                .conn
                .get_or_try_init(|| client.get_multiplexed_async_connection())
                .await
                .map(|_| ()),
            None => Ok(()),
        };
        match reachable {
            Ok(()) => feed,
            Err(e) => {
                warn!("Redis unreachable ({}), change feed disabled", e);
                Self::disabled()
            }
        }
    }

    /// A feed that publishes nothing, for tools and tests without Redis.
    pub fn disabled() -> Self {
        Self {
            client: None,
            conn: Default::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Best-effort: a failed publish is logged. Returns whether the event
    /// reached Redis.
    pub async fn publish(&self, event: &ChangeEvent) -> bool {
        match self.try_publish(event).await {
            Ok(sent) => sent,
            Err(e) => {
                warn!("Failed to publish {:?} on {}: {}", event.event, event.table, e);
                false
            }
        }
    }

    async fn try_publish(&self, event: &ChangeEvent) -> Result<bool> {
        let Some(client) = self.client.as_ref() else {
            return Ok(false);
        };
        let conn = self
            .conn
            .get_or_try_init(|| client.get_multiplexed_async_connection())
            .await?;
        let payload = serde_json::to_string(event)?;
        let mut conn = conn.clone();
        let _: () = conn.publish(CHANNEL, payload).await?;
        debug!("Published {:?} on {}", event.event, event.table);
        Ok(true)
    }

    /// Forward every event arriving on the Redis channel into `tx` until the
    /// connection drops.
    pub async fn forward_to(&self, tx: broadcast::Sender<ChangeEvent>) -> Result<()> {
        let Some(client) = self.client.as_ref() else {
            return Ok(());
        };
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(CHANNEL).await?;
        let mut messages = pubsub.on_message();

        while let Some(msg) = messages.next().await {
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Unreadable change-feed message: {}", e);
                    continue;
                }
            };
            match serde_json::from_str::<ChangeEvent>(&payload) {
                // No receivers is fine.
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => warn!("Malformed change event {:?}: {}", payload, e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = ChangeEvent::new("signals", ChangeKind::Insert, Some(7), None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["table"], "signals");
        assert_eq!(json["event"], "INSERT");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn test_visibility() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let private = ChangeEvent::new("price_alerts", ChangeKind::Update, Some(1), Some(owner));
        assert!(private.visible_to(owner));
        assert!(!private.visible_to(other));

        let global = ChangeEvent::new("signals", ChangeKind::Update, Some(1), None);
        assert!(global.visible_to(other));
    }

    #[tokio::test]
    async fn test_disabled_feed_is_silent() {
        let feed = ChangeFeed::disabled();
        assert!(!feed.is_enabled());
        assert!(!feed.publish(&ChangeEvent::new("signals", ChangeKind::Insert, Some(1), None)).await);
        let (tx, _rx) = broadcast::channel(4);
        feed.forward_to(tx).await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_redis_disables_the_feed() {
        let feed = ChangeFeed::connect("redis://127.0.0.1:1").await;
        assert!(!feed.is_enabled());

        let unchecked = ChangeFeed::new("redis://127.0.0.1:1").unwrap();
        assert!(unchecked.is_enabled());
        let sent = unchecked
            .publish(&ChangeEvent::new("signals", ChangeKind::Insert, Some(1), None))
            .await;
        assert!(!sent);
    }
}
