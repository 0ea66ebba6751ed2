//! Web Push payloads and delivery through the push gateway
//!
//! The service worker renders `PushPayload` as an OS notification and, on
//! click, opens the route attached to the notification type. Encryption and
//! VAPID signing happen in the gateway; this side only builds payloads and
//! hands them over together with the stored subscription.

use anyhow::Result;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::entity::push_subscriptions;
use crate::repositories::PushSubscriptionRepository;

pub const DEFAULT_ICON: &str = "/icons/icon-192x192.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Signal,
    Result,
    PriceAlert,
    Trade,
    Goal,
    #[serde(other)]
    General,
}

impl NotificationType {
    /// In-app path a notification click navigates to.
    pub fn route(&self) -> &'static str {
        match self {
            Self::Signal => "/signals",
            Self::Result => "/signals/history",
            Self::PriceAlert => "/alerts",
            Self::Trade => "/wallet",
            Self::Goal => "/goals",
            Self::General => "/",
        }
    }
}

/// Click routing for a raw `type` string as it arrives in notification data.
pub fn route_for(kind: &str) -> &'static str {
    serde_json::from_value::<NotificationType>(json!(kind))
        .unwrap_or(NotificationType::General)
        .route()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushData {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub data: PushData,
}

impl PushPayload {
    pub fn new(kind: NotificationType, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: DEFAULT_ICON.to_string(),
            data: PushData {
                kind,
                url: kind.route().to_string(),
                signal_id: None,
                alert_id: None,
            },
        }
    }

    pub fn with_signal(mut self, signal_id: i32) -> Self {
        self.data.signal_id = Some(signal_id);
        self
    }

    pub fn with_alert(mut self, alert_id: i32) -> Self {
        self.data.alert_id = Some(alert_id);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The push service no longer knows the subscription (404/410).
    Expired,
    /// No gateway configured.
    Skipped,
}

#[derive(Clone)]
pub struct PushGateway {
    client: reqwest::Client,
    url: Option<String>,
}

impl PushGateway {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    pub async fn send(&self, sub: &push_subscriptions::Model, payload: &PushPayload) -> Result<DeliveryOutcome> {
        let Some(url) = self.url.as_deref() else {
            return Ok(DeliveryOutcome::Skipped);
        };

        let body = json!({
            "subscription": {
                "endpoint": sub.endpoint,
                "keys": { "p256dh": sub.p256dh, "auth": sub.auth },
            },
            "payload": payload,
        });
        let response = self.client.post(url).json(&body).send().await?;

        match response.status() {
            status if status.is_success() => Ok(DeliveryOutcome::Delivered),
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(DeliveryOutcome::Expired),
            status => Err(anyhow::anyhow!("Push gateway returned {} for subscription {}", status, sub.id)),
        }
    }

    /// Best-effort fan-out. Expired subscriptions are deleted, other failures
    /// are logged. Returns the number of delivered notifications.
    pub async fn broadcast(
        &self,
        repo: &PushSubscriptionRepository,
        subs: &[push_subscriptions::Model],
        payload: &PushPayload,
    ) -> usize {
        if !self.is_enabled() {
            debug!("Push gateway disabled, dropping {:?} notification", payload.data.kind);
            return 0;
        }

        let mut delivered = 0;
        for sub in subs {
            match self.send(sub, payload).await {
                Ok(DeliveryOutcome::Delivered) => delivered += 1,
                Ok(DeliveryOutcome::Expired) => {
                    info!("Push subscription {} expired, removing", sub.id);
                    if let Err(e) = repo.remove_by_id(sub.id).await {
                        warn!("Failed to remove expired push subscription {}: {}", sub.id, e);
                    }
                }
                Ok(DeliveryOutcome::Skipped) => {}
                Err(e) => warn!("Push delivery to subscription {} failed: {}", sub.id, e),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_routes_by_type() {
        assert_eq!(route_for("signal"), "/signals");
        assert_eq!(route_for("result"), "/signals/history");
        assert_eq!(route_for("price_alert"), "/alerts");
        assert_eq!(route_for("trade"), "/wallet");
        assert_eq!(route_for("goal"), "/goals");
        assert_eq!(route_for("newsletter"), "/");
    }

    #[test]
    fn test_payload_shape() {
        let payload = PushPayload::new(NotificationType::Signal, "EUR/USD", "CALL M5").with_signal(42);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["title"], "EUR/USD");
        assert_eq!(value["icon"], DEFAULT_ICON);
        assert_eq!(value["data"]["type"], "signal");
        assert_eq!(value["data"]["url"], "/signals");
        assert_eq!(value["data"]["signal_id"], 42);
        assert!(value["data"].get("alert_id").is_none());
    }

    #[test]
    fn test_disabled_gateway() {
        assert!(!PushGateway::new(None).is_enabled());
        assert!(PushGateway::new(Some("http://localhost:9000/send".into())).is_enabled());
    }
}
