//! The broker tab: where ready signals are sent for execution

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::entity::signals;
use std::future::Future;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalPayload {
    pub id: i32,
    pub asset: String,
    pub timeframe: String,
    pub direction: String,
    pub entry_time: Option<DateTime<Utc>>,
}

impl From<&signals::Model> for SignalPayload {
    fn from(signal: &signals::Model) -> Self {
        Self {
            id: signal.id,
            asset: signal.asset.clone(),
            timeframe: signal.timeframe.clone(),
            direction: signal.direction.clone(),
            entry_time: signal.entry_time,
        }
    }
}

pub trait BrokerTab: Send + Sync + 'static {
    /// Whether a broker tab is open to receive signals.
    fn is_connected(&self) -> bool;

    fn execute(&self, signal: &SignalPayload) -> impl Future<Output = Result<()>> + Send;
}

/// Broker tab reached through the browser bridge's HTTP endpoint.
#[derive(Clone)]
pub struct HttpBrokerTab {
    client: reqwest::Client,
    url: Option<String>,
}

impl HttpBrokerTab {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

impl BrokerTab for HttpBrokerTab {
    fn is_connected(&self) -> bool {
        self.url.is_some()
    }

    async fn execute(&self, signal: &SignalPayload) -> Result<()> {
        let url = self.url.as_deref().ok_or_else(|| anyhow!("no broker tab"))?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "action": "executeSignal", "signal": signal }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Broker bridge returned {}: {}", status, body));
        }
        debug!("Broker bridge accepted signal {}", signal.id);
        Ok(())
    }
}
