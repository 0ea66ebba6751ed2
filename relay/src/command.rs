//! Message actions exchanged with the popup and the broker tab

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RelayCommand {
    /// Flip auto-trade, or set it when `enabled` is given.
    ToggleAutoTrade {
        #[serde(default)]
        enabled: Option<bool>,
    },
    GetStatus,
    #[serde(rename_all = "camelCase")]
    SignalExecuted { signal_id: i32 },
    #[serde(rename_all = "camelCase")]
    SignalFailed {
        signal_id: i32,
        #[serde(default)]
        error: Option<String>,
    },
    CaptureVisibleTab,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStatus {
    pub auto_trade: bool,
    pub last_poll_at: Option<DateTime<Utc>>,
    pub sent_count: u64,
    pub executed_count: u64,
    pub failed_count: u64,
    pub broker_connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelayReply {
    Status(RelayStatus),
    #[serde(rename_all = "camelCase")]
    AutoTrade { auto_trade: bool },
    #[serde(rename_all = "camelCase")]
    Recorded { signal_id: i32, status: String },
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0} is not supported")]
    Unsupported(&'static str),
    #[error("signal {0} not found")]
    SignalNotFound(i32),
    #[error("signal store error: {0}")]
    Store(#[from] anyhow::Error),
    #[error("relay worker is not running")]
    WorkerGone,
}
