//! The polling worker. One task owns all relay state; interval ticks and
//! message actions are handled one at a time from a single `select!` loop.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::broker::{BrokerTab, SignalPayload};
use crate::command::{RelayCommand, RelayError, RelayReply, RelayStatus};
use crate::readiness::ready_signals;
use crate::source::SignalSource;

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub poll_interval: std::time::Duration,
    pub batch_size: u64,
    pub entry_window: Duration,
    pub auto_trade_on_start: bool,
}

impl RelaySettings {
    pub fn from_config(config: &shared::Config) -> Self {
        Self {
            poll_interval: std::time::Duration::from_secs(config.relay_poll_interval_secs.max(1)),
            batch_size: config.relay_batch_size,
            entry_window: Duration::seconds(config.entry_window_secs),
            auto_trade_on_start: config.auto_trade_on_start,
        }
    }
}

struct Envelope {
    command: RelayCommand,
    reply: oneshot::Sender<Result<RelayReply, RelayError>>,
}

/// Sends message actions to a running worker.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<Envelope>,
}

impl RelayHandle {
    pub async fn request(&self, command: RelayCommand) -> Result<RelayReply, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { command, reply })
            .await
            .map_err(|_| RelayError::WorkerGone)?;
        rx.await.map_err(|_| RelayError::WorkerGone)?
    }
}

pub struct SignalRelay<S, B> {
    source: S,
    broker: B,
    settings: RelaySettings,
    auto_trade: bool,
    /// Signals already handed to the broker tab.
    sent: HashSet<i32>,
    last_poll_at: Option<DateTime<Utc>>,
    sent_count: u64,
    executed_count: u64,
    failed_count: u64,
}

impl<S: SignalSource, B: BrokerTab> SignalRelay<S, B> {
    pub fn new(source: S, broker: B, settings: RelaySettings) -> Self {
        Self {
            auto_trade: settings.auto_trade_on_start,
            source,
            broker,
            settings,
            sent: HashSet::new(),
            last_poll_at: None,
            sent_count: 0,
            executed_count: 0,
            failed_count: 0,
        }
    }

    pub fn status(&self) -> RelayStatus {
        RelayStatus {
            auto_trade: self.auto_trade,
            last_poll_at: self.last_poll_at,
            sent_count: self.sent_count,
            executed_count: self.executed_count,
            failed_count: self.failed_count,
            broker_connected: self.broker.is_connected(),
        }
    }

    /// One poll. Returns the ids forwarded to the broker tab.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<Vec<i32>> {
        if !self.auto_trade {
            return Ok(Vec::new());
        }
        if !self.broker.is_connected() {
            debug!("No broker tab, nothing to send");
            return Ok(Vec::new());
        }

        self.last_poll_at = Some(now);
        let pending = self.source.pending(self.settings.batch_size).await?;

        // A short batch is the whole pending queue, so anything missing from
        // it has left the pending state.
        if (pending.len() as u64) < self.settings.batch_size {
            let still_pending: HashSet<i32> = pending.iter().map(|s| s.id).collect();
            self.sent.retain(|id| still_pending.contains(id));
        }

        let mut forwarded = Vec::new();
        for signal in ready_signals(&pending, now, self.settings.entry_window) {
            if self.sent.contains(&signal.id) {
                continue;
            }
            match self.broker.execute(&SignalPayload::from(signal)).await {
                Ok(()) => {
                    info!(
                        "Sent signal {} ({} {} {}) to the broker tab",
                        signal.id, signal.asset, signal.timeframe, signal.direction
                    );
                    self.sent.insert(signal.id);
                    self.sent_count += 1;
                    forwarded.push(signal.id);
                }
                Err(e) => warn!("Broker tab rejected signal {}: {:#}", signal.id, e),
            }
        }
        Ok(forwarded)
    }

    pub async fn handle(&mut self, command: RelayCommand) -> Result<RelayReply, RelayError> {
        match command {
            RelayCommand::ToggleAutoTrade { enabled } => {
                self.auto_trade = enabled.unwrap_or(!self.auto_trade);
                info!("Auto-trade {}", if self.auto_trade { "enabled" } else { "disabled" });
                Ok(RelayReply::AutoTrade {
                    auto_trade: self.auto_trade,
                })
            }
            RelayCommand::GetStatus => Ok(RelayReply::Status(self.status())),
            RelayCommand::SignalExecuted { signal_id } => {
                let signal = self
                    .source
                    .report_executed(signal_id, Utc::now())
                    .await?
                    .ok_or(RelayError::SignalNotFound(signal_id))?;
                self.sent.remove(&signal_id);
                self.executed_count += 1;
                info!("Signal {} executed", signal_id);
                Ok(RelayReply::Recorded {
                    signal_id,
                    status: signal.status,
                })
            }
            RelayCommand::SignalFailed { signal_id, error } => {
                let signal = self
                    .source
                    .report_failed(signal_id, error.clone())
                    .await?
                    .ok_or(RelayError::SignalNotFound(signal_id))?;
                self.sent.remove(&signal_id);
                self.failed_count += 1;
                warn!("Signal {} failed: {}", signal_id, error.as_deref().unwrap_or("no reason given"));
                Ok(RelayReply::Recorded {
                    signal_id,
                    status: signal.status,
                })
            }
            RelayCommand::CaptureVisibleTab => Err(RelayError::Unsupported("captureVisibleTab")),
        }
    }

    pub fn spawn(self) -> (RelayHandle, JoinHandle<()>)
    where
        S: Send,
        B: Send,
    {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(self.run(rx));
        (RelayHandle { tx }, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Envelope>) {
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "Relay polling every {:?} (batch {}, auto-trade {})",
            self.settings.poll_interval, self.settings.batch_size, self.auto_trade
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        warn!("Relay poll failed: {:#}", e);
                    }
                }
                envelope = rx.recv() => {
                    let Some(Envelope { command, reply }) = envelope else {
                        info!("All relay handles dropped, stopping worker");
                        break;
                    };
                    let result = self.handle(command).await;
                    // The caller may have gone away.
                    let _ = reply.send(result);
                }
            }
        }
    }
}
