//! Telegram message ingestion: classify, then insert a signal or resolve one

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use shared::entity::signals;
use shared::repositories::{InsertOutcome, PushSubscriptionRepository, SignalRepository};
use shared::{ChangeEvent, ChangeFeed, ChangeKind, NewSignal, NotificationType, PushGateway, PushPayload};
use std::sync::Arc;
use tracing::{debug, info};

use crate::i18n;
use crate::parser::{self, Classified, ParsedResult, ParsedSignal};
use crate::services::result_matcher::ResultMatcher;

/// A text message lifted out of a Telegram update.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub message_id: i64,
    pub chat_id: Option<i64>,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Created(signals::Model),
    /// A signal for this Telegram message id already exists.
    Duplicate,
    Resolved(signals::Model),
    /// A result arrived but no open signal in the window matched it.
    Unmatched,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub timezone: Tz,
    pub match_window: Duration,
    pub locale: String,
}

#[derive(Clone)]
pub struct IngestService {
    signals: SignalRepository,
    subscriptions: PushSubscriptionRepository,
    matcher: ResultMatcher,
    push: PushGateway,
    feed: ChangeFeed,
    settings: IngestSettings,
}

impl IngestService {
    pub fn new(db: Arc<DatabaseConnection>, settings: IngestSettings, push: PushGateway, feed: ChangeFeed) -> Self {
        let signals = SignalRepository::new(db.clone());
        Self {
            matcher: ResultMatcher::new(signals.clone(), settings.match_window),
            subscriptions: PushSubscriptionRepository::new(db),
            signals,
            push,
            feed,
            settings,
        }
    }

    pub async fn ingest(&self, msg: InboundMessage) -> Result<IngestOutcome> {
        match parser::classify(&msg.text) {
            Classified::Signal(parsed) => self.ingest_signal(&msg, parsed).await,
            Classified::Result(parsed) => self.ingest_result(&msg, parsed).await,
            Classified::Unclassified => {
                debug!("Message {} is neither a signal nor a result, dropping", msg.message_id);
                Ok(IngestOutcome::Ignored)
            }
        }
    }

    async fn ingest_signal(&self, msg: &InboundMessage, parsed: ParsedSignal) -> Result<IngestOutcome> {
        let entry_time = parsed
            .entry_time
            .map(|t| parser::resolve_entry_time(t, msg.received_at, self.settings.timezone));

        let new = NewSignal {
            asset: parsed.asset,
            timeframe: parsed.timeframe,
            direction: parsed.direction,
            raw_message: msg.text.clone(),
            telegram_message_id: msg.message_id,
            chat_id: msg.chat_id,
            entry_time,
            received_at: msg.received_at,
        };

        let signal = match self.signals.insert_if_absent(new).await? {
            InsertOutcome::Inserted(signal) => signal,
            InsertOutcome::Duplicate => {
                info!("Telegram message {} already ingested, skipping", msg.message_id);
                return Ok(IngestOutcome::Duplicate);
            }
        };

        info!(
            "Stored signal {} ({} {} {}) from message {}",
            signal.id, signal.asset, signal.timeframe, signal.direction, msg.message_id
        );
        self.feed
            .publish(&ChangeEvent::new("signals", ChangeKind::Insert, Some(signal.id), None))
            .await;
        self.notify(self.signal_payload(&signal));

        Ok(IngestOutcome::Created(signal))
    }

    async fn ingest_result(&self, msg: &InboundMessage, parsed: ParsedResult) -> Result<IngestOutcome> {
        let Some(candidate) = self
            .matcher
            .find_match(parsed.asset.as_deref(), msg.received_at)
            .await?
        else {
            info!(
                "Result {} from message {} matched no open signal (asset hint {:?})",
                parsed.result.as_str(),
                msg.message_id,
                parsed.asset
            );
            return Ok(IngestOutcome::Unmatched);
        };

        let Some(signal) = self
            .signals
            .set_result(candidate.id, parsed.result, msg.received_at)
            .await?
        else {
            return Ok(IngestOutcome::Unmatched);
        };

        info!(
            "Signal {} ({}) resolved as {} by message {}",
            signal.id,
            signal.asset,
            parsed.result.as_str(),
            msg.message_id
        );
        self.feed
            .publish(&ChangeEvent::new("signals", ChangeKind::Update, Some(signal.id), None))
            .await;
        self.notify(self.result_payload(&signal, parsed.result.as_str()));

        Ok(IngestOutcome::Resolved(signal))
    }

    fn signal_payload(&self, signal: &signals::Model) -> PushPayload {
        let locale = self.settings.locale.as_str();
        let title = i18n::translate(locale, "push_signal_title", Some(&[("asset", signal.asset.as_str())]));
        let direction = i18n::translate(locale, &format!("direction_{}", signal.direction), None);
        let body = i18n::translate(
            locale,
            "push_signal_body",
            Some(&[("direction", direction.as_str()), ("timeframe", signal.timeframe.as_str())]),
        );
        PushPayload::new(NotificationType::Signal, title, body).with_signal(signal.id)
    }

    fn result_payload(&self, signal: &signals::Model, result: &str) -> PushPayload {
        let locale = self.settings.locale.as_str();
        let title = i18n::translate(locale, "push_result_title", Some(&[("asset", signal.asset.as_str())]));
        let outcome = i18n::translate(locale, &format!("result_{}", result), None);
        PushPayload::new(NotificationType::Result, title, outcome).with_signal(signal.id)
    }

    /// Push delivery runs in the background; the webhook does not wait on it.
    fn notify(&self, payload: PushPayload) {
        if !self.push.is_enabled() {
            return;
        }
        let push = self.push.clone();
        let subscriptions = self.subscriptions.clone();
        tokio::spawn(async move {
            match subscriptions.list_all().await {
                Ok(subs) => {
                    let delivered = push.broadcast(&subscriptions, &subs, &payload).await;
                    debug!("Delivered {:?} notification to {} subscriptions", payload.data.kind, delivered);
                }
                Err(e) => tracing::warn!("Could not load push subscriptions: {}", e),
            }
        });
    }
}
