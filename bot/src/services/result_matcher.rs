//! Pairs a result notice with the open signal it most plausibly reports on

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use shared::entity::signals;
use shared::repositories::SignalRepository;

/// Upper bound on open signals inspected per result.
pub const CANDIDATE_LIMIT: u64 = 50;

/// Uppercase with separators and whitespace removed: `eur-usd otc` -> `EURUSDOTC`.
pub fn normalize_asset(asset: &str) -> String {
    asset
        .chars()
        .filter(|c| !matches!(c, '-' | '/' | '_') && !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// First candidate whose asset loosely matches the hint. Candidates must
/// already be ordered most recent first; recency is the only tie-break.
pub fn select_candidate<'a>(candidates: &'a [signals::Model], asset_hint: Option<&str>) -> Option<&'a signals::Model> {
    let hint = asset_hint.map(normalize_asset).filter(|h| !h.is_empty());
    let Some(hint) = hint else {
        return candidates.first();
    };
    candidates.iter().find(|signal| {
        let asset = normalize_asset(&signal.asset);
        asset.contains(&hint) || hint.contains(&asset)
    })
}

#[derive(Clone)]
pub struct ResultMatcher {
    signals: SignalRepository,
    window: Duration,
}

impl ResultMatcher {
    pub fn new(signals: SignalRepository, window: Duration) -> Self {
        Self { signals, window }
    }

    /// The most recent unresolved signal received within the window that
    /// matches `asset_hint`, if any.
    pub async fn find_match(&self, asset_hint: Option<&str>, now: DateTime<Utc>) -> Result<Option<signals::Model>> {
        let candidates = self
            .signals
            .find_unresolved_since(now - self.window, CANDIDATE_LIMIT)
            .await?;
        Ok(select_candidate(&candidates, asset_hint).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_signal(id: i32, asset: &str, minute: u32) -> signals::Model {
        signals::Model {
            id,
            asset: asset.to_string(),
            timeframe: "M5".to_string(),
            direction: "call".to_string(),
            raw_message: String::new(),
            telegram_message_id: id as i64,
            chat_id: None,
            entry_time: None,
            status: "pending".to_string(),
            result: None,
            failure_reason: None,
            received_at: Utc.with_ymd_and_hms(2026, 3, 2, 10, minute, 0).unwrap(),
            executed_at: None,
            resolved_at: None,
        }
    }

    #[test]
    fn test_normalize_asset() {
        assert_eq!(normalize_asset("eur-usd otc"), "EURUSDOTC");
        assert_eq!(normalize_asset("EUR/USD"), "EURUSD");
        assert_eq!(normalize_asset("GBPJPY_otc"), "GBPJPYOTC");
    }

    #[test]
    fn test_without_hint_most_recent_wins() {
        let candidates = vec![open_signal(3, "GBP/JPY", 30), open_signal(2, "EUR/USD", 20)];
        assert_eq!(select_candidate(&candidates, None).map(|s| s.id), Some(3));
        assert_eq!(select_candidate(&[], None), None);
    }

    #[test]
    fn test_hint_filters_by_loose_substring() {
        let candidates = vec![
            open_signal(4, "GBP/JPY", 40),
            open_signal(3, "EUR/USD OTC", 30),
            open_signal(2, "EUR/USD", 20),
        ];
        assert_eq!(select_candidate(&candidates, Some("eur-usd")).map(|s| s.id), Some(3));
        assert_eq!(select_candidate(&candidates, Some("EURUSD OTC")).map(|s| s.id), Some(3));
        assert_eq!(select_candidate(&candidates, Some("AUD/CAD")), None);
    }
}
