//! Classifier for broker channel messages
//!
//! Rules are tried in a fixed order and the first one that fires decides the
//! class. Result markers win over signal fields so that a result notice
//! quoting the original signal ("EUR/USD M5 CALL ✅ WIN") is never
//! re-ingested as a new signal.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use shared::{Direction, SignalResult};
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSignal {
    pub asset: String,
    pub timeframe: String,
    pub direction: Direction,
    /// Wall-clock entry time as written in the message, in the channel's timezone.
    pub entry_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResult {
    pub result: SignalResult,
    /// Asset named in the result notice, if any; narrows the match.
    pub asset: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Signal(ParsedSignal),
    Result(ParsedResult),
    Unclassified,
}

type Rule = fn(&str) -> Option<Classified>;

/// Ordered by precedence.
const RULES: &[(&str, Rule)] = &[("result", classify_result), ("signal", classify_signal)];

pub fn classify(text: &str) -> Classified {
    RULES
        .iter()
        .find_map(|(name, rule)| {
            let classified = rule(text);
            if classified.is_some() {
                tracing::debug!("Message matched {} rule", name);
            }
            classified
        })
        .unwrap_or(Classified::Unclassified)
}

const CURRENCIES: &str = "USDT|USDC|USD|EUR|GBP|JPY|AUD|CAD|CHF|NZD|CNH|SGD|HKD|TRY|ZAR|MXN|SEK|NOK|PLN|INR|AED|SAR|QAR|KES|NGN|BTC|ETH|LTC|XRP|BNB|SOL|DOGE|XAU|XAG";

// Both sides come from the currency list so that marker words written before
// a pair ("CALL - EUR/USD") are never read as the base.
static ASSET_SEPARATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({c})\s*[/\-]\s*({c})\b(?:[\s_\-]*\(?(OTC)\)?)?",
        c = CURRENCIES
    ))
    .unwrap()
});

static ASSET_COMPACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({c})({c})(?:[\s_\-]*\(?(OTC)\)?)?", c = CURRENCIES)).unwrap()
});

static TIMEFRAME_PREFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([MHS])\s?(\d{1,3})\b").unwrap());

static TIMEFRAME_SUFFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s?(minutes|minute|mins|min|m|hours|hour|h|seconds|secs|sec|s)\b|(\d{1,3})\s*(دقائق|دقيقة|ساعة|ثانية)").unwrap()
});

static DIRECTION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(CALL|BUY|UP|HIGHER)|(PUT|SELL|DOWN|LOWER))\b").unwrap()
});

static DIRECTION_SYMBOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(🔼|⬆|📈|🟢|شراء|صعود)|(🔽|⬇|📉|🔴|بيع|هبوط)").unwrap()
});

static ENTRY_TIME_MARKED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\b(?:entry|enter|time|at)\b|⏰|🕐|⌚|⏱|الدخول|الساعة)[^0-9\n]{0,12}(\d{1,2})[:.](\d{2})\b").unwrap()
});

static ENTRY_TIME_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());

static WIN_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bWIN(?:NER|S)?\b|\bWIN\s*[12¹²₁₂]\b|\bWIN[¹²₁₂]|\bMG\s*[12]\b|ربح").unwrap()
});

static LOSS_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:LOSS|LOSE|LOST)\b|خسارة|خساره").unwrap());

static WIN_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bWIN\s*(?:\(\s*)?(?:(?:MG|G|GALE|X)\s*)?([12¹²₁₂])(?:\s*\))?(?:[^0-9:.]|$)").unwrap()
});

/// Martingale level written on its own ("MG1", "MG 2").
static MG_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bMG\s*([12])\b").unwrap());

fn classify_result(text: &str) -> Option<Classified> {
    let win = WIN_MARKER.is_match(text);
    let loss = LOSS_MARKER.is_match(text);

    let result = match (win, loss) {
        (true, false) => win_level(text),
        (false, true) => SignalResult::Loss,
        // Both markers at once is a tally ("WIN 5 / LOSS 1"), not an outcome.
        _ => return None,
    };

    Some(Classified::Result(ParsedResult {
        result,
        asset: extract_asset(text),
    }))
}

fn win_level(text: &str) -> SignalResult {
    let level = WIN_LEVEL
        .captures(text)
        .or_else(|| MG_LEVEL.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    match level {
        Some("1" | "¹" | "₁") => SignalResult::Win1,
        Some("2" | "²" | "₂") => SignalResult::Win2,
        _ => SignalResult::Win,
    }
}

fn classify_signal(text: &str) -> Option<Classified> {
    let asset = extract_asset(text)?;
    let timeframe = extract_timeframe(text)?;
    let direction = extract_direction(text)?;

    Some(Classified::Signal(ParsedSignal {
        asset,
        timeframe,
        direction,
        entry_time: extract_entry_time(text),
    }))
}

/// Canonical `BASE/QUOTE`, with ` OTC` appended for over-the-counter quotes.
pub fn extract_asset(text: &str) -> Option<String> {
    let caps = ASSET_SEPARATED
        .captures(text)
        .or_else(|| ASSET_COMPACT.captures(text))?;
    let base = caps.get(1)?.as_str().to_uppercase();
    let quote = caps.get(2)?.as_str().to_uppercase();
    let otc = caps.get(3).is_some();

    Some(if otc {
        format!("{}/{} OTC", base, quote)
    } else {
        format!("{}/{}", base, quote)
    })
}

/// Canonical form is unit letter then count: `M5`, `H1`, `S30`.
pub fn extract_timeframe(text: &str) -> Option<String> {
    if let Some(caps) = TIMEFRAME_PREFIXED.captures(text) {
        let unit = caps[1].to_uppercase();
        let count: u32 = caps[2].parse().ok()?;
        if count > 0 {
            return Some(format!("{}{}", unit, count));
        }
    }

    for caps in TIMEFRAME_SUFFIXED.captures_iter(text) {
        let (count, unit) = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
            (Some(count), Some(unit), _, _) => (count.as_str(), unit.as_str().to_lowercase()),
            (_, _, Some(count), Some(unit)) => (count.as_str(), unit.as_str().to_string()),
            _ => continue,
        };
        let count: u32 = match count.parse() {
            Ok(n) if n > 0 => n,
            _ => continue,
        };
        let letter = match unit.as_str() {
            "m" | "min" | "mins" | "minute" | "minutes" | "دقائق" | "دقيقة" => "M",
            "h" | "hour" | "hours" | "ساعة" => "H",
            _ => "S",
        };
        return Some(format!("{}{}", letter, count));
    }
    None
}

/// Words take precedence over emoji and Arabic markers.
pub fn extract_direction(text: &str) -> Option<Direction> {
    let caps = DIRECTION_WORD
        .captures(text)
        .or_else(|| DIRECTION_SYMBOL.captures(text))?;
    if caps.get(1).is_some() {
        Some(Direction::Call)
    } else {
        Some(Direction::Put)
    }
}

pub fn extract_entry_time(text: &str) -> Option<NaiveTime> {
    let caps = ENTRY_TIME_MARKED
        .captures(text)
        .or_else(|| ENTRY_TIME_BARE.captures(text))?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Anchor a wall-clock entry time to the day the message arrived.
///
/// Times more than 12 hours before the message refer to the next day (a
/// 23:58 message announcing a 00:01 entry).
pub fn resolve_entry_time(time: NaiveTime, received_at: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local_date = received_at.with_timezone(&tz).date_naive();
    let anchor = |date: chrono::NaiveDate| {
        let naive = date.and_time(time);
        tz.from_local_datetime(&naive)
            .earliest()
            .or_else(|| tz.from_local_datetime(&naive).latest())
            .map(|dt| dt.with_timezone(&Utc))
            // Inside a DST gap: read the wall-clock time as UTC.
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    };

    let same_day = anchor(local_date);
    if same_day < received_at - Duration::hours(12) {
        anchor(local_date + Duration::days(1))
    } else {
        same_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(text: &str) -> ParsedSignal {
        match classify(text) {
            Classified::Signal(s) => s,
            other => panic!("expected a signal for {:?}, got {:?}", text, other),
        }
    }

    fn result(text: &str) -> ParsedResult {
        match classify(text) {
            Classified::Result(r) => r,
            other => panic!("expected a result for {:?}, got {:?}", text, other),
        }
    }

    #[test]
    fn test_classic_signal_layout() {
        let parsed = signal("💰 EUR/USD OTC\n⏰ M5\n🔼 CALL\n🕐 Entry: 14:30");
        assert_eq!(parsed.asset, "EUR/USD OTC");
        assert_eq!(parsed.timeframe, "M5");
        assert_eq!(parsed.direction, Direction::Call);
        assert_eq!(parsed.entry_time, NaiveTime::from_hms_opt(14, 30, 0));
    }

    #[test]
    fn test_compact_asset_and_suffixed_timeframe() {
        let parsed = signal("GBPJPY_otc 1 min PUT");
        assert_eq!(parsed.asset, "GBP/JPY OTC");
        assert_eq!(parsed.timeframe, "M1");
        assert_eq!(parsed.direction, Direction::Put);
        assert_eq!(parsed.entry_time, None);
    }

    #[test]
    fn test_sell_maps_to_put_and_hyphen_pairs() {
        let parsed = signal("AUD-CAD H1 SELL at 09:05");
        assert_eq!(parsed.asset, "AUD/CAD");
        assert_eq!(parsed.timeframe, "H1");
        assert_eq!(parsed.direction, Direction::Put);
        assert_eq!(parsed.entry_time, NaiveTime::from_hms_opt(9, 5, 0));
    }

    #[test]
    fn test_arabic_signal() {
        let parsed = signal("الزوج: EUR/USD\nالمدة: 5 دقائق\nالاتجاه: صعود 🟢\nالدخول 21:15");
        assert_eq!(parsed.asset, "EUR/USD");
        assert_eq!(parsed.timeframe, "M5");
        assert_eq!(parsed.direction, Direction::Call);
        assert_eq!(parsed.entry_time, NaiveTime::from_hms_opt(21, 15, 0));
    }

    #[test]
    fn test_signal_needs_all_three_fields() {
        assert_eq!(classify("EUR/USD CALL"), Classified::Unclassified);
        assert_eq!(classify("EUR/USD M5"), Classified::Unclassified);
        assert_eq!(classify("M5 CALL"), Classified::Unclassified);
        assert_eq!(classify("Good morning traders!"), Classified::Unclassified);
    }

    #[test]
    fn test_result_levels() {
        assert_eq!(result("✅ WIN").result, SignalResult::Win);
        assert_eq!(result("✅ WIN¹").result, SignalResult::Win1);
        assert_eq!(result("WIN 2 ✅").result, SignalResult::Win2);
        assert_eq!(result("win (MG1)").result, SignalResult::Win1);
        assert_eq!(result("❌ LOSS").result, SignalResult::Loss);
        assert_eq!(result("ربح ✅").result, SignalResult::Win);
        assert_eq!(result("خسارة ❌").result, SignalResult::Loss);
    }

    #[test]
    fn test_compact_and_martingale_result_levels() {
        assert_eq!(result("WIN1").result, SignalResult::Win1);
        assert_eq!(result("WIN 1 ✅").result, SignalResult::Win1);
        assert_eq!(result("✅ MG1").result, SignalResult::Win1);
        assert_eq!(result("MG 2").result, SignalResult::Win2);

        let parsed = result("EUR/USD WIN2");
        assert_eq!(parsed.result, SignalResult::Win2);
        assert_eq!(parsed.asset.as_deref(), Some("EUR/USD"));
    }

    #[test]
    fn test_marker_word_before_a_pair_is_not_the_base() {
        let parsed = signal("CALL - EUR/USD M5");
        assert_eq!(parsed.asset, "EUR/USD");
        assert_eq!(parsed.direction, Direction::Call);

        let parsed = result("✅ WIN - EUR/USD");
        assert_eq!(parsed.result, SignalResult::Win);
        assert_eq!(parsed.asset.as_deref(), Some("EUR/USD"));
    }

    #[test]
    fn test_win_followed_by_a_time_is_a_plain_win() {
        assert_eq!(result("WIN 14:35").result, SignalResult::Win);
    }

    #[test]
    fn test_result_keeps_asset_hint_and_beats_signal_fields() {
        let parsed = result("EUR/USD M5 CALL ✅ WIN²");
        assert_eq!(parsed.result, SignalResult::Win2);
        assert_eq!(parsed.asset.as_deref(), Some("EUR/USD"));
    }

    #[test]
    fn test_tally_messages_are_not_results() {
        assert_eq!(classify("Today: WIN 8 / LOSS 2"), Classified::Unclassified);
    }

    #[test]
    fn test_entry_time_resolution() {
        let received = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 5).unwrap();
        let at = resolve_entry_time(NaiveTime::from_hms_opt(10, 1, 0).unwrap(), received, chrono_tz::UTC);
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 2, 10, 1, 0).unwrap());

        let late = Utc.with_ymd_and_hms(2026, 3, 2, 23, 58, 0).unwrap();
        let at = resolve_entry_time(NaiveTime::from_hms_opt(0, 1, 0).unwrap(), late, chrono_tz::UTC);
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 3, 0, 1, 0).unwrap());
    }

    #[test]
    fn test_entry_time_honours_channel_timezone() {
        // Riyadh is UTC+3 all year.
        let received = Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap();
        let at = resolve_entry_time(
            NaiveTime::from_hms_opt(14, 5, 0).unwrap(),
            received,
            chrono_tz::Asia::Riyadh,
        );
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 2, 11, 5, 0).unwrap());
    }
}
