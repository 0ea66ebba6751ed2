use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade direction of a binary-options signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Call,
    Put,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "call" | "buy" | "up" => Some(Self::Call),
            "put" | "sell" | "down" => Some(Self::Put),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Pending,
    Executed,
    Failed,
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Executed => "executed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "executed" => Some(Self::Executed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Outcome reported by a result message. `Win1`/`Win2` are wins reached on
/// the first or second martingale step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalResult {
    Win,
    Win1,
    Win2,
    Loss,
}

impl SignalResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Win1 => "win1",
            Self::Win2 => "win2",
            Self::Loss => "loss",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "win" => Some(Self::Win),
            "win1" => Some(Self::Win1),
            "win2" => Some(Self::Win2),
            "loss" => Some(Self::Loss),
            _ => None,
        }
    }

    pub fn is_win(&self) -> bool {
        !matches!(self, Self::Loss)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Pending,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Pending => "pending",
            Self::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "pending" => Some(Self::Pending),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
}

impl AlertCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "above" => Some(Self::Above),
            "below" => Some(Self::Below),
            _ => None,
        }
    }

    /// Whether `price` satisfies the alert against `target`. Touching the
    /// target counts.
    pub fn is_met(&self, target: f64, price: f64) -> bool {
        match self {
            Self::Above => price >= target,
            Self::Below => price <= target,
        }
    }
}

/// Realized P&L of a paper trade: linear in the price move and the position size.
pub fn profit_loss(direction: Direction, entry_price: f64, exit_price: f64, amount: f64) -> f64 {
    let move_per_unit = exit_price - entry_price;
    match direction {
        Direction::Call => move_per_unit * amount,
        Direction::Put => -move_per_unit * amount,
    }
}

/// Fields of a freshly classified signal, before it gets a row id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSignal {
    pub asset: String,
    pub timeframe: String,
    pub direction: Direction,
    pub raw_message: String,
    pub telegram_message_id: i64,
    pub chat_id: Option<i64>,
    pub entry_time: Option<DateTime<Utc>>,
    pub received_at: DateTime<Utc>,
}

/// Aggregate counters over the signal table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub total: u64,
    pub pending: u64,
    pub executed: u64,
    pub failed: u64,
    pub wins: u64,
    pub losses: u64,
    pub unresolved: u64,
    pub win_rate: f64,
}

impl SignalStats {
    /// Win rate in percent over resolved signals.
    pub fn compute_win_rate(wins: u64, losses: u64) -> f64 {
        let resolved = wins + losses;
        if resolved == 0 {
            0.0
        } else {
            (wins as f64 / resolved as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profit_loss_is_linear_and_direction_aware() {
        assert!((profit_loss(Direction::Call, 100.0, 110.0, 2.0) - 20.0).abs() < 1e-9);
        assert!((profit_loss(Direction::Put, 100.0, 110.0, 2.0) + 20.0).abs() < 1e-9);
        assert!((profit_loss(Direction::Put, 100.0, 90.0, 3.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_alert_condition_touching_target_triggers() {
        assert!(AlertCondition::Above.is_met(1.5, 1.5));
        assert!(AlertCondition::Above.is_met(1.5, 1.6));
        assert!(!AlertCondition::Above.is_met(1.5, 1.4));
        assert!(AlertCondition::Below.is_met(1.5, 1.4));
        assert!(!AlertCondition::Below.is_met(1.5, 1.6));
    }

    #[test]
    fn test_string_forms_round_trip() {
        for r in [SignalResult::Win, SignalResult::Win1, SignalResult::Win2, SignalResult::Loss] {
            assert_eq!(SignalResult::from_str(r.as_str()), Some(r));
        }
        assert_eq!(Direction::from_str("BUY"), Some(Direction::Call));
        assert_eq!(Direction::from_str("sell"), Some(Direction::Put));
        assert_eq!(SignalStatus::from_str("archived"), None);
    }

    #[test]
    fn test_win_rate() {
        assert_eq!(SignalStats::compute_win_rate(0, 0), 0.0);
        assert_eq!(SignalStats::compute_win_rate(3, 1), 75.0);
    }
}
