pub mod alert_repository;
pub mod favorite_repository;
pub mod goal_repository;
pub mod journal_repository;
pub mod push_repository;
pub mod signal_repository;
pub mod trade_repository;

pub use alert_repository::{AlertPatch, AlertRepository, NewAlert};
pub use favorite_repository::FavoriteRepository;
pub use goal_repository::{GoalPatch, GoalRepository, NewGoal};
pub use journal_repository::{JournalPatch, JournalRepository, NewJournalEntry};
pub use push_repository::{PushSubscriptionRepository, SubscriptionKeys};
pub use signal_repository::{InsertOutcome, SignalRepository};
pub use trade_repository::{CloseOutcome, ClosedTrade, NewTrade, TradeRepository};
