pub mod favorites;
pub mod goals;
pub mod journal_entries;
pub mod price_alerts;
pub mod push_subscriptions;
pub mod signals;
pub mod trades;
pub mod wallets;
