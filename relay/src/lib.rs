//! Extension-side relay: polls pending signals and hands the ready ones to
//! the broker tab, then records what the tab reports back.

pub mod broker;
pub mod command;
pub mod readiness;
pub mod server;
pub mod source;
pub mod worker;

pub use broker::{BrokerTab, HttpBrokerTab, SignalPayload};
pub use command::{RelayCommand, RelayError, RelayReply, RelayStatus};
pub use source::{SignalSource, SignalStore};
pub use worker::{RelayHandle, RelaySettings, SignalRelay};
