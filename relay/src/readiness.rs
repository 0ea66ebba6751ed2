use chrono::{DateTime, Duration, Utc};
use shared::entity::signals;

/// A signal without an entry time goes out immediately; one with an entry
/// time only while `now` is within `window` of it, on either side.
pub fn is_ready(entry_time: Option<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) -> bool {
    match entry_time {
        None => true,
        Some(entry) => (now - entry).num_milliseconds().abs() <= window.num_milliseconds(),
    }
}

pub fn ready_signals<'a>(
    pending: &'a [signals::Model],
    now: DateTime<Utc>,
    window: Duration,
) -> impl Iterator<Item = &'a signals::Model> {
    pending.iter().filter(move |s| is_ready(s.entry_time, now, window))
}
