//! Server-Sent Events stream of row changes for one table

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::{self, Stream};
use shared::ChangeEvent;
use std::convert::Infallible;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const TABLES: [&str; 8] = [
    "signals",
    "trades",
    "wallets",
    "push_subscriptions",
    "price_alerts",
    "favorites",
    "journal_entries",
    "goals",
];

pub fn router() -> Router<AppState> {
    Router::new().route("/api/realtime/:table", get(subscribe))
}

async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(table): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if !TABLES.contains(&table.as_str()) {
        return Err(ApiError::BadRequest("error_unknown_table"));
    }
    debug!("{} subscribed to {} changes", user, table);
    let events = change_stream(state.changes.subscribe(), table, user);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Events for `table` visible to `user`, until the sender goes away.
pub fn change_stream(
    rx: broadcast::Receiver<ChangeEvent>,
    table: String,
    user: Uuid,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, move |mut rx| {
        let table = table.clone();
        async move {
            loop {
                match rx.recv().await {
                    Ok(change) if change.table == table && change.visible_to(user) => {
                        let event = Event::default()
                            .event("change")
                            .json_data(&change)
                            .unwrap_or_else(|_| Event::default().event("change"));
                        return Some((Ok(event), rx));
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        // The client re-fetches on the next event anyway.
                        warn!("Realtime subscriber lagged, {} changes skipped", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }
    })
}
