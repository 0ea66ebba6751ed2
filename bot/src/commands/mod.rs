use chrono::{Duration, Utc};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

use crate::i18n;
use crate::services::ingest::InboundMessage;
use crate::state::{AppState, HandlerResult};

const PENDING_LIST_LIMIT: u64 = 10;

/// Signal desk commands
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Introduction
    Start,
    /// List the commands
    Help,
    /// Signal statistics for the last 24 hours
    Stats,
    /// Signals waiting for execution
    Pending,
}

pub async fn handle_command(bot: Bot, msg: Message, cmd: Command, state: Arc<AppState>) -> HandlerResult {
    let locale = i18n::get_user_language(
        msg.from.as_ref().and_then(|u| u.language_code.as_deref()),
        &state.locale,
    );
    info!("Processing /{:?} in chat {}", cmd, msg.chat.id);

    let reply = match render(&cmd, locale, &state).await {
        Ok(text) => text,
        Err(e) => {
            error!("Command {:?} failed: {:#}", cmd, e);
            i18n::translate(locale, "command_failed", None)
        }
    };

    bot.send_message(msg.chat.id, reply).parse_mode(ParseMode::Html).await?;
    Ok(())
}

async fn render(cmd: &Command, locale: &str, state: &AppState) -> Result<String, anyhow::Error> {
    let text = match cmd {
        Command::Start => i18n::translate(locale, "welcome", Some(&[("bot_name", state.bot_name.as_str())])),
        Command::Help => i18n::translate(locale, "help", None),
        Command::Stats => {
            let stats = state.signals.stats(Some(Utc::now() - Duration::hours(24))).await?;
            let (total, pending, executed, failed, wins, losses, unresolved) = (
                stats.total.to_string(),
                stats.pending.to_string(),
                stats.executed.to_string(),
                stats.failed.to_string(),
                stats.wins.to_string(),
                stats.losses.to_string(),
                stats.unresolved.to_string(),
            );
            let win_rate = format!("{:.1}", stats.win_rate);
            i18n::translate(
                locale,
                "stats",
                Some(&[
                    ("total", total.as_str()),
                    ("pending", pending.as_str()),
                    ("executed", executed.as_str()),
                    ("failed", failed.as_str()),
                    ("wins", wins.as_str()),
                    ("losses", losses.as_str()),
                    ("unresolved", unresolved.as_str()),
                    ("win_rate", win_rate.as_str()),
                ]),
            )
        }
        Command::Pending => {
            let pending = state.signals.find_pending(PENDING_LIST_LIMIT).await?;
            if pending.is_empty() {
                return Ok(i18n::translate(locale, "pending_empty", None));
            }
            let mut lines = vec![i18n::translate(locale, "pending_header", None)];
            for signal in pending {
                let id = signal.id.to_string();
                let direction = i18n::translate(locale, &format!("direction_{}", signal.direction), None);
                let received_at = signal.received_at.format("%H:%M:%S").to_string();
                lines.push(i18n::translate(
                    locale,
                    "pending_item",
                    Some(&[
                        ("id", id.as_str()),
                        ("asset", signal.asset.as_str()),
                        ("timeframe", signal.timeframe.as_str()),
                        ("direction", direction.as_str()),
                        ("received_at", received_at.as_str()),
                    ]),
                ));
            }
            lines.join("\n")
        }
    };
    Ok(text)
}

/// Messages, channel posts and edited channel posts that are not commands.
pub async fn handle_channel_message(msg: Message, state: Arc<AppState>) -> HandlerResult {
    let Some(text) = msg.text().or_else(|| msg.caption()) else {
        return Ok(());
    };
    let inbound = InboundMessage {
        message_id: msg.id.0 as i64,
        chat_id: Some(msg.chat.id.0),
        text: text.to_string(),
        received_at: Utc::now(),
    };
    // A failed write is logged; polling moves on to the next update.
    if let Err(e) = state.ingest.ingest(inbound).await {
        error!("Failed to ingest message {} from chat {}: {:#}", msg.id.0, msg.chat.id, e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/stats", "signal_bot").unwrap(), Command::Stats);
        assert_eq!(Command::parse("/pending@signal_bot", "signal_bot").unwrap(), Command::Pending);
        assert!(Command::parse("/backtest", "signal_bot").is_err());
    }
}
