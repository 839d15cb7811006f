//! Notification center served as Telegram bot commands.

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use teloxide::prelude::*;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::alerts::{AlertCenter, EMPTY_STATE};
use crate::analysis::{self, AnalysisRequest, LlmService};
use crate::model::Notification;
use crate::scheduler;
use crate::source::ProductSource;

/// Telegram rejects messages above 4096 characters.
const MESSAGE_LIMIT: usize = 4000;

static COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^/([A-Za-z_]+)(?:@\w+)?(?:\s+(.*))?$").expect("valid regex"));

const HELP: &str = "/alerts - list notifications\n\
/unread - unread count\n\
/read <id> - mark one notification read\n\
/readall - mark everything read\n\
/check - run a stock check now\n\
/parse <text> - extract data from text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Alerts,
    Unread,
    Read(String),
    ReadAll,
    Check,
    Parse(String),
    Help,
    Unknown,
}

/// Parse a slash command. Plain text yields `None`.
pub fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let Some(caps) = COMMAND.captures(trimmed) else {
        return Some(Command::Unknown);
    };
    let name = caps.get(1).map(|m| m.as_str().to_ascii_lowercase());
    let arg = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());

    let cmd = match (name.as_deref(), arg) {
        (Some("alerts"), None) => Command::Alerts,
        (Some("unread"), None) => Command::Unread,
        (Some("read"), Some(id)) if !id.contains(char::is_whitespace) => Command::Read(id),
        (Some("readall"), None) => Command::ReadAll,
        (Some("check"), None) => Command::Check,
        (Some("parse"), Some(text)) => Command::Parse(text),
        (Some("help") | Some("start"), _) => Command::Help,
        _ => Command::Unknown,
    };
    Some(cmd)
}

/// Shared state the commands operate on.
#[derive(Clone)]
pub struct BotContext {
    pub center: Arc<Mutex<AlertCenter>>,
    pub source: Arc<dyn ProductSource>,
    pub llm: Option<Arc<dyn LlmService>>,
}

#[instrument(skip_all, fields(cmd = ?cmd))]
pub async fn handle_command(ctx: &BotContext, cmd: Command) -> String {
    match cmd {
        Command::Alerts => {
            let center = ctx.center.lock().await;
            render_log(center.log().entries())
        }
        Command::Unread => {
            let center = ctx.center.lock().await;
            match center.badge_label() {
                Some(label) => format!("Unread notifications: {}", label),
                None => "No unread notifications.".to_string(),
            }
        }
        Command::Read(id) => {
            let mut center = ctx.center.lock().await;
            if center.mark_read(&id) {
                format!("Marked {} as read.", id)
            } else if center.log().get(&id).is_some() {
                format!("{} is already read.", id)
            } else {
                format!("No notification with id {}.", id)
            }
        }
        Command::ReadAll => {
            ctx.center.lock().await.mark_all_read();
            "All notifications marked as read.".to_string()
        }
        Command::Check => match scheduler::run_cycle(&ctx.center, ctx.source.as_ref()).await {
            Ok(report) => format!(
                "Stock check complete: {} new notification(s).",
                report.added
            ),
            Err(err) => {
                warn!(?err, "manual stock check failed");
                "Stock check failed: product data is unavailable.".to_string()
            }
        },
        Command::Parse(text) => {
            let Some(llm) = ctx.llm.as_ref() else {
                return "Document analysis is not configured.".to_string();
            };
            match analysis::analyze(llm.as_ref(), &AnalysisRequest::text(text)).await {
                Ok(res) => format!("{}\n\nConfidence: {}%", res.analysis, res.confidence),
                Err(failure) => format!("{} ({})", failure.analysis, failure.error),
            }
        }
        Command::Help => HELP.to_string(),
        Command::Unknown => "Unknown command.".to_string(),
    }
}

/// Newest first; unread entries carry a filled marker.
pub fn render_log(entries: &[Notification]) -> String {
    if entries.is_empty() {
        return EMPTY_STATE.to_string();
    }
    entries
        .iter()
        .map(|n| {
            format!(
                "{} [{}] {}\n{}\nid: {} | {}",
                if n.read { "○" } else { "●" },
                n.severity().as_str(),
                n.title,
                n.message,
                n.id,
                n.created_at.format("%Y-%m-%d %H:%M UTC"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Split on blank-line boundaries so every chunk fits one message.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for block in text.split("\n\n") {
        let sep = if current.is_empty() { 0 } else { 2 };
        if !current.is_empty() && current.chars().count() + sep + block.chars().count() > limit {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(block);
        while current.chars().count() > limit {
            let cut = current
                .char_indices()
                .nth(limit)
                .map(|(i, _)| i)
                .unwrap_or(current.len());
            let rest = current.split_off(cut);
            chunks.push(std::mem::replace(&mut current, rest));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[instrument(skip_all)]
pub async fn handle_update(
    bot: &Bot,
    ctx: &BotContext,
    allowed: impl Fn(i64) -> bool,
    msg: &Message,
) -> Result<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    if !allowed(user_id) {
        warn!(user_id, "ignoring message from user not in allowed_users");
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(cmd) = parse_command(text) else {
        bot.send_message(msg.chat.id, "Send /help for the list of commands.")
            .await?;
        return Ok(());
    };

    info!(user_id, ?cmd, "handling command");
    let reply = handle_command(ctx, cmd).await;
    for chunk in split_message(&reply, MESSAGE_LIMIT) {
        bot.send_message(msg.chat.id, chunk).await?;
    }
    Ok(())
}
