//! Chat command surface
//!
//! One admin chat drives everything; messages from any other chat are
//! dropped before parsing. Slash commands are dispatched here, and any
//! non-command text is fed to the user's active guided conversation.
//! Destructive operations (rollback, case deletion) go through an
//! inline-keyboard confirmation before touching the store.

use crate::analytics::AnalyticsMonitor;
use crate::error::BotError;
use crate::format::{backup_label, escape_markdown, format_file_size, truncate, MAX_MESSAGE_CHARS};
use crate::telegram::{
    CallbackQuery, InlineKeyboard, InlineKeyboardButton, Message, TelegramClient, Update,
};
use folio_content::{CaseId, CaseRecord, ContentDocument};
use folio_flow::{Conversation, FlowKind, FlowOutcome, SessionStore, Step, UserId};
use folio_store::{diff, ContentStore, DiffEntry, DiffKind, StoreError, StoreStats};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How many diff lines a message shows before summarizing the rest
const DIFF_DISPLAY_LIMIT: usize = 20;

/// Longest raw field a preview renders; cut before escaping so the
/// limit is markup-independent
const PREVIEW_FIELD_LIMIT: usize = 400;

/// Shared state handed to every handler
pub struct BotContext {
    /// Telegram client
    pub client: TelegramClient,
    /// The content store
    pub store: Arc<ContentStore>,
    /// Active guided conversations
    pub sessions: Arc<dyn SessionStore>,
    /// Analytics monitor, when Matomo is configured
    pub monitor: Option<Arc<AnalyticsMonitor>>,
    /// The only chat the bot talks to
    pub admin_chat_id: i64,
}

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` and `/help`
    Help,
    /// `/status`
    Status,
    /// `/get`
    Get,
    /// `/list_cases`
    ListCases,
    /// `/preview <id>`
    Preview(Option<String>),
    /// `/add_case`
    AddCase,
    /// `/edit_case <id>`
    EditCase(Option<String>),
    /// `/delete_case <id>`
    DeleteCase(Option<String>),
    /// `/history`
    History,
    /// `/rollback <n>`
    Rollback(Option<String>),
    /// `/diff <n> [m]`
    Diff(Option<String>, Option<String>),
    /// `/cancel`
    Cancel,
    /// `/analytics`
    Analytics,
    /// `/recent_visits`
    RecentVisits,
    /// `/analytics_start`
    AnalyticsStart,
    /// `/analytics_stop`
    AnalyticsStop,
}

impl Command {
    /// Parse a message text into a command
    ///
    /// Returns `None` for non-commands and for unknown commands; `/skip`
    /// and `/keep` are deliberately not commands, they are conversation
    /// input.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?;
        let name = head.strip_prefix('/')?;
        // Group chats append the bot's username to commands.
        let name = name.split('@').next().unwrap_or(name);
        let arg = parts.next().map(ToString::to_string);
        let second = parts.next().map(ToString::to_string);
        match name {
            "start" | "help" => Some(Self::Help),
            "status" => Some(Self::Status),
            "get" => Some(Self::Get),
            "list_cases" => Some(Self::ListCases),
            "preview" => Some(Self::Preview(arg)),
            "add_case" => Some(Self::AddCase),
            "edit_case" => Some(Self::EditCase(arg)),
            "delete_case" => Some(Self::DeleteCase(arg)),
            "history" => Some(Self::History),
            "rollback" => Some(Self::Rollback(arg)),
            "diff" => Some(Self::Diff(arg, second)),
            "cancel" => Some(Self::Cancel),
            "analytics" => Some(Self::Analytics),
            "recent_visits" => Some(Self::RecentVisits),
            "analytics_start" => Some(Self::AnalyticsStart),
            "analytics_stop" => Some(Self::AnalyticsStop),
            _ => None,
        }
    }
}

/// Route one update to its handler
///
/// # Errors
/// Only unexpected failures propagate; anything the operator can act on
/// is answered in chat instead.
pub async fn handle_update(ctx: &BotContext, update: Update) -> Result<(), BotError> {
    if let Some(message) = update.message {
        return handle_message(ctx, message).await;
    }
    if let Some(query) = update.callback_query {
        return handle_callback(ctx, query).await;
    }
    Ok(())
}

async fn handle_message(ctx: &BotContext, message: Message) -> Result<(), BotError> {
    if message.chat.id != ctx.admin_chat_id {
        debug!(chat = message.chat.id, "ignoring message from foreign chat");
        return Ok(());
    }
    let Some(user) = message.from else {
        return Ok(());
    };
    let Some(text) = message.text else {
        return Ok(());
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }

    let chat = message.chat.id;
    if let Some(command) = Command::parse(text) {
        return dispatch(ctx, chat, user.id, command).await;
    }
    if ctx.sessions.is_active(user.id) {
        return continue_conversation(ctx, chat, user.id, text).await;
    }
    ctx.client
        .send_plain(chat, "No active operation. Send /help to see what I can do.")
        .await?;
    Ok(())
}

#[allow(clippy::too_many_lines)]
async fn dispatch(
    ctx: &BotContext,
    chat: i64,
    user: UserId,
    command: Command,
) -> Result<(), BotError> {
    match command {
        Command::Help => {
            ctx.client.send_plain(chat, &render_help()).await?;
        }
        Command::Status => {
            let analytics = match &ctx.monitor {
                Some(monitor) if monitor.is_running() => "running",
                Some(_) => "stopped",
                None => "not configured",
            };
            match ctx.store.stats() {
                Ok(stats) => {
                    let backups = ctx.store.backups().list().len();
                    ctx.client
                        .send_plain(chat, &render_status(&stats, backups, analytics))
                        .await?;
                }
                Err(StoreError::NotFound { .. }) => {
                    ctx.client
                        .send_plain(chat, "No content file exists yet.")
                        .await?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Get => match ctx.store.read_raw() {
            Ok(raw) => {
                ctx.client
                    .send_document(chat, "content.json", raw.into_bytes(), "Current content")
                    .await?;
            }
            Err(StoreError::NotFound { .. }) => {
                ctx.client
                    .send_plain(chat, "No content file exists yet.")
                    .await?;
            }
            Err(err) => return Err(err.into()),
        },
        Command::ListCases => {
            let doc = ctx.store.read()?;
            ctx.client
                .send_markdown(chat, &render_case_list(&doc))
                .await?;
        }
        Command::Preview(id) => {
            let Some(id) = id else {
                ctx.client
                    .send_plain(chat, "Usage: /preview <case_id>")
                    .await?;
                return Ok(());
            };
            preview_case(ctx, chat, &id).await?;
        }
        Command::AddCase => {
            if ctx.sessions.begin(user, Conversation::add_case()).is_err() {
                ctx.client
                    .send_plain(
                        chat,
                        "You already have an operation in progress. Send /cancel to discard it first.",
                    )
                    .await?;
                return Ok(());
            }
            let conversation = ctx
                .sessions
                .get(user)
                .unwrap_or_else(Conversation::add_case);
            info!(user, "case creation started");
            ctx.client
                .send_plain(chat, &prompt_for(&conversation, Step::Id))
                .await?;
        }
        Command::EditCase(id) => {
            let Some(id) = id else {
                ctx.client
                    .send_plain(chat, "Usage: /edit_case <case_id> (see /list_cases)")
                    .await?;
                return Ok(());
            };
            start_edit(ctx, chat, user, &id).await?;
        }
        Command::DeleteCase(id) => {
            let Some(id) = id else {
                ctx.client
                    .send_plain(chat, "Usage: /delete_case <case_id>")
                    .await?;
                return Ok(());
            };
            confirm_delete(ctx, chat, &id).await?;
        }
        Command::History => {
            let names = ctx.store.backups().list();
            ctx.client.send_plain(chat, &render_history(&names)).await?;
        }
        Command::Rollback(version) => {
            confirm_rollback(ctx, chat, version.as_deref()).await?;
        }
        Command::Diff(first, second) => {
            show_diff(ctx, chat, first.as_deref(), second.as_deref()).await?;
        }
        Command::Cancel => {
            let reply = match ctx.sessions.remove(user) {
                Some(_) => {
                    info!(user, "conversation cancelled");
                    "Operation cancelled."
                }
                None => "Nothing to cancel.",
            };
            ctx.client.send_plain(chat, reply).await?;
        }
        Command::Analytics => {
            let Some(monitor) = &ctx.monitor else {
                ctx.client
                    .send_plain(chat, "Analytics is not configured.")
                    .await?;
                return Ok(());
            };
            match monitor.check_now().await {
                Ok(notes) if notes.is_empty() => {
                    ctx.client
                        .send_plain(chat, "Checked. No new visits since the last check.")
                        .await?;
                }
                Ok(notes) => {
                    let mut text = format!("Checked. {} new visit(s):\n", notes.len());
                    for note in &notes {
                        text.push_str(&format!("• {}\n", note.summary()));
                    }
                    ctx.client.send_plain(chat, &truncate(&text, MAX_MESSAGE_CHARS)).await?;
                }
                Err(err) => {
                    warn!(error = %err, "manual analytics check failed");
                    ctx.client
                        .send_plain(chat, &format!("⚠️ Analytics check failed: {err}"))
                        .await?;
                }
            }
        }
        Command::RecentVisits => {
            let Some(monitor) = &ctx.monitor else {
                ctx.client
                    .send_plain(chat, "Analytics is not configured.")
                    .await?;
                return Ok(());
            };
            let notes = monitor.recent();
            if notes.is_empty() {
                ctx.client
                    .send_plain(chat, "No visits recorded yet.")
                    .await?;
            } else {
                let mut text = String::from("Recent visits:\n");
                for note in &notes {
                    text.push_str(&format!("• {}\n", note.summary()));
                }
                ctx.client.send_plain(chat, &truncate(&text, MAX_MESSAGE_CHARS)).await?;
            }
        }
        Command::AnalyticsStart => {
            let Some(monitor) = &ctx.monitor else {
                ctx.client
                    .send_plain(chat, "Analytics is not configured.")
                    .await?;
                return Ok(());
            };
            let reply = if monitor.start(crate::config::ANALYTICS_CHECK_INTERVAL) {
                "Analytics monitoring started."
            } else {
                "Analytics monitoring is already running."
            };
            ctx.client.send_plain(chat, reply).await?;
        }
        Command::AnalyticsStop => {
            let Some(monitor) = &ctx.monitor else {
                ctx.client
                    .send_plain(chat, "Analytics is not configured.")
                    .await?;
                return Ok(());
            };
            let reply = if monitor.stop() {
                "Analytics monitoring stopped."
            } else {
                "Analytics monitoring is not running."
            };
            ctx.client.send_plain(chat, reply).await?;
        }
    }
    Ok(())
}

async fn continue_conversation(
    ctx: &BotContext,
    chat: i64,
    user: UserId,
    text: &str,
) -> Result<(), BotError> {
    let Some(mut conversation) = ctx.sessions.get(user) else {
        return Ok(());
    };
    let doc = match ctx.store.read() {
        Ok(doc) => doc,
        Err(err) => {
            warn!(error = %err, "content unreadable during conversation");
            ctx.client
                .send_plain(chat, "⚠️ The content file is unreadable right now. Try again, or /cancel.")
                .await?;
            return Ok(());
        }
    };

    let kind = conversation.kind();
    match conversation.advance(text, &doc) {
        FlowOutcome::Prompted { step } => {
            let prompt = prompt_for(&conversation, step);
            ctx.sessions.set(user, conversation);
            ctx.client.send_plain(chat, &prompt).await?;
        }
        FlowOutcome::Rejected { reason } => {
            ctx.sessions.set(user, conversation);
            ctx.client
                .send_plain(chat, &format!("⚠️ {reason}. Try again, or /cancel."))
                .await?;
        }
        FlowOutcome::Completed(record) => {
            ctx.sessions.remove(user);
            persist_record(ctx, chat, kind, &record).await?;
        }
    }
    Ok(())
}

async fn persist_record(
    ctx: &BotContext,
    chat: i64,
    kind: FlowKind,
    record: &CaseRecord,
) -> Result<(), BotError> {
    let mut doc = ctx.store.read()?;
    doc.insert_case(record);
    match ctx.store.write(&doc) {
        Ok(_) => {
            let verb = match kind {
                FlowKind::AddCase => "created",
                FlowKind::EditCase => "updated",
            };
            info!(id = record.id.as_str(), verb, "case study persisted");
            ctx.client
                .send_markdown(
                    chat,
                    &format!(
                        "✅ Case `{}` {verb}\\.\nSend /preview {} to review it\\.",
                        escape_markdown(record.id.as_str()),
                        escape_markdown(record.id.as_str())
                    ),
                )
                .await?;
        }
        Err(StoreError::Validation { errors }) => {
            warn!(?errors, "completed case failed validation");
            ctx.client
                .send_plain(
                    chat,
                    &format!("⚠️ The result failed validation and was not saved: {}", errors.join("; ")),
                )
                .await?;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn preview_case(ctx: &BotContext, chat: i64, raw_id: &str) -> Result<(), BotError> {
    let Ok(id) = CaseId::parse(raw_id) else {
        ctx.client
            .send_plain(chat, &format!("{raw_id:?} is not a valid case id."))
            .await?;
        return Ok(());
    };
    let doc = ctx.store.read()?;
    match doc.case(&id) {
        Ok(record) => {
            let text = truncate(&render_preview(&record), MAX_MESSAGE_CHARS);
            ctx.client.send_markdown(chat, &text).await?;
        }
        Err(_) => {
            ctx.client
                .send_plain(chat, &format!("No case study with id {raw_id:?}."))
                .await?;
        }
    }
    Ok(())
}

async fn start_edit(ctx: &BotContext, chat: i64, user: UserId, raw_id: &str) -> Result<(), BotError> {
    let Ok(id) = CaseId::parse(raw_id) else {
        ctx.client
            .send_plain(chat, &format!("{raw_id:?} is not a valid case id."))
            .await?;
        return Ok(());
    };
    let doc = ctx.store.read()?;
    let record = match doc.case(&id) {
        Ok(record) => record,
        Err(_) => {
            ctx.client
                .send_plain(chat, &format!("No case study with id {raw_id:?}."))
                .await?;
            return Ok(());
        }
    };
    let conversation = Conversation::edit_case(record);
    let prompt = prompt_for(&conversation, Step::Title);
    if ctx.sessions.begin(user, conversation).is_err() {
        ctx.client
            .send_plain(
                chat,
                "You already have an operation in progress. Send /cancel to discard it first.",
            )
            .await?;
        return Ok(());
    }
    info!(user, id = raw_id, "case edit started");
    ctx.client.send_plain(chat, &prompt).await?;
    Ok(())
}

async fn confirm_delete(ctx: &BotContext, chat: i64, raw_id: &str) -> Result<(), BotError> {
    let doc = ctx.store.read()?;
    if !doc.case_exists(raw_id) {
        ctx.client
            .send_plain(chat, &format!("No case study with id {raw_id:?}."))
            .await?;
        return Ok(());
    }
    let users = doc.profiles_using_case(raw_id);
    let mut text = format!("Delete case {raw_id:?}?");
    if !users.is_empty() {
        text.push_str(&format!(
            "\nIt is referenced by: {}. The reference(s) will be removed too.",
            users.join(", ")
        ));
    }
    let keyboard = InlineKeyboard::single_row(vec![
        InlineKeyboardButton::new("🗑 Delete", format!("delete_confirm_{raw_id}")),
        InlineKeyboardButton::new("Cancel", "delete_cancel"),
    ]);
    ctx.client.send_with_keyboard(chat, &text, &keyboard).await?;
    Ok(())
}

async fn confirm_rollback(
    ctx: &BotContext,
    chat: i64,
    version: Option<&str>,
) -> Result<(), BotError> {
    let names = ctx.store.backups().list();
    let Some(version) = version.and_then(|raw| raw.parse::<usize>().ok()) else {
        ctx.client
            .send_plain(chat, "Usage: /rollback <n> (see /history for versions)")
            .await?;
        return Ok(());
    };
    if version < 1 || version > names.len() {
        ctx.client
            .send_plain(
                chat,
                &format!("Version {version} does not exist; {} backup(s) available.", names.len()),
            )
            .await?;
        return Ok(());
    }
    let text = format!(
        "Restore backup #{version} from {}? The current content is snapshotted first.",
        backup_label(&names[version - 1])
    );
    let keyboard = InlineKeyboard::single_row(vec![
        InlineKeyboardButton::new("↩️ Restore", format!("rollback_confirm_{version}")),
        InlineKeyboardButton::new("Cancel", "rollback_cancel"),
    ]);
    ctx.client.send_with_keyboard(chat, &text, &keyboard).await?;
    Ok(())
}

async fn show_diff(
    ctx: &BotContext,
    chat: i64,
    first: Option<&str>,
    second: Option<&str>,
) -> Result<(), BotError> {
    let Some(first) = first.and_then(|raw| raw.parse::<usize>().ok()) else {
        ctx.client
            .send_plain(chat, "Usage: /diff <n> [m] (see /history for versions)")
            .await?;
        return Ok(());
    };
    let second = second.and_then(|raw| raw.parse::<usize>().ok());

    // Higher version numbers are older; diff always runs old -> new.
    let result = match second {
        Some(second) => {
            let older = first.max(second);
            let newer = first.min(second);
            load_pair(ctx, older, newer)
        }
        None => ctx.store.backups().load(first).and_then(|(older, name)| {
            let current = ctx.store.read()?;
            Ok((older, name, current.into_root(), "current".to_string()))
        }),
    };

    match result {
        Ok((older, older_name, newer, newer_name)) => {
            let entries = diff(&older, &newer);
            let header = format!(
                "Changes from {} to {}:",
                backup_label(&older_name),
                if newer_name == "current" {
                    newer_name
                } else {
                    backup_label(&newer_name)
                }
            );
            ctx.client
                .send_plain(chat, &format!("{header}\n{}", render_diff(&entries)))
                .await?;
        }
        Err(StoreError::VersionNotFound { requested, available }) => {
            ctx.client
                .send_plain(
                    chat,
                    &format!("Version {requested} does not exist; {available} backup(s) available."),
                )
                .await?;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn load_pair(
    ctx: &BotContext,
    older: usize,
    newer: usize,
) -> Result<(Value, String, Value, String), StoreError> {
    let (older_value, older_name) = ctx.store.backups().load(older)?;
    let (newer_value, newer_name) = ctx.store.backups().load(newer)?;
    Ok((older_value, older_name, newer_value, newer_name))
}

async fn handle_callback(ctx: &BotContext, query: CallbackQuery) -> Result<(), BotError> {
    if let Err(err) = ctx.client.answer_callback(&query.id).await {
        warn!(error = %err, "failed to acknowledge callback");
    }
    let Some(message) = query.message else {
        return Ok(());
    };
    if message.chat.id != ctx.admin_chat_id {
        return Ok(());
    }
    let Some(data) = query.data else {
        return Ok(());
    };
    let chat = message.chat.id;
    let message_id = message.message_id;

    let resolution = if let Some(raw) = data.strip_prefix("rollback_confirm_") {
        match raw.parse::<usize>() {
            Ok(version) => match ctx.store.rollback(version) {
                Ok(outcome) => {
                    info!(version, restored = %outcome.restored, "rollback confirmed");
                    format!("✅ Restored backup #{version} ({}).", backup_label(&outcome.restored))
                }
                Err(err) => {
                    warn!(error = %err, "rollback failed");
                    format!("⚠️ Rollback failed: {err}")
                }
            },
            Err(_) => "⚠️ Malformed rollback request.".to_string(),
        }
    } else if data == "rollback_cancel" {
        "Rollback cancelled.".to_string()
    } else if let Some(id) = data.strip_prefix("delete_confirm_") {
        delete_case(ctx, id)
    } else if data == "delete_cancel" {
        "Deletion cancelled.".to_string()
    } else {
        debug!(data, "unknown callback payload");
        return Ok(());
    };

    ctx.client
        .edit_message_text(chat, message_id, &resolution)
        .await?;
    Ok(())
}

fn delete_case(ctx: &BotContext, id: &str) -> String {
    let mut doc = match ctx.store.read() {
        Ok(doc) => doc,
        Err(err) => return format!("⚠️ Deletion failed: {err}"),
    };
    match doc.delete_case(id) {
        Ok(affected) => match ctx.store.write(&doc) {
            Ok(_) => {
                info!(id, ?affected, "case study deleted");
                if affected.is_empty() {
                    format!("🗑 Case {id:?} deleted.")
                } else {
                    format!(
                        "🗑 Case {id:?} deleted and unlinked from: {}.",
                        affected.join(", ")
                    )
                }
            }
            Err(err) => format!("⚠️ Deletion failed: {err}"),
        },
        Err(_) => format!("No case study with id {id:?}."),
    }
}

fn render_help() -> String {
    [
        "Portfolio content bot. Commands:",
        "",
        "/status — content overview",
        "/get — download content.json",
        "/list_cases — list case studies",
        "/preview <id> — show one case study",
        "/add_case — create a case study step by step",
        "/edit_case <id> — edit a case study (/keep keeps a field)",
        "/delete_case <id> — delete a case study",
        "/history — list backups",
        "/rollback <n> — restore backup n (1 = most recent)",
        "/diff <n> [m] — compare backups, or a backup with current",
        "/cancel — abort the current operation",
        "",
        "/analytics — check for new visits now",
        "/recent_visits — recently seen visits",
        "/analytics_start — resume periodic visit checks",
        "/analytics_stop — pause periodic visit checks",
    ]
    .join("\n")
}

fn render_status(stats: &StoreStats, backups: usize, analytics: &str) -> String {
    format!(
        "📊 Content status\nProfiles: {}\nCase studies: {}\nLast modified: {}\nFile size: {}\nBackups: {}\nAnalytics: {}",
        stats.profiles_count,
        stats.case_count,
        stats.last_modified.format("%Y-%m-%d %H:%M:%S UTC"),
        format_file_size(stats.file_size),
        backups,
        analytics
    )
}

fn render_case_list(doc: &ContentDocument) -> String {
    let Some(cases) = doc.case_studies().filter(|map| !map.is_empty()) else {
        return "No case studies yet\\. Send /add\\_case to create one\\.".to_string();
    };
    let mut lines = vec!["*Case studies:*".to_string()];
    for (id, study) in cases {
        let title = study
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("(untitled)");
        lines.push(format!(
            "• `{}` {}",
            escape_markdown(id),
            escape_markdown(&truncate(title, 60))
        ));
    }
    lines.join("\n")
}

fn render_preview(record: &CaseRecord) -> String {
    let study = &record.study;
    let details = &record.details;
    let title = if study.title.is_empty() {
        "(untitled)".to_string()
    } else {
        truncate(&study.title, 120)
    };
    let mut out = format!(
        "*{}*\n`{}`\n",
        escape_markdown(&title),
        escape_markdown(record.id.as_str())
    );
    if !study.desc.is_empty() {
        out.push_str(&format!(
            "\n{}\n",
            escape_markdown(&truncate(&study.desc, PREVIEW_FIELD_LIMIT))
        ));
    }
    if !study.metrics.is_empty() {
        out.push_str(&format!(
            "\n*Metrics:* {}",
            escape_markdown(&truncate(&study.metrics, 200))
        ));
    }
    if !study.tags.is_empty() {
        out.push_str(&format!(
            "\n*Tags:* {}",
            escape_markdown(&truncate(&study.tags.join(", "), 200))
        ));
    }
    let sections: [(&str, String); 5] = [
        ("Challenge", details.challenge.clone()),
        ("Approach", details.approach.join("\n")),
        ("Solution", details.solution.clone()),
        ("Results", details.results.join("\n")),
        ("Learnings", details.learnings.clone()),
    ];
    for (label, body) in sections {
        if !body.is_empty() {
            out.push_str(&format!(
                "\n\n*{label}:*\n{}",
                escape_markdown(&truncate(&body, PREVIEW_FIELD_LIMIT))
            ));
        }
    }
    out
}

fn render_history(names: &[String]) -> String {
    if names.is_empty() {
        return "No backups yet.".to_string();
    }
    let mut lines = vec![format!("{} backup(s), most recent first:", names.len())];
    for (index, name) in names.iter().enumerate() {
        lines.push(format!("{}. {}", index + 1, backup_label(name)));
    }
    lines.join("\n")
}

fn render_diff(entries: &[DiffEntry]) -> String {
    if entries.is_empty() {
        return "No differences.".to_string();
    }
    let mut lines: Vec<String> = entries
        .iter()
        .take(DIFF_DISPLAY_LIMIT)
        .map(|entry| {
            let symbol = match entry.kind {
                DiffKind::Added => "➕",
                DiffKind::Removed => "➖",
                DiffKind::Changed => "✏️",
            };
            format!("{symbol} {} ({})", entry.path, entry.kind)
        })
        .collect();
    if entries.len() > DIFF_DISPLAY_LIMIT {
        lines.push(format!("… and {} more", entries.len() - DIFF_DISPLAY_LIMIT));
    }
    lines.join("\n")
}

fn prompt_for(conversation: &Conversation, step: Step) -> String {
    let (current, total) = step.position(conversation.kind());
    match conversation.kind() {
        FlowKind::AddCase => {
            let hint = if step == Step::Id {
                "Lowercase letters, digits, and underscores only. The id cannot be changed later."
            } else {
                "Send /skip to leave it empty."
            };
            format!("Step {current}/{total}: enter the {}.\n{hint}", step.label())
        }
        FlowKind::EditCase => {
            let existing = conversation.draft_field(step);
            let shown = if existing.is_empty() {
                "(empty)".to_string()
            } else {
                truncate(&existing, 200)
            };
            format!(
                "Step {current}/{total}: enter the new {}.\nCurrent: {shown}\nSend /keep to leave it unchanged.",
                step.label()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use folio_content::{CaseDetails, CaseStudy};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_bare_and_suffixed_commands() {
        assert_eq!(Command::parse("/status"), Some(Command::Status));
        assert_eq!(Command::parse("/status@folio_bot"), Some(Command::Status));
        assert_eq!(Command::parse("/help"), Some(Command::Help));
        assert_eq!(Command::parse("/start"), Some(Command::Help));
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(
            Command::parse("/preview gmx_v2"),
            Some(Command::Preview(Some("gmx_v2".to_string())))
        );
        assert_eq!(
            Command::parse("/rollback 3"),
            Some(Command::Rollback(Some("3".to_string())))
        );
        assert_eq!(
            Command::parse("/diff 2 5"),
            Some(Command::Diff(Some("2".to_string()), Some("5".to_string())))
        );
        assert_eq!(Command::parse("/diff"), Some(Command::Diff(None, None)));
        assert_eq!(Command::parse("/edit_case"), Some(Command::EditCase(None)));
    }

    #[test]
    fn escape_tokens_and_plain_text_are_not_commands() {
        assert_eq!(Command::parse("/skip"), None);
        assert_eq!(Command::parse("/keep"), None);
        assert_eq!(Command::parse("/definitely_not_a_command"), None);
        assert_eq!(Command::parse("hello there"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn help_covers_the_command_surface() {
        let help = render_help();
        for command in [
            "/status",
            "/get",
            "/list_cases",
            "/preview",
            "/add_case",
            "/edit_case",
            "/delete_case",
            "/history",
            "/rollback",
            "/diff",
            "/cancel",
            "/analytics",
            "/recent_visits",
        ] {
            assert!(help.contains(command), "help is missing {command}");
        }
    }

    #[test]
    fn status_lines_up_fields() {
        let stats = StoreStats {
            profiles_count: 3,
            case_count: 5,
            last_modified: DateTime::<Utc>::from_timestamp(1_750_000_000, 0).unwrap(),
            file_size: 2048,
        };
        let text = render_status(&stats, 7, "running");
        assert!(text.contains("Profiles: 3"));
        assert!(text.contains("Case studies: 5"));
        assert!(text.contains("File size: 2.0 KiB"));
        assert!(text.contains("Backups: 7"));
        assert!(text.contains("Analytics: running"));
    }

    #[test]
    fn case_list_escapes_titles() {
        let doc = ContentDocument::new(json!({
            "GLOBAL_DATA": {
                "menu": [], "experience": {}, "skills": [],
                "case_studies": {"gmx_v2": {"title": "GMX V2 (perps!)"}}
            },
            "ACME": {"meta": {}}
        }))
        .unwrap();
        let text = render_case_list(&doc);
        assert!(text.contains("`gmx\\_v2`"));
        assert!(text.contains("GMX V2 \\(perps\\!\\)"));
    }

    #[test]
    fn empty_case_list_suggests_add() {
        let doc = ContentDocument::new(json!({
            "GLOBAL_DATA": {"menu": [], "experience": {}, "skills": []},
            "ACME": {"meta": {}}
        }))
        .unwrap();
        assert!(render_case_list(&doc).contains("No case studies yet"));
    }

    #[test]
    fn preview_includes_filled_sections_only() {
        let record = CaseRecord {
            id: CaseId::parse("gmx_v2").unwrap(),
            study: CaseStudy {
                title: "GMX V2".to_string(),
                desc: String::new(),
                metrics: "40% faster".to_string(),
                tags: vec!["defi".to_string(), "ui".to_string()],
            },
            details: CaseDetails {
                challenge: "Slow fills".to_string(),
                approach: vec![],
                solution: String::new(),
                results: vec!["r1".to_string()],
                learnings: String::new(),
            },
        };
        let text = render_preview(&record);
        assert!(text.contains("*GMX V2*"));
        assert!(text.contains("*Metrics:* 40% faster"));
        assert!(text.contains("*Tags:* defi, ui"));
        assert!(text.contains("*Challenge:*"));
        assert!(text.contains("*Results:*"));
        assert!(!text.contains("*Approach:*"));
        assert!(!text.contains("*Solution:*"));
    }

    #[test]
    fn preview_cuts_long_fields_before_escaping() {
        let record = CaseRecord {
            id: CaseId::parse("huge").unwrap(),
            study: CaseStudy {
                title: "T".repeat(500),
                desc: ".".repeat(2000),
                metrics: String::new(),
                tags: vec![],
            },
            details: CaseDetails {
                challenge: "!".repeat(2000),
                approach: vec![],
                solution: String::new(),
                results: vec![],
                learnings: String::new(),
            },
        };
        let text = render_preview(&record);
        // Cut on the raw field, so escaping cannot blow past the message
        // ceiling and no escape sequence is ever split.
        assert!(text.chars().count() < MAX_MESSAGE_CHARS);
        assert!(text.contains('…'));
        assert!(!text.contains("\\…"));
    }

    #[test]
    fn history_is_one_indexed() {
        let names = vec![
            "content-2026-08-30T12-00-00-000000Z.json".to_string(),
            "content-2026-08-29T09-30-00-000000Z.json".to_string(),
        ];
        let text = render_history(&names);
        assert!(text.starts_with("2 backup(s)"));
        assert!(text.contains("1. 2026-08-30 12:00:00 UTC"));
        assert!(text.contains("2. 2026-08-29 09:30:00 UTC"));
        assert_eq!(render_history(&[]), "No backups yet.");
    }

    #[test]
    fn diff_rendering_caps_output() {
        let entries: Vec<DiffEntry> = (0..40)
            .map(|i| DiffEntry {
                kind: DiffKind::Changed,
                path: format!("GLOBAL_DATA.field{i}"),
            })
            .collect();
        let text = render_diff(&entries);
        assert!(text.contains("… and 20 more"));
        assert!(text.contains("✏️ GLOBAL_DATA.field0 (changed)"));
        assert_eq!(render_diff(&[]), "No differences.");
    }

    #[test]
    fn prompts_differ_between_flows() {
        let add = Conversation::add_case();
        let id_prompt = prompt_for(&add, Step::Id);
        assert!(id_prompt.starts_with("Step 1/10"));
        assert!(id_prompt.contains("cannot be changed"));

        let record = CaseRecord {
            id: CaseId::parse("gmx_v2").unwrap(),
            study: CaseStudy {
                title: "Old Title".to_string(),
                ..CaseStudy::default()
            },
            details: CaseDetails::default(),
        };
        let edit = Conversation::edit_case(record);
        let title_prompt = prompt_for(&edit, Step::Title);
        assert!(title_prompt.starts_with("Step 1/9"));
        assert!(title_prompt.contains("Current: Old Title"));
        assert!(title_prompt.contains("/keep"));
    }
}
