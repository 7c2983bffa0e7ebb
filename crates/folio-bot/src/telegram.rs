//! Minimal Telegram Bot API client
//!
//! Covers exactly the surface the bot uses: long-polled updates, text
//! messages in plain and MarkdownV2 flavors, document uploads, inline
//! keyboards, message edits, and callback acknowledgements. Every call
//! goes through one envelope type; Telegram's `ok: false` responses
//! surface as [`BotError::Telegram`] with the API's description.

use crate::error::BotError;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Extra slack on top of the long-poll timeout before the HTTP request
/// itself is abandoned
const POLL_GRACE: Duration = Duration::from_secs(10);

/// An incoming update from `getUpdates`
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update id; the next poll offsets past it
    pub update_id: i64,
    /// Present for regular messages
    #[serde(default)]
    pub message: Option<Message>,
    /// Present for inline-keyboard button presses
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// A chat message
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message id within its chat
    pub message_id: i64,
    /// Sender; absent for channel posts
    #[serde(default)]
    pub from: Option<User>,
    /// The chat the message belongs to
    pub chat: Chat,
    /// Text content, when the message has any
    #[serde(default)]
    pub text: Option<String>,
}

/// A Telegram user
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// User id
    pub id: i64,
}

/// A Telegram chat
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat id
    pub id: i64,
}

/// An inline-keyboard button press
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    /// Query id, needed to acknowledge the press
    pub id: String,
    /// The user who pressed the button
    pub from: User,
    /// The message carrying the keyboard
    #[serde(default)]
    pub message: Option<Message>,
    /// The button's `callback_data`
    #[serde(default)]
    pub data: Option<String>,
}

/// One button of an inline keyboard
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    /// Button label
    pub text: String,
    /// Opaque payload returned in the callback query
    pub callback_data: String,
}

impl InlineKeyboardButton {
    /// Build a button
    #[must_use]
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// An inline keyboard, rows of buttons
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboard {
    /// Button rows
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboard {
    /// A single row of buttons
    #[must_use]
    pub fn single_row(buttons: Vec<InlineKeyboardButton>) -> Self {
        Self {
            inline_keyboard: vec![buttons],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboard>,
}

#[derive(Debug, Serialize)]
struct EditMessageRequest<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackRequest<'a> {
    callback_query_id: &'a str,
}

/// The Bot API client
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    /// Build a client for the given bot token
    ///
    /// # Errors
    /// [`BotError::Http`] when the underlying HTTP client cannot be
    /// constructed.
    pub fn new(token: &str) -> Result<Self, BotError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base: format!("https://api.telegram.org/bot{token}"),
        })
    }

    async fn call<T, P>(&self, method: &str, payload: &P) -> Result<T, BotError>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let response = self
            .http
            .post(format!("{}/{method}", self.base))
            .json(payload)
            .send()
            .await?;
        unwrap_envelope(method, response.json().await?)
    }

    /// Long-poll for updates after `offset`
    ///
    /// # Errors
    /// [`BotError::Http`] or [`BotError::Telegram`].
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, BotError> {
        let payload = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message", "callback_query"],
        };
        // Per-request timeout: the poll itself may legitimately hold the
        // connection open for timeout_secs.
        let response = self
            .http
            .post(format!("{}/getUpdates", self.base))
            .timeout(Duration::from_secs(timeout_secs) + POLL_GRACE)
            .json(&payload)
            .send()
            .await?;
        unwrap_envelope("getUpdates", response.json().await?)
    }

    /// Send a plain-text message
    ///
    /// # Errors
    /// [`BotError::Http`] or [`BotError::Telegram`].
    pub async fn send_plain(&self, chat_id: i64, text: &str) -> Result<Message, BotError> {
        self.call(
            "sendMessage",
            &SendMessageRequest {
                chat_id,
                text,
                parse_mode: None,
                reply_markup: None,
            },
        )
        .await
    }

    /// Send a MarkdownV2 message
    ///
    /// The caller is responsible for escaping; see
    /// [`crate::format::escape_markdown`].
    ///
    /// # Errors
    /// [`BotError::Http`] or [`BotError::Telegram`].
    pub async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<Message, BotError> {
        self.call(
            "sendMessage",
            &SendMessageRequest {
                chat_id,
                text,
                parse_mode: Some("MarkdownV2"),
                reply_markup: None,
            },
        )
        .await
    }

    /// Send a plain-text message with an inline keyboard attached
    ///
    /// # Errors
    /// [`BotError::Http`] or [`BotError::Telegram`].
    pub async fn send_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<Message, BotError> {
        self.call(
            "sendMessage",
            &SendMessageRequest {
                chat_id,
                text,
                parse_mode: None,
                reply_markup: Some(keyboard),
            },
        )
        .await
    }

    /// Upload a document from memory
    ///
    /// # Errors
    /// [`BotError::Http`] or [`BotError::Telegram`].
    pub async fn send_document(
        &self,
        chat_id: i64,
        filename: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<Message, BotError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/json")?;
        let form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);
        let response = self
            .http
            .post(format!("{}/sendDocument", self.base))
            .multipart(form)
            .send()
            .await?;
        unwrap_envelope("sendDocument", response.json().await?)
    }

    /// Replace the text of an existing message
    ///
    /// Used to resolve confirmation keyboards in place.
    ///
    /// # Errors
    /// [`BotError::Http`] or [`BotError::Telegram`].
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<Message, BotError> {
        self.call(
            "editMessageText",
            &EditMessageRequest {
                chat_id,
                message_id,
                text,
            },
        )
        .await
    }

    /// Acknowledge a callback query so the client stops its spinner
    ///
    /// # Errors
    /// [`BotError::Http`] or [`BotError::Telegram`].
    pub async fn answer_callback(&self, callback_query_id: &str) -> Result<bool, BotError> {
        self.call(
            "answerCallbackQuery",
            &AnswerCallbackRequest { callback_query_id },
        )
        .await
    }
}

fn unwrap_envelope<T>(method: &str, envelope: Envelope<T>) -> Result<T, BotError> {
    if envelope.ok {
        envelope
            .result
            .ok_or_else(|| BotError::Telegram(format!("{method}: ok response without result")))
    } else {
        Err(BotError::Telegram(
            envelope
                .description
                .unwrap_or_else(|| format!("{method} failed without description")),
        ))
    }
}
