//! Minimal Telegram Bot API client: the handful of methods the bot uses.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::conversation::{texts, Keyboard};
use crate::domain::errors::DomainError;
use crate::domain::order::Customer;
use crate::domain::ports::Notifier;

/// Extra time on top of the long-poll timeout before the request itself
/// gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    pub fn customer(&self) -> Customer {
        let full_name = match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        };
        Customer {
            user_id: self.id,
            username: self.username.clone(),
            full_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

pub struct TelegramClient {
    http: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        }
    }

    fn method(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        name: &str,
        request: RequestBuilder,
    ) -> Result<T, DomainError> {
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::Transient(format!("{}: {}", name, e)))?;
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| DomainError::Transient(format!("{}: {}", name, e)))?;

        match body {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(DomainError::Transient(format!(
                "{}: {}",
                name,
                description.unwrap_or_else(|| "request rejected".to_string())
            ))),
        }
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, DomainError> {
        let request = self
            .http
            .post(self.method("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs) + POLL_GRACE)
            .json(&json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }));
        self.call("getUpdates", request).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), DomainError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = reply_markup(keyboard) {
            body["reply_markup"] = markup;
        }

        let request = self.http.post(self.method("sendMessage")).json(&body);
        self.call::<Value>("sendMessage", request).await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), DomainError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = Value::from(text);
        }

        let request = self.http.post(self.method("answerCallbackQuery")).json(&body);
        self.call::<Value>("answerCallbackQuery", request).await?;
        Ok(())
    }

    pub async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
    ) -> Result<(), DomainError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DomainError::Internal(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "report.pdf".to_string(), |n| n.to_string_lossy().into_owned());

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", "HTML")
            .part("document", Part::bytes(bytes).file_name(file_name));

        let request = self.http.post(self.method("sendDocument")).multipart(form);
        self.call::<Value>("sendDocument", request).await?;
        Ok(())
    }
}

fn reply_markup(keyboard: &Keyboard) -> Option<Value> {
    match keyboard {
        Keyboard::None => None,
        Keyboard::MainMenu => Some(json!({
            "keyboard": [
                [{ "text": texts::NEW_ORDER_LABEL }],
                [{ "text": texts::MY_ORDERS_LABEL }, { "text": texts::HELP_LABEL }],
            ],
            "resize_keyboard": true,
        })),
        Keyboard::Inline(rows) => {
            let rows: Vec<Value> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .filter_map(|button| {
                            button.action.callback_data().map(|data| {
                                json!({ "text": button.label, "callback_data": data })
                            })
                        })
                        .collect()
                })
                .collect();
            Some(json!({ "inline_keyboard": rows }))
        }
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DomainError> {
        self.send_message(chat_id, text, &Keyboard::None).await
    }

    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
    ) -> Result<(), DomainError> {
        TelegramClient::send_document(self, chat_id, path, caption).await
    }
}
