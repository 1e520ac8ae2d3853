use std::path::PathBuf;

use crate::domain::order::Order;

use super::action::Action;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    None,
    /// The persistent main menu under the input field.
    MainMenu,
    /// Buttons attached to the message, one inner `Vec` per row.
    Inline(Vec<Vec<Button>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Message { text: String, keyboard: Keyboard },
    /// Short non-fatal message; the conversation stays where it was.
    Notice(String),
    Document { path: PathBuf, caption: String },
}

impl Reply {
    pub fn message(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Reply::Message {
            text: text.into(),
            keyboard,
        }
    }
}

/// What handling one action produced.
#[derive(Debug, Default)]
pub struct Outcome {
    pub replies: Vec<Reply>,
    /// Set when the action completed an order; it is already persisted.
    pub placed: Option<Order>,
}

impl Outcome {
    pub fn reply(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            placed: None,
        }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::reply(Reply::Notice(text.into()))
    }
}
