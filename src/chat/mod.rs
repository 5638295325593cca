use crate::dashboard::WidgetDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod assistant;
pub mod intent;
pub mod responder;

/// Storage key of the chat session that is not bound to any widget.
pub const ASSISTANT_OWNER_KEY: &str = "__assistant__";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChatOwner {
    Assistant,
    Widget(String),
}

impl ChatOwner {
    pub fn storage_key(&self) -> &str {
        match self {
            Self::Assistant => ASSISTANT_OWNER_KEY,
            Self::Widget(id) => id.as_str(),
        }
    }

    pub fn from_storage_key(key: &str) -> Self {
        if key == ASSISTANT_OWNER_KEY {
            Self::Assistant
        } else {
            Self::Widget(key.to_string())
        }
    }

    pub fn widget_id(&self) -> Option<&str> {
        match self {
            Self::Assistant => None,
            Self::Widget(id) => Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    Text(String),
    Widget(WidgetDescriptor),
}

impl Suggestion {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Text(text) => text.as_str(),
            Self::Widget(widget) => widget.title.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub attached_widget: Option<WidgetDescriptor>,
    pub suggestions: Vec<Suggestion>,
}

impl ChatMessage {
    pub fn new(id: impl Into<String>, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            attached_widget: None,
            suggestions: Vec::new(),
        }
    }
}

/// Append-only transcript of one chat window.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    owner: ChatOwner,
    messages: Vec<ChatMessage>,
    awaiting_response: bool,
}

impl ChatSession {
    pub fn new(owner: ChatOwner) -> Self {
        Self::restored(owner, Vec::new())
    }

    pub fn restored(owner: ChatOwner, messages: Vec<ChatMessage>) -> Self {
        Self {
            owner,
            messages,
            awaiting_response: false,
        }
    }

    pub fn owner(&self) -> &ChatOwner {
        &self.owner
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    pub fn set_awaiting_response(&mut self, awaiting: bool) {
        self.awaiting_response = awaiting;
    }

    pub fn next_message_id(&self) -> String {
        format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            self.messages.len() + 1
        )
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &ChatMessage {
        let message = ChatMessage::new(self.next_message_id(), Sender::User, text);
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }
}
