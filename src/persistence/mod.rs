use crate::chat::{ChatMessage, ChatOwner, ChatSession, Sender};
use crate::dashboard::{LayoutRect, StoredWidget, WidgetDescriptor};
use crate::error::PersistenceError;
use crate::widgets::catalog::WidgetRegistry;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod backend;
pub mod gateway;

pub const SCHEMA_VERSION: &str = "1.0.0";
pub const STORAGE_KEY: &str = "dashboard_layout_state";

/// Persisted dashboard record. Widget content is never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub version: String,
    /// Save time in epoch milliseconds.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub components: Vec<StoredWidget>,
    #[serde(default)]
    pub layout: Vec<LayoutRect>,
    #[serde(default)]
    pub chat_messages: BTreeMap<String, Vec<StoredChatMessage>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl From<&ChatMessage> for StoredChatMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.clone(),
            text: message.text.clone(),
            sender: message.sender,
            timestamp: message.timestamp,
        }
    }
}

impl From<StoredChatMessage> for ChatMessage {
    fn from(stored: StoredChatMessage) -> Self {
        Self {
            id: stored.id,
            text: stored.text,
            sender: stored.sender,
            timestamp: stored.timestamp,
            attached_widget: None,
            suggestions: Vec::new(),
        }
    }
}

impl Snapshot {
    pub fn capture<'a>(
        widgets: &[WidgetDescriptor],
        layout: &[LayoutRect],
        chats: impl IntoIterator<Item = &'a ChatSession>,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            timestamp: saved_at.timestamp_millis(),
            components: widgets.iter().map(WidgetDescriptor::stored).collect(),
            layout: layout.to_vec(),
            chat_messages: chats
                .into_iter()
                .map(|session| {
                    (
                        session.owner().storage_key().to_string(),
                        session.messages().iter().map(StoredChatMessage::from).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    pub fn into_restored(self) -> RestoredState {
        RestoredState {
            version: self.version,
            widgets: self.components,
            layout: self.layout,
            chats: self
                .chat_messages
                .into_iter()
                .map(|(key, messages)| {
                    ChatSession::restored(
                        ChatOwner::from_storage_key(&key),
                        messages.into_iter().map(ChatMessage::from).collect(),
                    )
                })
                .collect(),
        }
    }
}

/// Decoded snapshot. Widgets still need content from the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredState {
    pub version: String,
    pub widgets: Vec<StoredWidget>,
    pub layout: Vec<LayoutRect>,
    pub chats: Vec<ChatSession>,
}

impl RestoredState {
    pub fn rehydrate(&self, registry: &WidgetRegistry) -> Vec<WidgetDescriptor> {
        self.widgets
            .iter()
            .map(|stored| WidgetDescriptor {
                id: stored.id.clone(),
                widget_type: stored.widget_type.clone(),
                title: stored.title.clone(),
                content: registry.recreate_content(&stored.widget_type, &stored.title),
            })
            .collect()
    }
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, PersistenceError> {
    serde_json::to_vec(snapshot).map_err(PersistenceError::Encode)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot, PersistenceError> {
    serde_json::from_slice(bytes).map_err(PersistenceError::Decode)
}
