//! Chat-update events handed from the protocol client to the pipeline.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use chatvault_store::{Chat, Message};

/// A single event on the producer→consumer channel.
///
/// The protocol client emits one `LiveMessage` per inbound message and one
/// `HistorySync` per reconstructed conversation in a backfill batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChatEvent {
    LiveMessage(Message),
    HistorySync(Conversation),
}

impl ChatEvent {
    /// The chat row this event upserts.
    ///
    /// Live messages carry a minimal view: the sender doubles as the display
    /// name until a richer update arrives, and the message timestamp becomes
    /// the watermark.
    pub fn chat(&self) -> Chat {
        match self {
            ChatEvent::LiveMessage(msg) => Chat {
                jid: msg.chat_jid.clone(),
                name: Some(msg.sender.clone()),
                last_message_time: Some(msg.timestamp),
                ..Chat::default()
            },
            ChatEvent::HistorySync(conv) => Chat {
                jid: conv.jid.clone(),
                name: conv.name.clone(),
                last_message_time: conv.last_message_time,
                ..Chat::default()
            },
        }
    }

    /// Messages carried by the event, in delivery order.
    pub fn messages(&self) -> &[Message] {
        match self {
            ChatEvent::LiveMessage(msg) => std::slice::from_ref(msg),
            ChatEvent::HistorySync(conv) => &conv.messages,
        }
    }
}

/// A conversation reconstructed from a history-sync batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub jid: String,
    pub name: Option<String>,
    /// Maximum timestamp over the recovered messages.
    pub last_message_time: Option<DateTime<Utc>>,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Rebuild a conversation from raw history entries.
    ///
    /// Entries without a recoverable body are skipped, payload order is
    /// preserved, and the watermark is the maximum recovered timestamp.
    pub fn from_history(conv: HistoryConversation) -> Self {
        let HistoryConversation { id, name, messages: entries } = conv;

        let mut messages = Vec::new();
        let mut last_message_time: Option<DateTime<Utc>> = None;

        for entry in entries {
            let content = match entry.content() {
                Some(c) => c.to_string(),
                None => continue,
            };
            let timestamp = match Utc.timestamp_opt(entry.timestamp, 0).single() {
                Some(ts) => ts,
                None => continue,
            };
            if last_message_time.map_or(true, |t| timestamp > t) {
                last_message_time = Some(timestamp);
            }
            messages.push(Message {
                id: entry.id,
                chat_jid: id.clone(),
                sender: entry.participant.unwrap_or_default(),
                content,
                timestamp,
                is_from_me: entry.from_me,
                chat_name: None,
            });
        }

        Self {
            jid: id,
            name,
            last_message_time,
            messages,
        }
    }
}

/// Raw history-sync batch as decoded by the protocol client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryPayload {
    #[serde(default)]
    pub conversations: Vec<HistoryConversation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConversation {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub messages: Vec<HistoryEntry>,
}

/// One recovered message. Entries with neither a plain nor an extended-text
/// body are unrecoverable and skipped during reconstruction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    #[serde(default)]
    pub participant: Option<String>,
    #[serde(default)]
    pub from_me: bool,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub extended_body: Option<String>,
}

impl HistoryEntry {
    fn content(&self) -> Option<&str> {
        self.body
            .as_deref()
            .filter(|b| !b.is_empty())
            .or_else(|| self.extended_body.as_deref().filter(|b| !b.is_empty()))
    }
}

/// One `HistorySync` event per conversation in the batch. Conversations
/// without an id are dropped.
pub fn events_from_history(payload: HistoryPayload) -> Vec<ChatEvent> {
    payload
        .conversations
        .into_iter()
        .filter(|c| !c.id.is_empty())
        .map(|c| ChatEvent::HistorySync(Conversation::from_history(c)))
        .collect()
}
