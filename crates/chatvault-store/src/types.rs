//! Model types for chats, messages, and the derived read-side views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain suffix marking a group conversation.
pub const GROUP_SUFFIX: &str = "@g.us";

/// Default domain for direct-chat JIDs.
pub const USER_SERVER: &str = "s.whatsapp.net";

/// A conversation, keyed by JID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chat {
    pub jid: String,
    pub name: Option<String>,
    /// Watermark used for default ordering and the last-message join.
    pub last_message_time: Option<DateTime<Utc>>,
    /// Populated by include-last-message reads; never stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_is_from_me: Option<bool>,
}

impl Chat {
    /// Group chats use the reserved `@g.us` domain suffix.
    pub fn is_group(&self) -> bool {
        self.jid.ends_with(GROUP_SUFFIX)
    }
}

/// A single message within a chat. `id` is assigned by the sending device
/// per conversation, so it is only unique together with `chat_jid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_jid: String,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_from_me: bool,
    /// Chat display name, populated by joined reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_name: Option<String>,
}

/// A contact synthesized from direct-chat rows at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub phone_number: String,
    pub name: Option<String>,
    pub jid: String,
}

/// A message together with its surrounding conversation window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageContext {
    pub message: Message,
    pub before: Vec<Message>,
    pub after: Vec<Message>,
}

/// The part of a JID before the domain separator.
pub fn local_part(jid: &str) -> &str {
    jid.split('@').next().unwrap_or(jid)
}
