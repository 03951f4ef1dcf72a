//! SQLite-backed message store: idempotent writes and the basic reads.
//!
//! Timestamps are persisted as RFC 3339 UTC text in a single fixed format,
//! so lexicographic comparison in SQL matches chronological order and the
//! watermark equality join stays exact.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;
use crate::types::{Chat, Message};
use chatvault_core::{Error, Result};

/// Durable store for chats and messages.
///
/// All writes are insert-or-replace by primary key, so re-applying an event
/// under at-least-once delivery is safe.
pub struct MessageStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl MessageStore {
    /// Open or create the message database under `store_dir`.
    pub fn open(store_dir: impl AsRef<Path>) -> Result<Self> {
        let store_dir = store_dir.as_ref();
        std::fs::create_dir_all(store_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = store_dir.join("messages.db");

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let chat_count = store.count_chats()?;
        let message_count = store.count_messages()?;
        info!(
            "MessageStore initialized: {} chats, {} messages, path={}",
            chat_count,
            message_count,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Path of the underlying database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Insert-or-replace a chat by JID. All fields are overwritten with the
    /// supplied values; there is no partial merge.
    pub fn upsert_chat(&self, chat: &Chat) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT OR REPLACE INTO chats (jid, name, last_message_time) VALUES (?1, ?2, ?3)",
        )
        .map_err(db_err)?
        .execute(params![
            chat.jid,
            chat.name,
            chat.last_message_time.as_ref().map(encode_ts),
        ])
        .map_err(db_err)?;
        Ok(())
    }

    /// Insert-or-replace a message by `(id, chat_jid)`.
    ///
    /// Empty-content messages are dropped without an error; the write stays
    /// idempotent and safe to re-apply under at-least-once delivery.
    pub fn upsert_message(&self, msg: &Message) -> Result<()> {
        if msg.content.is_empty() {
            debug!("Skipping empty message {} in {}", msg.id, msg.chat_jid);
            return Ok(());
        }

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT OR REPLACE INTO messages \
             (id, chat_jid, sender, content, timestamp, is_from_me) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .map_err(db_err)?
        .execute(params![
            msg.id,
            msg.chat_jid,
            msg.sender,
            msg.content,
            encode_ts(&msg.timestamp),
            msg.is_from_me,
        ])
        .map_err(db_err)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// All chats, most recently active first. Chats without a watermark
    /// sort last.
    pub fn get_chats(&self) -> Result<Vec<Chat>> {
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare_cached(
                    "SELECT jid, name, last_message_time FROM chats \
                     ORDER BY last_message_time DESC",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map([], |row| ChatRow::read(row, false))
                .map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)?
        };

        rows.into_iter().map(ChatRow::into_chat).collect()
    }

    /// Look up a chat by JID. Absence is `Ok(None)`, not an error.
    pub fn get_chat(&self, jid: &str) -> Result<Option<Chat>> {
        let row = {
            let conn = self.conn.lock();
            conn.prepare_cached(
                "SELECT jid, name, last_message_time FROM chats WHERE jid = ?1",
            )
            .map_err(db_err)?
            .query_row(params![jid], |row| ChatRow::read(row, false))
            .optional()
            .map_err(db_err)?
        };

        row.map(ChatRow::into_chat).transpose()
    }

    /// Most recent messages in a chat, newest first, capped at `limit`.
    pub fn get_messages(&self, chat_jid: &str, limit: i64) -> Result<Vec<Message>> {
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare_cached(
                    "SELECT id, chat_jid, sender, content, timestamp, is_from_me \
                     FROM messages WHERE chat_jid = ?1 \
                     ORDER BY timestamp DESC LIMIT ?2",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map(params![chat_jid, limit], |row| MessageRow::read(row, false))
                .map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)?
        };

        rows.into_iter().map(MessageRow::into_message).collect()
    }

    /// Total chat rows.
    pub fn count_chats(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM chats", [], |row| row.get(0))
            .map_err(db_err)
    }

    /// Total message rows.
    pub fn count_messages(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .map_err(db_err)
    }
}

// ---------------------------------------------------------------
// Row Mapping Helpers
// ---------------------------------------------------------------

pub(crate) fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

/// Encode a timestamp for storage and for SQL comparisons. The format is
/// fixed-width so string order equals time order.
pub(crate) fn encode_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored timestamp. Failure surfaces as a malformed-record error,
/// distinct from a database failure.
pub(crate) fn decode_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Malformed(format!("bad timestamp {:?}: {}", raw, e)))
}

/// A chat row as read from SQL, timestamps still encoded.
pub(crate) struct ChatRow {
    jid: String,
    name: Option<String>,
    last_message_time: Option<String>,
    last_message: Option<String>,
    last_sender: Option<String>,
    last_is_from_me: Option<bool>,
}

impl ChatRow {
    /// Columns: jid, name, last_message_time [, last_message, last_sender,
    /// last_is_from_me].
    pub(crate) fn read(row: &rusqlite::Row<'_>, with_last_message: bool) -> rusqlite::Result<Self> {
        Ok(Self {
            jid: row.get(0)?,
            name: row.get(1)?,
            last_message_time: row.get(2)?,
            last_message: if with_last_message { row.get(3)? } else { None },
            last_sender: if with_last_message { row.get(4)? } else { None },
            last_is_from_me: if with_last_message { row.get(5)? } else { None },
        })
    }

    pub(crate) fn into_chat(self) -> Result<Chat> {
        let last_message_time = self
            .last_message_time
            .as_deref()
            .map(decode_ts)
            .transpose()?;
        Ok(Chat {
            jid: self.jid,
            name: self.name,
            last_message_time,
            last_message: self.last_message,
            last_sender: self.last_sender,
            last_is_from_me: self.last_is_from_me,
        })
    }
}

/// A message row as read from SQL, timestamp still encoded.
pub(crate) struct MessageRow {
    id: String,
    chat_jid: String,
    sender: String,
    content: String,
    timestamp: String,
    is_from_me: bool,
    chat_name: Option<String>,
}

impl MessageRow {
    /// Columns: id, chat_jid, sender, content, timestamp, is_from_me
    /// [, chat_name].
    pub(crate) fn read(row: &rusqlite::Row<'_>, with_chat_name: bool) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            chat_jid: row.get(1)?,
            sender: row.get(2)?,
            content: row.get(3)?,
            timestamp: row.get(4)?,
            is_from_me: row.get(5)?,
            chat_name: if with_chat_name { row.get(6)? } else { None },
        })
    }

    /// The raw stored timestamp, used as an anchor for window queries.
    pub(crate) fn raw_timestamp(&self) -> &str {
        &self.timestamp
    }

    pub(crate) fn chat_jid(&self) -> &str {
        &self.chat_jid
    }

    pub(crate) fn into_message(self) -> Result<Message> {
        let timestamp = decode_ts(&self.timestamp)?;
        Ok(Message {
            id: self.id,
            chat_jid: self.chat_jid,
            sender: self.sender,
            content: self.content,
            timestamp,
            is_from_me: self.is_from_me,
            chat_name: self.chat_name,
        })
    }
}
