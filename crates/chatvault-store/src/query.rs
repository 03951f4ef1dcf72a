//! Read-side query engine: filtered, paginated views over the store.
//!
//! Every operation compiles into a single parameterized statement. All
//! listings share one pagination contract: a non-positive limit falls back
//! to the default page size, a negative page clamps to zero, and the offset
//! is `page * limit`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, ToSql};
use serde::{Deserialize, Serialize};

use crate::sqlite::{db_err, encode_ts, ChatRow, MessageRow, MessageStore};
use crate::types::{local_part, Chat, Contact, Message, MessageContext, GROUP_SUFFIX, USER_SERVER};
use chatvault_core::{Error, Result};

/// Default page size for chat and message listings.
const DEFAULT_PAGE_SIZE: i64 = 20;

/// Default cap for `recent_messages`.
const DEFAULT_RECENT_LIMIT: i64 = 10;

/// Cap on contact search results.
const CONTACT_SEARCH_LIMIT: i64 = 50;

/// Message columns selected by every joined read, chat name last.
const MESSAGE_COLS: &str =
    "m.id, m.chat_jid, m.sender, m.content, m.timestamp, m.is_from_me, c.name";

/// Filter for [`QueryEngine::list_messages`]. Predicates are ANDed when
/// present; the time range is inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Exact sender match.
    pub sender: Option<String>,
    /// Exact chat match.
    pub chat_jid: Option<String>,
    /// Case-insensitive substring over message content.
    pub query: Option<String>,
    pub limit: i64,
    pub page: i64,
    /// Expand each match into its surrounding window.
    pub include_context: bool,
    pub context_before: i64,
    pub context_after: i64,
}

/// Filter for [`QueryEngine::list_chats`].
#[derive(Debug, Clone, Default)]
pub struct ChatFilter {
    /// Case-insensitive substring over chat name or JID.
    pub query: Option<String>,
    pub limit: i64,
    pub page: i64,
    /// Attach the message whose timestamp equals the chat watermark.
    pub include_last_message: bool,
    pub sort_by: ChatSort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatSort {
    #[default]
    LastActive,
    Name,
}

/// Read-only operations against the message store.
///
/// Constructed over an explicitly owned store handle; readers may run
/// concurrently with the ingestion pipeline since all state lives in the
/// store.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<MessageStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self { store }
    }

    /// The underlying store, for the basic unfiltered reads.
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    // ---------------------------------------------------------------
    // Messages
    // ---------------------------------------------------------------

    /// List messages matching `filter`, newest first, with chat names
    /// attached.
    ///
    /// With `include_context`, every match is expanded in place into
    /// `(before..., match, after...)` and the expansions are concatenated in
    /// match order. Windows of adjacent matches may overlap; the result is
    /// not re-sorted or deduplicated (see DESIGN.md).
    pub fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>> {
        let (limit, offset) = page_bounds(filter.limit, filter.page, DEFAULT_PAGE_SIZE);

        let mut sql = format!(
            "SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid",
            MESSAGE_COLS
        );
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some((start, end)) = &filter.date_range {
            clauses.push("m.timestamp BETWEEN ? AND ?");
            args.push(Box::new(encode_ts(start)));
            args.push(Box::new(encode_ts(end)));
        }
        if let Some(sender) = &filter.sender {
            clauses.push("m.sender = ?");
            args.push(Box::new(sender.clone()));
        }
        if let Some(chat_jid) = &filter.chat_jid {
            clauses.push("m.chat_jid = ?");
            args.push(Box::new(chat_jid.clone()));
        }
        if let Some(query) = &filter.query {
            clauses.push("LOWER(m.content) LIKE LOWER(?)");
            args.push(Box::new(format!("%{}%", query)));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY m.timestamp DESC LIMIT ? OFFSET ?");
        args.push(Box::new(limit));
        args.push(Box::new(offset));

        let matches = {
            let conn = self.store.conn();
            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            let rows = stmt
                .query_map(params_from_iter(args.iter().map(|a| a.as_ref())), |row| {
                    MessageRow::read(row, true)
                })
                .map_err(db_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err)?;
            rows_to_messages(rows)?
        };

        if !filter.include_context || matches.is_empty() {
            return Ok(matches);
        }

        let mut expanded = Vec::new();
        for msg in &matches {
            let ctx = match self.message_context(
                &msg.id,
                filter.context_before,
                filter.context_after,
            ) {
                Ok(ctx) => ctx,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            expanded.extend(ctx.before);
            expanded.push(ctx.message);
            expanded.extend(ctx.after);
        }
        Ok(expanded)
    }

    /// The message with `message_id` plus up to `before`/`after` neighbors
    /// in the same chat, both sides ascending by timestamp and never padded.
    ///
    /// The target is looked up by id alone, taking the first storage match.
    /// Fails with `NotFound` when no row carries the id.
    pub fn message_context(
        &self,
        message_id: &str,
        before: i64,
        after: i64,
    ) -> Result<MessageContext> {
        let before = before.max(0);
        let after = after.max(0);

        let conn = self.store.conn();

        let target = {
            let mut stmt = conn
                .prepare_cached(&format!(
                    "SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid \
                     WHERE m.id = ?1 LIMIT 1",
                    MESSAGE_COLS
                ))
                .map_err(db_err)?;
            stmt.query_row(params![message_id], |row| MessageRow::read(row, true))
                .optional()
                .map_err(db_err)?
                .ok_or_else(|| Error::NotFound(format!("message {}", message_id)))?
        };

        // Window bounds compare the stored timestamp encoding directly.
        let anchor = target.raw_timestamp().to_string();
        let chat_jid = target.chat_jid().to_string();

        let mut before_msgs = {
            let mut stmt = conn
                .prepare_cached(&format!(
                    "SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid \
                     WHERE m.chat_jid = ?1 AND m.timestamp < ?2 \
                     ORDER BY m.timestamp DESC LIMIT ?3",
                    MESSAGE_COLS
                ))
                .map_err(db_err)?;
            let rows = stmt
                .query_map(params![chat_jid, anchor, before], |row| {
                    MessageRow::read(row, true)
                })
                .map_err(db_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err)?;
            rows_to_messages(rows)?
        };
        before_msgs.reverse();

        let after_msgs = {
            let mut stmt = conn
                .prepare_cached(&format!(
                    "SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid \
                     WHERE m.chat_jid = ?1 AND m.timestamp > ?2 \
                     ORDER BY m.timestamp ASC LIMIT ?3",
                    MESSAGE_COLS
                ))
                .map_err(db_err)?;
            let rows = stmt
                .query_map(params![chat_jid, anchor, after], |row| {
                    MessageRow::read(row, true)
                })
                .map_err(db_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err)?;
            rows_to_messages(rows)?
        };

        Ok(MessageContext {
            message: target.into_message()?,
            before: before_msgs,
            after: after_msgs,
        })
    }

    /// Newest messages across all chats, with chat names attached.
    pub fn recent_messages(&self, limit: i64) -> Result<Vec<Message>> {
        let limit = if limit <= 0 { DEFAULT_RECENT_LIMIT } else { limit };

        let conn = self.store.conn();
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid \
                 ORDER BY m.timestamp DESC LIMIT ?1",
                MESSAGE_COLS
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![limit], |row| MessageRow::read(row, true))
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        rows_to_messages(rows)
    }

    /// Most recent message exchanged with the contact: the chat JID matches
    /// exactly, or the sender matches the JID's local part exactly or as a
    /// substring. Fails with `NotFound` when no such message exists.
    pub fn last_interaction(&self, jid: &str) -> Result<Message> {
        let phone = local_part(jid);

        let conn = self.store.conn();
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid \
                 WHERE m.chat_jid = ?1 OR m.sender = ?2 OR m.sender LIKE ?3 \
                 ORDER BY m.timestamp DESC LIMIT 1",
                MESSAGE_COLS
            ))
            .map_err(db_err)?;
        let row = stmt
            .query_row(params![jid, phone, format!("%{}%", phone)], |row| {
                MessageRow::read(row, true)
            })
            .optional()
            .map_err(db_err)?
            .ok_or_else(|| Error::NotFound(format!("no messages for contact {}", jid)))?;

        row.into_message()
    }

    // ---------------------------------------------------------------
    // Chats
    // ---------------------------------------------------------------

    /// List chats matching `filter`.
    ///
    /// The last message is located by timestamp equality with the chat
    /// watermark; a watermark that matches no stored message yields an
    /// absent last message.
    pub fn list_chats(&self, filter: &ChatFilter) -> Result<Vec<Chat>> {
        let (limit, offset) = page_bounds(filter.limit, filter.page, DEFAULT_PAGE_SIZE);

        let mut sql = String::from("SELECT c.jid, c.name, c.last_message_time");
        if filter.include_last_message {
            sql.push_str(", m.content, m.sender, m.is_from_me");
        }
        sql.push_str(" FROM chats c");
        if filter.include_last_message {
            sql.push_str(
                " LEFT JOIN messages m \
                 ON c.jid = m.chat_jid AND c.last_message_time = m.timestamp",
            );
        }

        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(query) = &filter.query {
            sql.push_str(" WHERE (LOWER(c.name) LIKE LOWER(?) OR LOWER(c.jid) LIKE LOWER(?))");
            let pattern = format!("%{}%", query);
            args.push(Box::new(pattern.clone()));
            args.push(Box::new(pattern));
        }

        sql.push_str(match filter.sort_by {
            ChatSort::LastActive => " ORDER BY c.last_message_time DESC",
            ChatSort::Name => " ORDER BY c.name",
        });
        sql.push_str(" LIMIT ? OFFSET ?");
        args.push(Box::new(limit));
        args.push(Box::new(offset));

        let rows = {
            let conn = self.store.conn();
            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            stmt.query_map(params_from_iter(args.iter().map(|a| a.as_ref())), |row| {
                ChatRow::read(row, filter.include_last_message)
            })
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?
        };

        rows.into_iter().map(ChatRow::into_chat).collect()
    }

    /// Single chat by JID, optionally enriched with its last message.
    ///
    /// Unlike the store-level lookup, a missing chat is `NotFound` here so
    /// front ends can map it onto their own missing-entity response.
    pub fn get_chat(&self, jid: &str, include_last_message: bool) -> Result<Chat> {
        let sql = if include_last_message {
            "SELECT c.jid, c.name, c.last_message_time, m.content, m.sender, m.is_from_me \
             FROM chats c \
             LEFT JOIN messages m ON c.jid = m.chat_jid AND c.last_message_time = m.timestamp \
             WHERE c.jid = ?1"
        } else {
            "SELECT c.jid, c.name, c.last_message_time FROM chats c WHERE c.jid = ?1"
        };

        let row = {
            let conn = self.store.conn();
            let mut stmt = conn.prepare_cached(sql).map_err(db_err)?;
            stmt.query_row(params![jid], |row| ChatRow::read(row, include_last_message))
                .optional()
                .map_err(db_err)?
                .ok_or_else(|| Error::NotFound(format!("chat {}", jid)))?
        };

        row.into_chat()
    }

    /// Direct chat for a phone number; bare numbers get the user domain
    /// appended.
    pub fn direct_chat_by_contact(&self, phone_number: &str) -> Result<Chat> {
        let jid = if phone_number.contains('@') {
            phone_number.to_string()
        } else {
            format!("{}@{}", phone_number, USER_SERVER)
        };
        self.get_chat(&jid, true)
    }

    /// Chats involving a contact: the chat JID matches exactly, or some
    /// message's sender matches the JID's local part exactly or as a
    /// substring. One row per chat, most recently active first.
    pub fn contact_chats(&self, jid: &str, limit: i64, page: i64) -> Result<Vec<Chat>> {
        let (limit, offset) = page_bounds(limit, page, DEFAULT_PAGE_SIZE);
        let phone = local_part(jid);

        let rows = {
            let conn = self.store.conn();
            let mut stmt = conn
                .prepare_cached(
                    "SELECT c.jid, c.name, c.last_message_time, \
                            lm.content, lm.sender, lm.is_from_me \
                     FROM chats c \
                     LEFT JOIN messages lm \
                       ON c.jid = lm.chat_jid AND c.last_message_time = lm.timestamp \
                     JOIN messages m ON c.jid = m.chat_jid \
                     WHERE c.jid = ?1 OR m.sender = ?2 OR m.sender LIKE ?3 \
                     GROUP BY c.jid \
                     ORDER BY c.last_message_time DESC \
                     LIMIT ?4 OFFSET ?5",
                )
                .map_err(db_err)?;
            stmt.query_map(
                params![jid, phone, format!("%{}%", phone), limit, offset],
                |row| ChatRow::read(row, true),
            )
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?
        };

        rows.into_iter().map(ChatRow::into_chat).collect()
    }

    // ---------------------------------------------------------------
    // Contacts
    // ---------------------------------------------------------------

    /// Up to 50 distinct non-group chats whose name or JID contains the
    /// query, case-insensitively, ordered by name then JID. The phone number
    /// is the JID truncated at its domain separator.
    pub fn search_contacts(&self, query: &str) -> Result<Vec<Contact>> {
        let pattern = format!("%{}%", query);
        let group_pattern = format!("%{}", GROUP_SUFFIX);

        let conn = self.store.conn();
        let mut stmt = conn
            .prepare_cached(
                "SELECT jid, name FROM chats \
                 WHERE (LOWER(name) LIKE LOWER(?1) OR LOWER(jid) LIKE LOWER(?1)) \
                   AND jid NOT LIKE ?2 \
                 GROUP BY jid \
                 ORDER BY name, jid \
                 LIMIT ?3",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(
                params![pattern, group_pattern, CONTACT_SEARCH_LIMIT],
                |row| {
                    let jid: String = row.get(0)?;
                    let name: Option<String> = row.get(1)?;
                    Ok((jid, name))
                },
            )
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(jid, name)| Contact {
                phone_number: local_part(&jid).to_string(),
                name,
                jid,
            })
            .collect())
    }
}

/// Normalize limit/page and return `(limit, offset)`.
fn page_bounds(limit: i64, page: i64, default_limit: i64) -> (i64, i64) {
    let limit = if limit <= 0 { default_limit } else { limit };
    let page = page.max(0);
    (limit, page * limit)
}

fn rows_to_messages(rows: Vec<MessageRow>) -> Result<Vec<Message>> {
    rows.into_iter().map(MessageRow::into_message).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn test_engine() -> (QueryEngine, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MessageStore::open(dir.path()).unwrap());
        (QueryEngine::new(store), dir)
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn seed_chat(engine: &QueryEngine, jid: &str, name: &str, last: Option<i64>) {
        engine
            .store()
            .upsert_chat(&Chat {
                jid: jid.into(),
                name: Some(name.into()),
                last_message_time: last.map(ts),
                ..Chat::default()
            })
            .unwrap();
    }

    fn seed_message(
        engine: &QueryEngine,
        id: &str,
        chat_jid: &str,
        sender: &str,
        content: &str,
        at: i64,
    ) {
        engine
            .store()
            .upsert_message(&Message {
                id: id.into(),
                chat_jid: chat_jid.into(),
                sender: sender.into(),
                content: content.into(),
                timestamp: ts(at),
                is_from_me: false,
                chat_name: None,
            })
            .unwrap();
    }

    /// One chat with five messages at t = 10..50.
    fn seed_window_chat(engine: &QueryEngine) {
        seed_chat(engine, "a@s.whatsapp.net", "Alice", Some(50));
        for (i, at) in [10, 20, 30, 40, 50].iter().enumerate() {
            seed_message(
                engine,
                &format!("m{}", i + 1),
                "a@s.whatsapp.net",
                "33611111111@s.whatsapp.net",
                &format!("message at {}", at),
                *at,
            );
        }
    }

    #[test]
    fn test_context_window_around_target() {
        let (engine, _dir) = test_engine();
        seed_window_chat(&engine);

        let ctx = engine.message_context("m3", 2, 1).unwrap();
        assert_eq!(ctx.message.timestamp, ts(30));

        let before: Vec<_> = ctx.before.iter().map(|m| m.timestamp).collect();
        let after: Vec<_> = ctx.after.iter().map(|m| m.timestamp).collect();
        assert_eq!(before, [ts(10), ts(20)]);
        assert_eq!(after, [ts(40)]);
    }

    #[test]
    fn test_context_window_at_earliest_message() {
        let (engine, _dir) = test_engine();
        seed_window_chat(&engine);

        let ctx = engine.message_context("m1", 5, 1).unwrap();
        assert!(ctx.before.is_empty());
        assert_eq!(ctx.after.len(), 1);
    }

    #[test]
    fn test_context_stays_within_chat() {
        let (engine, _dir) = test_engine();
        seed_window_chat(&engine);
        seed_chat(&engine, "b@s.whatsapp.net", "Bob", Some(35));
        seed_message(
            &engine,
            "other",
            "b@s.whatsapp.net",
            "33622222222@s.whatsapp.net",
            "from another chat",
            35,
        );

        let ctx = engine.message_context("m3", 5, 5).unwrap();
        assert!(ctx.before.iter().all(|m| m.chat_jid == "a@s.whatsapp.net"));
        assert!(ctx.after.iter().all(|m| m.chat_jid == "a@s.whatsapp.net"));
    }

    #[test]
    fn test_context_unknown_id_is_not_found() {
        let (engine, _dir) = test_engine();
        seed_window_chat(&engine);

        let err = engine.message_context("unknown-id", 1, 1).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_messages_pagination() {
        let (engine, _dir) = test_engine();
        seed_window_chat(&engine);

        let filter = MessageFilter {
            chat_jid: Some("a@s.whatsapp.net".into()),
            limit: 2,
            page: 1,
            ..MessageFilter::default()
        };
        let msgs = engine.list_messages(&filter).unwrap();

        // Descending ranks: 50, 40 | 30, 20 | 10. Page 1 is the middle two.
        let at: Vec<_> = msgs.iter().map(|m| m.timestamp).collect();
        assert_eq!(at, [ts(30), ts(20)]);
    }

    #[test]
    fn test_list_messages_normalizes_bad_bounds() {
        let (engine, _dir) = test_engine();
        seed_window_chat(&engine);

        let filter = MessageFilter {
            limit: -3,
            page: -2,
            ..MessageFilter::default()
        };
        let msgs = engine.list_messages(&filter).unwrap();
        assert_eq!(msgs.len(), 5);
        assert_eq!(msgs[0].timestamp, ts(50));
    }

    #[test]
    fn test_list_messages_filters_combine() {
        let (engine, _dir) = test_engine();
        seed_window_chat(&engine);
        seed_chat(&engine, "b@s.whatsapp.net", "Bob", Some(25));
        seed_message(
            &engine,
            "b1",
            "b@s.whatsapp.net",
            "33622222222@s.whatsapp.net",
            "Message At 25",
            25,
        );

        // Range + content substring, case-insensitive, scoped to one chat.
        let filter = MessageFilter {
            date_range: Some((ts(20), ts(30))),
            query: Some("MESSAGE AT".into()),
            chat_jid: Some("a@s.whatsapp.net".into()),
            ..MessageFilter::default()
        };
        let msgs = engine.list_messages(&filter).unwrap();
        let at: Vec<_> = msgs.iter().map(|m| m.timestamp).collect();
        assert_eq!(at, [ts(30), ts(20)]);

        // Exact sender.
        let filter = MessageFilter {
            sender: Some("33622222222@s.whatsapp.net".into()),
            ..MessageFilter::default()
        };
        let msgs = engine.list_messages(&filter).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].chat_jid, "b@s.whatsapp.net");
        assert_eq!(msgs[0].chat_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_list_messages_date_range_is_inclusive() {
        let (engine, _dir) = test_engine();
        seed_window_chat(&engine);

        let filter = MessageFilter {
            date_range: Some((ts(20), ts(40))),
            ..MessageFilter::default()
        };
        let msgs = engine.list_messages(&filter).unwrap();
        let at: Vec<_> = msgs.iter().map(|m| m.timestamp).collect();
        assert_eq!(at, [ts(40), ts(30), ts(20)]);
    }

    #[test]
    fn test_list_messages_expands_context_in_match_order() {
        let (engine, _dir) = test_engine();
        seed_window_chat(&engine);

        let filter = MessageFilter {
            query: Some("at 40".into()),
            include_context: true,
            context_before: 1,
            context_after: 1,
            ..MessageFilter::default()
        };
        let msgs = engine.list_messages(&filter).unwrap();
        let at: Vec<_> = msgs.iter().map(|m| m.timestamp).collect();
        assert_eq!(at, [ts(30), ts(40), ts(50)]);
    }

    #[test]
    fn test_list_chats_sort_modes() {
        let (engine, _dir) = test_engine();
        seed_chat(&engine, "c@s.whatsapp.net", "Zoe", Some(30));
        seed_chat(&engine, "a@s.whatsapp.net", "Alice", Some(10));
        seed_chat(&engine, "b@s.whatsapp.net", "Bob", Some(20));

        let by_name = engine
            .list_chats(&ChatFilter {
                sort_by: ChatSort::Name,
                ..ChatFilter::default()
            })
            .unwrap();
        let names: Vec<_> = by_name.iter().map(|c| c.name.as_deref().unwrap()).collect();
        assert_eq!(names, ["Alice", "Bob", "Zoe"]);

        let by_activity = engine.list_chats(&ChatFilter::default()).unwrap();
        let names: Vec<_> = by_activity
            .iter()
            .map(|c| c.name.as_deref().unwrap())
            .collect();
        assert_eq!(names, ["Zoe", "Bob", "Alice"]);
    }

    #[test]
    fn test_list_chats_query_matches_name_or_jid() {
        let (engine, _dir) = test_engine();
        seed_chat(&engine, "33612345678@s.whatsapp.net", "Alice", Some(10));
        seed_chat(&engine, "44712345678@s.whatsapp.net", "Bob", Some(20));

        let by_name = engine
            .list_chats(&ChatFilter {
                query: Some("alice".into()),
                ..ChatFilter::default()
            })
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].jid, "33612345678@s.whatsapp.net");

        let by_jid = engine
            .list_chats(&ChatFilter {
                query: Some("447".into()),
                ..ChatFilter::default()
            })
            .unwrap();
        assert_eq!(by_jid.len(), 1);
        assert_eq!(by_jid[0].name.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_list_chats_last_message_join_is_exact() {
        let (engine, _dir) = test_engine();
        seed_chat(&engine, "a@s.whatsapp.net", "Alice", Some(20));
        seed_message(
            &engine,
            "m1",
            "a@s.whatsapp.net",
            "33611111111@s.whatsapp.net",
            "latest",
            20,
        );
        // Watermark points at a timestamp no message carries.
        seed_chat(&engine, "b@s.whatsapp.net", "Bob", Some(99));
        seed_message(
            &engine,
            "m2",
            "b@s.whatsapp.net",
            "33622222222@s.whatsapp.net",
            "stale",
            10,
        );

        let chats = engine
            .list_chats(&ChatFilter {
                include_last_message: true,
                sort_by: ChatSort::Name,
                ..ChatFilter::default()
            })
            .unwrap();

        assert_eq!(chats[0].last_message.as_deref(), Some("latest"));
        assert!(chats[1].last_message.is_none());
    }

    #[test]
    fn test_get_chat_not_found_vs_store_absent() {
        let (engine, _dir) = test_engine();

        // Store-level lookup: absence is None, not an error.
        assert!(engine.store().get_chat("unknown@x").unwrap().is_none());

        // Engine-level lookup: absence is NotFound.
        let err = engine.get_chat("unknown@x", true).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_direct_chat_by_contact_appends_domain() {
        let (engine, _dir) = test_engine();
        seed_chat(&engine, "33612345678@s.whatsapp.net", "Alice", Some(10));

        let chat = engine.direct_chat_by_contact("33612345678").unwrap();
        assert_eq!(chat.jid, "33612345678@s.whatsapp.net");
    }

    #[test]
    fn test_search_contacts_excludes_groups_and_caps_results() {
        let (engine, _dir) = test_engine();
        seed_chat(&engine, "12036@g.us", "team chat", Some(10));
        for i in 0..55 {
            seed_chat(
                &engine,
                &format!("336{:08}@s.whatsapp.net", i),
                &format!("team member {:02}", i),
                Some(i),
            );
        }

        let contacts = engine.search_contacts("team").unwrap();
        assert_eq!(contacts.len(), 50);
        assert!(contacts.iter().all(|c| !c.jid.ends_with(GROUP_SUFFIX)));
        assert_eq!(contacts[0].phone_number, "33600000000");
    }

    #[test]
    fn test_contact_chats_matches_jid_and_sender() {
        let (engine, _dir) = test_engine();
        seed_chat(&engine, "33611111111@s.whatsapp.net", "Alice", Some(10));
        seed_message(
            &engine,
            "m1",
            "33611111111@s.whatsapp.net",
            "33611111111@s.whatsapp.net",
            "direct",
            10,
        );
        // A group where the contact spoke.
        seed_chat(&engine, "12036@g.us", "team chat", Some(30));
        seed_message(
            &engine,
            "g1",
            "12036@g.us",
            "33611111111@s.whatsapp.net",
            "group message",
            30,
        );
        // Unrelated chat.
        seed_chat(&engine, "33699999999@s.whatsapp.net", "Carol", Some(40));
        seed_message(
            &engine,
            "c1",
            "33699999999@s.whatsapp.net",
            "33699999999@s.whatsapp.net",
            "noise",
            40,
        );

        let chats = engine
            .contact_chats("33611111111@s.whatsapp.net", 10, 0)
            .unwrap();
        let jids: Vec<_> = chats.iter().map(|c| c.jid.as_str()).collect();
        assert_eq!(jids, ["12036@g.us", "33611111111@s.whatsapp.net"]);
    }

    #[test]
    fn test_last_interaction_picks_newest() {
        let (engine, _dir) = test_engine();
        seed_chat(&engine, "33611111111@s.whatsapp.net", "Alice", Some(10));
        seed_message(
            &engine,
            "m1",
            "33611111111@s.whatsapp.net",
            "33611111111@s.whatsapp.net",
            "older",
            10,
        );
        seed_chat(&engine, "12036@g.us", "team chat", Some(30));
        seed_message(
            &engine,
            "g1",
            "12036@g.us",
            "33611111111@s.whatsapp.net",
            "newer, in the group",
            30,
        );

        let msg = engine
            .last_interaction("33611111111@s.whatsapp.net")
            .unwrap();
        assert_eq!(msg.content, "newer, in the group");

        let err = engine
            .last_interaction("33600000000@s.whatsapp.net")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_recent_messages_spans_chats() {
        let (engine, _dir) = test_engine();
        seed_window_chat(&engine);
        seed_chat(&engine, "b@s.whatsapp.net", "Bob", Some(60));
        seed_message(
            &engine,
            "b1",
            "b@s.whatsapp.net",
            "33622222222@s.whatsapp.net",
            "newest overall",
            60,
        );

        let msgs = engine.recent_messages(3).unwrap();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0].content, "newest overall");
        assert_eq!(msgs[0].chat_name.as_deref(), Some("Bob"));
    }
}
