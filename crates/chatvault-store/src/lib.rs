//! ChatVault Store — durable chat/message persistence and the read-side
//! query engine.

pub mod query;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use query::{ChatFilter, ChatSort, MessageFilter, QueryEngine};
pub use sqlite::MessageStore;
pub use types::*;
