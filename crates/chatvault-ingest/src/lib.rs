//! ChatVault Ingest — chat-update events, history-sync reconstruction, and
//! the single-consumer ingestion pipeline.

pub mod event;
pub mod pipeline;

pub use event::{
    events_from_history, ChatEvent, Conversation, HistoryConversation, HistoryEntry,
    HistoryPayload,
};
pub use pipeline::{spawn_pipeline, IngestPipeline};
