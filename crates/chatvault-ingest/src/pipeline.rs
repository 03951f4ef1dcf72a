//! Single-consumer ingestion pipeline.
//!
//! All writes flow through one task that drains the event channel in order,
//! so two events for the same chat are never applied out of order or
//! concurrently. Readers query the store directly and concurrently.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::event::ChatEvent;
use chatvault_core::Result;
use chatvault_store::MessageStore;

/// Applies chat-update events to the store, one at a time.
pub struct IngestPipeline {
    store: Arc<MessageStore>,
}

impl IngestPipeline {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self { store }
    }

    /// Apply one event: upsert the chat, then each of its messages in order.
    ///
    /// The chat row lands first so every message upsert sees its foreign key
    /// satisfied. A failing message upsert is logged and skipped; the rest
    /// of the batch still applies.
    pub fn apply(&self, event: &ChatEvent) -> Result<()> {
        let chat = event.chat();
        self.store.upsert_chat(&chat)?;

        for msg in event.messages() {
            if let Err(e) = self.store.upsert_message(msg) {
                error!(
                    "Failed to store message {} in {}: {}",
                    msg.id, msg.chat_jid, e
                );
            }
        }
        Ok(())
    }

    /// Drain the channel until the producer closes it. A failed event is
    /// logged and the loop moves on; only channel closure ends it.
    pub async fn run(self, mut rx: mpsc::Receiver<ChatEvent>) {
        info!("Ingestion pipeline started");
        while let Some(event) = rx.recv().await {
            if let Err(e) = self.apply(&event) {
                error!("Failed to apply chat update: {}", e);
            }
        }
        info!("Ingestion pipeline stopped: event channel closed");
    }
}

/// Create the bounded event channel and spawn the consumer task.
///
/// The producer awaits when the queue is full; events are never dropped. A
/// slow store therefore backpressures the producer instead of growing an
/// unbounded backlog.
pub fn spawn_pipeline(
    store: Arc<MessageStore>,
    capacity: usize,
) -> (mpsc::Sender<ChatEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let pipeline = IngestPipeline::new(store);
    let handle = tokio::spawn(pipeline.run(rx));
    (tx, handle)
}
