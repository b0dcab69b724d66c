//! Buffered conversational memory for one session.
//!
//! Every message is written through to the store; the last
//! `buffer_size` messages are kept in memory and replayed to the LLM.

use crate::ports::memory_store::{MemoryStore, StoreError};
use crate::use_cases::shared::SessionScope;
use agentflow_domain::{AgentType, ChatMessage, StoredMessage};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub struct BufferedChatContext {
    store: Arc<dyn MemoryStore>,
    scope: SessionScope,
    buffer_size: usize,
    buffer: Mutex<VecDeque<ChatMessage>>,
}

impl BufferedChatContext {
    pub fn new(store: Arc<dyn MemoryStore>, scope: SessionScope, buffer_size: usize) -> Self {
        Self {
            store,
            scope,
            buffer_size,
            buffer: Mutex::new(VecDeque::with_capacity(buffer_size)),
        }
    }

    /// Replace the buffer with the most recent stored messages.
    pub async fn load(&self) -> Result<(), StoreError> {
        let stored = self
            .store
            .get_messages(
                &self.scope.user_id,
                &self.scope.session_id,
                Some(self.buffer_size),
            )
            .await?;
        debug!(
            session_id = %self.scope.session_id,
            count = stored.len(),
            "Loaded chat history"
        );
        let mut buffer = self.buffer.lock().await;
        buffer.clear();
        buffer.extend(stored.iter().map(StoredMessage::to_chat_message));
        Ok(())
    }

    /// Persist a message and append it to the buffer.
    pub async fn add(&self, source: AgentType, message: ChatMessage) -> Result<(), StoreError> {
        let stored = StoredMessage::new(
            &self.scope.session_id,
            &self.scope.user_id,
            source,
            &message,
        );
        self.store.add_message(&stored).await?;

        let mut buffer = self.buffer.lock().await;
        buffer.push_back(message);
        while buffer.len() > self.buffer_size {
            buffer.pop_front();
        }
        Ok(())
    }

    /// Buffered messages, oldest first.
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.buffer.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.buffer.lock().await.len()
    }

    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }
}
