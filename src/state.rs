//! Application state: completion service, prompts, pipeline settings, catalog,
//! and the in-memory tutor conversation store.
//!
//! Conversations live only as long as the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::ai::{self, CompletionService};
use crate::config::{load_agent_config_from_env, AgentConfig, Prompts, RoadmapSettings};
use crate::domain::{CatalogCard, Conversation, TutorMessage};
use crate::error::AiError;
use crate::seeds::seed_catalog_cards;

#[derive(Clone)]
pub struct AppState {
    pub ai: Option<Arc<dyn CompletionService>>,
    pub prompts: Prompts,
    pub roadmap: RoadmapSettings,
    pub catalog: Vec<CatalogCard>,
    pub conversations: Arc<RwLock<HashMap<u64, Conversation>>>,
    next_conversation_id: Arc<AtomicU64>,
    next_message_id: Arc<AtomicU64>,
}

impl AppState {
    /// Build state from env: load config, pick the AI provider.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_agent_config_from_env().unwrap_or_default();
        let ai = ai::from_env();
        if ai.is_none() {
            warn!(target: "eduai_backend", "AI disabled (no provider credentials). AI endpoints will answer 503.");
        }
        Self::with_parts(ai, cfg)
    }

    pub fn with_parts(ai: Option<Arc<dyn CompletionService>>, cfg: AgentConfig) -> Self {
        let catalog = if cfg.catalog.is_empty() { seed_catalog_cards() } else { cfg.catalog };
        info!(
            target: "eduai_backend",
            catalog = catalog.len(),
            expand_concurrency = cfg.roadmap.expand_concurrency,
            "Application state ready"
        );
        Self {
            ai,
            prompts: cfg.prompts,
            roadmap: cfg.roadmap,
            catalog,
            conversations: Arc::new(RwLock::new(HashMap::new())),
            next_conversation_id: Arc::new(AtomicU64::new(1)),
            next_message_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The configured completion service, or ServiceUnavailable.
    pub fn ai(&self) -> Result<&dyn CompletionService, AiError> {
        self.ai
            .as_deref()
            .ok_or_else(|| AiError::ServiceUnavailable("no AI provider configured".into()))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn create_conversation(&self) -> u64 {
        let id = self.next_conversation_id.fetch_add(1, Ordering::Relaxed);
        let conv = Conversation { id, created_at: Utc::now(), messages: Vec::new() };
        self.conversations.write().await.insert(id, conv);
        id
    }

    /// Append a message. An id the store has not seen yet starts a new conversation under that id.
    #[instrument(level = "debug", skip(self, content), fields(content_len = content.len()))]
    pub async fn add_message(&self, conversation_id: u64, role: &str, content: &str) {
        let message = TutorMessage {
            id: self.next_message_id.fetch_add(1, Ordering::Relaxed),
            role: role.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let mut convs = self.conversations.write().await;
        convs
            .entry(conversation_id)
            .or_insert_with(|| Conversation { id: conversation_id, created_at: Utc::now(), messages: Vec::new() })
            .messages
            .push(message);
        drop(convs);
        // Keep generated ids clear of ids introduced by clients.
        self.next_conversation_id.fetch_max(conversation_id.saturating_add(1), Ordering::Relaxed);
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_messages(&self, conversation_id: u64) -> Option<Vec<TutorMessage>> {
        self.conversations
            .read()
            .await
            .get(&conversation_id)
            .map(|c| c.messages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::with_parts(None, AgentConfig::default())
    }

    #[tokio::test]
    async fn conversations_record_messages_in_order() {
        let s = state();
        let id = s.create_conversation().await;
        s.add_message(id, "user", "hi").await;
        s.add_message(id, "assistant", "hello").await;
        let msgs = s.get_messages(id).await.unwrap();
        let roles: Vec<&str> = msgs.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant"]);
        assert!(msgs[0].id < msgs[1].id);
        assert!(s.get_messages(id + 100).await.is_none());
    }

    #[tokio::test]
    async fn unknown_conversation_id_is_adopted() {
        let s = state();
        s.add_message(42, "user", "hi").await;
        assert_eq!(s.get_messages(42).await.unwrap().len(), 1);
        assert_eq!(s.create_conversation().await, 43);
    }

    #[test]
    fn missing_provider_is_unavailable_and_catalog_seeded() {
        let s = state();
        assert!(matches!(s.ai(), Err(AiError::ServiceUnavailable(_))));
        assert_eq!(s.catalog.len(), 3);
    }
}
