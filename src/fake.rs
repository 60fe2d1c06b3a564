//! Scripted [`Backend`] used by the store tests.

use crate::api::{Backend, Error};
use crate::state::{
    AppConfig, AvailableModels, BackendStatus, ChatPayload, ChatResponse, Conversation,
};
use async_trait::async_trait;
use std::cell::RefCell;

fn offline() -> Error {
    Error::Status {
        status: 503,
        body: "offline".to_string(),
    }
}

/// Every endpoint fails until a response is scripted for it.
#[derive(Default)]
pub struct FakeBackend {
    pub health: RefCell<Option<BackendStatus>>,
    pub models: RefCell<Option<AvailableModels>>,
    pub config: RefCell<Option<AppConfig>>,
    pub accept_config: RefCell<bool>,
    pub conversations: RefCell<Option<Vec<Conversation>>>,
    /// Server-side id handed out on create; `None` makes create fail.
    pub assign_id: RefCell<Option<String>>,
    pub accept_delete: RefCell<bool>,
    pub reply: RefCell<Option<String>>,
    pub calls: RefCell<Vec<String>>,
    pub saved: RefCell<Vec<AppConfig>>,
    pub payloads: RefCell<Vec<ChatPayload>>,
}

impl FakeBackend {
    pub fn online() -> Self {
        FakeBackend {
            accept_config: RefCell::new(true),
            accept_delete: RefCell::new(true),
            ..Default::default()
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

#[async_trait(?Send)]
impl Backend for FakeBackend {
    async fn health(&self) -> Result<BackendStatus, Error> {
        self.record("GET /health");
        self.health.borrow().clone().ok_or_else(offline)
    }

    async fn models(&self, provider: Option<&str>) -> Result<AvailableModels, Error> {
        self.record(format!("GET /api/models?provider={}", provider.unwrap_or("")));
        self.models.borrow().clone().ok_or_else(offline)
    }

    async fn load_config(&self) -> Result<AppConfig, Error> {
        self.record("GET /api/config");
        self.config.borrow().clone().ok_or_else(offline)
    }

    async fn save_config(&self, config: &AppConfig) -> Result<(), Error> {
        self.record("PUT /api/config");
        self.saved.borrow_mut().push(config.clone());
        if *self.accept_config.borrow() {
            Ok(())
        } else {
            Err(offline())
        }
    }

    async fn conversations(&self) -> Result<Vec<Conversation>, Error> {
        self.record("GET /api/conversations");
        self.conversations.borrow().clone().ok_or_else(offline)
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, Error> {
        self.record("POST /api/conversations");
        let id = self.assign_id.borrow().clone().ok_or_else(offline)?;
        Ok(Conversation {
            id,
            timestamp: "2024-05-01T10:00:00Z".to_string(),
            preview: String::new(),
            ..conversation.clone()
        })
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), Error> {
        self.record(format!("DELETE /api/conversations/{id}"));
        if *self.accept_delete.borrow() {
            Ok(())
        } else {
            Err(offline())
        }
    }

    async fn chat(&self, payload: &ChatPayload) -> Result<ChatResponse, Error> {
        self.record("POST /chat");
        self.payloads.borrow_mut().push(payload.clone());
        let content = self.reply.borrow().clone().ok_or_else(offline)?;
        let body = serde_json::json!({
            "conversationId": payload.conversation_id,
            "message": {"role": "assistant", "content": content},
            "done": true
        });
        Ok(serde_json::from_value(body)?)
    }
}
