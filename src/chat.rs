use crate::api::{Backend, Error};
use crate::config::ConfigStore;
use crate::conversations::ConversationStore;
use crate::health::HealthMonitor;
use crate::state::{truncate, BackendConfig, ChatPayload, Message, PREVIEW_LEN};
use leptos::logging::{error, log};
use leptos::*;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send.
    Ignored,
    /// The backend is down; a warning was appended instead of calling `/chat`.
    Blocked,
    Replied,
    Failed,
}

pub fn blocked_message(backend: &BackendConfig) -> String {
    let kind = backend.kind;
    format!(
        "🚫 Backend not available. Please start {} ({}) and try again.",
        kind.name(),
        kind.start_command()
    )
}

pub fn failure_message(backend: &BackendConfig, available: bool, err: &Error) -> String {
    let kind = backend.kind;
    if available {
        format!(
            "⚠️ **Connection Error**\n\nI'm having trouble processing your request. Please try again in a moment.\n\nError: {err}"
        )
    } else {
        format!(
            "🚫 **Backend Unavailable**\n\nI can't connect to {name} on port {port}. Please:\n\n1. **Install {name}**: {url}\n2. **Start the server**: `{start}`\n3. **Pull a model**: {pull}\n\nOnce running, I'll be able to help you!",
            name = kind.name(),
            port = backend.port,
            url = kind.install_url(),
            start = kind.start_command(),
            pull = kind.pull_hint(),
        )
    }
}

/// Turns one user submission into at most one `/chat` request.
#[derive(Clone)]
pub struct ChatFlow {
    config: ConfigStore,
    conversations: ConversationStore,
    health: HealthMonitor,
    backend: Rc<dyn Backend>,
    sending: RwSignal<bool>,
}

impl ChatFlow {
    pub fn new(
        config: ConfigStore,
        conversations: ConversationStore,
        health: HealthMonitor,
        backend: Rc<dyn Backend>,
    ) -> Self {
        ChatFlow {
            config,
            conversations,
            health,
            backend,
            sending: create_rw_signal(false),
        }
    }

    pub fn is_sending(&self) -> ReadSignal<bool> {
        self.sending.read_only()
    }

    pub async fn send_message(&self, content: String) -> SendOutcome {
        if content.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        let conversation_id = match self.conversations.active_id_untracked() {
            Some(id) => id,
            None => {
                let title = truncate(&content, PREVIEW_LEN);
                self.conversations.create(Some(title)).await.id
            }
        };
        let config = self.config.get();

        if !self.health.available() {
            let warning = Message::assistant(blocked_message(&config.backend));
            self.conversations.append_message(&conversation_id, warning);
            return SendOutcome::Blocked;
        }

        let payload = ChatPayload {
            conversation_id: Some(conversation_id.clone()),
            query: content.clone(),
            web_search_enabled: config.web_search_enabled,
            backend: config.backend,
            model: config.model.clone(),
        };
        log!("Query received: {payload:?}");
        self.conversations
            .append_message(&conversation_id, Message::user(content));

        self.sending.set(true);
        let result = self.backend.chat(&payload).await;
        self.sending.set(false);

        match result {
            Ok(response) => {
                let reply = Message::assistant(response.message.content);
                self.conversations.append_message(&conversation_id, reply);
                SendOutcome::Replied
            }
            Err(err) => {
                error!("Error calling backend API: {err}");
                let text = failure_message(&config.backend, self.health.available(), &err);
                self.conversations
                    .append_message(&conversation_id, Message::assistant(text));
                SendOutcome::Failed
            }
        }
    }
}
