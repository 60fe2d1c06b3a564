use crate::api::Backend;
use crate::state::{Conversation, Message, DEFAULT_TITLE};
use crate::storage::{self, read_json, write_json, Storage};
use leptos::logging::{log, warn};
use leptos::*;
use std::rc::Rc;

/// Conversation threads plus the single active selection.
#[derive(Clone)]
pub struct ConversationStore {
    conversations: RwSignal<Vec<Conversation>>,
    active: RwSignal<Option<String>>,
    backend: Rc<dyn Backend>,
    storage: Rc<dyn Storage>,
}

impl ConversationStore {
    pub fn new(backend: Rc<dyn Backend>, storage: Rc<dyn Storage>) -> Self {
        ConversationStore {
            conversations: create_rw_signal(vec![]),
            active: create_rw_signal(None),
            backend,
            storage,
        }
    }

    pub fn conversations(&self) -> ReadSignal<Vec<Conversation>> {
        self.conversations.read_only()
    }

    pub fn active_id(&self) -> ReadSignal<Option<String>> {
        self.active.read_only()
    }

    /// Tracked read of the active conversation, for views.
    pub fn active(&self) -> Option<Conversation> {
        let id = self.active.get()?;
        self.conversations
            .with(|conversations| conversations.iter().find(|c| c.id == id).cloned())
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations
            .with_untracked(|conversations| conversations.iter().find(|c| c.id == id).cloned())
    }

    pub fn active_id_untracked(&self) -> Option<String> {
        self.active.get_untracked()
    }

    fn contains(&self, id: &str) -> bool {
        self.conversations
            .with_untracked(|conversations| conversations.iter().any(|c| c.id == id))
    }

    pub async fn load(&self) {
        match self.backend.conversations().await {
            Ok(conversations) => {
                log!("Loaded {} conversations from backend", conversations.len());
                self.conversations.set(conversations);
            }
            Err(err) => {
                log!("Using local conversations - backend not available: {err}");
                let local: Option<Vec<Conversation>> =
                    read_json(self.storage.as_ref(), storage::CONVERSATIONS);
                match local {
                    Some(conversations) => self.conversations.set(conversations),
                    None => {
                        let welcome = Conversation::welcome();
                        self.conversations.set(vec![welcome]);
                    }
                }
            }
        }

        let saved: Option<String> = read_json(self.storage.as_ref(), storage::ACTIVE_CONVERSATION);
        let candidate = self.active.get_untracked().or(saved);
        let active = match candidate {
            Some(id) if self.contains(&id) => Some(id),
            _ => self
                .conversations
                .with_untracked(|conversations| conversations.first().map(|c| c.id.clone())),
        };
        self.select(active);
        self.persist();
    }

    /// Creates a conversation locally, then adopts the server's copy if the backend takes it.
    pub async fn create(&self, title: Option<String>) -> Conversation {
        let local = Conversation::new(title.unwrap_or_else(|| DEFAULT_TITLE.to_string()));
        let local_id = local.id.clone();
        self.conversations
            .update(|conversations| conversations.insert(0, local.clone()));
        self.select(Some(local_id.clone()));
        self.persist();

        let mut saved = match self.backend.create_conversation(&local).await {
            Ok(saved) => saved,
            Err(err) => {
                log!("Creating conversation locally - backend not available: {err}");
                return local;
            }
        };

        let mut adopted = None;
        self.conversations.update(|conversations| {
            if let Some(entry) = conversations.iter_mut().find(|c| c.id == local_id) {
                // Messages may have been appended while the request was in flight.
                if saved.messages.is_empty() {
                    saved.messages = std::mem::take(&mut entry.messages);
                }
                if saved.preview.is_empty() {
                    saved.preview = std::mem::take(&mut entry.preview);
                }
                *entry = saved.clone();
                adopted = Some(saved);
            }
        });
        let Some(saved) = adopted else {
            warn!("Conversation {local_id} vanished before the backend answered");
            return local;
        };
        if self.active.get_untracked().as_deref() == Some(local_id.as_str()) {
            self.select(Some(saved.id.clone()));
        }
        self.persist();
        saved
    }

    /// Removes `id` whatever the backend says, then picks a replacement selection.
    pub async fn delete(&self, id: &str) {
        if let Err(err) = self.backend.delete_conversation(id).await {
            log!("Deleting conversation locally - backend not available: {err}");
        }

        self.conversations
            .update(|conversations| conversations.retain(|c| c.id != id));
        let next = self
            .conversations
            .with_untracked(|conversations| conversations.first().map(|c| c.id.clone()));
        match next {
            Some(next) => {
                self.select(Some(next));
                self.persist();
            }
            None => {
                self.create(None).await;
            }
        }
    }

    pub fn switch(&self, id: &str) {
        if self.contains(id) {
            self.select(Some(id.to_string()));
        } else {
            warn!("Cannot switch to unknown conversation {id}");
        }
    }

    /// Local-only append; the backend learns about messages through `/chat`.
    pub fn append_message(&self, id: &str, message: Message) -> bool {
        let at = message.timestamp;
        let mut found = false;
        self.conversations.update(|conversations| {
            if let Some(conversation) = conversations.iter_mut().find(|c| c.id == id) {
                conversation.push(message);
                found = true;
            }
        });
        if found {
            self.persist();
            write_json(self.storage.as_ref(), storage::LAST_MESSAGE_AT, &at);
        } else {
            warn!("Dropping message for unknown conversation {id}");
        }
        found
    }

    fn select(&self, id: Option<String>) {
        match &id {
            Some(id) => write_json(self.storage.as_ref(), storage::ACTIVE_CONVERSATION, id),
            None => self.storage.remove(storage::ACTIVE_CONVERSATION),
        }
        self.active.set(id);
    }

    fn persist(&self) {
        self.conversations.with_untracked(|conversations| {
            write_json(self.storage.as_ref(), storage::CONVERSATIONS, conversations)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeBackend;
    use crate::state::{Role, JUST_NOW};
    use crate::storage::MemoryStorage;
    use chrono::{DateTime, TimeZone, Utc};
    use futures::executor::block_on;
    use leptos::create_runtime;

    fn store(backend: &Rc<FakeBackend>, storage: &Rc<MemoryStorage>) -> ConversationStore {
        ConversationStore::new(backend.clone(), storage.clone())
    }

    fn remote_list() -> Vec<Conversation> {
        let json = r#"[
            {"id": "a", "title": "First", "timestamp": "2024-05-01T10:00:00Z", "preview": "hi",
             "messages": [
                {"id": "m1", "content": "hi", "role": "user", "timestamp": "2024-05-01T10:00:00Z"},
                {"id": "m2", "content": "hello", "role": "assistant", "timestamp": "2024-05-01T10:00:05Z"}
             ]},
            {"id": "b", "title": "Second", "timestamp": "2024-04-30T10:00:00Z", "preview": "", "messages": []}
        ]"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_load_remote_normalizes_timestamps() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::online());
        *backend.conversations.borrow_mut() = Some(remote_list());
        let storage = Rc::new(MemoryStorage::default());
        let conversations = store(&backend, &storage);

        block_on(conversations.load());

        let loaded = conversations.conversations().get_untracked();
        assert_eq!(loaded.len(), 2);
        let first: &Vec<Message> = &loaded[0].messages;
        let expected: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 5).unwrap();
        assert_eq!(first[1].timestamp, expected);
        assert_eq!(conversations.active_id_untracked().as_deref(), Some("a"));
        let mirrored: Vec<Conversation> =
            read_json(storage.as_ref(), storage::CONVERSATIONS).unwrap();
        assert_eq!(mirrored, loaded);
        runtime.dispose();
    }

    #[test]
    fn test_load_keeps_saved_selection() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::online());
        *backend.conversations.borrow_mut() = Some(remote_list());
        let storage = Rc::new(MemoryStorage::default());
        write_json(storage.as_ref(), storage::ACTIVE_CONVERSATION, "b");
        let conversations = store(&backend, &storage);

        block_on(conversations.load());

        assert_eq!(conversations.active_id_untracked().as_deref(), Some("b"));
        runtime.dispose();
    }

    #[test]
    fn test_load_falls_back_to_local() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::default());
        let storage = Rc::new(MemoryStorage::default());
        write_json(storage.as_ref(), storage::CONVERSATIONS, &remote_list());
        write_json(storage.as_ref(), storage::ACTIVE_CONVERSATION, "gone");
        let conversations = store(&backend, &storage);

        block_on(conversations.load());

        assert_eq!(conversations.conversations().get_untracked(), remote_list());
        assert_eq!(conversations.active_id_untracked().as_deref(), Some("a"));
        runtime.dispose();
    }

    #[test]
    fn test_load_seeds_welcome_conversation() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::default());
        let storage = Rc::new(MemoryStorage::default());
        let conversations = store(&backend, &storage);

        block_on(conversations.load());

        let loaded = conversations.conversations().get_untracked();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].messages[0].role, Role::Assistant);
        assert_eq!(conversations.active_id_untracked(), Some(loaded[0].id.clone()));
        runtime.dispose();
    }

    #[test]
    fn test_create_adopts_server_identity() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::online());
        *backend.assign_id.borrow_mut() = Some("server-1".to_string());
        let storage = Rc::new(MemoryStorage::default());
        let conversations = store(&backend, &storage);

        let created = block_on(conversations.create(Some("Plans".to_string())));

        assert_eq!(created.id, "server-1");
        assert_eq!(created.title, "Plans");
        let all = conversations.conversations().get_untracked();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "server-1");
        assert_eq!(conversations.active_id_untracked().as_deref(), Some("server-1"));
        assert_eq!(
            read_json::<String>(storage.as_ref(), storage::ACTIVE_CONVERSATION).as_deref(),
            Some("server-1")
        );
        runtime.dispose();
    }

    #[test]
    fn test_create_keeps_local_when_offline() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::default());
        let storage = Rc::new(MemoryStorage::default());
        let conversations = store(&backend, &storage);

        let first = block_on(conversations.create(None));
        let second = block_on(conversations.create(None));

        assert_eq!(first.title, DEFAULT_TITLE);
        assert_eq!(first.timestamp, JUST_NOW);
        let ids: Vec<_> = conversations
            .conversations()
            .get_untracked()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![second.id.clone(), first.id]);
        assert_eq!(conversations.active_id_untracked(), Some(second.id));
        runtime.dispose();
    }

    #[test]
    fn test_delete_selects_next() {
        let runtime = create_runtime();
        for online in [true, false] {
            let backend = Rc::new(if online {
                FakeBackend::online()
            } else {
                FakeBackend::default()
            });
            *backend.conversations.borrow_mut() = Some(remote_list());
            let storage = Rc::new(MemoryStorage::default());
            let conversations = store(&backend, &storage);
            block_on(conversations.load());

            block_on(conversations.delete("a"));

            let ids: Vec<_> = conversations
                .conversations()
                .get_untracked()
                .into_iter()
                .map(|c| c.id)
                .collect();
            assert_eq!(ids, vec!["b".to_string()]);
            assert_eq!(conversations.active_id_untracked().as_deref(), Some("b"));
            assert_eq!(backend.count("DELETE /api/conversations/a"), 1);
        }
        runtime.dispose();
    }

    #[test]
    fn test_deleting_the_last_conversation_creates_one() {
        let runtime = create_runtime();
        for online in [true, false] {
            let backend = Rc::new(if online {
                FakeBackend::online()
            } else {
                FakeBackend::default()
            });
            let storage = Rc::new(MemoryStorage::default());
            let conversations = store(&backend, &storage);
            let only = block_on(conversations.create(None));
            if online {
                *backend.assign_id.borrow_mut() = Some("server-2".to_string());
            }

            block_on(conversations.delete(&only.id));

            let all = conversations.conversations().get_untracked();
            assert_eq!(all.len(), 1);
            assert_ne!(all[0].id, only.id);
            if online {
                assert_eq!(all[0].id, "server-2");
                assert_eq!(backend.count("POST /api/conversations"), 2);
            }
            assert!(all[0].messages.is_empty());
            assert_eq!(conversations.active_id_untracked(), Some(all[0].id.clone()));
        }
        runtime.dispose();
    }

    #[test]
    fn test_switch() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::online());
        *backend.conversations.borrow_mut() = Some(remote_list());
        let storage = Rc::new(MemoryStorage::default());
        let conversations = store(&backend, &storage);
        block_on(conversations.load());
        let calls = backend.calls.borrow().len();

        conversations.switch("b");
        assert_eq!(conversations.active_id_untracked().as_deref(), Some("b"));
        conversations.switch("missing");
        assert_eq!(conversations.active_id_untracked().as_deref(), Some("b"));
        assert_eq!(backend.calls.borrow().len(), calls);
        runtime.dispose();
    }

    #[test]
    fn test_append_only_touches_target() {
        let runtime = create_runtime();
        let backend = Rc::new(FakeBackend::online());
        *backend.conversations.borrow_mut() = Some(remote_list());
        let storage = Rc::new(MemoryStorage::default());
        let conversations = store(&backend, &storage);
        block_on(conversations.load());
        let before = conversations.get("a").unwrap();
        let calls = backend.calls.borrow().len();

        let message = Message::user("What is the capital of Norway?");
        assert!(conversations.append_message("b", message.clone()));

        assert_eq!(conversations.get("a").unwrap(), before);
        let target = conversations.get("b").unwrap();
        assert_eq!(target.messages, vec![message.clone()]);
        assert_eq!(target.preview, "What is the capital of Norway?");
        assert_eq!(target.timestamp, JUST_NOW);
        assert_eq!(backend.calls.borrow().len(), calls);
        assert_eq!(
            read_json::<DateTime<Utc>>(storage.as_ref(), storage::LAST_MESSAGE_AT),
            Some(message.timestamp)
        );
        assert!(!conversations.append_message("missing", Message::user("lost")));
        runtime.dispose();
    }
}
