use leptos::logging::{log, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;

pub const APP_CONFIG: &str = "appConfig";
/// Legacy standalone copy of `AppConfig::backend`.
pub const BACKEND_CONFIG: &str = "backendConfig";
/// Legacy standalone copy of `AppConfig::web_search_enabled`.
pub const WEB_SEARCH_ENABLED: &str = "webSearchEnabled";
pub const CONVERSATIONS: &str = "conversations";
pub const ACTIVE_CONVERSATION: &str = "activeConversationId";
pub const LAST_MESSAGE_AT: &str = "lastMessageAt";

/// Synchronous key/value storage that survives a page reload.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

pub fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Ignoring malformed {key} in storage: {err}");
            None
        }
    }
}

pub fn write_json<T: Serialize + ?Sized>(storage: &dyn Storage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => storage.set(key, &raw),
        Err(err) => warn!("Could not serialize {key}: {err}"),
    }
}

/// The browser's `window.localStorage`.
pub struct LocalStorage {
    inner: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> Option<Self> {
        match leptos::window().local_storage() {
            Ok(Some(inner)) => Some(LocalStorage { inner }),
            Ok(None) => None,
            Err(err) => {
                warn!("localStorage unavailable: {err:?}");
                None
            }
        }
    }
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.inner.set_item(key, value) {
            warn!("Could not write {key} to localStorage: {err:?}");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = self.inner.remove_item(key) {
            warn!("Could not remove {key} from localStorage: {err:?}");
        }
    }
}

/// Process-local storage, used when the browser refuses `localStorage`.
#[derive(Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        log!("Using in-memory storage, nothing will survive a reload");
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}
