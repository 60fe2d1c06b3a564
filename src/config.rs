use crate::api::Backend;
use crate::state::{AppConfig, BackendConfig, ConfigPatch, Theme};
use crate::storage::{self, read_json, write_json, Storage};
use leptos::logging::{log, warn};
use leptos::*;
use std::rc::Rc;

/// Where an update ended up, surfaced to the user as a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveNotice {
    Saved,
    SavedLocally,
}

impl SaveNotice {
    pub fn title(&self) -> &'static str {
        match self {
            SaveNotice::Saved => "Settings Saved",
            SaveNotice::SavedLocally => "Settings Saved Locally",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SaveNotice::Saved => "Your configuration has been saved successfully.",
            SaveNotice::SavedLocally => "Configuration saved locally. Backend not available.",
        }
    }
}

#[derive(Clone)]
pub struct ConfigStore {
    config: RwSignal<AppConfig>,
    backend: Rc<dyn Backend>,
    storage: Rc<dyn Storage>,
    apply_theme: Rc<dyn Fn(&str)>,
}

impl ConfigStore {
    pub fn new(backend: Rc<dyn Backend>, storage: Rc<dyn Storage>) -> Self {
        ConfigStore {
            config: create_rw_signal(AppConfig::default()),
            backend,
            storage,
            apply_theme: Rc::new(|_: &str| ()),
        }
    }

    /// Hook called with the accent colour whenever the theme changes.
    pub fn with_theme_applier(mut self, apply: impl Fn(&str) + 'static) -> Self {
        self.apply_theme = Rc::new(apply);
        self
    }

    pub fn config(&self) -> ReadSignal<AppConfig> {
        self.config.read_only()
    }

    pub fn get(&self) -> AppConfig {
        self.config.get_untracked()
    }

    pub async fn load(&self) {
        let config = match self.backend.load_config().await {
            Ok(mut remote) => {
                // The server does not know about the selected model.
                if remote.model.is_none() {
                    remote.model = self.local().and_then(|local| local.model);
                }
                remote
            }
            Err(err) => {
                log!("Loading config from localStorage - backend not available: {err}");
                self.local().unwrap_or_default()
            }
        };
        (self.apply_theme)(&config.theme.accent_color);
        self.persist(&config);
        self.config.set(config);
    }

    /// Merges `patch`, persists locally, then mirrors the result to the backend once.
    pub async fn update(&self, patch: ConfigPatch) -> SaveNotice {
        if let Some(theme) = &patch.theme {
            (self.apply_theme)(&theme.accent_color);
        }
        let mut config = self.get();
        config.merge(patch);
        self.persist(&config);
        self.config.set(config.clone());

        match self.backend.save_config(&config).await {
            Ok(()) => SaveNotice::Saved,
            Err(err) => {
                warn!("Saving config to localStorage - backend not available: {err}");
                SaveNotice::SavedLocally
            }
        }
    }

    pub async fn update_theme(&self, accent_color: String) -> SaveNotice {
        self.update(ConfigPatch {
            theme: Some(Theme { accent_color }),
            ..Default::default()
        })
        .await
    }

    pub async fn update_backend(&self, backend: BackendConfig) -> SaveNotice {
        self.update(ConfigPatch {
            backend: Some(backend),
            ..Default::default()
        })
        .await
    }

    pub async fn toggle_web_search(&self) -> SaveNotice {
        let enabled = !self.get().web_search_enabled;
        self.update(ConfigPatch {
            web_search_enabled: Some(enabled),
            ..Default::default()
        })
        .await
    }

    pub async fn select_model(&self, model: Option<String>) -> SaveNotice {
        self.update(ConfigPatch {
            model: Some(model),
            ..Default::default()
        })
        .await
    }

    fn local(&self) -> Option<AppConfig> {
        let storage = self.storage.as_ref();
        if let Some(config) = read_json(storage, storage::APP_CONFIG) {
            return Some(config);
        }
        let backend: Option<BackendConfig> = read_json(storage, storage::BACKEND_CONFIG);
        let web_search: Option<bool> = read_json(storage, storage::WEB_SEARCH_ENABLED);
        if backend.is_none() && web_search.is_none() {
            return None;
        }
        Some(AppConfig {
            backend: backend.unwrap_or_default(),
            web_search_enabled: web_search.unwrap_or_default(),
            ..Default::default()
        })
    }

    // The legacy keys must always agree with the unified blob.
    fn persist(&self, config: &AppConfig) {
        let storage = self.storage.as_ref();
        write_json(storage, storage::APP_CONFIG, config);
        write_json(storage, storage::BACKEND_CONFIG, &config.backend);
        write_json(storage, storage::WEB_SEARCH_ENABLED, &config.web_search_enabled);
    }
}
