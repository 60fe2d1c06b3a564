use crate::api::{api_url, Backend, HttpBackend};
use crate::chat::ChatFlow;
use crate::config::{ConfigStore, SaveNotice};
use crate::conversation::ChatWindow;
use crate::conversations::ConversationStore;
use crate::health::HealthMonitor;
use crate::nav::Nav;
use crate::settings::Settings;
use crate::storage::{LocalStorage, MemoryStorage, Storage};
use leptos::logging::{log, warn};
use leptos::*;
use std::rc::Rc;
use std::time::Duration;

const TOAST_DURATION: Duration = Duration::from_secs(3);

fn apply_accent(accent: &str) {
    let Some(root) = document().document_element() else {
        return;
    };
    if let Err(err) = root.set_attribute("data-accent", accent) {
        warn!("Could not apply accent {accent}: {err:?}");
    }
}

/// Shows the outcome of a settings save for a few seconds.
#[derive(Clone, Copy)]
pub struct Toasts(WriteSignal<Option<SaveNotice>>);

impl Toasts {
    pub fn show(&self, notice: SaveNotice) {
        let set_notice = self.0;
        set_notice.set(Some(notice));
        set_timeout(move || set_notice.set(None), TOAST_DURATION);
    }
}

#[component]
pub fn App() -> impl IntoView {
    let backend: Rc<dyn Backend> =
        Rc::new(HttpBackend::new(api_url()).expect("BIFROST_API_URL is a valid url"));
    let storage: Rc<dyn Storage> = match LocalStorage::open() {
        Some(storage) => Rc::new(storage),
        None => Rc::new(MemoryStorage::new()),
    };
    log!("Using backend {}", api_url());

    let config = ConfigStore::new(backend.clone(), storage.clone()).with_theme_applier(apply_accent);
    let conversations = ConversationStore::new(backend.clone(), storage);
    let health = HealthMonitor::new(backend.clone());
    let chat = ChatFlow::new(
        config.clone(),
        conversations.clone(),
        health.clone(),
        backend,
    );

    let (notice, set_notice) = create_signal(None::<SaveNotice>);
    let (settings_open, set_settings_open) = create_signal(false);

    provide_context(config.clone());
    provide_context(conversations.clone());
    provide_context(health.clone());
    provide_context(chat);
    provide_context(Toasts(set_notice));

    spawn_local(async move { config.load().await });
    spawn_local(async move { conversations.load().await });
    health.poll();
    spawn_local(async move { health.mount().await });

    view! {
        <div class="flex flex-row">
            <Nav on_settings=move || set_settings_open.set(true) />
            <ChatWindow />
            <Show when=move || settings_open.get()>
                <Settings on_close=move || set_settings_open.set(false) />
            </Show>
            {move || {
                notice
                    .get()
                    .map(|notice| {
                        let local = notice == SaveNotice::SavedLocally;
                        view! {
                            <div
                                class="fixed bottom-5 right-5 z-50 p-4 w-80 rounded-lg shadow bg-white dark:bg-gray-800 dark:text-white border"
                                class:border-amber-500=local
                            >
                                <h5 class="text-sm font-semibold">{notice.title()}</h5>
                                <p class="text-sm text-gray-500 dark:text-gray-400">
                                    {notice.description()}
                                </p>
                            </div>
                        }
                    })
            }}
        </div>
    }
}
