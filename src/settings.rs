use crate::app::Toasts;
use crate::config::ConfigStore;
use crate::health::HealthMonitor;
use crate::state::{BackendConfig, BackendKind, ACCENT_COLORS};
use leptos::*;

#[component]
fn AccentPicker() -> impl IntoView {
    let config = expect_context::<ConfigStore>();
    let toasts = expect_context::<Toasts>();
    let settings = config.config();
    let current = move || settings.with(|config| config.theme.accent_color.clone());

    ACCENT_COLORS
        .into_iter()
        .map(|accent| {
            let config = config.clone();
            let pick = move |_| {
                let config = config.clone();
                spawn_local(async move {
                    let notice = config.update_theme(accent.to_string()).await;
                    toasts.show(notice);
                });
            };
            view! {
                <button
                    type="button"
                    class=format!("w-8 h-8 rounded-full bg-{accent}-500")
                    class:ring-2=move || current() == accent
                    class:ring-offset-2=move || current() == accent
                    title=accent
                    on:click=pick
                >
                    <span class="sr-only">{accent}</span>
                </button>
            }
        })
        .collect_view()
}

/// Backend and appearance settings. Backend changes are staged until saved.
#[component]
pub fn Settings<F>(on_close: F) -> impl IntoView
where
    F: Fn() + 'static + Clone,
{
    let config = expect_context::<ConfigStore>();
    let health = expect_context::<HealthMonitor>();
    let toasts = expect_context::<Toasts>();
    let draft = create_rw_signal(config.get().backend);

    let change_kind = move |ev| {
        if let Some(kind) = BackendKind::parse(&event_target_value(&ev)) {
            draft.set(BackendConfig::for_kind(kind));
        }
    };
    let change_port = move |ev| {
        if let Ok(port) = event_target_value(&ev).parse::<u16>() {
            draft.update(|backend| backend.port = port);
        }
    };
    let close = on_close.clone();
    let save = move |_| {
        let config = config.clone();
        let health = health.clone();
        let backend = draft.get_untracked();
        spawn_local(async move {
            let notice = config.update_backend(backend).await;
            toasts.show(notice);
            health.refresh_models(backend.kind.as_str()).await;
        });
        close();
    };

    view! {
        <div class="fixed inset-0 z-40 flex items-center justify-center bg-black/50">
            <div class="w-full max-w-md p-6 rounded-lg shadow bg-white dark:bg-gray-800 dark:text-white">
                <div class="flex flex-row items-center mb-4">
                    <h3 class="text-lg font-semibold w-full">Settings</h3>
                    <button
                        type="button"
                        class="p-1 text-gray-500 hover:text-gray-900 dark:text-gray-400 dark:hover:text-white"
                        on:click=move |_| on_close()
                    >
                        <svg viewBox="0 0 10 10" width="14">
                            <path
                                d="M1 1L9 9M1 9L9 1"
                                stroke="currentColor"
                                fill="currentColor"
                                stroke-width="2"
                                stroke-linecap="round"
                            />
                        </svg>
                        <span class="sr-only">Close settings</span>
                    </button>
                </div>
                <label for="backend" class="block mb-1 text-sm font-medium">
                    Backend
                </label>
                <select
                    id="backend"
                    class="block w-full mb-4 p-2.5 text-sm rounded-lg border border-gray-300 bg-gray-50 dark:bg-gray-700 dark:border-gray-600"
                    on:change=change_kind
                >
                    {BackendKind::ALL
                        .into_iter()
                        .map(|kind| {
                            view! {
                                <option
                                    value=kind.as_str()
                                    selected=move || draft.with(|backend| backend.kind == kind)
                                >
                                    {kind.name()}
                                </option>
                            }
                        })
                        .collect_view()}
                </select>
                <label for="port" class="block mb-1 text-sm font-medium">
                    Port
                </label>
                <input
                    id="port"
                    type="number"
                    min="1"
                    max="65535"
                    class="block w-full mb-4 p-2.5 text-sm rounded-lg border border-gray-300 bg-gray-50 dark:bg-gray-700 dark:border-gray-600"
                    prop:value=move || draft.with(|backend| backend.port.to_string())
                    on:input=change_port
                />
                <span class="block mb-2 text-sm font-medium">Accent color</span>
                <div class="flex flex-row gap-3 mb-6">
                    <AccentPicker />
                </div>
                <button
                    type="button"
                    class="w-full text-white bg-gray-800 hover:bg-gray-900 focus:outline-none focus:ring-4 focus:ring-gray-300 font-medium rounded-lg text-sm px-5 py-2.5 dark:hover:bg-gray-700"
                    on:click=save
                >
                    "Save"
                </button>
            </div>
        </div>
    }
}
