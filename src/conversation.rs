use crate::app::Toasts;
use crate::chat::ChatFlow;
use crate::config::ConfigStore;
use crate::conversations::ConversationStore;
use crate::health::HealthMonitor;
use crate::loading::Thinking;
use crate::message::MessageBubble;
use crate::state::DEFAULT_TITLE;
use leptos::leptos_dom::ev::SubmitEvent;
use leptos::*;

#[component]
fn SearchToggle() -> impl IntoView {
    let config = expect_context::<ConfigStore>();
    let toasts = expect_context::<Toasts>();
    let settings = config.config();
    let enabled = move || settings.with(|config| config.web_search_enabled);
    let toggle = move |_| {
        let config = config.clone();
        spawn_local(async move {
            let notice = config.toggle_web_search().await;
            toasts.show(notice);
        });
    };
    view! {
        <button
            type="button"
            class="px-3 py-1 text-xs rounded-full border text-gray-500 dark:text-gray-400"
            class:border-blue-500=enabled
            class:text-blue-600=enabled
            on:click=toggle
        >
            {move || if enabled() { "Web search on" } else { "Web search off" }}
        </button>
    }
}

#[component]
fn ModelSelector() -> impl IntoView {
    let config = expect_context::<ConfigStore>();
    let health = expect_context::<HealthMonitor>();
    let toasts = expect_context::<Toasts>();
    let settings = config.config();
    let models = health.models();
    let names = move || {
        models.with(|models| {
            models
                .as_ref()
                .map(|models| models.models.clone())
                .unwrap_or_default()
        })
    };
    let selected = move || settings.with(|config| config.model.clone().unwrap_or_default());
    let change = move |ev| {
        let model = event_target_value(&ev);
        let config = config.clone();
        let health = health.clone();
        spawn_local(async move {
            let provider = config.get().backend.kind;
            let notice = config.select_model(Some(model)).await;
            toasts.show(notice);
            health.refresh_models(provider.as_str()).await;
        });
    };
    view! {
        <div class="flex items-center gap-2 text-xs text-gray-500 dark:text-gray-400">
            <select
                class="p-1 text-sm rounded-lg border border-gray-300 bg-white dark:bg-gray-800 dark:border-gray-600"
                prop:disabled=move || names().is_empty()
                on:change=change
            >
                <option value="" disabled selected=move || selected().is_empty()>
                    {move || if names().is_empty() { "No models available" } else { "Select model" }}
                </option>
                {move || {
                    let selected = selected();
                    names()
                        .into_iter()
                        .map(|name| {
                            let is_selected = name == selected;
                            view! {
                                <option value=name.clone() selected=is_selected>
                                    {name}
                                </option>
                            }
                        })
                        .collect::<Vec<_>>()
                }}
            </select>
            {move || {
                let count = names().len();
                match count {
                    0 => String::new(),
                    1 => "1 model available".to_string(),
                    n => format!("{n} models available"),
                }
            }}
        </div>
    }
}

#[component]
pub fn ChatWindow() -> impl IntoView {
    let store = expect_context::<ConversationStore>();
    let chat = expect_context::<ChatFlow>();
    let (message, set_message) = create_signal(String::new());
    let sending = chat.is_sending();

    let update_message = move |ev| {
        let v = event_target_value(&ev);
        set_message.set(v);
    };
    let send_message = move |ev: SubmitEvent| {
        ev.prevent_default();
        if sending.get_untracked() {
            return;
        }
        let content = message.get_untracked();
        set_message.set(String::new());
        let chat = chat.clone();
        spawn_local(async move {
            chat.send_message(content).await;
        });
    };
    let title = {
        let store = store.clone();
        move || {
            store
                .active()
                .map(|conversation| conversation.title)
                .unwrap_or_else(|| DEFAULT_TITLE.to_string())
        }
    };

    view! {
        <div class="h-dvh max-h-dvh grow flex flex-col scrollbar lg:w-4/5 w-screen max-w-screen dark:text-white">
            <header class="flex items-center justify-between p-4 border-b dark:border-gray-800">
                <h1 class="text-lg font-semibold truncate">{title}</h1>
                <ModelSelector />
            </header>
            <main class="grow flex flex-col-reverse overflow-auto max-h-screen">
                <Show when=move || sending.get()>
                    <Thinking />
                </Show>
                {move || match store.active() {
                    Some(conversation) => {
                        conversation
                            .messages
                            .into_iter()
                            .rev()
                            .map(|message| view! { <MessageBubble message=message /> })
                            .collect_view()
                    }
                    None => {
                        view! {
                            <div class="flex items-center justify-center h-full text-gray-500">
                                "No conversation selected"
                            </div>
                        }
                            .into_view()
                    }
                }}
            </main>
            <form class="w-full" on:submit=send_message>
                <label for="chat" class="sr-only">
                    Your message
                </label>
                <div class="flex items-center gap-2 px-3 py-2 bg-gray-50 dark:bg-gray-700">
                    <SearchToggle />
                    <input
                        id="chat"
                        class="block mx-2 p-2.5 w-full text-sm text-gray-900 bg-white rounded-lg border border-gray-300 focus:ring-blue-500 focus:border-blue-500 dark:bg-gray-800 dark:border-gray-600 dark:placeholder-gray-400 dark:text-white dark:focus:ring-blue-500 dark:focus:border-blue-500"
                        placeholder="Your message..."
                        on:input=update_message
                        prop:value=message
                    />
                    <button
                        type="submit"
                        class="inline-flex justify-center p-2 text-blue-600 rounded-full cursor-pointer hover:bg-blue-100 dark:text-blue-500 dark:hover:bg-gray-600 disabled:opacity-50 disabled:cursor-not-allowed"
                        prop:disabled=move || sending.get()
                    >
                        <svg
                            class="w-5 h-5 rotate-90 rtl:-rotate-90"
                            aria-hidden="true"
                            xmlns="http://www.w3.org/2000/svg"
                            fill="currentColor"
                            viewBox="0 0 18 20"
                        >
                            <path d="m17.914 18.594-8-18a1 1 0 0 0-1.828 0l-8 18a1 1 0 0 0 1.157 1.376L8 18.281V9a1 1 0 0 1 2 0v9.281l6.758 1.689a1 1 0 0 0 1.156-1.376Z" />
                        </svg>
                        <span class="sr-only">Send message</span>
                    </button>
                </div>
            </form>
        </div>
    }
}
