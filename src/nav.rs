use crate::conversations::ConversationStore;
use crate::health::{provider_summary, Connection, HealthMonitor};
use crate::loading::Spinner;
use crate::state::Conversation;
use chrono::Utc;
use ev::MouseEvent;
use leptos::*;

#[component]
fn ConnectionStatus() -> impl IntoView {
    let health = expect_context::<HealthMonitor>();
    let status = health.status();
    let loading = health.is_loading();
    let connection = move || status.with(|status| Connection::of(status.as_ref(), loading.get()));

    view! {
        <div
            class="flex items-center gap-2 mx-4 px-3 py-2 rounded-lg border text-left"
            class:border-green-500=move || connection() == Connection::Connected
            class:border-yellow-500=move || {
                matches!(connection(), Connection::Degraded | Connection::Checking)
            }
            class:border-red-500=move || connection() == Connection::Disconnected
        >
            {move || {
                if connection() == Connection::Checking {
                    view! { <Spinner /> }.into_view()
                } else {
                    view! {
                        <div
                            class="w-2 h-2 rounded-full"
                            class:bg-green-500=move || connection() == Connection::Connected
                            class:bg-yellow-500=move || connection() == Connection::Degraded
                            class:bg-red-500=move || connection() == Connection::Disconnected
                        />
                    }
                        .into_view()
                }
            }}
            <div class="flex flex-col">
                <span class="text-sm font-medium">{move || connection().label()}</span>
                <span class="text-xs text-gray-500 dark:text-gray-400">
                    {move || status.with(|status| status.as_ref().map(provider_summary))}
                </span>
            </div>
        </div>
    }
}

/// Switches to `id` and collapses the sidebar, which only matters on mobile.
fn open_conversation(store: &ConversationStore, id: &str, set_show: WriteSignal<bool>) {
    set_show.set(false);
    store.switch(id);
}

#[component]
fn ConversationItem(
    conversation: Conversation,
    active: bool,
    set_show: WriteSignal<bool>,
) -> impl IntoView {
    let store = expect_context::<ConversationStore>();
    let id = conversation.id.clone();
    let select = {
        let store = store.clone();
        let id = id.clone();
        move |_| open_conversation(&store, &id, set_show)
    };
    let delete = move |ev: MouseEvent| {
        ev.stop_propagation();
        let store = store.clone();
        let id = id.clone();
        spawn_local(async move { store.delete(&id).await });
    };
    let recency = conversation.recency(Utc::now());
    view! {
        <li
            class="group flex flex-row items-start p-2 rounded-lg cursor-pointer hover:bg-gray-100 dark:hover:bg-gray-700"
            class:bg-gray-100=active
            on:click=select
        >
            <div class="flex flex-col grow min-w-0 text-left">
                <span class="text-sm font-semibold truncate">{conversation.title}</span>
                <span class="text-xs text-gray-500 dark:text-gray-400 truncate">
                    {conversation.preview}
                </span>
                <span class="text-xs text-gray-400">{recency}</span>
            </div>
            <button
                type="button"
                class="invisible group-hover:visible p-1 text-gray-500 hover:text-red-600"
                on:click=delete
            >
                <svg viewBox="0 0 10 10" width="12">
                    <path
                        d="M1 1L9 9M1 9L9 1"
                        stroke="currentColor"
                        fill="currentColor"
                        stroke-width="2"
                        stroke-linecap="round"
                    />
                </svg>
                <span class="sr-only">Delete conversation</span>
            </button>
        </li>
    }
}

#[component]
pub fn Nav<T>(on_settings: T) -> impl IntoView
where
    T: Fn() + 'static + Clone,
{
    let store = expect_context::<ConversationStore>();
    let conversations = store.conversations();
    let active = store.active_id();
    let (show, set_show) = create_signal(true);
    let new_conversation = move |_| {
        let store = store.clone();
        spawn_local(async move {
            store.create(None).await;
        });
    };
    view! {
        {move || {
            if show.get() {
                view! { <div /> }
            } else {
                view! {
                    <div
                        class="lg:hidden text-gray-500 dark:text-gray-400 p-5 absolute top-0 left-0"
                        on:click=move |_| {
                            set_show
                                .update(|s| {
                                    *s = !*s;
                                })
                        }
                    >
                        <svg viewBox="0 0 10 8" width="20">
                            <path
                                d="M1 1h8M1 4h 8M1 7h8"
                                stroke="currentColor"
                                fill="currentColor"
                                stroke-width="2"
                                stroke-linecap="round"
                            />
                        </svg>
                    </div>
                }
            }
        }}
        <div
            class="lg:w-1/5 w-full lg:flex border-e-2 dark:border-gray-800 min-h-dvh max-h-dvh overflow-y-auto dark:text-white"
            class:hidden=move || !show.get()
        >
            <div class="text-center w-full flex flex-col vertical-align">
                <div
                    class="lg:hidden text-gray-500 dark:text-gray-400 p-5"
                    on:click=move |_| {
                        set_show
                            .update(|s| {
                                *s = !*s;
                            })
                    }
                >
                    <svg viewBox="0 0 10 10" width="20">
                        <path
                            d="M1 1L9 9M1 9L9 1"
                            stroke="currentColor"
                            fill="currentColor"
                            stroke-width="2"
                            stroke-linecap="round"
                        />
                    </svg>
                </div>
                <div class="flex flex-row m-4 items-center">
                    <h5 class="text-base py-2.5 font-semibold text-gray-500 uppercase dark:text-gray-400 w-full">
                        Bifrost
                    </h5>
                    <button
                        type="button"
                        class="p-2 text-gray-500 rounded-lg hover:bg-gray-100 dark:text-gray-400 dark:hover:bg-gray-700"
                        on:click=move |_| on_settings()
                    >
                        <svg
                            class="w-5 h-5"
                            viewBox="0 0 20 20"
                            fill="none"
                            xmlns="http://www.w3.org/2000/svg"
                        >
                            <circle cx="10" cy="10" r="3" stroke="currentColor" stroke-width="2" />
                            <path
                                d="M10 1v3M10 16v3M1 10h3M16 10h3M3.6 3.6l2.1 2.1M14.3 14.3l2.1 2.1M3.6 16.4l2.1-2.1M14.3 5.7l2.1-2.1"
                                stroke="currentColor"
                                stroke-width="2"
                                stroke-linecap="round"
                            />
                        </svg>
                        <span class="sr-only">Settings</span>
                    </button>
                </div>
                <ConnectionStatus />
                <button
                    type="button"
                    class="text-white bg-gray-800 hover:bg-gray-900 focus:outline-none focus:ring-4 focus:ring-gray-300 font-medium rounded-lg text-sm m-4 px-5 py-2.5 dark:bg-gray-800 dark:hover:bg-gray-700 dark:focus:ring-gray-700 dark:border-gray-700"
                    on:click=new_conversation
                >
                    "+ New Conversation"
                </button>
                <ul class="flex flex-col gap-1 px-2">
                    {move || {
                        let active = active.get();
                        conversations
                            .get()
                            .into_iter()
                            .map(|conversation| {
                                let is_active = active.as_deref() == Some(conversation.id.as_str());
                                view! { <ConversationItem conversation active=is_active set_show /> }
                            })
                            .collect::<Vec<_>>()
                    }}
                </ul>
            </div>
        </div>
    }
}
