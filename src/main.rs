mod api;
mod app;
mod chat;
mod config;
mod conversation;
mod conversations;
#[cfg(test)]
mod fake;
mod health;
mod loading;
mod message;
mod nav;
mod settings;
mod state;
mod storage;

use app::*;
use leptos::*;

fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(|| {
        view! { <App /> }
    })
}
