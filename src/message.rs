use crate::state::Message;
use chrono::{DateTime, Local};
use leptos::*;
use pulldown_cmark::Event;

/// Renders assistant markdown. Raw HTML is shown as text, never injected.
pub fn render_markdown(content: &str) -> String {
    let parser = pulldown_cmark::Parser::new(content).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        event => event,
    });
    let mut parsed = String::new();
    pulldown_cmark::html::push_html(&mut parsed, parser);
    parsed
}

#[component]
pub fn MessageBubble(message: Message) -> impl IntoView {
    let is_me = message.is_user();
    let datemsg = format!(
        "{}",
        DateTime::<Local>::from(message.timestamp).format("%H:%M")
    );
    let author = if is_me { "You" } else { "Assistant" };
    let body = if is_me {
        view! { <p class="text-sm font-normal whitespace-pre-wrap">{message.content}</p> }
            .into_view()
    } else {
        let parsed = render_markdown(&message.content);
        view! { <div class="text-sm font-normal prose dark:prose-invert" inner_html=parsed /> }
            .into_view()
    };
    view! {
        <div class="flex items-start m-5 gap-2.5" class:flex-row-reverse=is_me>
            <div class="flex flex-col gap-1 max-w-[90%]">
                <div class="flex items-center space-x-2 rtl:space-x-reverse">
                    <span class="text-sm font-semibold text-gray-900 dark:text-white">
                        {author}
                    </span>
                    <span class="text-sm font-normal text-gray-500 dark:text-gray-400">
                        {datemsg}
                    </span>
                </div>
                <div
                    class="flex flex-col leading-1.5 p-4 border-gray-200 bg-gray-100 rounded-e-xl rounded-es-xl dark:bg-gray-700 text-gray-900 dark:text-white"
                    class:bg-blue-100=is_me
                >
                    {body}
                </div>
            </div>
        </div>
    }
}
