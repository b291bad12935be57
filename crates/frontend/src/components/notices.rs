use dioxus::prelude::*;

use crate::host::use_host;

/// Stack of transient messages in the corner of the page.
#[component]
pub fn Toasts() -> Element {
    let host = use_host();
    let toasts = host.toasts.read().clone();
    if toasts.is_empty() {
        return rsx! {};
    }

    rsx! {
        div { class: "toasts",
            for t in toasts {
                div {
                    key: "{t.id}",
                    class: if t.error { "toast toast-error" } else { "toast" },
                    span { "{t.message}" }
                    button {
                        class: "toast-close",
                        onclick: move |_| host.dismiss(t.id),
                        "×"
                    }
                }
            }
        }
    }
}
