use dioxus::prelude::*;
use wayfinder_shared::candidate::{CandidateChoice, CandidateId};

use crate::host::use_host;

/// Body of the popup over an unresolved candidate pin: a note field and the
/// three ways to keep the point.
#[component]
pub fn CandidatePopup(id: CandidateId) -> Element {
    let host = use_host();
    let session = host.session;

    let Some(pin) = session.read().candidate().filter(|p| p.id == id).cloned() else {
        return rsx! {};
    };

    let resolve = move |choice: CandidateChoice| {
        if let Err(e) = host.update(|s| s.resolve_candidate(id, choice)) {
            host.toast(e.to_string(), true);
        }
    };

    rsx! {
        div { class: "candidate-popup",
            div { class: "candidate-name", "{pin.name}" }
            div { class: "candidate-coord",
                "{pin.coordinate.lat:.5}, {pin.coordinate.lng:.5}"
            }
            input {
                r#type: "text",
                placeholder: "Add a note",
                value: "{pin.note}",
                oninput: move |evt: Event<FormData>| {
                    let note = evt.value();
                    // Notes only matter to the open pin; no requests follow.
                    let _ = host.update(|s| s.set_candidate_note(id, &note));
                },
            }
            div { class: "candidate-actions",
                button { class: "btn-start", onclick: move |_| resolve(CandidateChoice::Start), "Start" }
                button { class: "btn-end", onclick: move |_| resolve(CandidateChoice::End), "End" }
                button { class: "btn-save", onclick: move |_| resolve(CandidateChoice::Save), "Save" }
            }
        }
    }
}
