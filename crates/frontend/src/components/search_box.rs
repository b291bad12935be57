use dioxus::logger::tracing::{info, warn};
use dioxus::prelude::*;
use wayfinder_shared::models::GeocodeResult;
use wayfinder_shared::search::SearchOutcome;

use crate::api;
use crate::host::{use_host, Host};

const HISTORY_LIMIT: usize = 5;

/// Show a geocoder hit: ask the backend whether it is a known POI, then hand
/// both to the session.
fn show_result(host: Host, result: GeocodeResult) {
    let base = host.poi_base();
    spawn(async move {
        let matched = match api::check_poi(&base, &result).await {
            Ok(m) => m,
            Err(e) => {
                // Still show the place, just without POI details
                warn!(error = %e, "poi match unavailable");
                None
            }
        };
        match host.update(|s| s.handle_search_result(&result, matched)) {
            Ok(SearchOutcome::Poi(id)) => info!(poi = %id, "search opened poi"),
            Ok(SearchOutcome::Candidate(_)) => {}
            Err(e) => host.toast(e.to_string(), true),
        }
    });
}

#[component]
pub fn SearchBox() -> Element {
    let host = use_host();
    let mut query = use_signal(String::new);
    let mut results = use_signal(Vec::<GeocodeResult>::new);
    let mut searching = use_signal(|| false);
    let mut history_version = use_signal(|| 0u64);

    let base = host.poi_base();
    let history = use_resource(move || {
        let base = base.clone();
        let _version = history_version();
        async move { api::recent_searches(&base, HISTORY_LIMIT).await.unwrap_or_default() }
    });

    let mut run_search = move |keyword: String| {
        let keyword = keyword.trim().to_string();
        if keyword.is_empty() {
            return;
        }
        spawn(api::log_search_then(host.poi_base(), keyword.clone(), move || history_version += 1));
        searching.set(true);
        spawn(async move {
            match api::geocode(&keyword).await {
                Ok(found) if found.is_empty() => {
                    results.set(Vec::new());
                    host.toast(format!("No results for \"{}\"", keyword), false);
                }
                Ok(found) => {
                    if found.len() == 1 {
                        results.set(Vec::new());
                        show_result(host, found[0].clone());
                    } else {
                        results.set(found);
                    }
                }
                Err(e) => host.toast(format!("Search failed ({})", e), true),
            }
            searching.set(false);
        });
    };

    let recent: Vec<String> = history
        .read()
        .as_ref()
        .map(|h| h.iter().map(|e| e.keyword.clone()).collect())
        .unwrap_or_default();
    let found: Vec<GeocodeResult> = results.read().clone();
    let show_recent = query.read().is_empty() && found.is_empty() && !recent.is_empty();

    rsx! {
        div { class: "panel search-box",
            form {
                onsubmit: move |evt: Event<FormData>| {
                    evt.prevent_default();
                    run_search(query.read().clone());
                },
                input {
                    r#type: "search",
                    placeholder: "Search for a place",
                    value: "{query}",
                    oninput: move |evt: Event<FormData>| query.set(evt.value()),
                }
                button { r#type: "submit", disabled: searching(), if searching() { "..." } else { "Search" } }
            }
            if !found.is_empty() {
                ul { class: "search-results",
                    for (i, r) in found.into_iter().enumerate() {
                        li {
                            key: "{i}",
                            onclick: {
                                let r = r.clone();
                                move |_| {
                                    results.set(Vec::new());
                                    show_result(host, r.clone());
                                }
                            },
                            "{r.name}"
                        }
                    }
                }
            }
            if show_recent {
                div { class: "recent-searches",
                    span { class: "muted", "Recent: " }
                    for keyword in recent {
                        button {
                            key: "{keyword}",
                            class: "chip",
                            onclick: {
                                let keyword = keyword.clone();
                                move |_| {
                                    query.set(keyword.clone());
                                    run_search(keyword.clone());
                                }
                            },
                            "{keyword}"
                        }
                    }
                }
            }
        }
    }
}
