use dioxus::prelude::*;
use wayfinder_shared::geo::format_distance;
use wayfinder_shared::poi::{AppliedAction, PanelAction};

use crate::host::use_host;

fn applied_text(applied: AppliedAction) -> &'static str {
    match applied {
        AppliedAction::Start => "Set as start",
        AppliedAction::End => "Set as destination",
        AppliedAction::Pinned(_) => "Pinned",
        AppliedAction::Route => "Route from your location",
    }
}

/// Website links without a scheme are treated as http.
fn website_href(site: &str) -> String {
    if site.starts_with("http://") || site.starts_with("https://") {
        site.to_string()
    } else {
        format!("http://{}", site)
    }
}

/// Sidebar with the selected place's details and actions.
#[component]
pub fn PlacePanel() -> Element {
    let host = use_host();
    let Some(panel) = host.session.read().panel().cloned() else {
        return rsx! {};
    };
    let details = panel.details;
    let has_user = host.session.read().user_location().is_some();

    let act = move |action: PanelAction| {
        if let Err(e) = host.update(|s| s.panel_action(action)) {
            host.toast(e.to_string(), true);
        }
    };

    let image = details.image.clone().map(|img| format!("/poi-images/{}", img.trim_start_matches('/')));
    let distance = details.distance_km.map(|km| format_distance(km * 1000.0));

    rsx! {
        div { class: "panel place-panel",
            div { class: "panel-header",
                h3 { "{details.name}" }
                button {
                    class: "panel-close",
                    onclick: move |_| host.update(|s| s.close_panel()),
                    "×"
                }
            }
            if let Some(src) = image {
                img { class: "place-image", src: "{src}", alt: "{details.name}" }
            }
            dl { class: "place-details",
                if let Some(category) = &details.category {
                    dt { "Type" }
                    dd { "{category}" }
                }
                if let Some(location) = &details.location {
                    dt { "Address" }
                    dd { "{location}" }
                }
                if let Some(phone) = &details.phone {
                    dt { "Phone" }
                    dd { a { href: "tel:{phone}", "{phone}" } }
                }
                if let Some(site) = &details.website {
                    dt { "Website" }
                    dd { a { href: "{website_href(site)}", target: "_blank", rel: "noopener", "{site}" } }
                }
                if let Some(d) = distance {
                    dt { "Distance" }
                    dd { "{d}" }
                }
            }
            div { class: "panel-actions",
                button { onclick: move |_| act(PanelAction::Start), "Start" }
                button { onclick: move |_| act(PanelAction::End), "End" }
                button { onclick: move |_| act(PanelAction::Pin), "Pin" }
                button {
                    disabled: !has_user,
                    title: if has_user { "Route from your location" } else { "Share your location first" },
                    onclick: move |_| act(PanelAction::Route),
                    "Route"
                }
                if let Some(applied) = panel.applied {
                    button {
                        class: "btn-unpin",
                        title: "{applied_text(applied)}",
                        onclick: move |_| act(PanelAction::Unpin),
                        "Unpin"
                    }
                }
            }
        }
    }
}
