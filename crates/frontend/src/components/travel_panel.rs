use dioxus::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wayfinder_shared::models::{LatLng, TravelMode};
use wayfinder_shared::routing::{RouteFailure, RouteStatus};
use wayfinder_shared::surface::RenderSurface;

use crate::host::{use_host, Host};

const YOU_ARE_HERE: &str = "You are here";

/// One-line description of the routing state.
fn status_text(status: &RouteStatus, has_start: bool, has_end: bool) -> String {
    match status {
        RouteStatus::Requesting { .. } => "Finding route...".to_string(),
        RouteStatus::Failed(RouteFailure::NoRoute) => "Can't find route!".to_string(),
        RouteStatus::Failed(RouteFailure::Unreachable(_)) => "Routing service unreachable".to_string(),
        RouteStatus::Success | RouteStatus::Idle => match (has_start, has_end) {
            (false, false) => "Click the map to pick a start and a destination".to_string(),
            (true, false) => "Pick a destination".to_string(),
            (false, true) => "Pick a start".to_string(),
            (true, true) => String::new(),
        },
    }
}

/// Browser geolocation, awaited as a promise.
async fn current_position() -> Result<LatLng, String> {
    let geolocation = web_sys::window()
        .ok_or("no window")?
        .navigator()
        .geolocation()
        .map_err(|_| "geolocation unavailable".to_string())?;
    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        if geolocation
            .get_current_position_with_error_callback(&resolve, Some(&reject))
            .is_err()
        {
            let _ = reject.call0(&wasm_bindgen::JsValue::NULL);
        }
    });
    let value = JsFuture::from(promise)
        .await
        .map_err(|_| "location permission denied".to_string())?;
    let position: web_sys::GeolocationPosition =
        value.dyn_into().map_err(|_| "unexpected position value".to_string())?;
    let coords = position.coords();
    Ok(LatLng::new(coords.latitude(), coords.longitude()))
}

fn locate_me(host: Host) {
    spawn(async move {
        match current_position().await {
            Ok(here) => {
                let placed = host.update(|s| {
                    let handle = s.set_user_location(here, YOU_ARE_HERE)?;
                    let zoom = s.config().focus_zoom;
                    s.surface_mut().fly_to(here, zoom);
                    s.on_viewport_settled();
                    Ok::<_, wayfinder_shared::MapError>(handle)
                });
                if let Err(e) = placed {
                    host.toast(e.to_string(), true);
                }
            }
            Err(e) => host.toast(e, true),
        }
    });
}

/// Travel mode switch, route state and map-wide actions.
#[component]
pub fn TravelPanel() -> Element {
    let host = use_host();
    let (mode, status, summary, has_start, has_end) = {
        let s = host.session.read();
        (
            s.travel_mode(),
            s.route_status().clone(),
            s.route().map(|r| r.summary()),
            s.start().is_some(),
            s.end().is_some(),
        )
    };
    let status_line = status_text(&status, has_start, has_end);

    rsx! {
        div { class: "panel travel-panel",
            h3 { "Route" }
            div { class: "travel-modes",
                for m in TravelMode::ALL {
                    button {
                        key: "{m}",
                        class: if m == mode { "mode active" } else { "mode" },
                        onclick: move |_| host.update(|s| s.set_travel_mode(m)),
                        "{m.label()}"
                    }
                }
            }
            if !status_line.is_empty() {
                p { class: "route-status", "{status_line}" }
            }
            if let Some(text) = summary {
                div { class: "route-summary",
                    for line in text.lines().map(str::to_string).collect::<Vec<_>>() {
                        div { "{line}" }
                    }
                }
            }
            div { class: "panel-actions",
                button {
                    disabled: !has_start,
                    onclick: move |_| { host.update(|s| s.unpin_start()); },
                    "Unpin start"
                }
                button {
                    disabled: !has_end,
                    onclick: move |_| { host.update(|s| s.unpin_end()); },
                    "Unpin end"
                }
            }
            div { class: "panel-actions",
                button { onclick: move |_| locate_me(host), "My location" }
                button {
                    class: "btn-danger",
                    onclick: move |_| host.update(|s| s.clear_map()),
                    "Clear map"
                }
            }
        }
    }
}
