use dioxus::prelude::*;
use wayfinder_shared::bridge::{pin_location_to_map, LocationPin};

use crate::host::{use_host, Host, SelectedPlace};

fn pin_from_place(place: &SelectedPlace) -> LocationPin {
    let mut pin = LocationPin::new(place.coordinate.lat, place.coordinate.lng, place.details.name.clone());
    pin.phone = place.details.phone.clone();
    pin.website = place.details.website.clone();
    pin.distance_km = place.details.distance_km;
    pin
}

fn show_step(host: Host, place: &SelectedPlace) {
    let c = place.coordinate;
    let title = place.details.name.clone();
    if let Err(e) = host.update(|s| s.focus_on_coordinate(c.lat, c.lng, &title, None)) {
        host.toast(e.to_string(), true);
    }
}

/// Feed of the places the map has shown, newest first. Each entry can be
/// revisited as a guide step or pinned again.
#[component]
pub fn ChatPanel(overlay: bool) -> Element {
    let host = use_host();
    let places: Vec<SelectedPlace> = host.places.read().iter().rev().cloned().collect();
    let empty = places.is_empty();

    rsx! {
        div { class: if overlay { "panel chat-panel chat-overlay" } else { "panel chat-panel" },
            div { class: "panel-header",
                h3 { "Places seen" }
                div { class: "panel-actions",
                    button {
                        title: "Remove the guide marker",
                        onclick: move |_| { host.update(|s| s.clear_guide()); },
                        "Clear guide"
                    }
                    button {
                        disabled: empty,
                        onclick: move |_| host.clear_places(),
                        "Clear list"
                    }
                }
            }
            if empty {
                p { class: "muted", "Places you open on the map show up here." }
            }
            ul { class: "place-feed",
                for (i, place) in places.into_iter().enumerate() {
                    li { key: "{i}",
                        div { class: "place-feed-name", "{place.details.name}" }
                        if let Some(location) = &place.details.location {
                            div { class: "muted", "{location}" }
                        }
                        div { class: "panel-actions",
                            button {
                                onclick: {
                                    let place = place.clone();
                                    move |_| show_step(host, &place)
                                },
                                "Show"
                            }
                            button {
                                onclick: {
                                    let pin = pin_from_place(&place);
                                    move |_| {
                                        let pin = pin.clone();
                                        host.update(|s| pin_location_to_map(Some(s), pin));
                                    }
                                },
                                "Pin"
                            }
                        }
                    }
                }
            }
        }
    }
}
