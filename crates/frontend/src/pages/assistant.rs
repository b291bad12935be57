use dioxus::prelude::*;
use wayfinder_shared::overlay::ChatHost;

use crate::components::chat_panel::ChatPanel;
use crate::components::map_view::MapView;
use crate::components::notices::Toasts;
use crate::components::place_panel::PlacePanel;
use crate::components::poi_filter::PoiFilter;
use crate::components::search_box::SearchBox;
use crate::components::travel_panel::TravelPanel;
use crate::host::use_host_provider;

#[component]
pub fn Assistant() -> Element {
    let host = use_host_provider();
    let chat_host = host.session.read().overlay().chat_host();

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "Wayfinder" }
                span { class: "muted", "Find places, pin them and plan a route" }
            }

            div { class: "sidebar",
                SearchBox {}
                PlacePanel {}
                PoiFilter {}
                TravelPanel {}
                if chat_host == ChatHost::Sidebar {
                    ChatPanel { overlay: false }
                }
            }

            div { class: "map-area",
                MapView {}
                if chat_host == ChatHost::MapOverlay {
                    ChatPanel { overlay: true }
                }
            }

            Toasts {}
        }
    }
}
