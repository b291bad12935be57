use dioxus::prelude::*;
use wayfinder_shared::models::{CategoryInfo, PoiCategory};

use crate::api;
use crate::host::use_host;

/// Category buttons plus the list of places currently shown.
#[component]
pub fn PoiFilter() -> Element {
    let host = use_host();
    let base = host.poi_base();
    let categories_resource = use_resource(move || {
        let base = base.clone();
        async move { api::fetch_categories(&base).await }
    });

    let categories: Vec<CategoryInfo> = match &*categories_resource.read() {
        Some(Ok(c)) => c.clone(),
        _ => vec![],
    };
    let load_error = matches!(&*categories_resource.read(), Some(Err(_)));

    let (active, pois) = {
        let s = host.session.read();
        let pois: Vec<(String, String)> = s.pois().iter().map(|p| (p.id.clone(), p.name.clone())).collect();
        (s.active_category().map(|c| c.0.clone()), pois)
    };

    rsx! {
        div { class: "panel poi-filter",
            h3 { "Places" }
            if load_error {
                p { class: "muted", "Categories unavailable" }
            }
            div { class: "category-buttons",
                for c in categories {
                    button {
                        key: "{c.slug}",
                        class: if active.as_deref() == Some(c.slug.as_str()) { "category active" } else { "category" },
                        title: "{c.display_name}",
                        onclick: {
                            let slug = c.slug.clone();
                            move |_| host.update(|s| s.select_category(PoiCategory::new(slug.clone())))
                        },
                        span { class: "category-icon", "{c.icon}" }
                        span { "{c.display_name}" }
                    }
                }
            }
            if active.is_some() && !pois.is_empty() {
                ul { class: "poi-list",
                    for (id, name) in pois {
                        li {
                            key: "{id}",
                            onclick: {
                                let id = id.clone();
                                move |_| {
                                    if let Err(e) = host.update(|s| s.select_poi(&id)) {
                                        host.toast(e.to_string(), true);
                                    }
                                }
                            },
                            "{name}"
                        }
                    }
                }
            }
        }
    }
}
