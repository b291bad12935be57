use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use wayfinder_shared::geo::Viewport;
use wayfinder_shared::models::{LatLng, MarkerRole};
use wayfinder_shared::session::{Popup, PopupKind};
use wayfinder_shared::store::PinId;
use wayfinder_shared::style::{style_for, MarkerStyle};
use wayfinder_shared::surface::Handle;

use crate::components::candidate_popup::CandidatePopup;
use crate::coords;
use crate::host::{use_host, Host};

pub const MAP_CONTAINER_ID: &str = "wayfinder-map-container";

const TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Markers this far outside the container are not drawn.
const OFFSCREEN_SLACK: f64 = 64.0;

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

// ---------------------------------------------------------------------------
// Render data (pure, testable)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct MarkerView {
    handle: Handle,
    left: f64,
    top: f64,
    style: MarkerStyle,
    label: String,
}

#[derive(Debug, Clone, PartialEq)]
struct PolylineView {
    handle: Handle,
    points: String,
    color: String,
    weight: f64,
}

/// `x,y x,y ...` in container pixels.
fn polyline_points(viewport: &Viewport, points: &[LatLng]) -> String {
    points
        .iter()
        .map(|p| {
            let (x, y) = viewport.to_container(*p);
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// SVG for a map pin. Drop-shaped for place markers, a ringed dot for the
/// user's avatar.
fn pin_svg(style: &MarkerStyle, role: MarkerRole) -> String {
    let (w, h) = style.size;
    let color = style.color;
    if role == MarkerRole::Avatar {
        let r = w / 2.0;
        let inner = r * 0.45;
        return format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><circle cx="{r}" cy="{r}" r="{r}" fill="{color}" fill-opacity="0.2"/><circle cx="{r}" cy="{r}" r="{inner}" fill="{color}" stroke="white" stroke-width="3"/></svg>"##
        );
    }
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 25 41"><path d="M12.5 0C5.6 0 0 5.6 0 12.5 0 21.9 12.5 41 12.5 41S25 21.9 25 12.5C25 5.6 19.4 0 12.5 0z" fill="{color}" stroke="rgba(0,0,0,0.35)" stroke-width="1"/><circle cx="12.5" cy="12.5" r="4.5" fill="white"/></svg>"##
    )
}

fn collect_markers(scene: &wayfinder_shared::Scene) -> Vec<(MarkerView, MarkerRole)> {
    let viewport = scene.viewport();
    scene
        .markers()
        .filter_map(|(handle, spec)| {
            let (x, y) = viewport.to_container(spec.coordinate);
            if !coords::in_view(x, y, viewport.width, viewport.height, OFFSCREEN_SLACK) {
                return None;
            }
            let style = style_for(spec.presentation);
            let (left, top) = coords::icon_origin(&style, x, y);
            Some((
                MarkerView {
                    handle,
                    left,
                    top,
                    style,
                    label: spec.label.clone(),
                },
                spec.presentation,
            ))
        })
        .collect()
}

fn collect_polylines(scene: &wayfinder_shared::Scene) -> Vec<PolylineView> {
    let viewport = scene.viewport();
    scene
        .polylines()
        .map(|(handle, spec)| PolylineView {
            handle,
            points: polyline_points(viewport, &spec.points),
            color: spec.color.clone(),
            weight: spec.weight,
        })
        .collect()
}

/// Popup position: above the marker it belongs to, or at the anchor for
/// route summaries.
fn popup_position(viewport: &Viewport, popup: &Popup) -> (f64, f64) {
    let (x, y) = viewport.to_container(popup.anchor);
    let role = match popup.kind {
        PopupKind::Candidate(_) => MarkerRole::Candidate,
        PopupKind::Start => MarkerRole::Start,
        PopupKind::End => MarkerRole::End,
        PopupKind::Saved(_) => MarkerRole::Saved,
        PopupKind::Step => MarkerRole::Step,
        PopupKind::UserLocation => MarkerRole::Avatar,
        PopupKind::Location => MarkerRole::Location,
        PopupKind::RouteSummary => return (x, y),
    };
    coords::popup_point(&style_for(role), x, y)
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Sync the scene size with the rendered container.
fn sync_size(host: Host) {
    let Some(rect) = coords::element_rect(MAP_CONTAINER_ID) else {
        return;
    };
    let (w, h) = (rect.width(), rect.height());
    let mut session = host.session;
    let current = *session.peek().surface().viewport();
    if (current.width - w).abs() > 0.5 || (current.height - h).abs() > 0.5 {
        session.write().surface_mut().set_size(w, h);
    }
}

#[component]
pub fn MapView() -> Element {
    let host = use_host();
    let mut session = host.session;

    // Last pointer position while a button or finger is down
    let mut last_pointer = use_signal(|| None::<(f64, f64)>);

    use_effect(move || {
        sync_size(host);
        host.update(|s| s.on_viewport_settled());
    });

    let (tiles, polylines, markers, popup, fullscreen) = {
        let s = session.read();
        let scene = s.surface();
        let viewport = *scene.viewport();
        let popup = s.popup().cloned().map(|p| {
            let pos = popup_position(&viewport, &p);
            (p, pos)
        });
        (
            viewport.visible_tiles(),
            collect_polylines(scene),
            collect_markers(scene),
            popup,
            s.is_fullscreen(),
        )
    };

    let dragging = session.read().store().drag().is_dragging();
    let container_class = format!(
        "map-container{}{}",
        if fullscreen { " fullscreen" } else { "" },
        if dragging { " dragging" } else { "" }
    );

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();
                let delta_y = wheel_delta_y(evt.data().delta());
                let client = evt.data().client_coordinates();
                let Some((cx, cy)) = coords::client_to_element(MAP_CONTAINER_ID, client.x, client.y) else {
                    return;
                };
                let old_z = session.peek().surface().viewport().zoom;
                let new_z = coords::wheel_zoom(old_z, delta_y);
                if (new_z - old_z).abs() < 1e-9 {
                    return;
                }
                session.write().surface_mut().viewport_mut().zoom_around(cx, cy, new_z);
                host.settle_later();
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                sync_size(host);
                let client = evt.client_coordinates();
                session.write().pointer_down(client.x, client.y);
                last_pointer.set(Some((client.x, client.y)));
            },

            onmousemove: move |evt: Event<MouseData>| {
                let Some((lx, ly)) = *last_pointer.peek() else {
                    return;
                };
                let client = evt.client_coordinates();
                let mut s = session.write();
                if s.pointer_move(client.x, client.y) {
                    s.surface_mut().viewport_mut().pan_by(client.x - lx, client.y - ly);
                    drop(s);
                    last_pointer.set(Some((client.x, client.y)));
                }
            },

            onmouseup: move |_| {
                let was_drag = session.peek().store().drag().is_dragging();
                session.write().pointer_up();
                last_pointer.set(None);
                if was_drag {
                    host.update(|s| s.on_viewport_settled());
                }
            },

            onmouseleave: move |_| {
                if last_pointer.peek().is_some() {
                    let was_drag = session.peek().store().drag().is_dragging();
                    session.write().pointer_up();
                    last_pointer.set(None);
                    if was_drag {
                        host.update(|s| s.on_viewport_settled());
                    }
                }
            },

            onclick: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                let Some((x, y)) = coords::client_to_element(MAP_CONTAINER_ID, client.x, client.y) else {
                    return;
                };
                let coordinate = session.peek().surface().viewport().to_latlng(x, y);
                host.update(|s| s.on_map_click(coordinate));
            },

            // --- Touch: one finger pans, a tap pins ---

            ontouchstart: move |evt: Event<TouchData>| {
                let touches = evt.data().touches();
                if touches.len() != 1 {
                    return;
                }
                sync_size(host);
                let p = touches[0].client_coordinates();
                session.write().pointer_down(p.x, p.y);
                last_pointer.set(Some((p.x, p.y)));
            },

            ontouchmove: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();
                let (Some((lx, ly)), 1) = (*last_pointer.peek(), touches.len()) else {
                    return;
                };
                let p = touches[0].client_coordinates();
                let mut s = session.write();
                if s.pointer_move(p.x, p.y) {
                    s.surface_mut().viewport_mut().pan_by(p.x - lx, p.y - ly);
                    drop(s);
                    last_pointer.set(Some((p.x, p.y)));
                }
            },

            ontouchend: move |evt: Event<TouchData>| {
                if !evt.data().touches().is_empty() {
                    return;
                }
                let was_drag = session.peek().store().drag().is_dragging();
                session.write().pointer_up();
                last_pointer.set(None);
                if was_drag {
                    host.update(|s| s.on_viewport_settled());
                }
            },

            ontouchcancel: move |_| {
                session.write().pointer_cancel();
                last_pointer.set(None);
            },

            div { class: "tile-layer",
                for (i, tile) in tiles.into_iter().enumerate() {
                    img {
                        key: "{tile.z}-{tile.x}-{tile.y}-{i}",
                        class: "tile",
                        src: "{tile.url(TILE_URL)}",
                        draggable: "false",
                        style: "left:{tile.left}px;top:{tile.top}px;width:{tile.size}px;height:{tile.size}px;",
                    }
                }
            }

            svg {
                class: "route-layer",
                xmlns: "http://www.w3.org/2000/svg",
                for line in polylines {
                    polyline {
                        key: "{line.handle.0}",
                        points: "{line.points}",
                        fill: "none",
                        stroke: "{line.color}",
                        stroke_width: "{line.weight}",
                        stroke_linejoin: "round",
                        stroke_linecap: "round",
                        onclick: move |evt: Event<MouseData>| {
                            evt.stop_propagation();
                            host.update(|s| s.marker_clicked(line.handle));
                        },
                    }
                }
            }

            div { class: "marker-layer",
                for (m, role) in markers {
                    div {
                        key: "{m.handle.0}",
                        class: "marker {m.style.class_name}",
                        title: "{m.label}",
                        style: "left:{m.left}px;top:{m.top}px;width:{m.style.size.0}px;height:{m.style.size.1}px;",
                        onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
                        onclick: move |evt: Event<MouseData>| {
                            evt.stop_propagation();
                            host.update(|s| s.marker_clicked(m.handle));
                        },
                        dangerous_inner_html: "{pin_svg(&m.style, role)}",
                    }
                }
            }

            if let Some((p, (px, py))) = popup {
                MapPopup { popup: p, x: px, y: py }
            }

            MapControls { fullscreen }
        }
    }
}

#[component]
fn MapPopup(popup: Popup, x: f64, y: f64) -> Element {
    let host = use_host();
    let style = format!("left:{x}px;top:{y}px;");
    let lines: Vec<String> = popup.text.lines().map(str::to_string).collect();

    rsx! {
        div {
            class: "popup",
            style: "{style}",
            onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
            onclick: move |evt: Event<MouseData>| evt.stop_propagation(),
            button {
                class: "popup-close",
                onclick: move |_| host.update(|s| s.close_popup()),
                "×"
            }
            {match popup.kind {
                PopupKind::Candidate(id) => rsx! {
                    CandidatePopup { id }
                },
                PopupKind::RouteSummary => rsx! {
                    div { class: "route-summary",
                        for line in lines {
                            div { "{line}" }
                        }
                    }
                },
                kind => rsx! {
                    div { class: "popup-text",
                        for line in lines {
                            div { "{line}" }
                        }
                    }
                    PopupActions { kind }
                },
            }}
        }
    }
}

/// Unpin buttons for pinned markers.
#[component]
fn PopupActions(kind: PopupKind) -> Element {
    let host = use_host();
    match kind {
        PopupKind::Start => rsx! {
            button { onclick: move |_| { host.update(|s| s.unpin_start()); }, "Unpin" }
        },
        PopupKind::End => rsx! {
            button { onclick: move |_| { host.update(|s| s.unpin_end()); }, "Unpin" }
        },
        PopupKind::Saved(id) => rsx! {
            button { onclick: move |_| unpin_saved(host, id), "Unpin" }
        },
        PopupKind::Step => rsx! {
            button { onclick: move |_| { host.update(|s| s.clear_guide()); }, "Done" }
        },
        _ => rsx! {},
    }
}

fn unpin_saved(host: Host, id: PinId) {
    if let Err(e) = host.update(|s| s.remove_saved(id)) {
        host.toast(e.to_string(), true);
    }
}

#[component]
fn MapControls(fullscreen: bool) -> Element {
    let host = use_host();
    let mut session = host.session;
    let mut zoom_by = move |delta: f64| {
        let (w, h, z) = {
            let s = session.peek();
            let v = s.surface().viewport();
            (v.width, v.height, v.zoom)
        };
        session
            .write()
            .surface_mut()
            .viewport_mut()
            .zoom_around(w / 2.0, h / 2.0, z + delta);
        host.settle_later();
    };

    rsx! {
        div {
            class: "map-controls",
            onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
            onclick: move |evt: Event<MouseData>| evt.stop_propagation(),
            button { title: "Zoom in", onclick: move |_| zoom_by(1.0), "+" }
            button { title: "Zoom out", onclick: move |_| zoom_by(-1.0), "−" }
            button {
                title: if fullscreen { "Exit fullscreen" } else { "Fullscreen" },
                onclick: move |_| {
                    host.update(|s| s.toggle_fullscreen());
                    // Container size changes with the layout
                    spawn(async move {
                        gloo_timers::future::TimeoutFuture::new(50).await;
                        sync_size(host);
                        host.update(|s| s.on_viewport_settled());
                    });
                },
                if fullscreen { "⤡" } else { "⤢" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::new_session;
    use wayfinder_shared::routing::{RouteGeometry, RouteLeg, RouteResponse};
    use wayfinder_shared::session::ServiceRequest;
    use wayfinder_shared::store::Owner;
    use wayfinder_shared::style::{AVATAR_STYLE, START_STYLE};
    use wayfinder_shared::MapConfig;

    fn viewport() -> Viewport {
        Viewport::new(LatLng::new(10.776, 106.700), 14.0, 800.0, 600.0)
    }

    #[test]
    fn test_polyline_points_center_is_middle_of_container() {
        let pts = polyline_points(&viewport(), &[LatLng::new(10.776, 106.700)]);
        assert_eq!(pts, "400.0,300.0");
    }

    #[test]
    fn test_polyline_points_joined_by_space() {
        let pts = polyline_points(
            &viewport(),
            &[LatLng::new(10.776, 106.700), LatLng::new(10.776, 106.701)],
        );
        assert_eq!(pts.split(' ').count(), 2);
    }

    #[test]
    fn test_pin_svg_uses_role_color() {
        let svg = pin_svg(&START_STYLE, MarkerRole::Start);
        assert!(svg.contains("#2aad27"));
        assert!(svg.contains("<path"));
        let avatar = pin_svg(&AVATAR_STYLE, MarkerRole::Avatar);
        assert!(avatar.contains("<circle"));
        assert!(!avatar.contains("<path"));
    }

    #[test]
    fn test_collected_markers_follow_presentation() {
        let mut s = new_session(MapConfig::default());
        s.surface_mut().set_size(800.0, 600.0);
        let here = s.surface().viewport().center;
        s.set_user_location(here, "You are here").unwrap();
        s.place_start(here, "Start").unwrap();
        let markers = collect_markers(s.surface());
        assert_eq!(markers.len(), 2);
        // start on top of the avatar is drawn as the avatar
        assert!(markers.iter().all(|(m, _)| m.style == AVATAR_STYLE));
    }

    #[test]
    fn test_offscreen_markers_are_skipped() {
        let mut s = new_session(MapConfig::default());
        s.surface_mut().set_size(800.0, 600.0);
        s.place_start(LatLng::new(21.03, 105.85), "Hanoi").unwrap();
        assert!(collect_markers(s.surface()).is_empty());
    }

    #[test]
    fn test_route_polyline_is_clickable_route() {
        let mut s = new_session(MapConfig::default());
        s.surface_mut().set_size(800.0, 600.0);
        s.place_start(LatLng::new(10.776, 106.700), "A").unwrap();
        s.place_end(LatLng::new(10.780, 106.705), "B").unwrap();
        let seq = match s.take_requests().pop() {
            Some(ServiceRequest::Route(r)) => r.seq,
            other => panic!("expected route request, got {:?}", other),
        };
        let response = RouteResponse {
            code: None,
            routes: vec![RouteLeg {
                distance: 1500.0,
                duration: 300.0,
                geometry: RouteGeometry {
                    coordinates: vec![[106.700, 10.776], [106.703, 10.778], [106.705, 10.780]],
                },
            }],
        };
        assert!(s.apply_route_response(seq, Ok(response)));
        let lines = collect_polylines(s.surface());
        assert_eq!(lines.len(), 1);
        assert_eq!(s.store().owner_of(lines[0].handle), Some(Owner::Route));
        assert_eq!(lines[0].points.split(' ').count(), 3);
    }

    #[test]
    fn test_route_summary_popup_sits_on_anchor() {
        let v = viewport();
        let popup = Popup {
            anchor: v.center,
            kind: PopupKind::RouteSummary,
            text: "WALKING\n1.5 km\n50 minutes".into(),
        };
        assert_eq!(popup_position(&v, &popup), (400.0, 300.0));
        let start = Popup {
            kind: PopupKind::Start,
            ..popup
        };
        assert_eq!(popup_position(&v, &start), (401.0, 266.0));
    }
}
