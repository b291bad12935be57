use wayfinder_shared::geo;
use wayfinder_shared::style::MarkerStyle;

/// Zoom levels added or removed per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 0.5;

/// Convert client (viewport) coordinates to container-relative pixel coordinates.
pub fn client_to_container(
    client_x: f64,
    client_y: f64,
    rect_left: f64,
    rect_top: f64,
) -> (f64, f64) {
    (client_x - rect_left, client_y - rect_top)
}

/// Bounding rect of an element by id.
pub fn element_rect(id: &str) -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(id)?;
    Some(element.get_bounding_client_rect())
}

/// Container-relative position of a client point inside element `id`.
pub fn client_to_element(id: &str, client_x: f64, client_y: f64) -> Option<(f64, f64)> {
    let rect = element_rect(id)?;
    Some(client_to_container(client_x, client_y, rect.left(), rect.top()))
}

/// Zoom after one wheel event. Scrolling up zooms in.
pub fn wheel_zoom(current: f64, delta_y: f64) -> f64 {
    if delta_y.abs() < f64::EPSILON {
        return current;
    }
    let step = if delta_y < 0.0 { WHEEL_ZOOM_STEP } else { -WHEEL_ZOOM_STEP };
    geo::clamp_zoom(current + step)
}

/// Top-left corner of a marker icon whose anchor sits on `(x, y)`.
pub fn icon_origin(style: &MarkerStyle, x: f64, y: f64) -> (f64, f64) {
    (x - style.anchor.0, y - style.anchor.1)
}

/// Point a popup attaches to for a marker anchored at `(x, y)`.
pub fn popup_point(style: &MarkerStyle, x: f64, y: f64) -> (f64, f64) {
    (x + style.popup_anchor.0, y + style.popup_anchor.1)
}

/// Whether a container point is inside the container, with some slack so
/// markers half off-screen still render.
pub fn in_view(x: f64, y: f64, width: f64, height: f64, slack: f64) -> bool {
    x >= -slack && y >= -slack && x <= width + slack && y <= height + slack
}
