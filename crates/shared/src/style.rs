use crate::models::MarkerRole;

/// Visual presentation of a marker role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub icon_url: &'static str,
    /// Fill used when the icon cannot be loaded and for the SVG fallback pin.
    pub color: &'static str,
    pub size: (f64, f64),
    /// Pixel inside the icon that sits on the coordinate.
    pub anchor: (f64, f64),
    /// Offset from the anchor where popups attach.
    pub popup_anchor: (f64, f64),
    pub class_name: &'static str,
}

const PIN_SIZE: (f64, f64) = (25.0, 41.0);
const PIN_ANCHOR: (f64, f64) = (12.0, 41.0);
const PIN_POPUP: (f64, f64) = (1.0, -34.0);

const fn pin(icon_url: &'static str, color: &'static str, class_name: &'static str) -> MarkerStyle {
    MarkerStyle {
        icon_url,
        color,
        size: PIN_SIZE,
        anchor: PIN_ANCHOR,
        popup_anchor: PIN_POPUP,
        class_name,
    }
}

pub const START_STYLE: MarkerStyle = pin("/assets/markers/marker-green.png", "#2aad27", "marker-start");
pub const END_STYLE: MarkerStyle = pin("/assets/markers/marker-red.png", "#cb2b3e", "marker-end");
pub const SAVED_STYLE: MarkerStyle = pin("/assets/markers/marker-gold.png", "#ffd326", "marker-saved");
pub const POI_STYLE: MarkerStyle = pin("/assets/markers/marker-blue.png", "#2a81cb", "marker-poi");
pub const CANDIDATE_STYLE: MarkerStyle = pin("/assets/markers/marker-blue.png", "#2a81cb", "marker-candidate");
pub const LOCATION_STYLE: MarkerStyle = pin("/assets/markers/marker-gold.png", "#ffd326", "marker-location");
pub const STEP_STYLE: MarkerStyle = pin("/assets/markers/marker-violet.png", "#9c2bcb", "marker-step");

pub const AVATAR_STYLE: MarkerStyle = MarkerStyle {
    icon_url: "/assets/markers/avatar.png",
    color: "#0078ff",
    size: (40.0, 40.0),
    anchor: (20.0, 20.0),
    popup_anchor: (0.0, -20.0),
    class_name: "marker-avatar",
};

pub const ROUTE_COLOR: &str = "#0078ff";
pub const ROUTE_WEIGHT: f64 = 5.0;

pub fn style_for(role: MarkerRole) -> MarkerStyle {
    match role {
        MarkerRole::Start => START_STYLE,
        MarkerRole::End => END_STYLE,
        MarkerRole::Saved => SAVED_STYLE,
        MarkerRole::Poi => POI_STYLE,
        MarkerRole::Candidate => CANDIDATE_STYLE,
        MarkerRole::Avatar => AVATAR_STYLE,
        MarkerRole::Location => LOCATION_STYLE,
        MarkerRole::Step => STEP_STYLE,
    }
}
