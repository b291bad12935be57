use serde::{Deserialize, Serialize};

use crate::models::{LatLng, TravelMode};

/// Multipliers applied to the routing service's duration estimate. The
/// service models fewer modes than the UI offers, so two-wheeler and walking
/// times are scaled from its own profile estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationCorrection {
    pub driving: f64,
    pub two_wheeler: f64,
    pub walking: f64,
}

impl DurationCorrection {
    pub fn factor(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Driving => self.driving,
            TravelMode::TwoWheeler => self.two_wheeler,
            TravelMode::Walking => self.walking,
        }
    }
}

impl Default for DurationCorrection {
    fn default() -> Self {
        DurationCorrection {
            driving: 1.0,
            two_wheeler: 3.3,
            walking: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapConfig {
    /// Base URL of the routing service, without the `/route/...` suffix.
    pub routing_base_url: String,
    /// Base URL of the POI backend, without the `/pois` suffix.
    pub poi_base_url: String,
    pub duration_correction: DurationCorrection,
    /// Markers closer than this to the user's avatar render as the avatar.
    pub avatar_overlap_meters: f64,
    /// Pointer travel (px) after which a press counts as a drag.
    pub drag_threshold_px: f64,
    pub default_center: LatLng,
    pub default_zoom: f64,
    /// Zoom used when flying to a searched or selected place.
    pub focus_zoom: f64,
    pub guide_zoom: f64,
    /// Padding (px) kept around a route when fitting the viewport to it.
    pub fit_padding_px: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            routing_base_url: "https://router.project-osrm.org/route/v1".to_string(),
            poi_base_url: String::new(),
            duration_correction: DurationCorrection::default(),
            avatar_overlap_meters: 2.0,
            drag_threshold_px: 5.0,
            default_center: LatLng::new(10.762622, 106.660172),
            default_zoom: 12.0,
            focus_zoom: 17.0,
            guide_zoom: 18.0,
            fit_padding_px: 24.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_correction_factors() {
        let c = DurationCorrection::default();
        assert_eq!(c.factor(TravelMode::Driving), 1.0);
        assert_eq!(c.factor(TravelMode::TwoWheeler), 3.3);
        assert_eq!(c.factor(TravelMode::Walking), 10.0);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let json = r#"{"poiBaseUrl":"http://localhost:3000","durationCorrection":{"driving":1.0,"twoWheeler":2.0,"walking":8.0}}"#;
        let cfg: MapConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.poi_base_url, "http://localhost:3000");
        assert_eq!(cfg.duration_correction.two_wheeler, 2.0);
        assert_eq!(cfg.avatar_overlap_meters, 2.0);
        assert_eq!(cfg.default_zoom, 12.0);
    }
}
