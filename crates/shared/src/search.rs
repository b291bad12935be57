use tracing::info;

use crate::candidate::CandidateId;
use crate::error::MapError;
use crate::models::{GeocodeResult, MarkerRole, PlaceDetails, PoiCategory, PoiRecord};
use crate::session::MapSession;
use crate::store::Slot;
use crate::surface::{MarkerSpec, RenderSurface};

/// What a search result turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The result is a known POI; its marker and panel are shown.
    Poi(String),
    /// No POI matched; a candidate pin is open at the result.
    Candidate(CandidateId),
}

impl<S: RenderSurface> MapSession<S> {
    /// Show a geocoder result. `matched` is the backend's POI match for it,
    /// if any. Browsing, the open popup and the route are cleared first.
    pub fn handle_search_result(
        &mut self,
        result: &GeocodeResult,
        matched: Option<PoiRecord>,
    ) -> Result<SearchOutcome, MapError> {
        let center = result.center.validate()?;
        self.turn_off_pois();
        self.close_popup();
        self.invalidate_route();

        let fallback = PoiCategory::new(
            matched
                .as_ref()
                .and_then(|r| r.category.clone())
                .unwrap_or_else(|| "poi".to_string()),
        );
        if let Some(poi) = matched.and_then(|r| r.into_poi(&fallback, 0)) {
            info!(poi = %poi.id, name = %poi.name, "search matched a poi");
            self.store
                .set(Slot::Location, MarkerSpec::new(MarkerRole::Poi, poi.coordinate, poi.name.clone()));
            let mut details = PlaceDetails::from(&poi);
            details.distance_km = self
                .user_location()
                .map(|me| crate::geo::distance_m(me, poi.coordinate) / 1000.0);
            self.open_panel(details, poi.coordinate);
            return Ok(SearchOutcome::Poi(poi.id));
        }

        info!(name = %result.name, %center, "search result pinned");
        let zoom = self.config.focus_zoom;
        self.store.surface_mut().fly_to(center, zoom);
        let id = self.open_candidate(center, &result.name)?;
        Ok(SearchOutcome::Candidate(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateState;
    use crate::models::LatLng;
    use crate::session::test_support::*;

    fn result(name: &str) -> GeocodeResult {
        GeocodeResult {
            name: name.to_string(),
            center: LatLng::new(10.7797, 106.6990),
        }
    }

    #[test]
    fn test_unmatched_result_opens_named_candidate() {
        let mut s = session();
        let outcome = s.handle_search_result(&result("Ben Thanh Market"), None).unwrap();
        let SearchOutcome::Candidate(id) = outcome else {
            panic!("expected candidate, got {:?}", outcome);
        };
        assert_eq!(s.candidate_state(id), Some(CandidateState::Open));
        assert_eq!(s.candidate().unwrap().name, "Ben Thanh Market");
        assert_eq!(s.surface().viewport().zoom, 17.0);
    }

    #[test]
    fn test_matched_result_opens_poi_panel() {
        let mut s = session();
        let record: PoiRecord = serde_json::from_str(
            r#"{"id":"h7","lat":10.7578,"lng":106.6596,"name":"Cho Ray Hospital","category":"hospital"}"#,
        )
        .unwrap();
        let outcome = s.handle_search_result(&result("Cho Ray"), Some(record)).unwrap();
        assert_eq!(outcome, SearchOutcome::Poi("h7".into()));
        let panel = s.panel().unwrap();
        assert_eq!(panel.details.category.as_deref(), Some("hospital"));
        assert_eq!(s.surface().markers_with_role(MarkerRole::Poi), 1);
        assert!(s.candidate().is_none());
    }

    #[test]
    fn test_search_clears_browsing_and_route() {
        let mut s = session();
        s.place_start(LatLng::new(10.776, 106.700), "A").unwrap();
        s.place_end(LatLng::new(10.780, 106.705), "B").unwrap();
        let seq = route_requests(&s)[0].seq;
        s.apply_route_response(seq, Ok(sample_route_response()));
        s.handle_search_result(&result("Somewhere"), None).unwrap();
        assert!(s.route().is_none());
        // endpoints survive a search
        assert!(s.start().is_some());
    }

    #[test]
    fn test_invalid_result_is_rejected() {
        let mut s = session();
        let bad = GeocodeResult {
            name: "x".into(),
            center: LatLng::new(f64::NAN, 0.0),
        };
        assert!(s.handle_search_result(&bad, None).is_err());
    }
}
