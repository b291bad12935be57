//! Routing engine adapter.
//!
//! `Idle -> Requesting -> {Success, Failed}`. Every trigger takes a fresh
//! sequence number and only the answer carrying the latest one is applied.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DurationCorrection;
use crate::error::FetchError;
use crate::models::{Bounds, LatLng, Route, TravelMode};
use crate::session::{MapSession, Notice, PopupKind, ServiceRequest};
use crate::store::Slot;
use crate::style::{ROUTE_COLOR, ROUTE_WEIGHT};
use crate::surface::{PolylineSpec, RenderSurface};

#[derive(Debug, Clone, PartialEq)]
pub enum RouteFailure {
    NoRoute,
    Unreachable(FetchError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RouteStatus {
    #[default]
    Idle,
    Requesting {
        seq: u64,
    },
    Success,
    Failed(RouteFailure),
}

#[derive(Debug, Clone, Default)]
pub struct RouteTracker {
    seq: u64,
    status: RouteStatus,
}

impl RouteTracker {
    /// Supersede whatever is in flight and return the new sequence number.
    pub fn begin(&mut self) -> u64 {
        self.seq += 1;
        self.status = RouteStatus::Requesting { seq: self.seq };
        self.seq
    }

    /// Forget the in-flight request; its answer will be treated as stale.
    pub fn cancel(&mut self) {
        self.seq += 1;
        self.status = RouteStatus::Idle;
    }

    pub fn is_current(&self, seq: u64) -> bool {
        matches!(self.status, RouteStatus::Requesting { seq: s } if s == seq)
    }

    pub fn status(&self) -> &RouteStatus {
        &self.status
    }

    pub fn latest_seq(&self) -> u64 {
        self.seq
    }

    fn finish(&mut self, status: RouteStatus) {
        self.status = status;
    }
}

/// One routing call: two coordinates and a travel mode.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub seq: u64,
    pub mode: TravelMode,
    pub start: LatLng,
    pub end: LatLng,
}

impl RouteRequest {
    /// `{base}/{profile}/{lng},{lat};{lng},{lat}?overview=full&geometries=geojson`
    pub fn url(&self, base: &str) -> String {
        format!(
            "{}/{}/{},{};{},{}?overview=full&geometries=geojson",
            base.trim_end_matches('/'),
            self.mode.profile(),
            self.start.lng,
            self.start.lat,
            self.end.lng,
            self.end.lat
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    /// `Ok`, or why nothing was routed (`NoRoute`, `NoSegment`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteLeg>,
}

/// Codes meaning the service was reached but found no path.
const NO_ROUTE_CODES: [&str; 2] = ["NoRoute", "NoSegment"];

impl RouteResponse {
    pub fn empty() -> Self {
        RouteResponse {
            code: None,
            routes: Vec::new(),
        }
    }

    /// Interpret a routing service reply. The service answers "no route"
    /// with a 4xx status and a JSON body, so client errors are decoded too;
    /// a no-route code or an empty route list becomes an empty response.
    pub fn from_service(status: u16, body: &str) -> Result<RouteResponse, FetchError> {
        let success = (200..300).contains(&status);
        if !success && !(400..500).contains(&status) {
            return Err(FetchError::Status(status));
        }
        let parsed: RouteResponse = match serde_json::from_str(body) {
            Ok(r) => r,
            Err(e) if success => return Err(FetchError::Decode(e.to_string())),
            Err(_) => return Err(FetchError::Status(status)),
        };
        let no_route = parsed
            .code
            .as_deref()
            .is_some_and(|c| NO_ROUTE_CODES.contains(&c));
        if no_route || (success && parsed.routes.is_empty()) {
            return Ok(RouteResponse::empty());
        }
        if !success {
            return Err(FetchError::Status(status));
        }
        Ok(parsed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    pub geometry: RouteGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    /// `[lng, lat]` pairs.
    pub coordinates: Vec<[f64; 2]>,
}

/// Convert the first route of a response into display units. `None` when
/// the service found nothing.
pub fn build_route(response: &RouteResponse, mode: TravelMode, correction: &DurationCorrection) -> Option<Route> {
    let leg = response.routes.first()?;
    if leg.geometry.coordinates.is_empty() {
        return None;
    }
    let raw_minutes = leg.duration / 60.0;
    Some(Route {
        distance_km: leg.distance / 1000.0,
        duration_minutes: (raw_minutes * correction.factor(mode)).round().max(0.0) as u32,
        travel_mode: mode,
        polyline: leg
            .geometry
            .coordinates
            .iter()
            .map(|[lng, lat]| LatLng::new(*lat, *lng))
            .collect(),
    })
}

impl<S: RenderSurface> MapSession<S> {
    pub fn route(&self) -> Option<&Route> {
        self.store.route().map(|layer| &layer.route)
    }

    pub fn route_status(&self) -> &RouteStatus {
        self.routing.status()
    }

    /// Queue a routing call for the current endpoints and travel mode.
    /// Entering routing ends POI browsing.
    pub(crate) fn request_route(&mut self) {
        let (Some(start), Some(end)) = (self.store.get(Slot::Start), self.store.get(Slot::End)) else {
            return;
        };
        let (start, end) = (start.coordinate, end.coordinate);
        self.turn_off_pois();
        let seq = self.routing.begin();
        let mode = self.store.travel_mode();
        info!(seq, %mode, %start, %end, "route requested");
        self.enqueue(ServiceRequest::Route(RouteRequest { seq, mode, start, end }));
    }

    /// Drop the current route and ignore any answer still in flight.
    pub(crate) fn invalidate_route(&mut self) {
        self.routing.cancel();
        if self.store.clear_route() {
            debug!("route removed");
        }
        self.close_popup_if(|k| *k == PopupKind::RouteSummary);
    }

    /// Apply the outcome of a routing call. Returns false when the answer was
    /// stale and ignored.
    pub fn apply_route_response(&mut self, seq: u64, result: Result<RouteResponse, FetchError>) -> bool {
        if !self.routing.is_current(seq) {
            debug!(seq, latest = self.routing.latest_seq(), "stale route response dropped");
            return false;
        }
        let mode = self.store.travel_mode();
        match result {
            Ok(response) => match build_route(&response, mode, &self.config.duration_correction) {
                Some(route) => {
                    info!(seq, km = route.distance_km, minutes = route.duration_minutes, "route applied");
                    let style = PolylineSpec {
                        points: route.polyline.clone(),
                        color: ROUTE_COLOR.to_string(),
                        weight: ROUTE_WEIGHT,
                    };
                    let bounds = Bounds::from_points(route.polyline.iter());
                    let summary = route.summary();
                    let mid = route.midpoint();
                    self.store.set_route(route, style);
                    if let Some(bounds) = bounds {
                        let padding = self.config.fit_padding_px;
                        self.store.surface_mut().fit_bounds(bounds, padding);
                    }
                    if let Some(mid) = mid {
                        self.show_popup(mid, PopupKind::RouteSummary, summary);
                    }
                    self.routing.finish(RouteStatus::Success);
                }
                None => {
                    info!(seq, "routing service found no route");
                    self.routing.finish(RouteStatus::Failed(RouteFailure::NoRoute));
                    self.notify(Notice::NoRoute);
                }
            },
            Err(err) => {
                warn!(seq, error = %err, "routing request failed");
                self.notify(Notice::RoutingUnavailable(err.to_string()));
                self.routing.finish(RouteStatus::Failed(RouteFailure::Unreachable(err)));
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PoiCategory;
    use crate::session::test_support::*;

    const A: LatLng = LatLng::new(10.776, 106.700);
    const B: LatLng = LatLng::new(10.780, 106.705);

    fn routed_session() -> (crate::MapSession<crate::Scene>, u64) {
        let mut s = session();
        s.place_start(A, "A").unwrap();
        s.place_end(B, "B").unwrap();
        let seq = route_requests(&s)[0].seq;
        s.take_requests();
        (s, seq)
    }

    #[test]
    fn test_request_url() {
        let req = RouteRequest {
            seq: 1,
            mode: TravelMode::TwoWheeler,
            start: A,
            end: B,
        };
        assert_eq!(
            req.url("https://router.project-osrm.org/route/v1/"),
            "https://router.project-osrm.org/route/v1/cycling/106.7,10.776;106.705,10.78?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn test_build_route_units_and_order() {
        let route = build_route(&sample_route_response(), TravelMode::Driving, &DurationCorrection::default()).unwrap();
        assert_eq!(route.distance_km, 1.5);
        assert_eq!(route.duration_minutes, 5);
        assert_eq!(route.polyline[0], LatLng::new(10.776, 106.700));
        assert_eq!(route.polyline.len(), 3);
    }

    #[test]
    fn test_build_route_applies_mode_correction() {
        let c = DurationCorrection::default();
        let resp = sample_route_response();
        // 5 raw minutes
        assert_eq!(build_route(&resp, TravelMode::TwoWheeler, &c).unwrap().duration_minutes, 17);
        assert_eq!(build_route(&resp, TravelMode::Walking, &c).unwrap().duration_minutes, 50);
    }

    #[test]
    fn test_build_route_empty_is_none() {
        let empty: RouteResponse = serde_json::from_str(r#"{"code":"NoRoute","routes":[]}"#).unwrap();
        assert!(build_route(&empty, TravelMode::Driving, &DurationCorrection::default()).is_none());
        let missing: RouteResponse = serde_json::from_str(r#"{"code":"NoRoute"}"#).unwrap();
        assert!(missing.routes.is_empty());
    }

    #[test]
    fn test_success_draws_route_fits_view_and_opens_summary() {
        let (mut s, seq) = routed_session();
        assert!(matches!(s.route_status(), RouteStatus::Requesting { .. }));
        assert!(s.apply_route_response(seq, Ok(sample_route_response())));
        assert_eq!(s.route_status(), &RouteStatus::Success);
        assert!(s.route().is_some());
        assert_eq!(s.surface().polylines().count(), 1);
        let view = s.surface().viewport_bounds();
        assert!(view.contains(A) && view.contains(B));
        let popup = s.popup().unwrap();
        assert_eq!(popup.kind, PopupKind::RouteSummary);
        assert_eq!(popup.text, "DRIVING\n1.5 km\n5 minutes");
        assert_eq!(popup.anchor, LatLng::new(10.778, 106.702));
    }

    #[test]
    fn test_out_of_order_responses_last_writer_wins() {
        let (mut s, seq1) = routed_session();
        s.set_travel_mode(TravelMode::Walking);
        let seq2 = route_requests(&s)[0].seq;
        assert!(seq2 > seq1);

        let r2: RouteResponse = serde_json::from_str(
            r#"{"routes":[{"distance":900.0,"duration":120.0,"geometry":{"coordinates":[[106.7,10.776],[106.705,10.78]]}}]}"#,
        )
        .unwrap();
        assert!(s.apply_route_response(seq2, Ok(r2)));
        assert!(!s.apply_route_response(seq1, Ok(sample_route_response())));

        let route = s.route().unwrap();
        assert_eq!(route.distance_km, 0.9);
        assert_eq!(route.travel_mode, TravelMode::Walking);
        assert_eq!(route.duration_minutes, 20);
        assert_eq!(s.surface().polylines().count(), 1);
    }

    #[test]
    fn test_empty_route_is_no_route_notice_and_keeps_markers() {
        let (mut s, seq) = routed_session();
        let empty = RouteResponse::empty();
        assert!(s.apply_route_response(seq, Ok(empty)));
        assert_eq!(s.take_notices(), vec![Notice::NoRoute]);
        assert!(s.start().is_some() && s.end().is_some());
        assert!(s.route().is_none());
        assert_eq!(s.route_status(), &RouteStatus::Failed(RouteFailure::NoRoute));
    }

    #[test]
    fn test_no_route_reply_with_client_error_status_is_no_route() {
        let (mut s, seq) = routed_session();
        let body = r#"{"code":"NoRoute","message":"Impossible route between points","routes":[]}"#;
        let reply = RouteResponse::from_service(400, body);
        assert_eq!(reply, Ok(RouteResponse::empty()));
        assert!(s.apply_route_response(seq, reply));
        assert_eq!(s.take_notices(), vec![Notice::NoRoute]);
        assert_eq!(s.route_status(), &RouteStatus::Failed(RouteFailure::NoRoute));
    }

    #[test]
    fn test_from_service_classifies_replies() {
        let no_segment = r#"{"code":"NoSegment","message":"Could not find a matching segment"}"#;
        assert_eq!(RouteResponse::from_service(400, no_segment), Ok(RouteResponse::empty()));
        assert_eq!(
            RouteResponse::from_service(200, r#"{"code":"Ok","routes":[]}"#),
            Ok(RouteResponse::empty())
        );
        let ok = serde_json::to_string(&sample_route_response()).unwrap();
        assert_eq!(RouteResponse::from_service(200, &ok).unwrap().routes.len(), 1);

        // Other client errors and server errors stay transport failures
        assert_eq!(
            RouteResponse::from_service(400, r#"{"code":"InvalidQuery","message":"bad"}"#),
            Err(FetchError::Status(400))
        );
        assert_eq!(RouteResponse::from_service(404, "<html>"), Err(FetchError::Status(404)));
        assert_eq!(RouteResponse::from_service(503, ""), Err(FetchError::Status(503)));
        assert!(matches!(
            RouteResponse::from_service(200, "not json"),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn test_transport_failure_is_distinct_notice() {
        let (mut s, seq) = routed_session();
        assert!(s.apply_route_response(seq, Err(FetchError::Transport("offline".into()))));
        let notices = s.take_notices();
        assert!(matches!(notices.as_slice(), [Notice::RoutingUnavailable(_)]));
        assert!(s.start().is_some() && s.end().is_some());
    }

    #[test]
    fn test_mode_change_keeps_previous_route_until_replaced() {
        let (mut s, seq) = routed_session();
        s.apply_route_response(seq, Ok(sample_route_response()));
        s.set_travel_mode(TravelMode::TwoWheeler);
        let seq2 = route_requests(&s)[0].seq;
        assert!(s.route().is_some());
        s.apply_route_response(seq2, Err(FetchError::Status(503)));
        assert_eq!(s.route().unwrap().travel_mode, TravelMode::Driving);
    }

    #[test]
    fn test_routing_turns_off_poi_browsing() {
        let mut s = session();
        s.select_category(PoiCategory::new("hospital"));
        assert!(s.poi_fetching());
        s.place_start(A, "A").unwrap();
        assert!(s.poi_fetching());
        s.place_end(B, "B").unwrap();
        assert!(!s.poi_fetching());
        assert!(s.active_category().is_none());
        assert!(s.store().poi_layer().is_empty());
    }

    #[test]
    fn test_scenario_click_start_click_end() {
        let mut s = session();
        s.select_category(PoiCategory::new("police"));
        s.take_requests();

        let c1 = s.on_map_click(A).unwrap();
        s.resolve_candidate(c1, crate::candidate::CandidateChoice::Start).unwrap();
        assert_eq!(s.start().unwrap().coordinate, A);
        assert!(s.candidate().is_none());
        assert!(s.route().is_none());
        assert!(route_requests(&s).is_empty());

        let c2 = s.on_map_click(B).unwrap();
        s.resolve_candidate(c2, crate::candidate::CandidateChoice::End).unwrap();
        let reqs = route_requests(&s);
        assert_eq!(reqs.len(), 1);
        assert_eq!((reqs[0].start, reqs[0].end), (A, B));

        assert!(s.apply_route_response(reqs[0].seq, Ok(sample_route_response())));
        assert!(s.store().route().is_some());
        assert!(!s.poi_fetching());
        assert!(s.store().poi_layer().is_empty());
    }
}
