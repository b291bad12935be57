//! The map session: one per page, owning the store and every controller.
//!
//! All operations are synchronous. Anything that needs the network is queued
//! as a [`ServiceRequest`]; the host performs the call and reports back via
//! `apply_route_response` / `apply_poi_response`. Late answers to superseded
//! requests are recognized by their sequence number and dropped.

use tracing::{debug, info};

use crate::candidate::{CandidateId, CandidateTracker};
use crate::config::MapConfig;
use crate::models::{LatLng, PlaceDetails, TravelMode};
use crate::overlay::OverlayState;
use crate::poi::{PlacePanel, PoiController, PoiQuery};
use crate::routing::{RouteRequest, RouteTracker};
use crate::store::{MapStore, Owner, PinId, Slot};
use crate::surface::{Handle, RenderSurface};

/// Network work the host must perform on the session's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceRequest {
    Route(RouteRequest),
    Pois(PoiQuery),
}

/// Non-blocking, user-visible messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The routing service answered but found nothing.
    NoRoute,
    RoutingUnavailable(String),
    PoiUnavailable(String),
    NoPoisInView,
    Invalid(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::NoRoute => "Can't find route!".to_string(),
            Notice::RoutingUnavailable(detail) => format!("Routing service unreachable ({})", detail),
            Notice::PoiUnavailable(detail) => format!("Could not load places ({})", detail),
            Notice::NoPoisInView => "No places of this type in the current view".to_string(),
            Notice::Invalid(detail) => detail.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::NoPoisInView)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopupKind {
    Candidate(CandidateId),
    Start,
    End,
    Saved(PinId),
    RouteSummary,
    Step,
    UserLocation,
    Location,
}

/// The single open popup.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub anchor: LatLng,
    pub kind: PopupKind,
    pub text: String,
}

pub type LocationListener = Box<dyn FnMut(LatLng, &PlaceDetails)>;

pub struct MapSession<S: RenderSurface> {
    pub(crate) store: MapStore<S>,
    pub(crate) config: MapConfig,
    pub(crate) routing: RouteTracker,
    pub(crate) pois: PoiController,
    pub(crate) candidates: CandidateTracker,
    pub(crate) popup: Option<Popup>,
    pub(crate) panel: Option<PlacePanel>,
    pub(crate) overlay: OverlayState,
    requests: Vec<ServiceRequest>,
    notices: Vec<Notice>,
    listener: Option<LocationListener>,
}

impl<S: RenderSurface> MapSession<S> {
    pub fn new(surface: S, config: MapConfig) -> Self {
        let store = MapStore::new(surface, config.drag_threshold_px);
        MapSession {
            store,
            config,
            routing: RouteTracker::default(),
            pois: PoiController::default(),
            candidates: CandidateTracker::default(),
            popup: None,
            panel: None,
            overlay: OverlayState::default(),
            requests: Vec::new(),
            notices: Vec::new(),
            listener: None,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn store(&self) -> &MapStore<S> {
        &self.store
    }

    pub fn surface(&self) -> &S {
        self.store.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.store.surface_mut()
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn panel(&self) -> Option<&PlacePanel> {
        self.panel.as_ref()
    }

    pub fn travel_mode(&self) -> TravelMode {
        self.store.travel_mode()
    }

    /// Drain queued network work.
    pub fn take_requests(&mut self) -> Vec<ServiceRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn pending_requests(&self) -> &[ServiceRequest] {
        &self.requests
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Register the chat panel's `onLocationSelected` callback.
    pub fn set_location_listener(&mut self, listener: impl FnMut(LatLng, &PlaceDetails) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_location_listener(&mut self) {
        self.listener = None;
    }

    pub(crate) fn enqueue(&mut self, request: ServiceRequest) {
        self.requests.push(request);
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        info!(notice = %notice.message(), "notice");
        self.notices.push(notice);
    }

    pub(crate) fn emit_location(&mut self, coordinate: LatLng, details: &PlaceDetails) {
        if let Some(listener) = self.listener.as_mut() {
            listener(coordinate, details);
        }
    }

    /// Open a popup, closing the current one first. Closing a candidate's
    /// popup discards the candidate.
    pub(crate) fn show_popup(&mut self, anchor: LatLng, kind: PopupKind, text: impl Into<String>) {
        self.close_popup();
        self.popup = Some(Popup {
            anchor,
            kind,
            text: text.into(),
        });
    }

    /// Close the open popup. An unresolved candidate is discarded with it.
    pub fn close_popup(&mut self) {
        if let Some(popup) = self.popup.take() {
            if let PopupKind::Candidate(id) = popup.kind {
                // The candidate may already be resolved; nothing to undo then.
                let _ = self.discard_candidate(id);
            }
        }
    }

    pub(crate) fn close_popup_if(&mut self, pred: impl Fn(&PopupKind) -> bool) {
        if self.popup.as_ref().is_some_and(|p| pred(&p.kind)) {
            self.close_popup();
        }
    }

    /// Switch travel mode. Re-routes when both endpoints are set; the next
    /// map click is swallowed so the click on the mode button does not fall
    /// through as a pin.
    pub fn set_travel_mode(&mut self, mode: TravelMode) {
        self.store.set_travel_mode(mode);
        self.store.suppress_next_click();
        debug!(%mode, "travel mode changed");
        if self.store.get(Slot::Start).is_some() && self.store.get(Slot::End).is_some() {
            self.request_route();
        }
    }

    /// Single teardown path used on context changes.
    pub fn clear_map(&mut self) {
        self.popup = None;
        self.panel = None;
        self.candidates.drop_open();
        self.routing.cancel();
        self.pois.reset();
        self.store.clear_all();
        info!("map cleared");
    }

    /// React to a click on a rendered shape.
    pub fn marker_clicked(&mut self, handle: Handle) {
        let Some(owner) = self.store.owner_of(handle) else {
            return;
        };
        match owner {
            Owner::Slot(Slot::Candidate) => {
                if let Some(pin) = self.candidates.open().cloned() {
                    self.popup = Some(Popup {
                        anchor: pin.coordinate,
                        kind: PopupKind::Candidate(pin.id),
                        text: pin.name,
                    });
                }
            }
            Owner::Slot(slot) => {
                let Some(marker) = self.store.get(slot).cloned() else {
                    return;
                };
                let kind = match slot {
                    Slot::Main => PopupKind::UserLocation,
                    Slot::Start => PopupKind::Start,
                    Slot::End => PopupKind::End,
                    Slot::Location => PopupKind::Location,
                    Slot::Step => PopupKind::Step,
                    Slot::Candidate => return,
                };
                self.show_popup(marker.coordinate, kind, marker.label);
            }
            Owner::Saved(id) => {
                if let Some(pin) = self.store.saved_pins().iter().find(|p| p.id == id).cloned() {
                    self.show_popup(pin.coordinate, PopupKind::Saved(id), pin.label);
                }
            }
            Owner::Poi(idx) => {
                if let Some(id) = self.pois.batch().get(idx).map(|p| p.id.clone()) {
                    // The id comes from the live batch, so this cannot miss.
                    let _ = self.select_poi(&id);
                }
            }
            Owner::Route => {
                let summary = self
                    .store
                    .route()
                    .and_then(|l| l.route.midpoint().map(|mid| (mid, l.route.summary())));
                if let Some((mid, text)) = summary {
                    self.show_popup(mid, PopupKind::RouteSummary, text);
                }
            }
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.overlay.is_fullscreen()
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.overlay.toggle()
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::geo::Viewport;
    use crate::surface::Scene;

    pub fn session() -> MapSession<Scene> {
        let config = MapConfig::default();
        let viewport = Viewport::new(config.default_center, config.default_zoom, 800.0, 600.0);
        MapSession::new(Scene::new(viewport), config)
    }

    /// A three-vertex route of 1.5 km / 300 s, in the service's lng-first order.
    pub fn sample_route_response() -> crate::routing::RouteResponse {
        serde_json::from_str(
            r#"{"code":"Ok","routes":[{"distance":1500.0,"duration":300.0,
                "geometry":{"type":"LineString","coordinates":[[106.700,10.776],[106.702,10.778],[106.705,10.780]]}}]}"#,
        )
        .unwrap()
    }

    pub fn route_requests(s: &MapSession<Scene>) -> Vec<RouteRequest> {
        s.pending_requests()
            .iter()
            .filter_map(|r| match r {
                ServiceRequest::Route(req) => Some(req.clone()),
                ServiceRequest::Pois(_) => None,
            })
            .collect()
    }

    pub fn poi_queries(s: &MapSession<Scene>) -> Vec<PoiQuery> {
        s.pending_requests()
            .iter()
            .filter_map(|r| match r {
                ServiceRequest::Pois(q) => Some(q.clone()),
                ServiceRequest::Route(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::test_support::*;
    use super::*;
    use crate::models::{MarkerRole, PoiCategory};

    #[test]
    fn test_new_session_is_empty() {
        let mut s = session();
        assert_eq!(s.surface().live_count(), 0);
        assert!(s.popup().is_none());
        assert!(s.take_requests().is_empty());
        assert!(s.take_notices().is_empty());
        assert_eq!(s.travel_mode(), TravelMode::Driving);
    }

    #[test]
    fn test_notice_messages_distinguish_empty_from_unreachable() {
        assert_eq!(Notice::NoRoute.message(), "Can't find route!");
        assert_ne!(Notice::NoRoute.message(), Notice::RoutingUnavailable("timeout".into()).message());
        assert!(!Notice::NoPoisInView.is_error());
    }

    #[test]
    fn test_clear_map_removes_everything() {
        let mut s = session();
        s.set_user_location(LatLng::new(10.77, 106.69), "You").unwrap();
        s.place_start(LatLng::new(10.776, 106.700), "A").unwrap();
        s.place_end(LatLng::new(10.780, 106.705), "B").unwrap();
        s.promote_to_saved(LatLng::new(10.79, 106.71), "note").unwrap();
        s.open_candidate(LatLng::new(10.70, 106.60), "Marked Point").unwrap();
        s.clear_map();
        assert_eq!(s.surface().live_count(), 0);
        assert!(s.popup().is_none());
        assert!(s.route().is_none());
        assert!(s.candidate().is_none());
    }

    #[test]
    fn test_travel_mode_change_reroutes_and_swallows_next_click() {
        let mut s = session();
        s.place_start(LatLng::new(10.776, 106.700), "A").unwrap();
        s.place_end(LatLng::new(10.780, 106.705), "B").unwrap();
        s.take_requests();

        s.set_travel_mode(TravelMode::Walking);
        let reqs = route_requests(&s);
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].mode, TravelMode::Walking);

        assert!(s.on_map_click(LatLng::new(10.7, 106.6)).is_none());
        assert!(s.on_map_click(LatLng::new(10.7, 106.6)).is_some());
    }

    #[test]
    fn test_travel_mode_change_without_endpoints_issues_nothing() {
        let mut s = session();
        s.set_travel_mode(TravelMode::TwoWheeler);
        assert!(s.take_requests().is_empty());
        assert_eq!(s.travel_mode(), TravelMode::TwoWheeler);
    }

    #[test]
    fn test_marker_click_opens_matching_popup() {
        let mut s = session();
        let start = s.place_start(LatLng::new(10.776, 106.700), "Home").unwrap();
        s.marker_clicked(start);
        let popup = s.popup().unwrap();
        assert_eq!(popup.kind, PopupKind::Start);
        assert_eq!(popup.text, "Home");

        let id = s.promote_to_saved(LatLng::new(10.79, 106.71), "Cafe").unwrap();
        let handle = s.store().saved_pins()[0].handle;
        s.marker_clicked(handle);
        assert_eq!(s.popup().unwrap().kind, PopupKind::Saved(id));
    }

    #[test]
    fn test_location_listener_receives_selected_places() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut s = session();
        s.set_location_listener(move |at, details| sink.borrow_mut().push((at, details.name.clone())));
        s.select_category(PoiCategory::new("hospital"));
        let seq = poi_queries(&s)[0].seq;
        let record: crate::models::PoiRecord =
            serde_json::from_str(r#"{"id":"h1","lat":10.77,"lng":106.69,"name":"Cho Ray"}"#).unwrap();
        s.apply_poi_response(seq, Ok(vec![record]));
        s.select_poi("h1").unwrap();
        assert_eq!(seen.borrow().as_slice(), &[(LatLng::new(10.77, 106.69), "Cho Ray".to_string())]);
        assert_eq!(s.surface().markers_with_role(MarkerRole::Poi), 1);
    }

    #[test]
    fn test_fullscreen_toggle() {
        let mut s = session();
        assert!(!s.is_fullscreen());
        assert!(s.toggle_fullscreen());
        assert!(s.is_fullscreen());
        assert!(!s.toggle_fullscreen());
    }
}
