//! POI fetch controller and the place details panel.
//!
//! While a category is active every viewport settle issues a bounded query;
//! each answer replaces the POI layer wholesale.

use tracing::{debug, info, warn};

use crate::error::{FetchError, MapError};
use crate::models::{Bounds, LatLng, MarkerRole, PlaceDetails, Poi, PoiCategory, PoiRecord};
use crate::session::{MapSession, Notice, ServiceRequest};
use crate::store::{PinId, Slot};
use crate::surface::{MarkerSpec, RenderSurface};

/// Label given to pins created without a note.
pub const NO_NOTE: &str = "(No note !)";

#[derive(Debug, Clone, PartialEq)]
pub struct PoiQuery {
    pub seq: u64,
    pub category: PoiCategory,
    pub bounds: Bounds,
}

impl PoiQuery {
    pub fn url(&self, base: &str) -> String {
        format!(
            "{}/pois?type={}&south={}&west={}&north={}&east={}",
            base.trim_end_matches('/'),
            self.category,
            self.bounds.south,
            self.bounds.west,
            self.bounds.north,
            self.bounds.east
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct PoiController {
    category: Option<PoiCategory>,
    fetching: bool,
    seq: u64,
    batch: Vec<Poi>,
}

impl PoiController {
    pub fn category(&self) -> Option<&PoiCategory> {
        self.category.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn batch(&self) -> &[Poi] {
        &self.batch
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Deactivate and forget the batch. In-flight answers become stale.
    pub(crate) fn reset(&mut self) {
        self.category = None;
        self.fetching = false;
        self.seq += 1;
        self.batch.clear();
    }
}

/// What the panel's last action did, so Unpin can undo it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppliedAction {
    Start,
    End,
    Pinned(PinId),
    /// Route from the user's location to the place.
    Route,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelAction {
    Start,
    End,
    Pin,
    Route,
    Unpin,
}

/// Sidebar showing one place.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacePanel {
    pub details: PlaceDetails,
    pub coordinate: LatLng,
    pub applied: Option<AppliedAction>,
}

impl<S: RenderSurface> MapSession<S> {
    pub fn active_category(&self) -> Option<&PoiCategory> {
        self.pois.category()
    }

    pub fn poi_fetching(&self) -> bool {
        self.pois.is_fetching()
    }

    pub fn pois(&self) -> &[Poi] {
        self.pois.batch()
    }

    /// Select a category from the filter bar. Re-selecting the active one
    /// turns browsing off; a new one clears the map and fetches at once.
    pub fn select_category(&mut self, category: PoiCategory) {
        if self.pois.category() == Some(&category) {
            info!(%category, "category toggled off");
            self.turn_off_pois();
            return;
        }
        self.clear_map();
        info!(%category, "category selected");
        self.pois.category = Some(category);
        self.pois.fetching = true;
        self.fetch_pois();
    }

    /// Stop browsing and clear the POI layer. Other markers stay. A panel
    /// showing a place from the batch closes with it.
    pub fn turn_off_pois(&mut self) -> bool {
        let was_active = self.pois.is_fetching();
        if self.panel_shows_batch_poi() {
            self.panel = None;
        }
        self.pois.reset();
        self.store.clear_poi_layer();
        was_active
    }

    /// Viewport settle signal from the host after a pan or zoom.
    pub fn on_viewport_settled(&mut self) {
        if self.pois.is_fetching() {
            self.fetch_pois();
        }
    }

    fn fetch_pois(&mut self) {
        let Some(category) = self.pois.category().cloned() else {
            return;
        };
        let bounds = self.store.surface().viewport_bounds();
        let seq = self.pois.next_seq();
        debug!(seq, %category, "poi fetch queued");
        self.enqueue(ServiceRequest::Pois(PoiQuery { seq, category, bounds }));
    }

    /// Apply a POI answer. Returns false when it was stale or browsing has
    /// stopped meanwhile.
    pub fn apply_poi_response(&mut self, seq: u64, result: Result<Vec<PoiRecord>, FetchError>) -> bool {
        if !self.pois.is_fetching() || seq != self.pois.seq {
            debug!(seq, latest = self.pois.seq, "stale poi response dropped");
            return false;
        }
        let Some(category) = self.pois.category().cloned() else {
            return false;
        };
        match result {
            Ok(records) => {
                let batch: Vec<Poi> = records
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, r)| r.into_poi(&category, i))
                    .collect();
                info!(seq, %category, count = batch.len(), "poi layer replaced");
                let specs: Vec<MarkerSpec> = batch
                    .iter()
                    .map(|p| MarkerSpec::new(MarkerRole::Poi, p.coordinate, p.name.clone()))
                    .collect();
                self.store.replace_poi_layer(specs);
                if batch.is_empty() {
                    self.notify(Notice::NoPoisInView);
                }
                self.pois.batch = batch;
            }
            Err(err) => {
                warn!(seq, %category, error = %err, "poi request failed");
                self.notify(Notice::PoiUnavailable(err.to_string()));
            }
        }
        true
    }

    /// Open the details panel for a POI of the current batch.
    pub fn select_poi(&mut self, id: &str) -> Result<(), MapError> {
        let poi = self
            .pois
            .batch()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| MapError::UnknownPoi(id.to_string()))?;
        let mut details = PlaceDetails::from(&poi);
        details.distance_km = self
            .user_location()
            .map(|me| crate::geo::distance_m(me, poi.coordinate) / 1000.0);
        self.open_panel(details, poi.coordinate);
        Ok(())
    }

    /// Show a place in the panel, fly to it and tell the chat panel.
    pub(crate) fn open_panel(&mut self, details: PlaceDetails, coordinate: LatLng) {
        let zoom = self.config.focus_zoom;
        self.store.surface_mut().fly_to(coordinate, zoom);
        self.emit_location(coordinate, &details);
        self.panel = Some(PlacePanel {
            details,
            coordinate,
            applied: None,
        });
    }

    fn panel_shows_batch_poi(&self) -> bool {
        let Some(id) = self.panel.as_ref().and_then(|p| p.details.id.as_deref()) else {
            return false;
        };
        self.pois.batch().iter().any(|p| p.id == id)
    }

    pub fn close_panel(&mut self) {
        self.panel = None;
    }

    /// Run one of the panel's buttons against the shown place.
    pub fn panel_action(&mut self, action: PanelAction) -> Result<(), MapError> {
        let panel = self.panel.clone().ok_or(MapError::NoPanel)?;
        let coordinate = panel.coordinate;
        let name = panel.details.name.clone();
        let previous = panel.applied;
        let label = if name.is_empty() { NO_NOTE.to_string() } else { name };

        let applied = match action {
            PanelAction::Start => {
                self.place_start(coordinate, &label)?;
                Some(AppliedAction::Start)
            }
            PanelAction::End => {
                self.place_end(coordinate, &label)?;
                Some(AppliedAction::End)
            }
            PanelAction::Pin => Some(AppliedAction::Pinned(self.promote_to_saved(coordinate, &label)?)),
            PanelAction::Route => {
                if self.user_location().is_none() {
                    return Err(MapError::MissingUserLocation);
                }
                // The avatar itself serves as the start marker.
                self.store.alias(Slot::Start, Slot::Main);
                self.place_end(coordinate, &label)?;
                Some(AppliedAction::Route)
            }
            PanelAction::Unpin => {
                match previous {
                    Some(AppliedAction::Start) => {
                        self.unpin_start();
                    }
                    Some(AppliedAction::End) => {
                        self.unpin_end();
                    }
                    Some(AppliedAction::Pinned(id)) => self.remove_saved(id)?,
                    Some(AppliedAction::Route) => {
                        self.unpin_start();
                        self.unpin_end();
                    }
                    None => {}
                }
                None
            }
        };
        // Routing started by this panel ends browsing but keeps the panel
        // so the action can be undone.
        let panel = self.panel.get_or_insert(panel);
        panel.applied = applied;
        Ok(())
    }
}
