//! Map state store.
//!
//! Owns the render surface and every handle placed on it. Marker slots hold
//! at most one live handle each; replacing a slot removes its predecessor
//! from the surface unless another slot still points at the same handle.

use std::collections::BTreeMap;

use tracing::debug;

use crate::gesture::DragTracker;
use crate::models::{LatLng, MarkerRole, Route, TravelMode};
use crate::surface::{Handle, MarkerSpec, PolylineSpec, RenderSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub u64);

/// Single-occupancy marker slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// The user's own position (avatar).
    Main,
    Start,
    End,
    /// Place pinned from the chat panel.
    Location,
    /// Guide-flow step marker.
    Step,
    /// Transient pin awaiting a choice in its popup.
    Candidate,
}

impl Slot {
    pub const ALL: [Slot; 6] = [Slot::Main, Slot::Start, Slot::End, Slot::Location, Slot::Step, Slot::Candidate];
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    pub handle: Handle,
    pub coordinate: LatLng,
    pub label: String,
    pub presentation: MarkerRole,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteLayer {
    pub handle: Handle,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedPin {
    pub id: PinId,
    pub handle: Handle,
    pub coordinate: LatLng,
    pub label: String,
}

/// What a live handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Owner {
    Slot(Slot),
    Saved(PinId),
    /// Index into the current POI batch.
    Poi(usize),
    Route,
}

pub struct MapStore<S: RenderSurface> {
    surface: S,
    slots: BTreeMap<Slot, PlacedMarker>,
    route: Option<RouteLayer>,
    saved: Vec<SavedPin>,
    next_pin: u64,
    poi_layer: Vec<Handle>,
    drag: DragTracker,
    travel_mode: TravelMode,
    suppress_next_click: bool,
}

impl<S: RenderSurface> MapStore<S> {
    pub fn new(surface: S, drag_threshold_px: f64) -> Self {
        MapStore {
            surface,
            slots: BTreeMap::new(),
            route: None,
            saved: Vec::new(),
            next_pin: 1,
            poi_layer: Vec::new(),
            drag: DragTracker::new(drag_threshold_px),
            travel_mode: TravelMode::default(),
            suppress_next_click: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    // ----- marker slots -----

    pub fn get(&self, slot: Slot) -> Option<&PlacedMarker> {
        self.slots.get(&slot)
    }

    /// Place a marker in `slot`, removing the previous occupant first.
    pub fn set(&mut self, slot: Slot, spec: MarkerSpec) -> Handle {
        self.clear(slot);
        let coordinate = spec.coordinate;
        let label = spec.label.clone();
        let presentation = spec.presentation;
        let handle = self.surface.add_marker(spec);
        debug!(?slot, handle = handle.0, "marker placed");
        self.slots.insert(
            slot,
            PlacedMarker {
                handle,
                coordinate,
                label,
                presentation,
            },
        );
        handle
    }

    /// Make `slot` refer to the same live marker as `from`. Returns false if
    /// `from` is empty.
    pub fn alias(&mut self, slot: Slot, from: Slot) -> bool {
        let Some(marker) = self.slots.get(&from).cloned() else {
            return false;
        };
        self.clear(slot);
        self.slots.insert(slot, marker);
        true
    }

    /// Empty a slot. The handle stays on the surface if another slot still
    /// refers to it.
    pub fn clear(&mut self, slot: Slot) -> bool {
        let Some(old) = self.slots.remove(&slot) else {
            return false;
        };
        if !self.slots.values().any(|m| m.handle == old.handle) {
            self.surface.remove(old.handle);
        }
        true
    }

    // ----- route -----

    pub fn route(&self) -> Option<&RouteLayer> {
        self.route.as_ref()
    }

    /// Swap in a new route layer in one step.
    pub fn set_route(&mut self, route: Route, style: PolylineSpec) {
        self.clear_route();
        let handle = self.surface.add_polyline(style);
        self.route = Some(RouteLayer { handle, route });
    }

    pub fn clear_route(&mut self) -> bool {
        match self.route.take() {
            Some(layer) => {
                self.surface.remove(layer.handle);
                true
            }
            None => false,
        }
    }

    // ----- saved pins -----

    pub fn saved_pins(&self) -> &[SavedPin] {
        &self.saved
    }

    pub fn push_saved(&mut self, spec: MarkerSpec) -> PinId {
        let id = PinId(self.next_pin);
        self.next_pin += 1;
        let coordinate = spec.coordinate;
        let label = spec.label.clone();
        let handle = self.surface.add_marker(spec);
        self.saved.push(SavedPin {
            id,
            handle,
            coordinate,
            label,
        });
        id
    }

    pub fn remove_saved(&mut self, id: PinId) -> bool {
        match self.saved.iter().position(|p| p.id == id) {
            Some(idx) => {
                let pin = self.saved.remove(idx);
                self.surface.remove(pin.handle);
                true
            }
            None => false,
        }
    }

    // ----- POI layer -----

    pub fn poi_layer(&self) -> &[Handle] {
        &self.poi_layer
    }

    /// Replace the whole POI layer.
    pub fn replace_poi_layer(&mut self, specs: impl IntoIterator<Item = MarkerSpec>) {
        self.clear_poi_layer();
        self.poi_layer = specs
            .into_iter()
            .map(|spec| self.surface.add_marker(spec))
            .collect();
    }

    pub fn clear_poi_layer(&mut self) {
        for handle in self.poi_layer.drain(..) {
            self.surface.remove(handle);
        }
    }

    // ----- flags -----

    pub fn travel_mode(&self) -> TravelMode {
        self.travel_mode
    }

    pub fn set_travel_mode(&mut self, mode: TravelMode) {
        self.travel_mode = mode;
    }

    pub fn drag(&self) -> &DragTracker {
        &self.drag
    }

    pub fn drag_mut(&mut self) -> &mut DragTracker {
        &mut self.drag
    }

    pub fn suppress_next_click(&mut self) {
        self.suppress_next_click = true;
    }

    /// Consume the one-shot click suppression flag.
    pub fn take_click_suppression(&mut self) -> bool {
        std::mem::take(&mut self.suppress_next_click)
    }

    // ----- queries -----

    pub fn owner_of(&self, handle: Handle) -> Option<Owner> {
        // Slot order puts Main first, so an aliased avatar resolves to it.
        if let Some((slot, _)) = self.slots.iter().find(|(_, m)| m.handle == handle) {
            return Some(Owner::Slot(*slot));
        }
        if let Some(pin) = self.saved.iter().find(|p| p.handle == handle) {
            return Some(Owner::Saved(pin.id));
        }
        if let Some(idx) = self.poi_layer.iter().position(|h| *h == handle) {
            return Some(Owner::Poi(idx));
        }
        match &self.route {
            Some(layer) if layer.handle == handle => Some(Owner::Route),
            _ => None,
        }
    }

    /// Remove every owned handle and reset transient flags. The travel mode
    /// is a preference and survives.
    pub fn clear_all(&mut self) {
        for slot in Slot::ALL {
            self.clear(slot);
        }
        self.clear_route();
        for pin in self.saved.drain(..) {
            self.surface.remove(pin.handle);
        }
        self.clear_poi_layer();
        self.drag.reset();
        self.suppress_next_click = false;
        debug!("map store cleared");
    }
}
