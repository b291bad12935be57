//! Marker lifecycle: start/end exclusivity, saved pins and the avatar.

use tracing::{debug, info};

use crate::error::MapError;
use crate::geo::distance_m;
use crate::models::{LatLng, MarkerRole};
use crate::session::{MapSession, PopupKind};
use crate::store::{PinId, PlacedMarker, Slot};
use crate::surface::{Handle, MarkerSpec, RenderSurface};

impl<S: RenderSurface> MapSession<S> {
    pub fn start(&self) -> Option<&PlacedMarker> {
        self.store.get(Slot::Start)
    }

    pub fn end(&self) -> Option<&PlacedMarker> {
        self.store.get(Slot::End)
    }

    pub fn user_location(&self) -> Option<LatLng> {
        self.store.get(Slot::Main).map(|m| m.coordinate)
    }

    /// True when `coordinate` is within the avatar-overlap distance of the
    /// user's own marker.
    pub fn is_at_avatar(&self, coordinate: LatLng) -> bool {
        self.user_location()
            .is_some_and(|me| distance_m(me, coordinate) < self.config.avatar_overlap_meters)
    }

    /// Place or move the user's avatar.
    pub fn set_user_location(&mut self, coordinate: LatLng, label: &str) -> Result<Handle, MapError> {
        let coordinate = coordinate.validate()?;
        let handle = self
            .store
            .set(Slot::Main, MarkerSpec::new(MarkerRole::Avatar, coordinate, label));
        debug!(%coordinate, "user location set");
        Ok(handle)
    }

    pub fn place_start(&mut self, coordinate: LatLng, label: &str) -> Result<Handle, MapError> {
        self.place_endpoint(Slot::Start, MarkerRole::Start, coordinate, label)
    }

    pub fn place_end(&mut self, coordinate: LatLng, label: &str) -> Result<Handle, MapError> {
        self.place_endpoint(Slot::End, MarkerRole::End, coordinate, label)
    }

    fn place_endpoint(
        &mut self,
        slot: Slot,
        role: MarkerRole,
        coordinate: LatLng,
        label: &str,
    ) -> Result<Handle, MapError> {
        let coordinate = coordinate.validate()?;
        let presentation = if self.is_at_avatar(coordinate) {
            MarkerRole::Avatar
        } else {
            role
        };
        let kind = if slot == Slot::Start { PopupKind::Start } else { PopupKind::End };
        self.close_popup_if(|k| *k == kind);
        let handle = self
            .store
            .set(slot, MarkerSpec::new(role, coordinate, label).presented_as(presentation));
        info!(?slot, %coordinate, "route endpoint placed");

        // The old geometry no longer connects the markers.
        self.invalidate_route();
        if self.store.get(Slot::Start).is_some() && self.store.get(Slot::End).is_some() {
            self.request_route();
        }
        Ok(handle)
    }

    /// Remove the start marker and any route. Returns false if there was no
    /// start marker.
    pub fn unpin_start(&mut self) -> bool {
        self.unpin_endpoint(Slot::Start, PopupKind::Start)
    }

    pub fn unpin_end(&mut self) -> bool {
        self.unpin_endpoint(Slot::End, PopupKind::End)
    }

    fn unpin_endpoint(&mut self, slot: Slot, kind: PopupKind) -> bool {
        let removed = self.store.clear(slot);
        self.invalidate_route();
        self.close_popup_if(|k| *k == kind);
        removed
    }

    pub fn promote_to_saved(&mut self, coordinate: LatLng, label: &str) -> Result<PinId, MapError> {
        let coordinate = coordinate.validate()?;
        let id = self
            .store
            .push_saved(MarkerSpec::new(MarkerRole::Saved, coordinate, label));
        info!(pin = id.0, %coordinate, "pin saved");
        Ok(id)
    }

    pub fn remove_saved(&mut self, id: PinId) -> Result<(), MapError> {
        if !self.store.remove_saved(id) {
            return Err(MapError::UnknownPin(id));
        }
        self.close_popup_if(|k| *k == PopupKind::Saved(id));
        Ok(())
    }
}
