use tracing::debug;

use crate::error::MapError;
use crate::models::{LatLng, MarkerRole};
use crate::session::{MapSession, PopupKind};
use crate::store::Slot;
use crate::surface::{Handle, MarkerSpec, RenderSurface};

impl<S: RenderSurface> MapSession<S> {
    /// Guide-flow hook: fly to a step's location and mark it. Only one step
    /// marker exists at a time. `zoom` defaults to the configured guide zoom.
    pub fn focus_on_coordinate(
        &mut self,
        lat: f64,
        lng: f64,
        title: &str,
        zoom: Option<f64>,
    ) -> Result<Handle, MapError> {
        let coordinate = LatLng::checked(lat, lng)?;
        let zoom = zoom.unwrap_or(self.config.guide_zoom);
        let handle = self
            .store
            .set(Slot::Step, MarkerSpec::new(MarkerRole::Step, coordinate, title));
        self.store.surface_mut().fly_to(coordinate, zoom);
        self.show_popup(coordinate, PopupKind::Step, title);
        debug!(%coordinate, zoom, title, "guide step focused");
        Ok(handle)
    }

    pub fn clear_guide(&mut self) -> bool {
        self.close_popup_if(|k| *k == PopupKind::Step);
        self.store.clear(Slot::Step)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{LatLng, MarkerRole};
    use crate::session::test_support::*;
    use crate::session::PopupKind;
    use crate::surface::RenderSurface;

    #[test]
    fn test_focus_flies_and_drops_step_marker() {
        let mut s = session();
        s.focus_on_coordinate(10.7769, 106.7009, "Go to counter 3", None).unwrap();
        assert_eq!(s.surface().viewport().zoom, 18.0);
        assert_eq!(s.surface().viewport().center, LatLng::new(10.7769, 106.7009));
        assert_eq!(s.surface().markers_with_role(MarkerRole::Step), 1);
        assert_eq!(s.popup().unwrap().kind, PopupKind::Step);
    }

    #[test]
    fn test_next_step_replaces_marker() {
        let mut s = session();
        let first = s.focus_on_coordinate(10.7769, 106.7009, "Step 1", None).unwrap();
        s.focus_on_coordinate(10.7771, 106.7012, "Step 2", Some(16.0)).unwrap();
        assert!(!s.surface().contains(first));
        assert_eq!(s.surface().markers_with_role(MarkerRole::Step), 1);
        assert_eq!(s.surface().viewport().zoom, 16.0);
    }

    #[test]
    fn test_step_marker_is_independent_of_route_markers() {
        let mut s = session();
        s.place_start(LatLng::new(10.776, 106.700), "A").unwrap();
        s.focus_on_coordinate(10.776, 106.700, "Here", None).unwrap();
        assert!(s.start().is_some());
        assert!(s.clear_guide());
        assert!(s.start().is_some());
        assert!(!s.clear_guide());
    }

    #[test]
    fn test_invalid_step_changes_nothing() {
        let mut s = session();
        let before = *s.surface().viewport();
        assert!(s.focus_on_coordinate(f64::INFINITY, 106.7, "bad", None).is_err());
        assert_eq!(*s.surface().viewport(), before);
        assert_eq!(s.surface().live_count(), 0);
    }
}
