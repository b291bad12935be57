//! Candidate pins: the transient marker a map click drops, with a popup
//! offering Start, End and Pin. `Open -> {Saved, Discarded}`.

use tracing::debug;

use crate::error::MapError;
use crate::models::{LatLng, MarkerRole};
use crate::poi::NO_NOTE;
use crate::session::{MapSession, PopupKind};
use crate::store::Slot;
use crate::surface::{MarkerSpec, RenderSurface};

/// Name given to candidates created by clicking the map.
pub const MARKED_POINT: &str = "Marked Point";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    Open,
    Saved,
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateChoice {
    Start,
    End,
    Save,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePin {
    pub id: CandidateId,
    pub coordinate: LatLng,
    pub name: String,
    pub note: String,
}

impl CandidatePin {
    /// Label for a start or end marker made from this pin.
    pub fn endpoint_label(&self) -> String {
        [self.note.trim(), self.name.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or(NO_NOTE)
            .to_string()
    }

    /// Label for a saved pin; only the note counts here.
    pub fn saved_label(&self) -> String {
        match self.note.trim() {
            "" => NO_NOTE.to_string(),
            note => note.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateTracker {
    next_id: u64,
    open: Option<CandidatePin>,
    closed: Option<(CandidateId, CandidateState)>,
}

impl CandidateTracker {
    pub fn open(&self) -> Option<&CandidatePin> {
        self.open.as_ref()
    }

    pub fn state(&self, id: CandidateId) -> Option<CandidateState> {
        match (&self.open, self.closed) {
            (Some(pin), _) if pin.id == id => Some(CandidateState::Open),
            (_, Some((closed, state))) if closed == id => Some(state),
            _ => None,
        }
    }

    fn begin(&mut self, coordinate: LatLng, name: &str) -> CandidatePin {
        self.next_id += 1;
        let pin = CandidatePin {
            id: CandidateId(self.next_id),
            coordinate,
            name: name.to_string(),
            note: String::new(),
        };
        self.open = Some(pin.clone());
        pin
    }

    fn take(&mut self, id: CandidateId, outcome: CandidateState) -> Option<CandidatePin> {
        if self.open.as_ref().is_some_and(|p| p.id == id) {
            self.closed = Some((id, outcome));
            self.open.take()
        } else {
            None
        }
    }

    /// Forget the open pin without touching the surface (the caller clears
    /// the store).
    pub(crate) fn drop_open(&mut self) {
        if let Some(pin) = self.open.take() {
            self.closed = Some((pin.id, CandidateState::Discarded));
        }
    }
}

impl<S: RenderSurface> MapSession<S> {
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.store.drag_mut().pointer_down(x, y);
    }

    /// Returns true while the gesture is a drag (the host pans the map).
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.store.drag_mut().pointer_move(x, y)
    }

    pub fn pointer_up(&mut self) {
        self.store.drag_mut().pointer_up();
    }

    /// Abandon the gesture, e.g. on touch cancel.
    pub fn pointer_cancel(&mut self) {
        self.store.drag_mut().reset();
    }

    /// Map click. Opens a candidate unless the click ends a drag or directly
    /// follows a travel-mode switch. Any click closes the place panel.
    pub fn on_map_click(&mut self, coordinate: LatLng) -> Option<CandidateId> {
        if !self.store.drag_mut().take_click() {
            debug!("click after drag ignored");
            return None;
        }
        self.close_panel();
        if self.store.take_click_suppression() {
            debug!("click after travel mode change ignored");
            return None;
        }
        self.open_candidate(coordinate, MARKED_POINT).ok()
    }

    /// Drop a candidate pin and open its popup. An earlier open candidate is
    /// discarded.
    pub fn open_candidate(&mut self, coordinate: LatLng, name: &str) -> Result<CandidateId, MapError> {
        let coordinate = coordinate.validate()?;
        self.close_popup();
        if let Some(open) = self.candidates.open().map(|p| p.id) {
            self.discard_candidate(open)?;
        }
        let pin = self.candidates.begin(coordinate, name);
        self.store
            .set(Slot::Candidate, MarkerSpec::new(MarkerRole::Candidate, coordinate, name));
        self.show_popup(coordinate, PopupKind::Candidate(pin.id), pin.name.clone());
        debug!(candidate = pin.id.0, %coordinate, "candidate opened");
        Ok(pin.id)
    }

    pub fn candidate(&self) -> Option<&CandidatePin> {
        self.candidates.open()
    }

    pub fn candidate_state(&self, id: CandidateId) -> Option<CandidateState> {
        self.candidates.state(id)
    }

    pub fn set_candidate_note(&mut self, id: CandidateId, note: &str) -> Result<(), MapError> {
        match self.candidates.open.as_mut() {
            Some(pin) if pin.id == id => {
                pin.note = note.to_string();
                Ok(())
            }
            _ => Err(MapError::UnknownCandidate(id)),
        }
    }

    /// Commit an open candidate. The transient pin is destroyed and the chosen
    /// role is created fresh at the same coordinate.
    pub fn resolve_candidate(&mut self, id: CandidateId, choice: CandidateChoice) -> Result<(), MapError> {
        let pin = self
            .candidates
            .take(id, CandidateState::Saved)
            .ok_or(MapError::UnknownCandidate(id))?;
        self.store.clear(Slot::Candidate);
        if self.popup.as_ref().is_some_and(|p| p.kind == PopupKind::Candidate(id)) {
            self.popup = None;
        }
        debug!(candidate = id.0, ?choice, "candidate resolved");
        match choice {
            CandidateChoice::Start => self.place_start(pin.coordinate, &pin.endpoint_label()).map(|_| ()),
            CandidateChoice::End => self.place_end(pin.coordinate, &pin.endpoint_label()).map(|_| ()),
            CandidateChoice::Save => self.promote_to_saved(pin.coordinate, &pin.saved_label()).map(|_| ()),
        }
    }

    /// Remove an unresolved candidate.
    pub fn discard_candidate(&mut self, id: CandidateId) -> Result<(), MapError> {
        self.candidates
            .take(id, CandidateState::Discarded)
            .ok_or(MapError::UnknownCandidate(id))?;
        self.store.clear(Slot::Candidate);
        if self.popup.as_ref().is_some_and(|p| p.kind == PopupKind::Candidate(id)) {
            self.popup = None;
        }
        debug!(candidate = id.0, "candidate discarded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::*;

    const A: LatLng = LatLng::new(10.776, 106.700);

    #[test]
    fn test_click_opens_candidate_with_popup() {
        let mut s = session();
        let id = s.on_map_click(A).unwrap();
        assert_eq!(s.candidate_state(id), Some(CandidateState::Open));
        assert_eq!(s.candidate().unwrap().name, MARKED_POINT);
        assert_eq!(s.popup().unwrap().kind, PopupKind::Candidate(id));
        assert_eq!(s.surface().markers_with_role(MarkerRole::Candidate), 1);
    }

    #[test]
    fn test_drag_does_not_open_candidate() {
        let mut s = session();
        s.pointer_down(100.0, 100.0);
        assert!(s.pointer_move(140.0, 120.0));
        s.pointer_up();
        assert!(s.on_map_click(A).is_none());
        assert!(s.candidate().is_none());
        // the next genuine click works again
        assert!(s.on_map_click(A).is_some());
    }

    #[test]
    fn test_closing_popup_discards_candidate() {
        let mut s = session();
        let id = s.on_map_click(A).unwrap();
        s.close_popup();
        assert_eq!(s.candidate_state(id), Some(CandidateState::Discarded));
        assert_eq!(s.surface().live_count(), 0);
    }

    #[test]
    fn test_second_click_replaces_open_candidate() {
        let mut s = session();
        let first = s.on_map_click(A).unwrap();
        let second = s.on_map_click(LatLng::new(10.78, 106.70)).unwrap();
        assert_ne!(first, second);
        assert_eq!(s.candidate_state(second), Some(CandidateState::Open));
        assert_eq!(s.surface().markers_with_role(MarkerRole::Candidate), 1);
        assert_eq!(s.discard_candidate(first), Err(MapError::UnknownCandidate(first)));
    }

    #[test]
    fn test_resolve_start_uses_note_then_name() {
        let mut s = session();
        let id = s.on_map_click(A).unwrap();
        s.resolve_candidate(id, CandidateChoice::Start).unwrap();
        assert_eq!(s.start().unwrap().label, MARKED_POINT);
        assert_eq!(s.candidate_state(id), Some(CandidateState::Saved));
        assert!(s.popup().is_none());

        let id = s.on_map_click(A).unwrap();
        s.set_candidate_note(id, "front gate").unwrap();
        s.resolve_candidate(id, CandidateChoice::End).unwrap();
        assert_eq!(s.end().unwrap().label, "front gate");
        assert_eq!(s.surface().markers_with_role(MarkerRole::Candidate), 0);
    }

    #[test]
    fn test_save_label_ignores_name() {
        let mut s = session();
        let id = s.on_map_click(A).unwrap();
        s.resolve_candidate(id, CandidateChoice::Save).unwrap();
        assert_eq!(s.store().saved_pins()[0].label, NO_NOTE);

        let id = s.on_map_click(A).unwrap();
        s.set_candidate_note(id, "  lunch  ").unwrap();
        s.resolve_candidate(id, CandidateChoice::Save).unwrap();
        assert_eq!(s.store().saved_pins()[1].label, "lunch");
    }

    #[test]
    fn test_resolved_candidate_cannot_be_resolved_again() {
        let mut s = session();
        let id = s.on_map_click(A).unwrap();
        s.resolve_candidate(id, CandidateChoice::Save).unwrap();
        assert_eq!(
            s.resolve_candidate(id, CandidateChoice::Start),
            Err(MapError::UnknownCandidate(id))
        );
        assert_eq!(s.set_candidate_note(id, "x"), Err(MapError::UnknownCandidate(id)));
    }

    #[test]
    fn test_opening_another_popup_discards_candidate() {
        let mut s = session();
        let start = s.place_start(A, "Home").unwrap();
        let id = s.on_map_click(LatLng::new(10.78, 106.70)).unwrap();
        s.marker_clicked(start);
        assert_eq!(s.candidate_state(id), Some(CandidateState::Discarded));
        assert_eq!(s.popup().unwrap().kind, PopupKind::Start);
    }

    #[test]
    fn test_click_closes_place_panel() {
        let mut s = session();
        s.pin_location(crate::bridge::LocationPin::new(10.77, 106.69, "Clinic")).unwrap();
        assert!(s.panel().is_some());
        s.on_map_click(A);
        assert!(s.panel().is_none());
    }

    #[test]
    fn test_invalid_candidate_coordinate() {
        let mut s = session();
        assert!(s.open_candidate(LatLng::new(95.0, 0.0), "x").is_err());
        assert!(s.candidate().is_none());
        assert!(s.popup().is_none());
    }
}
