/// Tells a drag-to-pan apart from a click-to-pin.
///
/// Movement beyond `threshold_px` between pointer-down and pointer-up marks
/// the gesture as a drag, and the click event that the browser fires after
/// it must not create a pin.
#[derive(Debug, Clone, PartialEq)]
pub struct DragTracker {
    threshold_px: f64,
    origin: Option<(f64, f64)>,
    dragging: bool,
    suppress_click: bool,
}

impl DragTracker {
    pub fn new(threshold_px: f64) -> Self {
        DragTracker {
            threshold_px,
            origin: None,
            dragging: false,
            suppress_click: false,
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.origin = Some((x, y));
        self.dragging = false;
        self.suppress_click = false;
    }

    /// Returns true once the gesture has become a drag.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        if let Some((ox, oy)) = self.origin {
            if !self.dragging && ((x - ox).powi(2) + (y - oy).powi(2)).sqrt() > self.threshold_px {
                self.dragging = true;
            }
        }
        self.dragging
    }

    pub fn pointer_up(&mut self) {
        self.suppress_click = self.dragging;
        self.origin = None;
        self.dragging = false;
    }

    /// Consume the click that follows pointer-up. Returns false if the click
    /// ended a drag and must be ignored.
    pub fn take_click(&mut self) -> bool {
        let allowed = !self.suppress_click;
        self.suppress_click = false;
        allowed
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn reset(&mut self) {
        self.origin = None;
        self.dragging = false;
        self.suppress_click = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_movement_is_a_click() {
        let mut t = DragTracker::new(5.0);
        t.pointer_down(100.0, 100.0);
        assert!(!t.pointer_move(103.0, 102.0));
        t.pointer_up();
        assert!(t.take_click());
    }

    #[test]
    fn test_drag_suppresses_one_click() {
        let mut t = DragTracker::new(5.0);
        t.pointer_down(100.0, 100.0);
        assert!(t.pointer_move(120.0, 100.0));
        // moving back inside the threshold does not undo the drag
        assert!(t.pointer_move(101.0, 100.0));
        t.pointer_up();
        assert!(!t.is_dragging());
        assert!(!t.take_click());
        assert!(t.take_click());
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut t = DragTracker::new(5.0);
        assert!(!t.pointer_move(500.0, 500.0));
        assert!(t.take_click());
    }
}
