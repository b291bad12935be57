//! The render surface seam.
//!
//! Map state talks to the visual layer only through [`RenderSurface`] and the
//! opaque [`Handle`]s it hands out. [`Scene`] is the retained implementation
//! the web front end draws from; tests use it to check that no handle leaks.

use std::collections::BTreeMap;

use crate::geo::Viewport;
use crate::models::{Bounds, LatLng, MarkerRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub role: MarkerRole,
    /// Role whose style is drawn. Equal to `role` except for the
    /// avatar-overlap override.
    pub presentation: MarkerRole,
    pub coordinate: LatLng,
    pub label: String,
}

impl MarkerSpec {
    pub fn new(role: MarkerRole, coordinate: LatLng, label: impl Into<String>) -> Self {
        MarkerSpec {
            role,
            presentation: role,
            coordinate,
            label: label.into(),
        }
    }

    pub fn presented_as(mut self, presentation: MarkerRole) -> Self {
        self.presentation = presentation;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolylineSpec {
    pub points: Vec<LatLng>,
    pub color: String,
    pub weight: f64,
}

pub trait RenderSurface {
    fn add_marker(&mut self, spec: MarkerSpec) -> Handle;
    fn add_polyline(&mut self, spec: PolylineSpec) -> Handle;
    /// Returns false when the handle was not live.
    fn remove(&mut self, handle: Handle) -> bool;
    fn contains(&self, handle: Handle) -> bool;
    fn fly_to(&mut self, center: LatLng, zoom: f64);
    fn fit_bounds(&mut self, bounds: Bounds, padding: f64);
    fn viewport_bounds(&self) -> Bounds;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Marker(MarkerSpec),
    Polyline(PolylineSpec),
}

/// Retained scene: every live shape keyed by its handle, plus the viewport.
#[derive(Debug, Clone)]
pub struct Scene {
    shapes: BTreeMap<Handle, Shape>,
    viewport: Viewport,
    next_id: u64,
    revision: u64,
}

impl Scene {
    pub fn new(viewport: Viewport) -> Self {
        Scene {
            shapes: BTreeMap::new(),
            viewport,
            next_id: 1,
            revision: 0,
        }
    }

    fn insert(&mut self, shape: Shape) -> Handle {
        let handle = Handle(self.next_id);
        self.next_id += 1;
        self.shapes.insert(handle, shape);
        self.revision += 1;
        handle
    }

    pub fn markers(&self) -> impl Iterator<Item = (Handle, &MarkerSpec)> {
        self.shapes.iter().filter_map(|(h, s)| match s {
            Shape::Marker(m) => Some((*h, m)),
            Shape::Polyline(_) => None,
        })
    }

    pub fn polylines(&self) -> impl Iterator<Item = (Handle, &PolylineSpec)> {
        self.shapes.iter().filter_map(|(h, s)| match s {
            Shape::Polyline(p) => Some((*h, p)),
            Shape::Marker(_) => None,
        })
    }

    pub fn marker(&self, handle: Handle) -> Option<&MarkerSpec> {
        match self.shapes.get(&handle) {
            Some(Shape::Marker(m)) => Some(m),
            _ => None,
        }
    }

    pub fn markers_with_role(&self, role: MarkerRole) -> usize {
        self.markers().filter(|(_, m)| m.role == role).count()
    }

    pub fn live_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable viewport access for pan and zoom gestures.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        self.revision += 1;
        &mut self.viewport
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.viewport_mut().resize(width, height);
    }

    /// Bumped on every change; lets the front end skip redundant redraws.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl RenderSurface for Scene {
    fn add_marker(&mut self, spec: MarkerSpec) -> Handle {
        self.insert(Shape::Marker(spec))
    }

    fn add_polyline(&mut self, spec: PolylineSpec) -> Handle {
        self.insert(Shape::Polyline(spec))
    }

    fn remove(&mut self, handle: Handle) -> bool {
        let removed = self.shapes.remove(&handle).is_some();
        if removed {
            self.revision += 1;
        }
        removed
    }

    fn contains(&self, handle: Handle) -> bool {
        self.shapes.contains_key(&handle)
    }

    fn fly_to(&mut self, center: LatLng, zoom: f64) {
        self.viewport_mut().fly_to(center, zoom);
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: f64) {
        self.viewport_mut().fit(bounds, padding);
    }

    fn viewport_bounds(&self) -> Bounds {
        self.viewport.bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::new(Viewport::new(LatLng::new(10.76, 106.66), 12.0, 800.0, 600.0))
    }

    #[test]
    fn test_handles_are_unique_and_removable() {
        let mut s = scene();
        let a = s.add_marker(MarkerSpec::new(MarkerRole::Start, LatLng::new(10.0, 106.0), "A"));
        let b = s.add_marker(MarkerSpec::new(MarkerRole::End, LatLng::new(10.1, 106.1), "B"));
        assert_ne!(a, b);
        assert_eq!(s.live_count(), 2);
        assert!(s.remove(a));
        assert!(!s.remove(a));
        assert!(!s.contains(a));
        assert!(s.contains(b));
        assert_eq!(s.live_count(), 1);
    }

    #[test]
    fn test_markers_and_polylines_are_separated() {
        let mut s = scene();
        s.add_marker(MarkerSpec::new(MarkerRole::Poi, LatLng::new(10.0, 106.0), "P"));
        s.add_polyline(PolylineSpec {
            points: vec![LatLng::new(10.0, 106.0), LatLng::new(10.1, 106.1)],
            color: "#0078ff".into(),
            weight: 5.0,
        });
        assert_eq!(s.markers().count(), 1);
        assert_eq!(s.polylines().count(), 1);
        assert_eq!(s.markers_with_role(MarkerRole::Poi), 1);
    }

    #[test]
    fn test_presentation_override() {
        let spec = MarkerSpec::new(MarkerRole::Start, LatLng::new(10.0, 106.0), "S")
            .presented_as(MarkerRole::Avatar);
        assert_eq!(spec.role, MarkerRole::Start);
        assert_eq!(spec.presentation, MarkerRole::Avatar);
    }

    #[test]
    fn test_revision_advances_on_change() {
        let mut s = scene();
        let r0 = s.revision();
        let h = s.add_marker(MarkerSpec::new(MarkerRole::Saved, LatLng::new(10.0, 106.0), ""));
        assert!(s.revision() > r0);
        let r1 = s.revision();
        s.remove(h);
        assert!(s.revision() > r1);
        let r2 = s.revision();
        s.fly_to(LatLng::new(11.0, 107.0), 17.0);
        assert!(s.revision() > r2);
        assert_eq!(s.viewport().zoom, 17.0);
    }
}
