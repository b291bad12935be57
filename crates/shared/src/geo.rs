//! Geodesy and Web Mercator viewport math.
//!
//! Tiles are 256 px squares; at zoom `z` the whole world is
//! `256 * 2^z` pixels wide. Container coordinates have their origin at the
//! top-left corner of the map element, X to the east, Y to the south.

use serde::{Deserialize, Serialize};

use crate::models::{Bounds, LatLng};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub const TILE_SIZE: f64 = 256.0;

/// Latitude at which the Mercator projection becomes a square world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Great-circle (haversine) distance in meters.
pub fn distance_m(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Format a meter distance for display.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

pub fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// World size in pixels at the given (possibly fractional) zoom.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project a coordinate to world pixels.
pub fn project(p: LatLng, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let x = (p.lng + 180.0) / 360.0 * size;
    let sin_lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().sin();
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * std::f64::consts::PI)) * size;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * y / size;
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat.clamp(-MAX_LATITUDE, MAX_LATITUDE), lng)
}

/// A raster tile and where it lands inside the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

impl TilePlacement {
    /// Expand a `{z}/{x}/{y}` URL template.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// The visible map region: center, zoom and container size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, width: f64, height: f64) -> Self {
        Viewport {
            center,
            zoom: clamp_zoom(zoom),
            width,
            height,
        }
    }

    /// World pixel of the container's top-left corner.
    fn origin(&self) -> (f64, f64) {
        let (cx, cy) = project(self.center, self.zoom);
        (cx - self.width / 2.0, cy - self.height / 2.0)
    }

    /// Container pixel of a coordinate.
    pub fn to_container(&self, p: LatLng) -> (f64, f64) {
        let (ox, oy) = self.origin();
        let (x, y) = project(p, self.zoom);
        (x - ox, y - oy)
    }

    /// Coordinate under a container pixel.
    pub fn to_latlng(&self, x: f64, y: f64) -> LatLng {
        let (ox, oy) = self.origin();
        unproject(ox + x, oy + y, self.zoom)
    }

    pub fn bounds(&self) -> Bounds {
        let nw = self.to_latlng(0.0, 0.0);
        let se = self.to_latlng(self.width, self.height);
        Bounds {
            south: se.lat,
            west: nw.lng,
            north: nw.lat,
            east: se.lng,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Move the content by a pointer delta, as when dragging the map.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let (cx, cy) = project(self.center, self.zoom);
        self.center = unproject(cx - dx, cy - dy, self.zoom);
    }

    /// Zoom so that the coordinate under `cursor` stays under it.
    pub fn zoom_around(&mut self, cursor_x: f64, cursor_y: f64, new_zoom: f64) {
        let new_zoom = clamp_zoom(new_zoom);
        let anchor = self.to_latlng(cursor_x, cursor_y);
        let (ax, ay) = project(anchor, new_zoom);
        let cx = ax - cursor_x + self.width / 2.0;
        let cy = ay - cursor_y + self.height / 2.0;
        self.zoom = new_zoom;
        self.center = unproject(cx, cy, new_zoom);
    }

    pub fn fly_to(&mut self, center: LatLng, zoom: f64) {
        self.center = center;
        self.zoom = clamp_zoom(zoom);
    }

    /// Largest integer zoom at which `bounds` fits inside the container
    /// minus `padding` on every side, centered on the box.
    pub fn fit(&mut self, bounds: Bounds, padding: f64) {
        let sw = LatLng::new(bounds.south, bounds.west);
        let ne = LatLng::new(bounds.north, bounds.east);
        let (x0, y0) = project(sw, 0.0);
        let (x1, y1) = project(ne, 0.0);
        let span_x = (x1 - x0).abs();
        let span_y = (y0 - y1).abs();
        let avail_x = (self.width - 2.0 * padding).max(1.0);
        let avail_y = (self.height - 2.0 * padding).max(1.0);

        let zoom = if span_x <= f64::EPSILON && span_y <= f64::EPSILON {
            MAX_ZOOM
        } else {
            let scale_x = if span_x > f64::EPSILON { avail_x / span_x } else { f64::INFINITY };
            let scale_y = if span_y > f64::EPSILON { avail_y / span_y } else { f64::INFINITY };
            scale_x.min(scale_y).log2().floor()
        };

        self.center = unproject((x0 + x1) / 2.0, (y0 + y1) / 2.0, 0.0);
        self.zoom = clamp_zoom(zoom);
    }

    /// Tiles covering the container at the nearest integer zoom, scaled to
    /// the fractional zoom.
    pub fn visible_tiles(&self) -> Vec<TilePlacement> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Vec::new();
        }
        let z = self.zoom.round().clamp(0.0, MAX_ZOOM);
        let scale = 2f64.powf(self.zoom - z);
        let tile_px = TILE_SIZE * scale;
        let (cx, cy) = project(self.center, z);
        let half_w = self.width / 2.0 / scale;
        let half_h = self.height / 2.0 / scale;
        let n = 2f64.powf(z) as i64;

        let min_tx = ((cx - half_w) / TILE_SIZE).floor() as i64;
        let max_tx = ((cx + half_w) / TILE_SIZE).floor() as i64;
        let min_ty = (((cy - half_h) / TILE_SIZE).floor() as i64).max(0);
        let max_ty = (((cy + half_h) / TILE_SIZE).floor() as i64).min(n - 1);

        let mut tiles = Vec::new();
        for ty in min_ty..=max_ty {
            for tx in min_tx..=max_tx {
                tiles.push(TilePlacement {
                    x: tx.rem_euclid(n) as u32,
                    y: ty as u32,
                    z: z as u32,
                    left: (tx as f64 * TILE_SIZE - cx) * scale + self.width / 2.0,
                    top: (ty as f64 * TILE_SIZE - cy) * scale + self.height / 2.0,
                    size: tile_px,
                });
            }
        }
        tiles
    }
}
