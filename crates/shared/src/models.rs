use serde::{Deserialize, Serialize};

use crate::error::MapError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }

    /// Build a coordinate, rejecting NaN/infinite values and anything outside
    /// the WGS84 ranges.
    pub fn checked(lat: f64, lng: f64) -> Result<Self, MapError> {
        let ll = LatLng { lat, lng };
        if ll.is_valid() {
            Ok(ll)
        } else {
            Err(MapError::InvalidCoordinate { lat, lng })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn validate(self) -> Result<Self, MapError> {
        Self::checked(self.lat, self.lng)
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelMode {
    #[default]
    Driving,
    TwoWheeler,
    Walking,
}

impl TravelMode {
    pub const ALL: [TravelMode; 3] = [TravelMode::Driving, TravelMode::TwoWheeler, TravelMode::Walking];

    /// Profile segment understood by the routing service.
    pub fn profile(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::TwoWheeler => "cycling",
            TravelMode::Walking => "walking",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TravelMode::Driving => "Driving",
            TravelMode::TwoWheeler => "Two-wheeler",
            TravelMode::Walking => "Walking",
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TravelMode::Driving => write!(f, "driving"),
            TravelMode::TwoWheeler => write!(f, "two-wheeler"),
            TravelMode::Walking => write!(f, "walking"),
        }
    }
}

/// Semantic role of a marker on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerRole {
    Start,
    End,
    Saved,
    Poi,
    Candidate,
    /// The user's own position.
    Avatar,
    /// A place pinned on behalf of the chat panel.
    Location,
    /// Current step of a guided flow.
    Step,
}

/// Axis-aligned lat/lng box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }

    pub fn center(&self) -> LatLng {
        LatLng::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    /// Smallest box covering every point, `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LatLng>) -> Option<Bounds> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let init = Bounds {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        Some(iter.fold(init, |b, p| Bounds {
            south: b.south.min(p.lat),
            west: b.west.min(p.lng),
            north: b.north.max(p.lat),
            east: b.east.max(p.lng),
        }))
    }
}

/// Category tag used by the POI backend (`type=` query parameter).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiCategory(pub String);

impl PoiCategory {
    pub fn new(slug: impl Into<String>) -> Self {
        PoiCategory(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category metadata served to the filter bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub slug: String,
    pub display_name: String,
    #[serde(default)]
    pub icon: String,
}

/// A POI as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl PoiRecord {
    /// Convert into a batch entry. Records without an id get one derived from
    /// their position in the batch; records with unusable coordinates are
    /// dropped.
    pub fn into_poi(self, category: &PoiCategory, index: usize) -> Option<Poi> {
        let coordinate = LatLng::checked(self.lat, self.lng).ok()?;
        Some(Poi {
            id: self.id.unwrap_or_else(|| format!("{}-{}", category, index)),
            coordinate,
            name: self.name,
            phone: self.phone_number.filter(|s| !s.is_empty()),
            website: self.website.filter(|s| !s.is_empty()),
            location: self.location.filter(|s| !s.is_empty()),
            image: self.img.map(|p| p.replace('\\', "/")),
            category: self
                .category
                .map(PoiCategory)
                .unwrap_or_else(|| category.clone()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: String,
    pub coordinate: LatLng,
    pub name: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub category: PoiCategory,
}

/// Derived route between the start and end markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub travel_mode: TravelMode,
    pub polyline: Vec<LatLng>,
}

impl Route {
    /// Point halfway along the vertex list, where the summary popup opens.
    pub fn midpoint(&self) -> Option<LatLng> {
        self.polyline.get(self.polyline.len() / 2).copied()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}\n{:.1} km\n{} minutes",
            self.travel_mode.to_string().to_uppercase(),
            self.distance_km,
            self.duration_minutes
        )
    }
}

/// Result of the external geocoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub name: String,
    pub center: LatLng,
}

/// Details shown in the place panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaceDetails {
    pub id: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub distance_km: Option<f64>,
}

impl From<&Poi> for PlaceDetails {
    fn from(poi: &Poi) -> Self {
        PlaceDetails {
            id: Some(poi.id.clone()),
            name: poi.name.clone(),
            category: Some(poi.category.0.clone()),
            phone: poi.phone.clone(),
            website: poi.website.clone(),
            location: poi.location.clone(),
            image: poi.image.clone(),
            distance_km: None,
        }
    }
}
