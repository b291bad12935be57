//! Entry point for the chat and search panels to show a place on the map.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::MapError;
use crate::models::{LatLng, MarkerRole, PlaceDetails};
use crate::session::MapSession;
use crate::store::Slot;
use crate::surface::{Handle, MarkerSpec, RenderSurface};

/// Arguments of `pinLocationToMap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPin {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

impl LocationPin {
    pub fn new(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        LocationPin {
            lat,
            lng,
            name: name.into(),
            phone: None,
            website: None,
            distance_km: None,
        }
    }
}

/// Show a place for another panel. Never fails: a map that is not created yet
/// makes this a no-op, and bad input is logged and dropped. Returns whether a
/// marker was placed.
pub fn pin_location_to_map<S: RenderSurface>(session: Option<&mut MapSession<S>>, pin: LocationPin) -> bool {
    let Some(session) = session else {
        return false;
    };
    match session.pin_location(pin) {
        Ok(_) => true,
        Err(err) => {
            warn!(error = %err, "location pin rejected");
            false
        }
    }
}

impl<S: RenderSurface> MapSession<S> {
    /// Keep a single location marker, fly to it and open the details panel.
    pub fn pin_location(&mut self, pin: LocationPin) -> Result<Handle, MapError> {
        let coordinate = LatLng::checked(pin.lat, pin.lng)?;
        let handle = self
            .store
            .set(Slot::Location, MarkerSpec::new(MarkerRole::Location, coordinate, pin.name.clone()));
        let details = PlaceDetails {
            name: pin.name,
            phone: pin.phone.filter(|s| !s.is_empty()),
            website: pin.website.filter(|s| !s.is_empty()),
            distance_km: pin.distance_km,
            ..PlaceDetails::default()
        };
        self.open_panel(details, coordinate);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::session::test_support::*;
    use crate::Scene;

    #[test]
    fn test_uninitialized_map_is_noop() {
        assert!(!pin_location_to_map::<Scene>(None, LocationPin::new(10.77, 106.69, "x")));
    }

    #[test]
    fn test_invalid_pin_is_swallowed() {
        let mut s = session();
        assert!(!pin_location_to_map(Some(&mut s), LocationPin::new(200.0, 106.69, "x")));
        assert_eq!(s.surface().live_count(), 0);
        assert!(s.panel().is_none());
    }

    #[test]
    fn test_single_location_marker_and_panel() {
        let mut s = session();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        s.set_location_listener(move |_, _| counter.set(counter.get() + 1));

        let mut pin = LocationPin::new(10.77, 106.69, "District 1 Notary");
        pin.phone = Some("028 3822 1234".into());
        pin.distance_km = Some(1.2);
        assert!(pin_location_to_map(Some(&mut s), pin));
        assert!(pin_location_to_map(Some(&mut s), LocationPin::new(10.78, 106.70, "Consulate")));

        assert_eq!(s.surface().markers_with_role(MarkerRole::Location), 1);
        assert_eq!(s.surface().viewport().zoom, 17.0);
        let panel = s.panel().unwrap();
        assert_eq!(panel.details.name, "Consulate");
        assert_eq!(panel.coordinate, LatLng::new(10.78, 106.70));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_pin_deserializes_from_chat_payload() {
        let pin: LocationPin =
            serde_json::from_str(r#"{"lat":10.77,"lng":106.69,"name":"Police","distanceKm":0.4}"#).unwrap();
        assert_eq!(pin.distance_km, Some(0.4));
        assert!(pin.website.is_none());
    }
}
