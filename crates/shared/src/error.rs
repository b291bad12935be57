use std::fmt;

use crate::candidate::CandidateId;
use crate::store::PinId;

/// Synchronous rejection of a map operation. Returned before any state is
/// touched, so a failed call leaves the session exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    InvalidCoordinate { lat: f64, lng: f64 },
    UnknownPin(PinId),
    UnknownCandidate(CandidateId),
    UnknownPoi(String),
    NoPanel,
    MissingUserLocation,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::InvalidCoordinate { lat, lng } => {
                write!(f, "Invalid coordinate ({}, {})", lat, lng)
            }
            MapError::UnknownPin(id) => write!(f, "No saved pin with id {}", id.0),
            MapError::UnknownCandidate(id) => write!(f, "No open candidate pin with id {}", id.0),
            MapError::UnknownPoi(id) => write!(f, "No POI with id {} in the current batch", id),
            MapError::NoPanel => write!(f, "No place details panel is open"),
            MapError::MissingUserLocation => write!(f, "User location is not known yet"),
        }
    }
}

impl std::error::Error for MapError {}

/// Failure of a call to the routing, POI or geocoding service.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    Transport(String),
    Status(u16),
    Decode(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "Service unreachable: {}", msg),
            FetchError::Status(code) => write!(f, "Service responded with status {}", code),
            FetchError::Decode(msg) => write!(f, "Malformed service response: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_coordinate_message() {
        let err = MapError::InvalidCoordinate { lat: 91.0, lng: 0.0 };
        assert_eq!(err.to_string(), "Invalid coordinate (91, 0)");
    }

    #[test]
    fn test_fetch_error_messages_are_distinct() {
        let transport = FetchError::Transport("timeout".into()).to_string();
        let status = FetchError::Status(502).to_string();
        assert!(transport.contains("unreachable"));
        assert!(status.contains("502"));
        assert_ne!(transport, status);
    }
}
