//! Map annotation, routing and POI subsystem.
//!
//! Everything in this crate is target independent: the browser front end
//! drives a [`session::MapSession`] over a retained [`surface::Scene`] and
//! performs the network calls the session queues up, while the backend
//! reuses the wire models.

pub mod bridge;
pub mod candidate;
pub mod config;
pub mod error;
pub mod geo;
pub mod gesture;
pub mod guide;
pub mod markers;
pub mod models;
pub mod overlay;
pub mod poi;
pub mod routing;
pub mod search;
pub mod session;
pub mod store;
pub mod style;
pub mod surface;

pub use config::MapConfig;
pub use error::{FetchError, MapError};
pub use models::{LatLng, TravelMode};
pub use session::MapSession;
pub use surface::{RenderSurface, Scene};
