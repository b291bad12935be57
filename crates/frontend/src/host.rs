//! Glue between the synchronous map session and the browser: every mutation
//! goes through [`Host::update`], which then runs the network calls the
//! session queued and surfaces its notices as toasts.

use dioxus::logger::tracing::{debug, warn};
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use wayfinder_shared::geo::Viewport;
use wayfinder_shared::models::{LatLng, PlaceDetails};
use wayfinder_shared::session::{Notice, ServiceRequest};
use wayfinder_shared::{MapConfig, MapSession, Scene};

use crate::api;

const TOAST_MS: u32 = 4_000;
/// Quiet time after the last wheel event before the view counts as settled.
const SETTLE_MS: u32 = 300;

pub type Session = MapSession<Scene>;

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub error: bool,
}

/// A place the map reported to the chat panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPlace {
    pub coordinate: LatLng,
    pub details: PlaceDetails,
}

#[derive(Clone, Copy)]
pub struct Host {
    pub session: Signal<Session>,
    pub toasts: Signal<Vec<Toast>>,
    pub places: Signal<Vec<SelectedPlace>>,
    next_toast: Signal<u64>,
    settle_gen: Signal<u64>,
    poi_base: Signal<String>,
}

/// Session configured for this page: POI calls go to the page origin.
pub fn page_config() -> MapConfig {
    let mut config = MapConfig::default();
    config.poi_base_url = api::resolve_base(&config.poi_base_url, &api::page_origin());
    config
}

pub fn new_session(config: MapConfig) -> Session {
    let viewport = Viewport::new(config.default_center, config.default_zoom, 800.0, 600.0);
    MapSession::new(Scene::new(viewport), config)
}

/// Create the host and provide it to the component tree.
pub fn use_host_provider() -> Host {
    let session = use_signal(|| new_session(page_config()));
    let toasts = use_signal(Vec::new);
    let mut places = use_signal(Vec::new);
    let next_toast = use_signal(|| 0u64);
    let settle_gen = use_signal(|| 0u64);
    let poi_base = use_signal(|| session.peek().config().poi_base_url.clone());

    let host = use_context_provider(|| Host {
        session,
        toasts,
        places,
        next_toast,
        settle_gen,
        poi_base,
    });

    // Chat panel hook: remember every place the map shows.
    use_hook(move || {
        let mut session = session;
        session.write().set_location_listener(move |coordinate, details| {
            places.write().push(SelectedPlace {
                coordinate,
                details: details.clone(),
            });
        });
    });

    host
}

pub fn use_host() -> Host {
    use_context::<Host>()
}

impl Host {
    pub fn poi_base(&self) -> String {
        self.poi_base.peek().clone()
    }

    /// Mutate the session, then dispatch what it queued.
    pub fn update<R>(mut self, f: impl FnOnce(&mut Session) -> R) -> R {
        let (out, requests, notices) = {
            let mut session = self.session.write();
            let out = f(&mut session);
            (out, session.take_requests(), session.take_notices())
        };
        for notice in notices {
            self.push_notice(&notice);
        }
        for request in requests {
            self.dispatch(request);
        }
        out
    }

    fn dispatch(self, request: ServiceRequest) {
        let config = self.session.peek().config().clone();
        match request {
            ServiceRequest::Route(req) => {
                let url = req.url(&config.routing_base_url);
                debug!(seq = req.seq, %url, "route request");
                spawn(async move {
                    let result = api::fetch_route(&url).await;
                    self.update(|s| s.apply_route_response(req.seq, result));
                });
            }
            ServiceRequest::Pois(query) => {
                let url = query.url(&config.poi_base_url);
                debug!(seq = query.seq, %url, "poi request");
                spawn(async move {
                    let result = api::fetch_pois(&url).await;
                    self.update(|s| s.apply_poi_response(query.seq, result));
                });
            }
        }
    }

    fn push_notice(self, notice: &Notice) {
        self.toast(notice.message(), notice.is_error());
    }

    /// Show a message for a few seconds.
    pub fn toast(mut self, message: impl Into<String>, error: bool) {
        let id = {
            let mut next = self.next_toast.write();
            *next += 1;
            *next
        };
        let message = message.into();
        if error {
            warn!(%message, "toast");
        }
        self.toasts.write().push(Toast { id, message, error });
        spawn(async move {
            TimeoutFuture::new(TOAST_MS).await;
            self.dismiss(id);
        });
    }

    pub fn dismiss(mut self, id: u64) {
        self.toasts.write().retain(|t| t.id != id);
    }

    /// Settle after a burst of wheel or drag events.
    pub fn settle_later(mut self) {
        let generation = {
            let mut gen = self.settle_gen.write();
            *gen += 1;
            *gen
        };
        spawn(async move {
            TimeoutFuture::new(SETTLE_MS).await;
            if *self.settle_gen.peek() == generation {
                self.update(|s| s.on_viewport_settled());
            }
        });
    }

    pub fn clear_places(mut self) {
        self.places.write().clear();
    }
}
