use serde::{Deserialize, Serialize};
use wayfinder_shared::models::{CategoryInfo, GeocodeResult, LatLng, PoiRecord};
use wayfinder_shared::routing::RouteResponse;
use wayfinder_shared::FetchError;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Page origin, used as the POI backend base when none is configured.
pub fn page_origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

/// Resolve a configured base URL, falling back to the page origin.
pub fn resolve_base(configured: &str, origin: &str) -> String {
    if configured.is_empty() {
        origin.trim_end_matches('/').to_string()
    } else {
        configured.trim_end_matches('/').to_string()
    }
}

pub fn build_check_poi_url(base: &str, lat: f64, lng: f64, name: &str) -> Result<reqwest::Url, FetchError> {
    let url = format!("{}/check_poi", base.trim_end_matches('/'));
    reqwest::Url::parse_with_params(
        &url,
        &[
            ("lat", lat.to_string()),
            ("lng", lng.to_string()),
            ("name", name.to_string()),
        ],
    )
    .map_err(|e| FetchError::Transport(e.to_string()))
}

pub fn build_geocode_url(query: &str) -> Result<reqwest::Url, FetchError> {
    reqwest::Url::parse_with_params(
        NOMINATIM_URL,
        &[("format", "json"), ("limit", "5"), ("q", query)],
    )
    .map_err(|e| FetchError::Transport(e.to_string()))
}

async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T, FetchError> {
    let resp = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status().as_u16()));
    }
    resp.json().await.map_err(|e| FetchError::Decode(e.to_string()))
}

/// Routing service call; `url` comes from `RouteRequest::url`. The body is
/// read on client errors too, since "no route" arrives as a 400.
pub async fn fetch_route(url: &str) -> Result<RouteResponse, FetchError> {
    let resp = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
    let status = resp.status().as_u16();
    let body = resp.text().await.map_err(|e| FetchError::Transport(e.to_string()))?;
    RouteResponse::from_service(status, &body)
}

/// POI backend call; `url` comes from `PoiQuery::url`.
pub async fn fetch_pois(url: &str) -> Result<Vec<PoiRecord>, FetchError> {
    get_json(url).await
}

pub async fn fetch_categories(base: &str) -> Result<Vec<CategoryInfo>, FetchError> {
    get_json(&format!("{}/categories", base)).await
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPoiResponse {
    pub is_poi: bool,
    #[serde(default)]
    pub poi: Option<PoiRecord>,
}

/// Ask the backend whether a geocoder hit is one of its POIs.
pub async fn check_poi(base: &str, result: &GeocodeResult) -> Result<Option<PoiRecord>, FetchError> {
    let url = build_check_poi_url(base, result.center.lat, result.center.lng, &result.name)?;
    let resp: CheckPoiResponse = get_json(url.as_str()).await?;
    Ok(if resp.is_poi { resp.poi } else { None })
}

#[derive(Debug, Clone, Serialize)]
struct LogSearchRequest<'a> {
    keyword: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub keyword: String,
    pub count: u64,
    pub last_searched: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHistoryResponse {
    pub history: Vec<SearchEntry>,
}

pub async fn log_search(base: &str, keyword: &str) -> Result<SearchEntry, FetchError> {
    let resp = reqwest::Client::new()
        .post(format!("{}/search_history", base))
        .json(&LogSearchRequest { keyword })
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status().as_u16()));
    }
    resp.json().await.map_err(|e| FetchError::Decode(e.to_string()))
}

/// Record a search, then run `on_done` whether or not the backend took it.
/// History views refresh from `on_done`.
pub async fn log_search_then(base: String, keyword: String, on_done: impl FnOnce()) {
    after_logged(log_search(&base, &keyword), on_done).await
}

async fn after_logged<T, F>(log: F, on_done: impl FnOnce())
where
    F: std::future::Future<Output = Result<T, FetchError>>,
{
    if let Err(e) = log.await {
        dioxus::logger::tracing::warn!(error = %e, "search history not recorded");
    }
    on_done();
}

pub async fn recent_searches(base: &str, limit: usize) -> Result<Vec<SearchEntry>, FetchError> {
    let resp: SearchHistoryResponse =
        get_json(&format!("{}/search_history?limit={}", base, limit)).await?;
    Ok(resp.history)
}

/// One Nominatim hit. Coordinates arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl NominatimPlace {
    /// `None` when the coordinates do not parse or are out of range.
    pub fn into_result(self) -> Option<GeocodeResult> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lng = self.lon.trim().parse::<f64>().ok()?;
        let center = LatLng::checked(lat, lng).ok()?;
        Some(GeocodeResult {
            name: self.display_name,
            center,
        })
    }
}

pub async fn geocode(query: &str) -> Result<Vec<GeocodeResult>, FetchError> {
    let url = build_geocode_url(query)?;
    let places: Vec<NominatimPlace> = get_json(url.as_str()).await?;
    Ok(places.into_iter().filter_map(NominatimPlace::into_result).collect())
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use super::*;

    #[test]
    fn test_resolve_base_prefers_configured() {
        assert_eq!(resolve_base("", "http://localhost:8080"), "http://localhost:8080");
        assert_eq!(
            resolve_base("https://api.example.com/", "http://localhost:8080"),
            "https://api.example.com"
        );
    }

    #[test]
    fn test_check_poi_url_encodes_name() {
        let url = build_check_poi_url("http://localhost:3000", 10.7578, 106.6596, "Cho Ray & Co").unwrap();
        assert_eq!(url.path(), "/check_poi");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("lat".to_string(), "10.7578".to_string()));
        assert_eq!(pairs[2], ("name".to_string(), "Cho Ray & Co".to_string()));
        assert!(url.as_str().contains("Cho+Ray+%26+Co"));
    }

    #[test]
    fn test_geocode_url() {
        let url = build_geocode_url("Ben Thanh").unwrap();
        assert_eq!(url.host_str(), Some("nominatim.openstreetmap.org"));
        assert!(url.query().unwrap().contains("q=Ben+Thanh"));
        assert!(url.query().unwrap().contains("format=json"));
    }

    #[test]
    fn test_nominatim_place_parses() {
        let json = r#"[{"display_name":"Ben Thanh Market, District 1","lat":"10.7725","lon":"106.6980","importance":0.5},
                       {"display_name":"Broken","lat":"north","lon":"106.0"}]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(json).unwrap();
        let results: Vec<GeocodeResult> = places.into_iter().filter_map(NominatimPlace::into_result).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Ben Thanh Market, District 1");
        assert!((results[0].center.lng - 106.698).abs() < 1e-9);
    }

    #[test]
    fn test_check_poi_response_deserializes() {
        let hit: CheckPoiResponse = serde_json::from_str(
            r#"{"isPoi":true,"poi":{"id":"h1","lat":10.7578,"lng":106.6596,"name":"Cho Ray Hospital","category":"hospital"}}"#,
        )
        .unwrap();
        assert!(hit.is_poi);
        assert_eq!(hit.poi.unwrap().name, "Cho Ray Hospital");

        let miss: CheckPoiResponse = serde_json::from_str(r#"{"isPoi":false}"#).unwrap();
        assert!(!miss.is_poi);
        assert!(miss.poi.is_none());
    }

    #[test]
    fn test_search_history_deserializes() {
        let json = r#"{"history":[{"keyword":"Cho Ray","count":3,"lastSearched":"2026-01-02T03:04:05+00:00"}]}"#;
        let resp: SearchHistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.history[0].count, 3);
    }

    fn poll_once(fut: impl Future<Output = ()>) -> bool {
        let mut fut = std::pin::pin!(fut);
        let mut cx = std::task::Context::from_waker(std::task::Waker::noop());
        fut.as_mut().poll(&mut cx).is_ready()
    }

    #[test]
    fn test_history_refresh_waits_for_log() {
        let done = std::cell::Cell::new(false);
        let pending = std::future::pending::<Result<(), FetchError>>();
        assert!(!poll_once(after_logged(pending, || done.set(true))));
        assert!(!done.get());

        let failed = std::future::ready(Err::<(), _>(FetchError::Status(500)));
        assert!(poll_once(after_logged(failed, || done.set(true))));
        assert!(done.get());
    }

    #[test]
    fn test_route_response_from_service() {
        let json = r#"{"code":"Ok","routes":[{"distance":1520.4,"duration":301.2,"geometry":{"type":"LineString","coordinates":[[106.7,10.776],[106.705,10.78]]}}]}"#;
        let resp: RouteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.routes.len(), 1);
        assert_eq!(resp.code.as_deref(), Some("Ok"));
        let empty = RouteResponse::from_service(400, r#"{"code":"NoRoute","routes":[]}"#).unwrap();
        assert!(empty.routes.is_empty());
    }
}
