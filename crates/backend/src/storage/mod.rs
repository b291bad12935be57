use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wayfinder_shared::models::{Bounds, PoiRecord};

const POIS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("pois");
const SEARCH_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("search_history");

/// Half-width (degrees) of the box searched around a geocoder result.
pub const MATCH_DELTA: f64 = 0.0005;
/// Squared-degree distance under which a candidate counts as the same place.
const SAME_PLACE_SQ: f64 = 0.000_000_5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub keyword: String,
    pub count: u64,
    /// RFC 3339 timestamp of the latest search.
    pub last_searched: String,
}

pub struct Storage {
    db: Database,
    path: PathBuf,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Arc<Self>, String> {
        let db = Database::create(path)
            .map_err(|e| format!("Failed to open database at {}: {}", path.display(), e))?;

        // Ensure tables exist
        let write_txn = db.begin_write().map_err(|e| e.to_string())?;
        {
            write_txn.open_table(POIS_TABLE).map_err(|e| e.to_string())?;
            write_txn.open_table(SEARCH_TABLE).map_err(|e| e.to_string())?;
        }
        write_txn.commit().map_err(|e| e.to_string())?;

        Ok(Arc::new(Storage {
            db,
            path: path.to_path_buf(),
        }))
    }

    /// Insert or overwrite a POI. Records without an id get a fresh one.
    pub fn save_poi(&self, poi: &PoiRecord) -> Result<PoiRecord, String> {
        let mut poi = poi.clone();
        let id = poi
            .id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone();
        let json = serde_json::to_vec(&poi).map_err(|e| e.to_string())?;

        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        {
            let mut table = write_txn.open_table(POIS_TABLE).map_err(|e| e.to_string())?;
            table
                .insert(id.as_str(), json.as_slice())
                .map_err(|e| e.to_string())?;
        }
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(poi)
    }

    /// Load a batch of POIs when the table is empty. Returns how many were
    /// written.
    pub fn seed_if_empty(&self, pois: &[PoiRecord]) -> Result<usize, String> {
        if self.count_pois()? > 0 {
            return Ok(0);
        }
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        {
            let mut table = write_txn.open_table(POIS_TABLE).map_err(|e| e.to_string())?;
            for (i, poi) in pois.iter().enumerate() {
                let mut poi = poi.clone();
                let fallback = format!("{}-{}", poi.category.as_deref().unwrap_or("poi"), i);
                let id = poi.id.get_or_insert(fallback).clone();
                let json = serde_json::to_vec(&poi).map_err(|e| e.to_string())?;
                table
                    .insert(id.as_str(), json.as_slice())
                    .map_err(|e| e.to_string())?;
            }
        }
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(pois.len())
    }

    pub fn get_poi(&self, id: &str) -> Result<Option<PoiRecord>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn.open_table(POIS_TABLE).map_err(|e| e.to_string())?;

        match table.get(id).map_err(|e| e.to_string())? {
            Some(value) => {
                let poi: PoiRecord = serde_json::from_slice(value.value()).map_err(|e| e.to_string())?;
                Ok(Some(poi))
            }
            None => Ok(None),
        }
    }

    pub fn delete_poi(&self, id: &str) -> Result<bool, String> {
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        let removed = {
            let mut table = write_txn.open_table(POIS_TABLE).map_err(|e| e.to_string())?;
            let result = table.remove(id).map_err(|e| e.to_string())?;
            result.is_some()
        };
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(removed)
    }

    /// Every stored POI matching `keep`, in id order.
    fn scan(&self, keep: impl Fn(&PoiRecord) -> bool) -> Result<Vec<PoiRecord>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn.open_table(POIS_TABLE).map_err(|e| e.to_string())?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(|e| e.to_string())? {
            let (_, value) = entry.map_err(|e| e.to_string())?;
            let poi: PoiRecord = serde_json::from_slice(value.value()).map_err(|e| e.to_string())?;
            if keep(&poi) {
                out.push(poi);
            }
        }
        Ok(out)
    }

    /// POIs of one category inside a box (edges inclusive).
    pub fn query_pois(&self, category: &str, bounds: &Bounds) -> Result<Vec<PoiRecord>, String> {
        self.scan(|p| {
            p.category.as_deref() == Some(category)
                && p.lat >= bounds.south
                && p.lat <= bounds.north
                && p.lng >= bounds.west
                && p.lng <= bounds.east
        })
    }

    /// Find the stored POI a geocoder result most likely refers to.
    pub fn check_poi(&self, lat: f64, lng: f64, name: &str) -> Result<Option<PoiRecord>, String> {
        let candidates = self.scan(|p| {
            (p.lat - lat).abs() <= MATCH_DELTA && (p.lng - lng).abs() <= MATCH_DELTA
        })?;
        Ok(best_match(candidates, lat, lng, name))
    }

    pub fn count_pois(&self) -> Result<u64, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn.open_table(POIS_TABLE).map_err(|e| e.to_string())?;
        table.len().map_err(|e| e.to_string())
    }

    /// `(category, count)` pairs sorted by category.
    pub fn count_by_category(&self) -> Result<Vec<(String, u64)>, String> {
        let mut counts = std::collections::BTreeMap::new();
        for poi in self.scan(|_| true)? {
            *counts
                .entry(poi.category.unwrap_or_else(|| "uncategorized".to_string()))
                .or_insert(0u64) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    /// Record a search keyword. Keywords are compared trimmed and
    /// case-insensitively; the first spelling seen is kept for display.
    pub fn log_search(&self, keyword: &str) -> Result<SearchEntry, String> {
        let display = keyword.trim();
        if display.is_empty() {
            return Err("Keyword must not be empty".to_string());
        }
        let key = display.to_lowercase();
        let now = chrono::Utc::now().to_rfc3339();

        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        let entry = {
            let mut table = write_txn.open_table(SEARCH_TABLE).map_err(|e| e.to_string())?;
            let existing: Option<SearchEntry> = match table.get(key.as_str()).map_err(|e| e.to_string())? {
                Some(v) => Some(serde_json::from_slice(v.value()).map_err(|e| e.to_string())?),
                None => None,
            };
            let entry = match existing {
                Some(prev) => SearchEntry {
                    keyword: prev.keyword,
                    count: prev.count + 1,
                    last_searched: now,
                },
                None => SearchEntry {
                    keyword: display.to_string(),
                    count: 1,
                    last_searched: now,
                },
            };
            let json = serde_json::to_vec(&entry).map_err(|e| e.to_string())?;
            table
                .insert(key.as_str(), json.as_slice())
                .map_err(|e| e.to_string())?;
            entry
        };
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(entry)
    }

    /// Most recently searched keywords first.
    pub fn recent_searches(&self, limit: usize) -> Result<Vec<SearchEntry>, String> {
        let mut entries = self.search_entries()?;
        entries.sort_by(|a, b| b.last_searched.cmp(&a.last_searched));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Most frequent keywords first.
    pub fn top_searches(&self, limit: usize) -> Result<Vec<SearchEntry>, String> {
        let mut entries = self.search_entries()?;
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
        entries.truncate(limit);
        Ok(entries)
    }

    fn search_entries(&self) -> Result<Vec<SearchEntry>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn.open_table(SEARCH_TABLE).map_err(|e| e.to_string())?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(|e| e.to_string())? {
            let (_, value) = entry.map_err(|e| e.to_string())?;
            out.push(serde_json::from_slice(value.value()).map_err(|e| e.to_string())?);
        }
        Ok(out)
    }

    pub fn total_searches(&self) -> Result<u64, String> {
        Ok(self.search_entries()?.iter().map(|e| e.count).sum())
    }

    pub fn db_size_bytes(&self) -> Result<u64, String> {
        std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| e.to_string())
    }
}

/// Pick the candidate a search result refers to: the first one practically
/// on top of the point or whose name contains (or is contained in) the
/// searched name, otherwise the nearest.
pub fn best_match(candidates: Vec<PoiRecord>, lat: f64, lng: f64, name: &str) -> Option<PoiRecord> {
    let wanted = name.to_lowercase();
    let mut nearest: Option<(f64, PoiRecord)> = None;
    for poi in candidates {
        let dist = (poi.lat - lat).powi(2) + (poi.lng - lng).powi(2);
        if dist < SAME_PLACE_SQ {
            return Some(poi);
        }
        let have = poi.name.to_lowercase();
        if have.contains(&wanted) || wanted.contains(&have) {
            return Some(poi);
        }
        if nearest.as_ref().map_or(true, |(d, _)| dist < *d) {
            nearest = Some((dist, poi));
        }
    }
    nearest.map(|(_, poi)| poi)
}
