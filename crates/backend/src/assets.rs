use std::path::Path;
use wayfinder_shared::models::{CategoryInfo, PoiRecord};

pub struct Assets {
    pub categories: Vec<CategoryInfo>,
    /// Seed data for an empty POI table.
    pub seed_pois: Vec<PoiRecord>,
}

impl Assets {
    pub fn load(assets_dir: &Path) -> Result<Self, String> {
        let categories_path = assets_dir.join("categories.json");
        let pois_path = assets_dir.join("pois.json");

        let categories_data = std::fs::read_to_string(&categories_path)
            .map_err(|e| format!("Failed to read {}: {}", categories_path.display(), e))?;
        let categories: Vec<CategoryInfo> = serde_json::from_str(&categories_data)
            .map_err(|e| format!("Failed to parse categories.json: {}", e))?;

        // The POI seed is optional; a deployment may fill the table by API.
        let seed_pois: Vec<PoiRecord> = match std::fs::read_to_string(&pois_path) {
            Ok(data) => {
                serde_json::from_str(&data).map_err(|e| format!("Failed to parse pois.json: {}", e))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(format!("Failed to read {}: {}", pois_path.display(), e)),
        };

        let unknown = seed_pois
            .iter()
            .filter(|p| match p.category.as_deref() {
                Some(c) => !categories.iter().any(|cat| cat.slug == c),
                None => true,
            })
            .count();
        if unknown > 0 {
            tracing::warn!(unknown, "Seed POIs without a known category");
        }

        tracing::info!(
            categories = categories.len(),
            seed_pois = seed_pois.len(),
            "Loaded POI assets"
        );

        Ok(Assets {
            categories,
            seed_pois,
        })
    }

    pub fn find_category(&self, slug: &str) -> Option<&CategoryInfo> {
        self.categories.iter().find(|c| c.slug == slug)
    }
}
