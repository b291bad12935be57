use std::sync::Arc;

use async_graphql::{Context, InputObject, Object, SimpleObject, ID};
use wayfinder_shared::models::{Bounds, LatLng, PoiRecord};

use crate::assets::Assets;
use crate::storage::{SearchEntry, Storage};

// GraphQL output types

#[derive(SimpleObject)]
pub struct GqlCategory {
    pub slug: String,
    pub display_name: String,
    pub icon: String,
}

#[derive(SimpleObject)]
pub struct GqlPoi {
    pub id: ID,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub img: Option<String>,
    pub category: Option<String>,
}

impl From<PoiRecord> for GqlPoi {
    fn from(p: PoiRecord) -> Self {
        GqlPoi {
            id: ID(p.id.unwrap_or_default()),
            lat: p.lat,
            lng: p.lng,
            name: p.name,
            phone_number: p.phone_number,
            website: p.website,
            location: p.location,
            img: p.img,
            category: p.category,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlPoiMatch {
    pub is_poi: bool,
    pub poi: Option<GqlPoi>,
}

#[derive(SimpleObject)]
pub struct GqlSearchEntry {
    pub keyword: String,
    pub count: u64,
    pub last_searched: String,
}

impl From<SearchEntry> for GqlSearchEntry {
    fn from(e: SearchEntry) -> Self {
        GqlSearchEntry {
            keyword: e.keyword,
            count: e.count,
            last_searched: e.last_searched,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlCategoryCount {
    pub category: String,
    pub display_name: String,
    pub count: u64,
}

#[derive(SimpleObject)]
pub struct GqlStats {
    pub total_pois: u64,
    pub db_size_bytes: u64,
    pub total_searches: u64,
    pub pois_by_category: Vec<GqlCategoryCount>,
    pub top_searches: Vec<GqlSearchEntry>,
}

// Input types

#[derive(InputObject)]
pub struct BoundsInput {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

#[derive(InputObject)]
pub struct CreatePoiInput {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub category: String,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub img: Option<String>,
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn categories(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlCategory>> {
        let assets = ctx.data::<Arc<Assets>>()?;
        Ok(assets
            .categories
            .iter()
            .map(|c| GqlCategory {
                slug: c.slug.clone(),
                display_name: c.display_name.clone(),
                icon: c.icon.clone(),
            })
            .collect())
    }

    async fn pois(
        &self,
        ctx: &Context<'_>,
        category: String,
        bounds: BoundsInput,
    ) -> async_graphql::Result<Vec<GqlPoi>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let bounds = Bounds {
            south: bounds.south,
            west: bounds.west,
            north: bounds.north,
            east: bounds.east,
        };
        let pois = storage
            .query_pois(&category, &bounds)
            .map_err(async_graphql::Error::new)?;
        Ok(pois.into_iter().map(GqlPoi::from).collect())
    }

    async fn poi(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<GqlPoi>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let poi = storage.get_poi(&id).map_err(async_graphql::Error::new)?;
        Ok(poi.map(GqlPoi::from))
    }

    async fn check_poi(
        &self,
        ctx: &Context<'_>,
        lat: f64,
        lng: f64,
        name: String,
    ) -> async_graphql::Result<GqlPoiMatch> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let found = storage
            .check_poi(lat, lng, &name)
            .map_err(async_graphql::Error::new)?;
        Ok(GqlPoiMatch {
            is_poi: found.is_some(),
            poi: found.map(GqlPoi::from),
        })
    }

    async fn recent_searches(
        &self,
        ctx: &Context<'_>,
        limit: Option<u32>,
    ) -> async_graphql::Result<Vec<GqlSearchEntry>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let entries = storage
            .recent_searches(limit.unwrap_or(10) as usize)
            .map_err(async_graphql::Error::new)?;
        Ok(entries.into_iter().map(GqlSearchEntry::from).collect())
    }

    async fn stats(&self, ctx: &Context<'_>) -> async_graphql::Result<GqlStats> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let assets = ctx.data::<Arc<Assets>>()?;
        let total_pois = storage.count_pois().map_err(async_graphql::Error::new)?;
        let db_size_bytes = storage.db_size_bytes().map_err(async_graphql::Error::new)?;
        let total_searches = storage.total_searches().map_err(async_graphql::Error::new)?;

        let pois_by_category = storage
            .count_by_category()
            .map_err(async_graphql::Error::new)?
            .into_iter()
            .map(|(category, count)| {
                let display_name = assets
                    .find_category(&category)
                    .map(|c| c.display_name.clone())
                    .unwrap_or_else(|| category.clone());
                GqlCategoryCount {
                    category,
                    display_name,
                    count,
                }
            })
            .collect();

        let top_searches = storage
            .top_searches(10)
            .map_err(async_graphql::Error::new)?
            .into_iter()
            .map(GqlSearchEntry::from)
            .collect();

        Ok(GqlStats {
            total_pois,
            db_size_bytes,
            total_searches,
            pois_by_category,
            top_searches,
        })
    }
}

// Mutation root

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_poi(&self, ctx: &Context<'_>, input: CreatePoiInput) -> async_graphql::Result<GqlPoi> {
        let assets = ctx.data::<Arc<Assets>>()?;
        if assets.find_category(&input.category).is_none() {
            return Err(async_graphql::Error::new(format!(
                "Unknown category: {}",
                input.category
            )));
        }
        LatLng::checked(input.lat, input.lng).map_err(|e| async_graphql::Error::new(e.to_string()))?;

        let storage = ctx.data::<Arc<Storage>>()?;
        let record = PoiRecord {
            id: None,
            lat: input.lat,
            lng: input.lng,
            name: input.name,
            phone_number: input.phone_number,
            website: input.website,
            location: input.location,
            img: input.img,
            category: Some(input.category),
        };
        let saved = storage.save_poi(&record).map_err(async_graphql::Error::new)?;
        tracing::info!(id = ?saved.id, "POI created");
        Ok(GqlPoi::from(saved))
    }

    async fn delete_poi(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let storage = ctx.data::<Arc<Storage>>()?;
        storage.delete_poi(&id).map_err(async_graphql::Error::new)
    }

    async fn log_search(&self, ctx: &Context<'_>, keyword: String) -> async_graphql::Result<GqlSearchEntry> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let entry = storage.log_search(&keyword).map_err(async_graphql::Error::new)?;
        Ok(GqlSearchEntry::from(entry))
    }
}

pub type Schema = async_graphql::Schema<QueryRoot, MutationRoot, async_graphql::EmptySubscription>;

pub fn build_schema(assets: Arc<Assets>, storage: Arc<Storage>) -> Schema {
    async_graphql::Schema::build(QueryRoot, MutationRoot, async_graphql::EmptySubscription)
        .data(assets)
        .data(storage)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_shared::models::CategoryInfo;

    fn test_schema() -> (tempfile::TempDir, Schema) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("test.redb")).unwrap();
        let assets = Arc::new(Assets {
            categories: vec![CategoryInfo {
                slug: "hospital".into(),
                display_name: "Hospital".into(),
                icon: String::new(),
            }],
            seed_pois: Vec::new(),
        });
        (dir, build_schema(assets, storage))
    }

    #[tokio::test]
    async fn test_create_then_query_in_bounds() {
        let (_dir, schema) = test_schema();
        let resp = schema
            .execute(
                r#"mutation { createPoi(input: { name: "Cho Ray", lat: 10.7578, lng: 106.6596, category: "hospital" }) { id name } }"#,
            )
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);

        let resp = schema
            .execute(
                r#"{ pois(category: "hospital", bounds: { south: 10.7, west: 106.6, north: 10.8, east: 106.7 }) { name } }"#,
            )
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let json = resp.data.into_json().unwrap();
        assert_eq!(json["pois"][0]["name"], "Cho Ray");
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category_and_bad_coordinate() {
        let (_dir, schema) = test_schema();
        let resp = schema
            .execute(r#"mutation { createPoi(input: { name: "Zoo", lat: 10.7, lng: 106.6, category: "zoo" }) { id } }"#)
            .await;
        assert!(resp.errors[0].message.contains("Unknown category"));

        let resp = schema
            .execute(r#"mutation { createPoi(input: { name: "X", lat: 95.0, lng: 106.6, category: "hospital" }) { id } }"#)
            .await;
        assert!(!resp.errors.is_empty());
    }

    #[tokio::test]
    async fn test_check_poi_and_stats() {
        let (_dir, schema) = test_schema();
        schema
            .execute(
                r#"mutation { createPoi(input: { name: "Cho Ray", lat: 10.7578, lng: 106.6596, category: "hospital" }) { id } }"#,
            )
            .await;
        schema.execute(r#"mutation { logSearch(keyword: "Cho Ray") { count } }"#).await;

        let resp = schema
            .execute(r#"{ checkPoi(lat: 10.7579, lng: 106.6597, name: "cho ray") { isPoi poi { name } } }"#)
            .await;
        let json = resp.data.into_json().unwrap();
        assert_eq!(json["checkPoi"]["isPoi"], true);

        let resp = schema
            .execute(r#"{ stats { totalPois totalSearches poisByCategory { displayName count } } }"#)
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let json = resp.data.into_json().unwrap();
        assert_eq!(json["stats"]["totalPois"], 1);
        assert_eq!(json["stats"]["totalSearches"], 1);
        assert_eq!(json["stats"]["poisByCategory"][0]["displayName"], "Hospital");
    }
}
