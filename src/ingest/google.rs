// src/ingest/google.rs
//! Google Places client for review ingestion: a text-search call to resolve a
//! place id, then one Place Details call for the reviews. At most those two
//! sequential requests per invocation, no retry, no backoff.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{EngineError, Result};

pub const ENV_GOOGLE_MAPS_API_KEY: &str = "GOOGLE_MAPS_API_KEY";

const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleReview {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub text: Option<String>,
    /// Unix seconds of the review.
    #[serde(default)]
    pub time: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub reviews: Vec<GoogleReview>,
}

/// Seam for the ingestion pipeline; the live impl talks to Google, tests plug
/// in a canned one.
#[async_trait]
pub trait PlaceSource: Send + Sync {
    async fn resolve_place_id(&self, query: &str) -> Result<String>;
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails>;
}

pub struct GooglePlaces {
    api_key: String,
    http: reqwest::Client,
}

impl GooglePlaces {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let key = std::env::var(ENV_GOOGLE_MAPS_API_KEY).map_err(|_| {
            EngineError::Validation(format!("{ENV_GOOGLE_MAPS_API_KEY} is not set"))
        })?;
        Ok(Self::new(key))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| EngineError::Upstream(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EngineError::Upstream(format!(
                "request failed ({status}) for {url}"
            )));
        }
        resp.json::<T>()
            .await
            .map_err(|e| EngineError::Upstream(format!("unreadable response from {url}: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    results: Vec<TextSearchResult>,
}

#[derive(Debug, Deserialize)]
struct TextSearchResult {
    #[serde(default)]
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    result: Option<PlaceDetails>,
}

#[async_trait]
impl PlaceSource for GooglePlaces {
    async fn resolve_place_id(&self, query: &str) -> Result<String> {
        let payload: TextSearchResponse =
            self.get_json(TEXT_SEARCH_URL, &[("query", query)]).await?;
        payload
            .results
            .into_iter()
            .find_map(|r| r.place_id)
            .ok_or_else(|| EngineError::Upstream(format!("no place_id found for query: {query}")))
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails> {
        let fields = "name,url,reviews,rating,user_ratings_total";
        let payload: DetailsResponse = self
            .get_json(DETAILS_URL, &[("place_id", place_id), ("fields", fields)])
            .await?;
        payload.result.ok_or_else(|| {
            EngineError::Upstream(format!("no place details for place_id: {place_id}"))
        })
    }
}
