use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::{BoundingBox, CandidateProfile, PropertyListing};

/// Errors that can occur when talking to the platform directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    Api(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Client for the platform backend that owns user profiles and property
/// listings
///
/// The matching engine never falls back to stale or partial directory
/// data; any failure here propagates so the candidate fetch fails closed.
pub struct DirectoryClient {
    base_url: String,
    api_key: String,
    client: Client,
    collections: DirectoryCollections,
}

/// Collection paths on the directory API
#[derive(Debug, Clone)]
pub struct DirectoryCollections {
    pub profiles: String,
    pub properties: String,
}

impl DirectoryClient {
    pub fn new(base_url: String, api_key: String, collections: DirectoryCollections) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
            collections,
        }
    }

    /// Fetch a single user profile
    pub async fn get_profile(&self, user_id: &str) -> Result<CandidateProfile, DirectoryError> {
        let url = format!(
            "{}/collections/{}/documents/{}",
            self.base_url.trim_end_matches('/'),
            self.collections.profiles,
            urlencoding::encode(user_id),
        );

        tracing::debug!("Fetching profile for user: {}", user_id);
        let doc = self.fetch_document(&url, user_id).await?;

        serde_json::from_value(doc)
            .map_err(|e| DirectoryError::InvalidResponse(format!("Failed to parse profile: {}", e)))
    }

    /// Fetch a single property listing
    pub async fn get_property(
        &self,
        property_id: &str,
    ) -> Result<PropertyListing, DirectoryError> {
        let url = format!(
            "{}/collections/{}/documents/{}",
            self.base_url.trim_end_matches('/'),
            self.collections.properties,
            urlencoding::encode(property_id),
        );

        tracing::debug!("Fetching property: {}", property_id);
        let doc = self.fetch_document(&url, property_id).await?;

        serde_json::from_value(doc).map_err(|e| {
            DirectoryError::InvalidResponse(format!("Failed to parse property: {}", e))
        })
    }

    /// Query active candidate profiles inside a bounding box
    ///
    /// The box is a coarse pre-filter; exact distance and the rest of the
    /// hard filters run in the selection pipeline.
    pub async fn query_profiles(
        &self,
        requester_id: &str,
        bbox: &BoundingBox,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<CandidateProfile>, DirectoryError> {
        let mut queries = vec![
            "equal(\"isActive\", true)".to_string(),
            format!("notEqual(\"userId\", \"{}\")", requester_id),
            format!("greaterThan(\"latitude\", {})", bbox.min_lat),
            format!("lessThan(\"latitude\", {})", bbox.max_lat),
            format!("greaterThan(\"longitude\", {})", bbox.min_lon),
            format!("lessThan(\"longitude\", {})", bbox.max_lon),
            format!("limit({})", limit),
        ];
        for id in exclude_ids {
            queries.push(format!("notEqual(\"userId\", \"{}\")", id));
        }

        let queries_json = serde_json::to_string(&queries)
            .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;
        let url = format!(
            "{}/collections/{}/documents?query={}",
            self.base_url.trim_end_matches('/'),
            self.collections.profiles,
            urlencoding::encode(&queries_json),
        );

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DirectoryError::Api(format!(
                "Failed to query profiles: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| DirectoryError::InvalidResponse("Missing documents array".into()))?;

        let profiles: Vec<CandidateProfile> = documents
            .iter()
            .filter_map(|doc| serde_json::from_value(doc.clone()).ok())
            .filter(|p: &CandidateProfile| p.user_id != requester_id)
            .collect();

        tracing::debug!("Queried {} candidate profiles", profiles.len());
        Ok(profiles)
    }

    /// Query active listings inside a bounding box
    pub async fn query_properties(
        &self,
        bbox: &BoundingBox,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<PropertyListing>, DirectoryError> {
        let mut queries = vec![
            "equal(\"isActive\", true)".to_string(),
            format!("greaterThan(\"latitude\", {})", bbox.min_lat),
            format!("lessThan(\"latitude\", {})", bbox.max_lat),
            format!("greaterThan(\"longitude\", {})", bbox.min_lon),
            format!("lessThan(\"longitude\", {})", bbox.max_lon),
            format!("limit({})", limit),
        ];
        for id in exclude_ids {
            queries.push(format!("notEqual(\"propertyId\", \"{}\")", id));
        }

        let queries_json = serde_json::to_string(&queries)
            .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;
        let url = format!(
            "{}/collections/{}/documents?query={}",
            self.base_url.trim_end_matches('/'),
            self.collections.properties,
            urlencoding::encode(&queries_json),
        );

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DirectoryError::Api(format!(
                "Failed to query properties: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| DirectoryError::InvalidResponse("Missing documents array".into()))?;

        let listings = documents
            .iter()
            .filter_map(|doc| serde_json::from_value(doc.clone()).ok())
            .collect();

        Ok(listings)
    }

    async fn fetch_document(&self, url: &str, id: &str) -> Result<Value, DirectoryError> {
        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound(id.to_string()));
        }
        if !response.status().is_success() {
            return Err(DirectoryError::Api(format!(
                "Directory returned {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        Ok(json.get("data").cloned().unwrap_or(json))
    }
}
