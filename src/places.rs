//! Client for the Places text-search and details endpoints.
//!
//! The harvest pipeline only ever needs two calls: a text search that yields
//! place identifiers for a query, and a details lookup for one identifier.
//! Both return typed errors; the pipeline decides what a failure means.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, PlacesError};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
const DEFAULT_LANGUAGE: &str = "es";
const DEFAULT_PLACE_TYPE: &str = "dental_clinic";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Fields requested from the details endpoint. Anything not listed here is
/// not billed and not returned.
const DETAIL_FIELDS: &str = "name,formatted_address,international_phone_number,website,rating";

const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Connection settings for [`PlacesClient`].
#[derive(Debug, Clone)]
pub struct PlacesConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub place_type: String,
    pub timeout: Duration,
}

impl PlacesConfig {
    /// Defaults for everything except the key.
    pub fn with_key(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            place_type: DEFAULT_PLACE_TYPE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `PLACES_API_KEY` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::with_key(crate::config::required_env("PLACES_API_KEY")?))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceSummary>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceSummary {
    place_id: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Details for a single place. Every field is optional; listings are often
/// missing a phone number or website.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceDetails {
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub international_phone_number: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f32>,
}

/// Thin typed wrapper over the two Places endpoints.
pub struct PlacesClient {
    http: reqwest::Client,
    config: PlacesConfig,
}

impl PlacesClient {
    pub fn new(config: PlacesConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Runs a text search and returns the matching place identifiers.
    ///
    /// `ZERO_RESULTS` is a normal answer and comes back as an empty vec; any
    /// other non-OK status is an error carrying the status and the API's
    /// message, so the caller can log it.
    pub async fn text_search(&self, query: &str) -> Result<Vec<String>, PlacesError> {
        let response: SearchResponse = self
            .http
            .get(format!("{}/textsearch/json", self.config.base_url))
            .query(&[
                ("query", query),
                ("key", &self.config.api_key),
                ("type", &self.config.place_type),
                ("language", &self.config.language),
            ])
            .send()
            .await?
            .json()
            .await?;

        match response.status.as_str() {
            STATUS_OK => Ok(response
                .results
                .into_iter()
                .map(|place| place.place_id)
                .collect()),
            STATUS_ZERO_RESULTS => Ok(Vec::new()),
            status => Err(PlacesError::Status {
                status: status.to_string(),
                message: response.error_message.unwrap_or_default(),
            }),
        }
    }

    /// Fetches the detail fields for one place identifier.
    pub async fn details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        let response: DetailsResponse = self
            .http
            .get(format!("{}/details/json", self.config.base_url))
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", &self.config.api_key),
                ("language", &self.config.language),
            ])
            .send()
            .await?
            .json()
            .await?;

        match (response.status.as_str(), response.result) {
            (STATUS_OK, Some(details)) => Ok(details),
            (status, _) => Err(PlacesError::Status {
                status: status.to_string(),
                message: response.error_message.unwrap_or_default(),
            }),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
