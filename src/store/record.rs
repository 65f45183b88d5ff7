//! The harvested row type and its CSV column mapping.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::places::PlaceDetails;

/// Placeholder stored when a listing lacks a text field.
pub const NOT_FOUND: &str = "Not found";

/// Placeholder stored when a listing has no rating.
pub const RATING_SENTINEL: &str = "N/A";

/// Column order of the CSV and the exported workbook.
pub const CSV_HEADERS: [&str; 7] = [
    "Name",
    "Address",
    "Phone Number",
    "Website",
    "Rating",
    "Email",
    "Searched Postcode",
];

/// One clinic as persisted to the CSV.
///
/// Text fields are never empty: anything the listing lacked holds
/// [`NOT_FOUND`]. The rating stays numeric in memory and round-trips
/// through the [`RATING_SENTINEL`] cell on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Phone Number")]
    pub phone: String,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Rating", with = "rating_cell")]
    pub rating: Option<f32>,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Searched Postcode")]
    pub postcode: u32,
}

impl ClinicRecord {
    /// Builds a record from fetched details plus the scraped addresses,
    /// tagged with the postcode whose search surfaced it.
    pub fn new(details: PlaceDetails, emails: BTreeSet<String>, postcode: u32) -> Self {
        let email = if emails.is_empty() {
            NOT_FOUND.to_string()
        } else {
            emails.into_iter().collect::<Vec<_>>().join(", ")
        };
        Self {
            name: details.name.unwrap_or_else(|| NOT_FOUND.to_string()),
            address: details
                .formatted_address
                .unwrap_or_else(|| NOT_FOUND.to_string()),
            phone: details
                .international_phone_number
                .unwrap_or_else(|| NOT_FOUND.to_string()),
            website: match details.website {
                Some(url) if !url.is_empty() => url,
                _ => NOT_FOUND.to_string(),
            },
            rating: details.rating,
            email,
            postcode,
        }
    }
}

/// Serde adapter for the rating column: `Some(4.5)` is written as `4.5`,
/// `None` as the sentinel; reading parses numbers and maps everything else
/// back to `None`.
mod rating_cell {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(rating: &Option<f32>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match rating {
            Some(value) => serializer.serialize_f32(*value),
            None => serializer.serialize_str(super::RATING_SENTINEL),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.trim().parse().ok())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
