//! The harvest pipeline: walk a postcode grid, search for clinics, fetch
//! details, scrape websites for addresses, and persist as we go.
//!
//! Remote failures never abort the walk; a search or details failure costs
//! at most the postcode or place it happened on. Only local persistence
//! errors are fatal, because continuing would silently drop data.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::pacing::{FixedDelay, Pacer};
use crate::places::{PlacesClient, PlacesConfig};
use crate::scrape::{ScrapeOutcome, SiteScraper};
use crate::store::{ClinicRecord, CsvStore, export_workbook};

/// Settings for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// First postcode of the grid.
    pub postcode_start: u32,
    /// Last postcode of the grid, inclusive.
    pub postcode_end: u32,
    /// What to search for, e.g. "clínica dental".
    pub search_term: String,
    /// City name appended to every query.
    pub city: String,
    pub csv_path: PathBuf,
    pub xlsx_path: PathBuf,
    /// Pause after each place's detail fetch.
    pub detail_pause: Duration,
    /// Pause after each postcode actually searched.
    pub grid_pause: Duration,
    /// Per-request timeout for clinic website fetches.
    pub scrape_timeout: Duration,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            postcode_start: 28001,
            postcode_end: 28080,
            search_term: "clínica dental".to_string(),
            city: "Madrid".to_string(),
            csv_path: PathBuf::from("clinics.csv"),
            xlsx_path: PathBuf::from("clinics.xlsx"),
            detail_pause: Duration::from_millis(100),
            grid_pause: Duration::from_secs(1),
            scrape_timeout: Duration::from_secs(10),
        }
    }
}

/// What one run did, for the end-of-run summary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Postcodes actually searched this run.
    pub searched: usize,
    /// Postcodes skipped because a previous run already covered them.
    pub skipped: usize,
    /// Searched postcodes that yielded no clinics.
    pub no_results: usize,
    /// Records appended to the CSV.
    pub saved: usize,
    /// Clinic websites that could not be fetched.
    pub scrape_failures: usize,
}

/// Sequential walk over the postcode grid.
pub struct HarvestPipeline {
    config: HarvestConfig,
    places: PlacesClient,
    scraper: SiteScraper,
    store: CsvStore,
    detail_pacer: Box<dyn Pacer>,
    grid_pacer: Box<dyn Pacer>,
}

impl HarvestPipeline {
    pub fn new(config: HarvestConfig, places: PlacesConfig) -> Result<Self, Error> {
        let places = PlacesClient::new(places)?;
        let scraper = SiteScraper::new(config.scrape_timeout)?;
        let store = CsvStore::new(config.csv_path.clone());
        let detail_pacer = Box::new(FixedDelay::new(config.detail_pause));
        let grid_pacer = Box::new(FixedDelay::new(config.grid_pause));
        Ok(Self {
            config,
            places,
            scraper,
            store,
            detail_pacer,
            grid_pacer,
        })
    }

    /// Replaces both pacing policies.
    pub fn with_pacing(mut self, detail: Box<dyn Pacer>, grid: Box<dyn Pacer>) -> Self {
        self.detail_pacer = detail;
        self.grid_pacer = grid;
        self
    }

    pub async fn run(&self) -> Result<HarvestSummary, Error> {
        let processed = self.store.processed_postcodes();
        if !processed.is_empty() {
            tracing::info!(
                postcodes = processed.len(),
                "Found existing data, resuming where the last run stopped"
            );
        }
        if self.config.postcode_start > self.config.postcode_end {
            tracing::warn!("Postcode range is empty, nothing to search");
        }

        let mut summary = HarvestSummary::default();
        for postcode in self.config.postcode_start..=self.config.postcode_end {
            if processed.contains(&postcode) {
                tracing::info!(postcode, "Already searched, skipping");
                summary.skipped += 1;
                continue;
            }
            let query = search_query(&self.config.search_term, &self.config.city, postcode);
            tracing::info!(postcode, query = %query, "Searching");
            summary.searched += 1;

            let place_ids = match self.places.text_search(&query).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(postcode, error = %e, "Search failed");
                    Vec::new()
                }
            };
            if place_ids.is_empty() {
                tracing::info!(postcode, "No clinics found for this postcode");
                summary.no_results += 1;
                self.grid_pacer.pause().await;
                continue;
            }

            tracing::info!(postcode, places = place_ids.len(), "Fetching details");
            let mut batch = Vec::with_capacity(place_ids.len());
            for place_id in &place_ids {
                match self.places.details(place_id).await {
                    Ok(details) => {
                        let website = details.website.clone().unwrap_or_default();
                        let outcome = self.scraper.scrape(&website).await;
                        if let ScrapeOutcome::FetchFailed(reason) = &outcome {
                            tracing::warn!(url = %website, reason = %reason, "Website fetch failed");
                            summary.scrape_failures += 1;
                        }
                        let record = ClinicRecord::new(details, outcome.into_emails(), postcode);
                        tracing::info!(
                            name = %record.name,
                            phone = %record.phone,
                            email = %record.email,
                            "Clinic recorded"
                        );
                        batch.push(record);
                    }
                    Err(e) => {
                        tracing::warn!(place_id = %place_id, error = %e, "Details fetch failed");
                    }
                }
                self.detail_pacer.pause().await;
            }

            if !batch.is_empty() {
                self.store.append(&batch)?;
                tracing::info!(postcode, saved = batch.len(), "Batch appended");
                summary.saved += batch.len();
            }
            self.grid_pacer.pause().await;
        }

        self.export()?;
        Ok(summary)
    }

    /// Reloads everything harvested so far and writes the workbook.
    fn export(&self) -> Result<(), Error> {
        if !self.store.exists() {
            tracing::info!("No data was collected, skipping workbook export");
            return Ok(());
        }
        let records = self.store.load_all()?;
        export_workbook(&records, &self.config.xlsx_path)?;
        tracing::info!(
            path = %self.config.xlsx_path.display(),
            rows = records.len(),
            "Workbook written"
        );
        Ok(())
    }
}

fn search_query(term: &str, city: &str, postcode: u32) -> String {
    format!("{term} {city} {postcode}")
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_combine_term_city_and_postcode() {
        assert_eq!(
            search_query("clínica dental", "Madrid", 28004),
            "clínica dental Madrid 28004"
        );
    }

    #[test]
    fn default_grid_covers_the_madrid_postcodes() {
        let config = HarvestConfig::default();
        assert_eq!(config.postcode_start, 28001);
        assert_eq!(config.postcode_end, 28080);
        assert_eq!(config.grid_pause, Duration::from_secs(1));
        assert_eq!(config.detail_pause, Duration::from_millis(100));
    }
}
