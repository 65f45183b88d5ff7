//! clinic-scout — postcode-grid clinic harvesting and e-mail outreach.

pub mod config;
pub mod error;
pub mod harvest;
pub mod outreach;
pub mod pacing;
pub mod places;
pub mod scrape;
pub mod store;
