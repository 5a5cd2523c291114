//! Shared domain types and defaults.

mod types;

pub use types::*;

/// Default source for the daily dataset snapshot.
pub const DEFAULT_DATA_URL: &str = "https://covid.ourworldindata.org/data/owid-covid-data.csv";

/// Default directory for dated snapshot files and the download log.
pub const DEFAULT_DATA_DIR: &str = "covid_data";

/// Default selection when the user provides no countries.
pub const DEFAULT_COUNTRY: &str = "United States";
