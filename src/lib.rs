extern crate tl;

pub mod dom;
pub mod dump;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod icon;
pub mod infobox;
pub mod labels;
pub mod links;
pub mod output;
pub mod scrape;
pub mod settings;
pub mod util;

pub use crate::error::ScrapeError;
pub use crate::extract::{FieldValue, UnitRecord};
pub use crate::labels::{LabelTable, ValueKind};
pub use crate::scrape::{ScrapeReport, Scraper};
pub use crate::settings::ScrapeSettings;

use anyhow::Result;

use crate::fetch::HttpFetcher;

/// Scrape every unit of the configured wiki over HTTP.
///
/// Loads the label table named in `settings` (or the bundled one), then runs
/// the batch sequentially. Units that fail are listed in the report.
pub fn scrape(settings: ScrapeSettings) -> Result<ScrapeReport> {
    let labels = LabelTable::load(settings.labels.as_deref())?;
    let fetcher = HttpFetcher::from_settings(&settings)?;
    Scraper::new(settings, labels, fetcher).run()
}
