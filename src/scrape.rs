//! The batch run: index page, then one detail page per unit.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, error, info, warn};

use crate::dom::{HtmlNode, Source};
use crate::dump;
use crate::error::ScrapeError;
use crate::extract::{extract_fields, UnitRecord};
use crate::fetch::Fetch;
use crate::icon;
use crate::infobox::locate_infobox;
use crate::labels::LabelTable;
use crate::links::{self, UnitLink, UnresolvedUnit};
use crate::output::Catalog;
use crate::settings::ScrapeSettings;

/// A unit that could not be scraped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub unit: String,
    pub url: String,
    pub kind: &'static str,
    pub error: String,
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    /// Number of units found on the index page.
    pub discovered: usize,
    pub catalog: Catalog,
    pub failures: Vec<UnitFailure>,
}

impl ScrapeReport {
    pub fn succeeded(&self) -> usize {
        self.catalog.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of failures per error kind.
    pub fn failure_reasons(&self) -> IndexMap<&'static str, usize> {
        let mut reasons = IndexMap::new();
        for failure in &self.failures {
            *reasons.entry(failure.kind).or_insert(0) += 1;
        }
        reasons
    }

    /// Log the totals and every failure.
    pub fn log_summary(&self) {
        info!(
            "{} units discovered, {} scraped, {} failed",
            self.discovered,
            self.succeeded(),
            self.failed()
        );
        for (kind, count) in self.failure_reasons() {
            warn!("{} failed: {}", count, kind);
        }
        for failure in &self.failures {
            warn!("  {} ({}): {}", failure.unit, failure.url, failure.error);
        }
    }
}

/// Scrapes every unit listed on the index page, one after the other.
pub struct Scraper<F> {
    settings: ScrapeSettings,
    labels: LabelTable,
    fetcher: F,
}

impl<F: Fetch> Scraper<F> {
    pub fn new(settings: ScrapeSettings, labels: LabelTable, fetcher: F) -> Self {
        Scraper {
            settings,
            labels,
            fetcher,
        }
    }

    /// Fetch the index page and resolve the links of all listed units.
    pub fn discover(&self) -> Result<Vec<Result<UnitLink, UnresolvedUnit>>> {
        let index_url = self.settings.index_url()?;
        info!("Fetching unit index {}", index_url);
        let html = self.fetcher.fetch_text(&index_url)?;
        let units = links::discover_units_from_html(&html)
            .with_context(|| format!("no units on index page {index_url}"))?;
        Ok(links::resolve_links(&units, &self.settings.root_url()?))
    }

    /// Run the whole batch. Only a failure to read the index page aborts it;
    /// units that fail are recorded in the report.
    pub fn run(&self) -> Result<ScrapeReport> {
        let links = self.discover()?;
        let total = links.len();
        info!(
            "{} unit URLs available for scraping",
            links.iter().filter(|link| link.is_ok()).count()
        );
        if links.is_empty() {
            warn!("No unit URLs were obtained");
        }

        let mut report = ScrapeReport {
            discovered: total,
            ..Default::default()
        };
        for (i, link) in links.into_iter().enumerate() {
            let (unit, url, result) = match link {
                Ok(link) => {
                    info!("[{}/{}] Scraping {}", i + 1, total, link.name);
                    let result = self.scrape_unit(&link);
                    (link.name, link.url.to_string(), result)
                }
                Err(unresolved) => (unresolved.name, unresolved.href, Err(unresolved.error)),
            };
            match result {
                Ok(record) => {
                    report.catalog.insert(unit, record);
                }
                Err(err) => {
                    if err.is_stale_table() {
                        error!("{}: {} (update the label classification table)", unit, err);
                    } else {
                        warn!("{}: {}", unit, err);
                    }
                    report.failures.push(UnitFailure {
                        unit,
                        url,
                        kind: err.kind(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Fetch, locate and extract one unit. Icons and row dumps, when
    /// configured, are written after a successful extraction.
    pub fn scrape_unit(&self, link: &UnitLink) -> Result<UnitRecord, ScrapeError> {
        let page_url = link.page_url();
        let html = self.fetcher.fetch_text(&page_url)?;
        let source = Source::new(&html);
        let dom = source.parse().ok_or_else(|| ScrapeError::Parse {
            url: page_url.to_string(),
        })?;
        let infobox = locate_infobox(
            HtmlNode::root(&dom),
            &self.settings.target_game,
            &link.disambiguator(),
        )?;
        let record = extract_fields(&infobox, &self.labels)?;
        debug!(
            "{}: {} blocks extracted from {}",
            link.name,
            record.blocks.len(),
            page_url
        );

        if let Some(dir) = &self.settings.icon_dir {
            icon::download_icon(infobox.node(), &self.fetcher, &page_url, dir);
        }
        if let Some(dir) = &self.settings.dump_dir {
            if let Err(err) = dump::dump_block_rows(infobox.node(), dir) {
                warn!("{}: failed to dump rows: {:#}", link.name, err);
            }
        }
        Ok(record)
    }
}
