use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{error, info, LevelFilter};

use infobox_scraper::output::write_catalog;
use infobox_scraper::{scrape, ScrapeSettings};

/// Scrape unit statistics from wiki infoboxes into a JSON file.
#[derive(Parser)]
#[command(name = "infobox-scraper")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML). Flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root URL of the wiki
    #[arg(long, value_name = "URL")]
    root: Option<String>,

    /// Path of the unit index page, relative to the root
    #[arg(long, value_name = "PATH")]
    index: Option<String>,

    /// Game an infobox must belong to
    #[arg(long, value_name = "NAME")]
    game: Option<String>,

    /// Label classification table (TOML)
    #[arg(long, value_name = "FILE")]
    labels: Option<PathBuf>,

    /// Download unit icons into this directory
    #[arg(long, value_name = "DIR")]
    icons: Option<PathBuf>,

    /// Dump the raw HTML of every infobox row into this directory
    #[arg(long, value_name = "DIR")]
    dump_html: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Output JSON file
    #[arg(short, long, value_name = "FILE", default_value = "data/units.json")]
    output: PathBuf,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> Result<ScrapeSettings> {
        let mut settings = match &self.config {
            Some(path) => ScrapeSettings::from_file(path)?,
            None => ScrapeSettings::default(),
        };
        if let Some(root) = &self.root {
            settings.site_root = root.clone();
        }
        if let Some(index) = &self.index {
            settings.index_path = index.clone();
        }
        if let Some(game) = &self.game {
            settings.target_game = game.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
        if self.labels.is_some() {
            settings.labels = self.labels.clone();
        }
        if self.icons.is_some() {
            settings.icon_dir = self.icons.clone();
        }
        if self.dump_html.is_some() {
            settings.dump_dir = self.dump_html.clone();
        }
        Ok(settings)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = cli.settings()?;
    info!(
        "Starting extraction of {:?} units from {}",
        settings.target_game,
        settings.index_url()?
    );
    let report = scrape(settings)?;
    report.log_summary();
    write_catalog(&cli.output, &report.catalog)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
