use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

/// Settings of a scrape run.
///
/// Can be read from a TOML file; keys that are missing keep their default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrapeSettings {
    /// Root of the wiki. Links on the index page are resolved against it.
    pub site_root: String,
    /// Path of the unit index page, relative to `site_root`.
    pub index_path: String,
    /// Only infoboxes whose game contains this text are considered.
    pub target_game: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Label classification table. The bundled table is used if unset.
    pub labels: Option<PathBuf>,
    /// Where to store unit icons. Icons are skipped if unset.
    pub icon_dir: Option<PathBuf>,
    /// Where to dump the raw HTML of infobox rows. Nothing is dumped if unset.
    pub dump_dir: Option<PathBuf>,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        ScrapeSettings {
            site_root: "https://ageofempires.fandom.com/".into(),
            index_path: "wiki/Unit_(Age_of_Empires_III)".into(),
            target_game: "Age of Empires III".into(),
            timeout_secs: 30,
            user_agent: concat!("infobox-scraper/", env!("CARGO_PKG_VERSION")).into(),
            labels: None,
            icon_dir: None,
            dump_dir: None,
        }
    }
}

impl ScrapeSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        toml::from_str(&source).with_context(|| format!("invalid settings {}", path.display()))
    }

    /// The site root as URL, always ending in `/` so relative paths resolve below it.
    pub fn root_url(&self) -> Result<Url> {
        let mut root = self.site_root.clone();
        if !root.ends_with('/') {
            root.push('/');
        }
        Url::parse(&root).with_context(|| format!("invalid site root {:?}", self.site_root))
    }

    pub fn index_url(&self) -> Result<Url> {
        self.root_url()?
            .join(&self.index_path)
            .with_context(|| format!("invalid index path {:?}", self.index_path))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use crate::settings::*;

    #[test]
    fn default_urls() {
        let settings = ScrapeSettings::default();
        assert_eq!(
            settings.index_url().unwrap().as_str(),
            "https://ageofempires.fandom.com/wiki/Unit_(Age_of_Empires_III)"
        );
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn root_without_trailing_slash() {
        let settings = ScrapeSettings {
            site_root: "https://example.org/mirror".into(),
            index_path: "wiki/Units".into(),
            ..Default::default()
        };
        assert_eq!(
            settings.index_url().unwrap().as_str(),
            "https://example.org/mirror/wiki/Units"
        );
    }

    #[test]
    fn partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scrape.toml");
        fs::write(
            &path,
            r#"
            target_game = "Age of Empires II"
            timeout_secs = 5
            icon_dir = "icons"
            "#,
        )
        .unwrap();
        let settings = ScrapeSettings::from_file(&path).unwrap();
        assert_eq!(settings.target_game, "Age of Empires II");
        assert_eq!(settings.timeout_secs, 5);
        assert_eq!(settings.icon_dir, Some(PathBuf::from("icons")));
        assert_eq!(settings.site_root, ScrapeSettings::default().site_root);
    }

    #[test]
    fn unknown_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scrape.toml");
        fs::write(&path, "target = 1").unwrap();
        assert!(ScrapeSettings::from_file(&path).is_err());
    }
}
