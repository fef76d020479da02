//! Classification of infobox row labels into value kinds.
//!
//! The table is data, not code: it is loaded from a TOML file (see
//! `config/labels.toml`, which is also embedded as the fallback) so it can
//! follow changes of the wiki's schema without a rebuild.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::util::normalize;

/// The table shipped with the crate.
pub const BUNDLED_LABELS: &str = include_str!("../config/labels.toml");

/// How the value of a row is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Visible text of the value cell, trimmed.
    Text,
    /// One entry per line-break separated group.
    List,
    /// One `label -> value` pair per line-break separated group.
    Dict,
    /// The row is dropped.
    Ignore,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LabelTableFile {
    #[serde(default)]
    text: Vec<String>,
    #[serde(default)]
    list: Vec<String>,
    #[serde(default)]
    dict: Vec<String>,
    #[serde(default)]
    ignore: Vec<String>,
}

/// Maps every known label to exactly one [ValueKind].
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    kinds: HashMap<String, ValueKind>,
}

impl LabelTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// The table embedded at compile time from `config/labels.toml`.
    pub fn bundled() -> Result<Self> {
        Self::from_toml(BUNDLED_LABELS).context("bundled label table is invalid")
    }

    /// Parse a table from TOML with the arrays `text`, `list`, `dict` and `ignore`.
    pub fn from_toml(source: &str) -> Result<Self> {
        let file: LabelTableFile = toml::from_str(source)?;
        let mut table = LabelTable::new();
        for (kind, labels) in [
            (ValueKind::Text, file.text),
            (ValueKind::List, file.list),
            (ValueKind::Dict, file.dict),
            (ValueKind::Ignore, file.ignore),
        ] {
            for label in labels {
                table.insert(&label, kind)?;
            }
        }
        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read label table {}", path.display()))?;
        let table = Self::from_toml(&source)
            .with_context(|| format!("invalid label table {}", path.display()))?;
        debug!("Loaded {} labels from {}", table.len(), path.display());
        Ok(table)
    }

    /// Load the table at `path`, or the bundled one if no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::bundled(),
        }
    }

    /// Add a label. Fails if the label is already classified as a different kind.
    pub fn insert(&mut self, label: &str, kind: ValueKind) -> Result<()> {
        let key = normalize(label);
        if key.is_empty() {
            return Err(anyhow!("empty label in classification table"));
        }
        match self.kinds.insert(key, kind) {
            Some(previous) if previous != kind => Err(anyhow!(
                "label {:?} is classified as both {:?} and {:?}",
                label,
                previous,
                kind
            )),
            _ => Ok(()),
        }
    }

    /// Look up the kind of `label`.
    pub fn classify(&self, label: &str) -> Result<ValueKind, ScrapeError> {
        self.kinds
            .get(&normalize(label))
            .copied()
            .ok_or_else(|| ScrapeError::UnknownLabel(label.to_string()))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
