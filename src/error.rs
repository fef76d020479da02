use thiserror::Error;

/// Why a single unit could not be scraped.
///
/// All of these are recoverable at the batch level: the orchestrator records
/// the failure and moves on to the next unit.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot resolve link {href:?}: {source}")]
    InvalidLink {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to parse HTML of {url}")]
    Parse { url: String },

    #[error("no {0} found")]
    NotFound(String),

    #[error(
        "{} infoboxes match and none is named {:?} (candidates: {})",
        .candidates.len(),
        .disambiguator,
        .candidates.join(", ")
    )]
    Ambiguous {
        candidates: Vec<String>,
        disambiguator: String,
    },

    #[error("label {0:?} is missing from the classification table")]
    UnknownLabel(String),

    #[error("could not read label {label:?} as a dict, group {group:?} has fewer than two fragments")]
    MalformedDictGroup { label: String, group: Vec<String> },
}

impl ScrapeError {
    /// Short name of the error kind, used to group failures in the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Fetch { .. } => "fetch",
            ScrapeError::InvalidLink { .. } => "invalid link",
            ScrapeError::Parse { .. } => "parse",
            ScrapeError::NotFound(_) => "not found",
            ScrapeError::Ambiguous { .. } => "ambiguous",
            ScrapeError::UnknownLabel(_) => "unknown label",
            ScrapeError::MalformedDictGroup { .. } => "malformed dict group",
        }
    }

    /// True if the error means the label classification table needs updating.
    pub fn is_stale_table(&self) -> bool {
        matches!(self, ScrapeError::UnknownLabel(_))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ScrapeError;

    #[test]
    fn messages() {
        let err = ScrapeError::UnknownLabel("Mystery Stat".into());
        assert_eq!(
            err.to_string(),
            "label \"Mystery Stat\" is missing from the classification table"
        );
        assert!(err.is_stale_table());

        let err = ScrapeError::Ambiguous {
            candidates: vec!["Pikeman".into(), "Pikeman".into()],
            disambiguator: "halberdier".into(),
        };
        assert_eq!(
            err.to_string(),
            "2 infoboxes match and none is named \"halberdier\" (candidates: Pikeman, Pikeman)"
        );
        assert_eq!(err.kind(), "ambiguous");
        assert!(!err.is_stale_table());

        let err = ScrapeError::Fetch {
            url: "https://example.org/wiki/Pikeman".into(),
            source: "404 Not Found".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch https://example.org/wiki/Pikeman: 404 Not Found"
        );

        let err = ScrapeError::InvalidLink {
            href: "http://[::1".into(),
            source: url::ParseError::InvalidIpv6Address,
        };
        assert_eq!(err.kind(), "invalid link");
        assert!(err.to_string().starts_with("cannot resolve link \"http://[::1\""));
    }
}
