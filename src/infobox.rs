//! Locating the infobox of one unit on a detail page.
//!
//! A detail page can carry several `aside.portable-infobox` widgets: one per
//! game the unit appears in, and sometimes one per unit when a page documents
//! a family of units.

use log::debug;

use crate::dom::DomNode;
use crate::error::ScrapeError;
use crate::util::normalize;

/// A located infobox widget.
#[derive(Clone, Copy)]
pub struct Infobox<N> {
    node: N,
}

impl<N: DomNode> Infobox<N> {
    pub fn new(node: N) -> Self {
        Infobox { node }
    }

    pub fn node(&self) -> N {
        self.node
    }

    /// The unit name shown in the infobox title (`h2.pi-title`, else the first `h2`).
    pub fn heading(&self) -> Option<String> {
        self.node
            .find(|node| node.is_tag_with_class("h2", "pi-title"))
            .or_else(|| self.node.find(|node| node.is_tag("h2")))
            .map(|heading| heading.text().trim().to_string())
    }

    /// The game the infobox describes: the value of the `game` row, else the
    /// first data value of the widget.
    pub fn game(&self) -> Option<String> {
        let is_value = |node: &N| node.is_tag_with_class("div", "pi-data-value");
        self.node
            .find(|node| node.attr("data-source").as_deref() == Some("game"))
            .and_then(|row| row.find(is_value))
            .or_else(|| self.node.find(is_value))
            .map(|value| value.text().trim().to_string())
    }
}

/// All infobox widgets of a page, in document order.
pub fn infoboxes<N: DomNode>(page: N) -> Vec<Infobox<N>> {
    page.find_all(|node| node.is_tag_with_class("aside", "portable-infobox"))
        .into_iter()
        .map(Infobox::new)
        .collect()
}

/// Find the infobox for `target_game` on a detail page.
///
/// Infoboxes whose game contains `target_game` are candidates. A single
/// candidate is returned as is; among several, the first whose normalized
/// heading equals the normalized `disambiguator` wins.
pub fn locate_infobox<N: DomNode>(
    page: N,
    target_game: &str,
    disambiguator: &str,
) -> Result<Infobox<N>, ScrapeError> {
    let mut candidates: Vec<Infobox<N>> = infoboxes(page)
        .into_iter()
        .filter(|infobox| {
            infobox
                .game()
                .map(|game| game.contains(target_game))
                .unwrap_or(false)
        })
        .collect();
    debug!(
        "{} infoboxes for game {:?} on page",
        candidates.len(),
        target_game
    );

    match candidates.len() {
        0 => Err(ScrapeError::NotFound(format!(
            "infobox for game {target_game:?}"
        ))),
        1 => Ok(candidates.remove(0)),
        _ => {
            let wanted = normalize(disambiguator);
            let headings: Vec<Option<String>> =
                candidates.iter().map(|infobox| infobox.heading()).collect();
            match headings
                .iter()
                .position(|heading| matches!(heading, Some(h) if normalize(h) == wanted))
            {
                Some(index) => Ok(candidates.remove(index)),
                None => Err(ScrapeError::Ambiguous {
                    candidates: headings.into_iter().flatten().collect(),
                    disambiguator: wanted,
                }),
            }
        }
    }
}
