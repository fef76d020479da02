//! Link discovery on the wiki's unit index page.

use indexmap::IndexMap;
use log::{debug, warn};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::dom::{DomNode, HtmlNode, Source};
use crate::error::ScrapeError;
use crate::util::normalize;

/// A headed group of units on the index page, e.g. "Infantry".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// `(unit name, relative url)` pairs in page order.
    pub units: Vec<(String, String)>,
}

/// A unit and the absolute URL of its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLink {
    pub name: String,
    pub url: Url,
}

impl UnitLink {
    /// Resolve `href` against the site root.
    pub fn resolve(name: &str, href: &str, root: &Url) -> Result<Self, url::ParseError> {
        Ok(UnitLink {
            name: name.to_string(),
            url: root.join(href)?,
        })
    }

    /// Fragment identifier of the link, if any (`#Pikeman` in `/wiki/Pikemen#Pikeman`).
    pub fn fragment(&self) -> Option<&str> {
        self.url.fragment().filter(|fragment| !fragment.is_empty())
    }

    /// Normalized string used to pick this unit's infobox on a shared page:
    /// the percent-decoded fragment if there is one, the unit name otherwise.
    pub fn disambiguator(&self) -> String {
        match self.fragment() {
            Some(fragment) => normalize(&percent_decode_str(fragment).decode_utf8_lossy()),
            None => normalize(&self.name),
        }
    }

    /// The detail page URL without fragment.
    pub fn page_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }
}

/// Find the named sections of the index page and the unit links listed under each.
///
/// Sections are the `h2` children of the content region. The units of a
/// section are the anchors of the first `ul` that follows its heading (before
/// the next heading). A heading without a list yields an empty section.
pub fn discover_sections<N: DomNode>(index: N) -> Result<Vec<Section>, ScrapeError> {
    let content = index
        .find(|node| node.is_tag_with_class("div", "mw-parser-output"))
        .ok_or_else(|| ScrapeError::NotFound("content region `div.mw-parser-output`".into()))?;

    let children = content.child_elements(|_| true);
    let mut sections = Vec::new();
    for (i, heading) in children.iter().enumerate() {
        if !heading.is_tag("h2") {
            continue;
        }
        let name = section_name(*heading);
        let units = children[i + 1..]
            .iter()
            .take_while(|node| !node.is_tag("h2"))
            .find(|node| node.is_tag("ul"))
            .map(|list| list_units(*list))
            .unwrap_or_default();
        if units.is_empty() {
            debug!("Section {:?} lists no units", name);
        }
        sections.push(Section { name, units });
    }
    Ok(sections)
}

/// All units of the index page as `unit name -> relative url`, in page order.
/// A name listed in several sections keeps its first position and its last url.
pub fn discover_units<N: DomNode>(index: N) -> Result<IndexMap<String, String>, ScrapeError> {
    let mut units = IndexMap::new();
    for section in discover_sections(index)? {
        for (name, href) in section.units {
            if let Some(previous) = units.insert(name.clone(), href) {
                debug!(
                    "Unit {:?} listed again in section {:?}, replacing {}",
                    name, section.name, previous
                );
            }
        }
    }
    Ok(units)
}

/// Parse the index page and discover its units.
pub fn discover_units_from_html(html: &str) -> Result<IndexMap<String, String>, ScrapeError> {
    let source = Source::new(html);
    let dom = source.parse().ok_or_else(|| ScrapeError::Parse {
        url: "index page".into(),
    })?;
    discover_units(HtmlNode::root(&dom))
}

/// A discovered unit whose href does not resolve to a URL.
#[derive(Debug)]
pub struct UnresolvedUnit {
    pub name: String,
    pub href: String,
    pub error: ScrapeError,
}

/// Resolve discovered units against the site root, keeping page order.
pub fn resolve_links(
    units: &IndexMap<String, String>,
    root: &Url,
) -> Vec<Result<UnitLink, UnresolvedUnit>> {
    units
        .iter()
        .map(|(name, href)| {
            UnitLink::resolve(name, href, root).map_err(|source| {
                warn!("Unit {:?}: cannot resolve {:?}: {}", name, href, source);
                UnresolvedUnit {
                    name: name.clone(),
                    href: href.clone(),
                    error: ScrapeError::InvalidLink {
                        href: href.clone(),
                        source,
                    },
                }
            })
        })
        .collect()
}

fn section_name<N: DomNode>(heading: N) -> String {
    heading
        .child_elements(|node| node.is_tag_with_class("span", "mw-headline"))
        .first()
        .map(|span| span.text())
        .unwrap_or_else(|| heading.text())
        .trim()
        .to_string()
}

fn list_units<N: DomNode>(list: N) -> Vec<(String, String)> {
    list.child_elements(|node| node.is_tag("li"))
        .into_iter()
        .filter_map(|item| {
            let anchor = item
                .child_elements(|node| node.is_tag("a") && !node.has_class("image"))
                .into_iter()
                .next()?;
            let name = anchor.text().trim().to_string();
            let href = anchor.attr("href")?;
            if name.is_empty() || href.is_empty() {
                return None;
            }
            Some((name, href))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::dom::{HtmlNode, Source};
    use crate::error::ScrapeError;
    use crate::links::*;

    const INDEX: &'static str = r#"
    <html><body>
    <div class="mw-parser-output">
        <p>Units are trained at buildings.</p>
        <h2><span class="mw-headline" id="Infantry">Infantry</span><span class="mw-editsection">edit</span></h2>
        <ul>
            <li><a href="/wiki/Pikeman_(Age_of_Empires_III)" class="image"><img src="x.png"/></a> <a href="/wiki/Pikeman_(Age_of_Empires_III)">Pikeman</a></li>
            <li><a href="/wiki/Musketeer">Musketeer</a>
                <ul><li><a href="/wiki/Nested">Nested</a></li></ul>
            </li>
            <li>No link here</li>
        </ul>
        <h2><span class="mw-headline" id="Cavalry">Cavalry</span></h2>
        <p>Nothing listed yet.</p>
        <h2><span class="mw-headline" id="Mercenaries">Mercenaries</span></h2>
        <ul>
            <li><a href="/wiki/Landsknecht">Landsknecht</a></li>
            <li><a href="/wiki/Musketeer_(Mercenary)">Musketeer</a></li>
        </ul>
        <div><h2>Nested heading</h2><ul><li><a href="/wiki/Hidden">Hidden</a></li></ul></div>
    </div>
    </body></html>
    "#;

    #[test]
    fn sections() {
        let source = Source::new(INDEX);
        let dom = source.parse().unwrap();
        let sections = discover_sections(HtmlNode::root(&dom)).unwrap();
        assert_eq!(
            sections,
            vec![
                Section {
                    name: "Infantry".into(),
                    units: vec![
                        ("Pikeman".into(), "/wiki/Pikeman_(Age_of_Empires_III)".into()),
                        ("Musketeer".into(), "/wiki/Musketeer".into()),
                    ],
                },
                Section {
                    name: "Cavalry".into(),
                    units: vec![],
                },
                Section {
                    name: "Mercenaries".into(),
                    units: vec![
                        ("Landsknecht".into(), "/wiki/Landsknecht".into()),
                        ("Musketeer".into(), "/wiki/Musketeer_(Mercenary)".into()),
                    ],
                },
            ]
        );
    }

    #[test]
    fn units_are_keyed_by_name() {
        let units = discover_units_from_html(INDEX).unwrap();
        let names: Vec<&str> = units.keys().map(|name| name.as_str()).collect();
        assert_eq!(names, vec!["Pikeman", "Musketeer", "Landsknecht"]);
        // Later sections overwrite earlier urls
        assert_eq!(units["Musketeer"], "/wiki/Musketeer_(Mercenary)");
    }

    #[test]
    fn missing_content_region() {
        match discover_units_from_html("<html><body><p>empty</p></body></html>") {
            Err(ScrapeError::NotFound(what)) => assert!(what.contains("mw-parser-output")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn heading_without_span() {
        let source = Source::new(
            r#"<div class="mw-parser-output"><h2> Ships </h2><ul><li><a href="/wiki/Caravel">Caravel</a></li></ul></div>"#,
        );
        let units = discover_sections(HtmlNode::root(&source.parse().unwrap())).unwrap();
        assert_eq!(units[0].name, "Ships");
        assert_eq!(units[0].units.len(), 1);
    }

    #[test]
    fn resolve_and_disambiguate() {
        let root = Url::parse("https://ageofempires.fandom.com/").unwrap();
        let link = UnitLink::resolve("Pikeman", "/wiki/Pikeman", &root).unwrap();
        assert_eq!(link.url.as_str(), "https://ageofempires.fandom.com/wiki/Pikeman");
        assert_eq!(link.fragment(), None);
        assert_eq!(link.disambiguator(), "pikeman");

        let link = UnitLink::resolve("Elite Pikeman", "/wiki/Pikemen#Elite_Pikeman", &root).unwrap();
        assert_eq!(link.fragment(), Some("Elite_Pikeman"));
        assert_eq!(link.disambiguator(), "elite_pikeman");
        assert_eq!(link.page_url().as_str(), "https://ageofempires.fandom.com/wiki/Pikemen");
    }

    #[test]
    fn resolve_many() {
        let root = Url::parse("https://ageofempires.fandom.com/").unwrap();
        let units = discover_units_from_html(INDEX).unwrap();
        let links = resolve_links(&units, &root);
        assert_eq!(links.len(), 3);
        assert_eq!(
            links[2].as_ref().unwrap().url.as_str(),
            "https://ageofempires.fandom.com/wiki/Landsknecht"
        );
    }

    #[test]
    fn unresolvable_href_is_kept() {
        let root = Url::parse("https://ageofempires.fandom.com/").unwrap();
        let mut units = IndexMap::new();
        units.insert("Pikeman".to_string(), "/wiki/Pikeman".to_string());
        units.insert("Broken".to_string(), "http://[::1".to_string());

        let links = resolve_links(&units, &root);
        assert_eq!(links.len(), 2);
        assert!(links[0].is_ok());
        let unresolved = links[1].as_ref().unwrap_err();
        assert_eq!(unresolved.name, "Broken");
        assert_eq!(unresolved.href, "http://[::1");
        assert_eq!(unresolved.error.kind(), "invalid link");
    }

    #[test]
    fn fragment_is_percent_decoded() {
        let root = Url::parse("https://ageofempires.fandom.com/").unwrap();
        let link = UnitLink::resolve("Jäger", "/wiki/Mercenaries#J%C3%A4ger", &root).unwrap();
        assert_eq!(link.disambiguator(), "jäger");

        // Raw non-ASCII fragments are encoded by the URL parser and decoded again
        let link = UnitLink::resolve("Jäger", "/wiki/Mercenaries#Jäger", &root).unwrap();
        assert_eq!(link.disambiguator(), "jäger");

        let link = UnitLink::resolve("Black Rider", "/wiki/Mercenaries#Black%20Rider", &root).unwrap();
        assert_eq!(link.disambiguator(), "black_rider");
    }
}
