//! Turning an infobox into a [UnitRecord].
//!
//! An infobox is made of titled `section` blocks; each block has rows with a
//! label (`h3`) and a value cell (`div.pi-data-value`). The label decides,
//! through the [LabelTable], how the cell is read.

use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::dom::DomNode;
use crate::error::ScrapeError;
use crate::infobox::Infobox;
use crate::labels::{LabelTable, ValueKind};

/// The parsed value of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Dict(IndexMap<String, String>),
}

/// `label -> value` for the rows of one block.
pub type Block = IndexMap<String, FieldValue>;

/// Everything extracted from one unit's infobox.
///
/// Serializes as `{"name": .., "<block title>": {"<label>": <value>, ..}, ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub name: String,
    #[serde(flatten)]
    pub blocks: IndexMap<String, Block>,
}

/// Extract all classified rows of all titled blocks of `infobox`.
///
/// Fails on the first label missing from `labels` or the first malformed dict
/// group; a unit is never partially extracted.
pub fn extract_fields<N: DomNode>(
    infobox: &Infobox<N>,
    labels: &LabelTable,
) -> Result<UnitRecord, ScrapeError> {
    let name = infobox
        .heading()
        .ok_or_else(|| ScrapeError::NotFound("infobox heading".into()))?;

    let mut blocks = IndexMap::new();
    for (title, block) in blocks_of(infobox.node()) {
        let fields = extract_block(block, labels)?;
        debug!("Block {:?} of {:?}: {} fields", title, name, fields.len());
        blocks.insert(title, fields);
    }

    Ok(UnitRecord { name, blocks })
}

/// The titled `section` blocks of an infobox, as `(title, block)`.
pub fn blocks_of<N: DomNode>(infobox: N) -> Vec<(String, N)> {
    infobox
        .find_all(|node| node.is_tag("section"))
        .into_iter()
        .filter_map(|section| {
            let title = section.find(|node| node.is_tag("h2"))?.text().trim().to_string();
            Some((title, section))
        })
        .collect()
}

/// The rows of a block that have both a label (`h3`) and a value cell, as
/// `(label, row, cell)`. Rows missing either are skipped.
pub fn rows_of<N: DomNode>(block: N) -> Vec<(String, N, N)> {
    block
        .child_elements(|node| node.is_tag_with_class("div", "pi-item"))
        .into_iter()
        .filter_map(|row| {
            let label = row.find(|node| node.is_tag("h3"))?.text().trim().to_string();
            let cell = row.find(|node| node.is_tag_with_class("div", "pi-data-value"))?;
            Some((label, row, cell))
        })
        .collect()
}

fn extract_block<N: DomNode>(block: N, labels: &LabelTable) -> Result<Block, ScrapeError> {
    let mut fields = Block::new();
    for (label, _, cell) in rows_of(block) {
        let kind = labels.classify(&label)?;
        trace!("Label {:?} is {:?}", label, kind);
        if let Some(value) = parse_value(kind, cell, &label)? {
            fields.insert(label, value);
        }
    }
    Ok(fields)
}

/// Read a value cell as `kind`. `Ignore` yields `None`.
pub fn parse_value<N: DomNode>(
    kind: ValueKind,
    cell: N,
    label: &str,
) -> Result<Option<FieldValue>, ScrapeError> {
    Ok(match kind {
        ValueKind::Text => Some(FieldValue::Text(parse_text(cell))),
        ValueKind::List => Some(FieldValue::List(parse_list(cell))),
        ValueKind::Dict => Some(FieldValue::Dict(parse_dict(cell, label)?)),
        ValueKind::Ignore => None,
    })
}

pub fn parse_text<N: DomNode>(cell: N) -> String {
    cell.text().trim().to_string()
}

/// One entry per line-break separated group; empty groups are dropped.
pub fn parse_list<N: DomNode>(cell: N) -> Vec<String> {
    split_groups(cell)
        .into_iter()
        .map(|group| group.iter().map(|node| node.text()).collect::<String>())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Reads each line-break separated group as `<value> <label>`, e.g. `100 Food`
/// becomes `"Food": "100"`. Fragments beyond the second are ignored.
pub fn parse_dict<N: DomNode>(
    cell: N,
    label: &str,
) -> Result<IndexMap<String, String>, ScrapeError> {
    let mut values = IndexMap::new();
    for group in split_groups(cell) {
        let fragments: Vec<String> = group
            .iter()
            .map(|node| node.text().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();
        match fragments.as_slice() {
            [] => continue,
            [value, key, rest @ ..] => {
                if !rest.is_empty() {
                    debug!("Label {:?}: ignoring extra fragments {:?}", label, rest);
                }
                values.insert(key.clone(), value.clone());
            }
            [_] => {
                return Err(ScrapeError::MalformedDictGroup {
                    label: label.to_string(),
                    group: fragments.clone(),
                })
            }
        }
    }
    Ok(values)
}

/// Split the children of a cell into groups delimited by `br` elements.
/// Children marked with the `image` class are left out.
fn split_groups<N: DomNode>(cell: N) -> Vec<Vec<N>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    for child in cell.children() {
        if child.has_class("image") {
            continue;
        }
        if child.is_tag("br") {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
        } else {
            current.push(child);
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}
