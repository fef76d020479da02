//! The JSON document a run produces: `unit name -> record`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::info;
use serde::Serialize;

use crate::extract::UnitRecord;

/// Records keyed by unit name, in discovery order.
pub type Catalog = IndexMap<String, UnitRecord>;

/// Serialize a catalog with four-space indentation.
pub fn to_json<W: Write>(catalog: &Catalog, writer: W) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    catalog.serialize(&mut serializer)?;
    Ok(())
}

/// Write `catalog` to `path`, creating parent directories.
pub fn write_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    to_json(catalog, &mut writer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("Data for {} units saved in {}", catalog.len(), path.display());
    Ok(())
}

pub fn read_catalog(path: &Path) -> Result<Catalog> {
    let source =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("invalid catalog {}", path.display()))
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use crate::extract::{FieldValue, UnitRecord};
    use crate::output::*;

    fn catalog() -> Catalog {
        let mut statistics = IndexMap::new();
        statistics.insert("Hit points".to_string(), FieldValue::Text("60".into()));
        statistics.insert(
            "Trained at".to_string(),
            FieldValue::List(vec!["Barracks".into(), "Fort".into()]),
        );
        statistics.insert(
            "Cost".to_string(),
            FieldValue::Dict(
                [("Food".to_string(), "100".to_string()), ("Coin".to_string(), "20".to_string())]
                    .into_iter()
                    .collect(),
            ),
        );
        let mut blocks = IndexMap::new();
        blocks.insert("Statistics".to_string(), statistics);

        let mut catalog = Catalog::new();
        catalog.insert(
            "Pikeman".to_string(),
            UnitRecord {
                name: "Pikeman".into(),
                blocks,
            },
        );
        catalog.insert(
            "Explorer".to_string(),
            UnitRecord {
                name: "Explorer".into(),
                blocks: IndexMap::new(),
            },
        );
        catalog
    }

    #[test]
    fn four_space_indent() {
        let mut out = Vec::new();
        to_json(&catalog(), &mut out).unwrap();
        let json = String::from_utf8(out).unwrap();
        assert!(json.starts_with("{\n    \"Pikeman\": {\n        \"name\": \"Pikeman\","));
        // Insertion order is kept
        assert!(json.find("Hit points").unwrap() < json.find("Cost").unwrap());
        assert!(json.find("Pikeman").unwrap() < json.find("Explorer").unwrap());
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("units.json");
        let catalog = catalog();
        write_catalog(&path, &catalog).unwrap();
        assert_eq!(read_catalog(&path).unwrap(), catalog);
    }
}
