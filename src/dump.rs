//! Raw HTML dump of infobox rows, for maintaining the label table.
//!
//! Every row ends up in `<dir>/<block title>/<label>.html`, so new or
//! renamed labels can be inspected and classified.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

use crate::dom::DomNode;
use crate::extract::{blocks_of, rows_of};
use crate::util::file_stem;

/// Write the outer HTML of every labelled row of `infobox` below `dir`.
/// Returns the number of files written.
pub fn dump_block_rows<N: DomNode>(infobox: N, dir: &Path) -> Result<usize> {
    let mut written = 0;
    for (title, block) in blocks_of(infobox) {
        let block_dir = dir.join(file_stem(&title));
        fs::create_dir_all(&block_dir)
            .with_context(|| format!("failed to create {}", block_dir.display()))?;
        for (label, row, _) in rows_of(block) {
            let path = block_dir.join(format!("{}.html", file_stem(&label)));
            fs::write(&path, row.outer_html())
                .with_context(|| format!("failed to write {}", path.display()))?;
            written += 1;
        }
    }
    debug!("Dumped {} rows to {}", written, dir.display());
    Ok(written)
}
