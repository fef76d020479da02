//! Best-effort download of a unit's icon.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use url::Url;

use crate::dom::DomNode;
use crate::fetch::Fetch;
use crate::util::{file_stem, normalize};

/// The Definitive Edition thumbnail of an infobox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRef {
    /// Image source as written in the page (possibly relative).
    pub src: String,
    /// The `data-image-name` of the image.
    pub name: String,
}

impl IconRef {
    /// File name to store the icon under: the normalized image name, with the
    /// extension of the source URL appended if the name has none. The name
    /// never contains a path separator.
    pub fn file_name(&self, base: &Url) -> String {
        let name = file_stem(&normalize(&self.name));
        if Path::new(&name).extension().is_some() {
            return name;
        }
        let extension = base.join(&self.src).ok().and_then(|url| {
            url.path_segments()?
                .filter_map(|segment| {
                    Path::new(segment)
                        .extension()
                        .map(|ext| ext.to_string_lossy().to_lowercase())
                })
                .last()
        });
        match extension {
            Some(extension) => format!("{name}.{extension}"),
            None => name,
        }
    }
}

/// Find the thumbnail tagged as the Definitive Edition variant.
///
/// Lazily loaded images carry a `data:` placeholder in `src`; their real
/// source is in `data-src`.
pub fn find_icon<N: DomNode>(infobox: N) -> Option<IconRef> {
    let image = infobox.find(|node| {
        node.is_tag_with_class("img", "pi-image-thumbnail")
            && node.attr("alt").as_deref() == Some("Definitive")
    })?;
    let src = image
        .attr("src")
        .filter(|src| !src.is_empty() && !src.starts_with("data:"))
        .or_else(|| image.attr("data-src"))?;
    let name = image.attr("data-image-name").filter(|name| !name.trim().is_empty())?;
    Some(IconRef { src, name })
}

/// Download the icon of `infobox` into `dir`, returning the written path.
///
/// Failures are logged and swallowed; an existing file of the same name is
/// overwritten.
pub fn download_icon<N: DomNode, F: Fetch>(
    infobox: N,
    fetcher: &F,
    base: &Url,
    dir: &Path,
) -> Option<PathBuf> {
    let icon = find_icon(infobox)?;
    let url = match base.join(&icon.src) {
        Ok(url) => url,
        Err(err) => {
            warn!("Invalid icon url {:?}: {}", icon.src, err);
            return None;
        }
    };
    let path = dir.join(icon.file_name(base));
    let result = fetcher
        .fetch_bytes(&url)
        .map_err(anyhow::Error::from)
        .and_then(|bytes| {
            fs::create_dir_all(dir)?;
            fs::write(&path, bytes)?;
            Ok(())
        });
    match result {
        Ok(()) => {
            info!("Saved icon {}", path.display());
            Some(path)
        }
        Err(err) => {
            warn!("Failed to download icon {}: {:#}", url, err);
            None
        }
    }
}
