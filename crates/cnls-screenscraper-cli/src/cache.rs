//! On-disk store of raw cNLS Mapper pages, one HTML file per sequence.
//!
//! Pages are fetched once with `fetch` and can then be parsed any number of
//! times with `parse-cached`, without touching the service again.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const PAGE_EXTENSION: &str = "html";

/// File name used for a sequence's page. Characters that are awkward in file
/// names are replaced with `_`.
pub fn file_name_for(definition: &str) -> String {
    let stem: String = definition
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "unnamed".to_string() } else { stem };
    format!("{stem}.{PAGE_EXTENSION}")
}

/// Writes pages for one run into a directory.
///
/// Distinct definitions can sanitize to the same file name. Within a run the
/// later page gets a numeric suffix instead of replacing the earlier one.
/// Files left by previous runs are overwritten.
pub struct PageWriter {
    dir: PathBuf,
    taken: HashSet<String>,
}

impl PageWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            taken: HashSet::new(),
        }
    }

    /// Write `body` for `definition`, creating the directory if needed.
    pub fn write(&mut self, definition: &str, body: &str) -> Result<PathBuf> {
        let name = self.claim(definition);
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create cache dir: {}", self.dir.display()))?;
        let path = self.dir.join(name);
        fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    fn claim(&mut self, definition: &str) -> String {
        let name = file_name_for(definition);
        if self.taken.insert(name.clone()) {
            return name;
        }
        let stem = name.trim_end_matches(&format!(".{PAGE_EXTENSION}")).to_string();
        let unique = (2..)
            .map(|n| format!("{stem}_{n}.{PAGE_EXTENSION}"))
            .find(|candidate| !self.taken.contains(candidate))
            .unwrap_or(name);
        tracing::warn!("{definition}: file name already used in this run, saving as {unique}");
        self.taken.insert(unique.clone());
        unique
    }
}

/// Every regular file in `dir`, sorted by name.
pub fn cached_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read cache dir: {}", dir.display()))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    pages.sort();
    Ok(pages)
}

/// Read a cached page. The service serves ISO-8859-1, so invalid UTF-8 is
/// replaced rather than rejected.
pub fn read_page(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
