//! Index pages for the staging tree.
//!
//! After staging, every directory gets an `index.html` so the file server
//! never falls back to its own directory listing: the root page lists every
//! staged artifact, every other directory gets the fixed placeholder.

use anyhow::{Context, Result};
use std::path::Path;
use walkdir::WalkDir;

use crate::page;

/// Write an `index.html` into every directory under `root`.
///
/// The root itself receives `links` wrapped in an unordered list; all other
/// directories receive [`page::LISTING_DISABLED`]. Files are left untouched.
/// Re-running overwrites each page identically.
pub fn write_indexes(root: &Path, links: &[String]) -> Result<()> {
    for entry in WalkDir::new(root) {
        let entry =
            entry.with_context(|| format!("walking staging tree '{}'", root.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let target = entry.path().join("index.html");
        if entry.path() == root {
            page::write_index_page(&target, &link_list_markup(links))?;
        } else {
            page::write_index_page(&target, page::LISTING_DISABLED)?;
        }
    }
    Ok(())
}

fn link_list_markup(links: &[String]) -> String {
    let mut lines = Vec::with_capacity(links.len() + 2);
    lines.push("<ul>".to_string());
    for link in links {
        lines.push(format!("  <li>{link}</li>"));
    }
    lines.push("</ul>".to_string());
    lines.join("\n")
}
