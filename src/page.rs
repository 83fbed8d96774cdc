//! Minimal static HTML pages.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Body fragment written into every non-root directory to shadow the file
/// server's default directory listing.
pub const LISTING_DISABLED: &str =
    "<p>Directory listings are disabled. See <a href=\"/\">here</a> for available content.</p>";

/// Write a complete minimal HTML document whose body is `body`, verbatim.
///
/// Callers are responsible for escaping; the fragment is embedded as-is.
/// An existing file at `path` is truncated.
pub fn write_index_page(path: &Path, body: &str) -> Result<()> {
    let document = [
        "<!doctype html>",
        "<html lang=\"en\">",
        "<head>",
        "<meta charset=\"utf-8\">",
        "</head>",
        "<body>",
        body,
        "</body>",
        "</html>",
    ]
    .join("\n");

    fs::write(path, document).with_context(|| format!("writing index page '{}'", path.display()))
}
