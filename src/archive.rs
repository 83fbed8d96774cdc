//! Single-file tar and zip packaging.
//!
//! Each prebuilt binary is offered for download both as a bare file and as a
//! `.tar` / `.zip` archive holding exactly that one file. The tar entry
//! preserves the source file's mode, mtime, and size; the zip entry carries
//! default metadata and just the name. The source is usually a symlink into
//! the real release directory, so archiving is also where a missing binary
//! surfaces as an error.

use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Write `<dir>/<stem>.tar` containing the single file `<dir>/<file_name>`.
///
/// Symlinks are followed, so the entry records the metadata and content of
/// the link target. An existing archive at the destination is overwritten.
pub fn write_tar(dir: &Path, file_name: &str, stem: &str) -> Result<PathBuf> {
    let source = dir.join(file_name);
    let out_path = dir.join(format!("{stem}.tar"));

    let out = File::create(&out_path)
        .with_context(|| format!("creating tar archive '{}'", out_path.display()))?;
    let mut builder = tar::Builder::new(out);
    builder
        .append_path_with_name(&source, file_name)
        .with_context(|| format!("archiving '{}'", source.display()))?;
    builder
        .into_inner()
        .with_context(|| format!("finalizing tar archive '{}'", out_path.display()))?;

    Ok(out_path)
}

/// Write `<dir>/<stem>.zip` containing the single file `<dir>/<file_name>`.
///
/// The entry is stored under the plain file name with default zip metadata.
/// An existing archive at the destination is overwritten.
pub fn write_zip(dir: &Path, file_name: &str, stem: &str) -> Result<PathBuf> {
    let source = dir.join(file_name);
    let out_path = dir.join(format!("{stem}.zip"));

    let out = File::create(&out_path)
        .with_context(|| format!("creating zip archive '{}'", out_path.display()))?;
    let mut writer = zip::ZipWriter::new(out);
    // Fixed entry timestamp keeps rebuilt archives byte-identical.
    let options =
        zip::write::SimpleFileOptions::default().last_modified_time(zip::DateTime::default());
    writer
        .start_file(file_name, options)
        .with_context(|| format!("starting zip entry '{file_name}'"))?;

    let mut reader = File::open(&source)
        .with_context(|| format!("opening '{}'", source.display()))?;
    io::copy(&mut reader, &mut writer)
        .with_context(|| format!("archiving '{}'", source.display()))?;
    writer
        .finish()
        .with_context(|| format!("finalizing zip archive '{}'", out_path.display()))?;

    Ok(out_path)
}
