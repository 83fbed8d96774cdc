//! Staging tree construction.
//!
//! Builds the directory layout that the server exposes:
//!
//! ```text
//! <root>/oc-license              -> <source_root>/LICENSE
//! <root>/<arch>/<os>/<name>      -> <source_root>/<target path>
//! <root>/<arch>/<os>/<stem>.tar
//! <root>/<arch>/<os>/<stem>.zip
//! ```
//!
//! Construction is a single deterministic pass over the configured targets;
//! the first failure aborts the whole build. Alongside the tree it returns
//! the ordered list of HTML link fragments for the root index page.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use crate::archive;
use crate::config::Config;

/// Name of the license symlink at the staging root.
pub const LICENSE_LINK: &str = "oc-license";

/// Populate `root` from `config` and return the link fragments in index
/// order: the license first, then one entry per target.
///
/// `root` must be an existing, preferably empty directory; directory creation
/// below it is idempotent, so re-running over a previous tree overwrites it.
pub fn build_staging(config: &Config, root: &Path) -> Result<Vec<String>> {
    for arch in &config.architectures {
        let dir = root.join(arch);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating architecture directory '{}'", dir.display()))?;
    }

    let license_target = config.license_path();
    let license_link = root.join(LICENSE_LINK);
    symlink(&license_target, &license_link).with_context(|| {
        format!(
            "linking '{}' -> '{}'",
            license_link.display(),
            license_target.display()
        )
    })?;
    let mut links = vec![format!("<a href='{LICENSE_LINK}'>license</a>")];

    for target in &config.targets {
        let source = config.source_path(target);
        let base = target
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("target path '{}' has no file name", target.path.display()))?;
        let stem = target
            .path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("target path '{}' has no file stem", target.path.display()))?;

        let dir = root.join(&target.arch).join(&target.os);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating target directory '{}'", dir.display()))?;

        let link = dir.join(base);
        symlink(&source, &link).with_context(|| {
            format!("linking '{}' -> '{}'", link.display(), source.display())
        })?;

        archive::write_tar(&dir, base, stem)?;
        archive::write_zip(&dir, base, stem)?;

        let binary_href = format!("{}/{}/{}", target.arch, target.os, base);
        let archive_href = format!("{}/{}/{}", target.arch, target.os, stem);
        links.push(format!(
            "<a href=\"{binary_href}\">{stem} ({arch} {os})</a> \
             (<a href=\"{archive_href}.tar\">tar</a> <a href=\"{archive_href}.zip\">zip</a>)",
            arch = target.arch,
            os = target.os,
        ));
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReleaseTarget;
    use std::fs::File;
    use std::io::Read;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_config(source_root: &Path, targets: Vec<ReleaseTarget>) -> Config {
        let mut config = Config::default();
        config.source_root = source_root.to_path_buf();
        config.architectures = targets.iter().map(|t| t.arch.clone()).collect();
        config.architectures.dedup();
        config.targets = targets;
        config
    }

    fn target(arch: &str, os: &str, path: &str) -> ReleaseTarget {
        ReleaseTarget {
            arch: arch.to_string(),
            os: os.to_string(),
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn stages_one_target_end_to_end() {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("linux_amd64")).unwrap();
        fs::write(source.path().join("linux_amd64/oc"), b"0123456789").unwrap();
        fs::write(source.path().join("LICENSE"), b"license text").unwrap();

        let root = TempDir::new().unwrap();
        let config = test_config(
            source.path(),
            vec![target("amd64", "linux", "linux_amd64/oc")],
        );

        let links = build_staging(&config, root.path()).unwrap();

        let dir = root.path().join("amd64/linux");
        assert!(dir.join("oc").symlink_metadata().unwrap().is_symlink());
        assert!(dir.join("oc.tar").is_file());
        assert!(dir.join("oc.zip").is_file());

        let mut archive = tar::Archive::new(File::open(dir.join("oc.tar")).unwrap());
        let mut entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.header().size().unwrap(), 10);
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"0123456789");

        assert_eq!(links.len(), 2);
        assert_eq!(links[0], "<a href='oc-license'>license</a>");
        assert!(links[1].contains("<a href=\"amd64/linux/oc\">oc (amd64 linux)</a>"));
        assert!(links[1].contains("<a href=\"amd64/linux/oc.tar\">tar</a>"));
        assert!(links[1].contains("<a href=\"amd64/linux/oc.zip\">zip</a>"));
    }

    #[test]
    fn license_symlink_points_at_source_root() {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("linux_amd64")).unwrap();
        fs::write(source.path().join("linux_amd64/oc"), b"bin").unwrap();
        fs::write(source.path().join("LICENSE"), b"license").unwrap();

        let root = TempDir::new().unwrap();
        let config = test_config(
            source.path(),
            vec![target("amd64", "linux", "linux_amd64/oc")],
        );
        build_staging(&config, root.path()).unwrap();

        let link = root.path().join(LICENSE_LINK);
        assert_eq!(
            fs::read_link(&link).unwrap(),
            source.path().join("LICENSE")
        );
        assert_eq!(fs::read(&link).unwrap(), b"license");
    }

    #[test]
    fn windows_binaries_lose_their_extension_in_archive_names() {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("windows")).unwrap();
        fs::write(source.path().join("windows/oc.exe"), b"MZ").unwrap();
        fs::write(source.path().join("LICENSE"), b"license").unwrap();

        let root = TempDir::new().unwrap();
        let config = test_config(
            source.path(),
            vec![target("amd64", "windows", "windows/oc.exe")],
        );
        let links = build_staging(&config, root.path()).unwrap();

        let dir = root.path().join("amd64/windows");
        assert!(dir.join("oc.exe").symlink_metadata().unwrap().is_symlink());
        assert!(dir.join("oc.tar").is_file());
        assert!(dir.join("oc.zip").is_file());
        assert!(links[1].contains(">oc (amd64 windows)</a>"));
    }

    #[test]
    fn missing_source_binary_fails_the_build() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("LICENSE"), b"license").unwrap();

        let root = TempDir::new().unwrap();
        let config = test_config(
            source.path(),
            vec![target("amd64", "linux", "linux_amd64/oc")],
        );

        assert!(build_staging(&config, root.path()).is_err());
    }

    #[test]
    fn rebuilding_from_a_stable_source_is_deterministic() {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("linux_amd64")).unwrap();
        fs::write(source.path().join("linux_amd64/oc"), b"stable bytes").unwrap();
        fs::write(source.path().join("LICENSE"), b"license").unwrap();
        let config = test_config(
            source.path(),
            vec![target("amd64", "linux", "linux_amd64/oc")],
        );

        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        build_staging(&config, first.path()).unwrap();
        build_staging(&config, second.path()).unwrap();

        for name in ["amd64/linux/oc.tar", "amd64/linux/oc.zip"] {
            assert_eq!(
                fs::read(first.path().join(name)).unwrap(),
                fs::read(second.path().join(name)).unwrap(),
                "{name} differs between runs"
            );
        }
    }

    #[test]
    fn architecture_directories_are_precreated() {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("linux_amd64")).unwrap();
        fs::write(source.path().join("linux_amd64/oc"), b"bin").unwrap();
        fs::write(source.path().join("LICENSE"), b"license").unwrap();

        let root = TempDir::new().unwrap();
        let mut config = test_config(
            source.path(),
            vec![target("amd64", "linux", "linux_amd64/oc")],
        );
        config.architectures = vec!["amd64".to_string(), "s390x".to_string()];

        build_staging(&config, root.path()).unwrap();
        assert!(root.path().join("s390x").is_dir());
    }
}
