//! Runtime configuration: source directory, release targets, listen port.
//!
//! The defaults reproduce the classic oc-mirror layout (`/usr/share/openshift`
//! with one subdirectory per architecture/OS pair). A TOML file can replace
//! any of them:
//!
//! ```toml
//! source_root = "/srv/releases"
//! listen_port = 8080
//! architectures = ["amd64", "arm64"]
//! license_file = "LICENSE"
//!
//! [[target]]
//! arch = "amd64"
//! os = "linux"
//! path = "linux_amd64/oc"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// One prebuilt binary to package: where it lives and which platform it is for.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseTarget {
    pub arch: String,
    pub os: String,
    /// Path of the binary, relative to [`Config::source_root`].
    pub path: PathBuf,
}

/// Full program configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Directory holding the prebuilt binaries and the license file.
    pub source_root: PathBuf,
    /// TCP port the static file server binds on.
    pub listen_port: u16,
    /// Architectures that get a top-level staging directory.
    pub architectures: Vec<String>,
    /// License file, relative to `source_root`.
    pub license_file: PathBuf,
    /// Binaries to package, in the order they appear on the index page.
    #[serde(rename = "target")]
    pub targets: Vec<ReleaseTarget>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("/usr/share/openshift"),
            listen_port: 8080,
            architectures: ["amd64", "arm64", "ppc64le", "s390x"]
                .iter()
                .map(|arch| arch.to_string())
                .collect(),
            license_file: PathBuf::from("LICENSE"),
            targets: vec![
                oc_target("amd64", "linux", "linux_amd64/oc"),
                oc_target("amd64", "mac", "mac/oc"),
                oc_target("amd64", "windows", "windows/oc.exe"),
                oc_target("arm64", "linux", "linux_arm64/oc"),
                oc_target("arm64", "mac", "mac_arm64/oc"),
                oc_target("ppc64le", "linux", "linux_ppc64le/oc"),
                oc_target("s390x", "linux", "linux_s390x/oc"),
            ],
        }
    }
}

fn oc_target(arch: &str, os: &str, path: &str) -> ReleaseTarget {
    ReleaseTarget {
        arch: arch.to_string(),
        os: os.to_string(),
        path: PathBuf::from(path),
    }
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing config '{}'", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config '{}'", path.display()))?;
        Ok(config)
    }

    /// Check internal consistency.
    ///
    /// Every target must name an architecture from the architecture list and
    /// carry a relative path with a file name; (arch, os) pairs must be
    /// unique since they map to a single staging directory.
    pub fn validate(&self) -> Result<()> {
        if self.architectures.is_empty() {
            bail!("architecture list is empty");
        }
        if self.targets.is_empty() {
            bail!("target list is empty");
        }

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for target in &self.targets {
            if target.path.is_absolute() {
                bail!(
                    "target path '{}' must be relative to source_root '{}'",
                    target.path.display(),
                    self.source_root.display()
                );
            }
            if target.path.file_name().is_none() {
                bail!("target path '{}' has no file name", target.path.display());
            }
            if !self.architectures.iter().any(|arch| *arch == target.arch) {
                bail!(
                    "target '{}/{}' names architecture '{}' missing from the architecture list",
                    target.arch,
                    target.os,
                    target.arch
                );
            }
            if !seen.insert((target.arch.as_str(), target.os.as_str())) {
                bail!("duplicate target for '{}/{}'", target.arch, target.os);
            }
        }
        Ok(())
    }

    /// Absolute path of a target's prebuilt binary.
    pub fn source_path(&self, target: &ReleaseTarget) -> PathBuf {
        self.source_root.join(&target.path)
    }

    /// Absolute path of the license file.
    pub fn license_path(&self) -> PathBuf {
        self.source_root.join(&self.license_file)
    }
}
