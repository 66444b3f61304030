//! Third-party package metadata shown on the about screen.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::Result;

/// Resolves a license identifier to its full text.
pub trait LicenseAccess: Send + Sync {
    fn license_text(&self, license_id: &str) -> Option<String>;
}

/// License texts stored as `<id>.txt` in one directory
#[derive(Debug, Clone)]
pub struct LicenseDir {
    dir: PathBuf,
}

impl LicenseDir {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl LicenseAccess for LicenseDir {
    fn license_text(&self, license_id: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.join(format!("{license_id}.txt"))).ok()
    }
}

#[derive(Deserialize)]
struct RawPackage {
    name: String,
    vendor: String,
    license: String,
    url: String,
    copyright: String,
    icon: String,
}

pub struct PackageInfo {
    pub name: String,
    pub vendor: String,
    pub license_id: String,
    pub url: String,
    pub copyright: String,
    pub icon_name: String,
    license: OnceLock<Option<String>>,
    access: Arc<dyn LicenseAccess>,
}

impl PackageInfo {
    /// Parse one package object. Every field is a required string; anything
    /// else yields `None` and a warning.
    pub fn from_json(value: &Value, access: Arc<dyn LicenseAccess>) -> Option<Self> {
        let raw = match RawPackage::deserialize(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Error reading package definition: {e}");
                return None;
            }
        };

        Some(Self {
            name: raw.name,
            vendor: raw.vendor,
            license_id: raw.license,
            url: raw.url,
            copyright: raw.copyright,
            icon_name: raw.icon,
            license: OnceLock::new(),
            access,
        })
    }

    /// Full license text, looked up on first use.
    pub fn license(&self) -> Option<&str> {
        self.license
            .get_or_init(|| self.access.license_text(&self.license_id))
            .as_deref()
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "vendor": self.vendor,
            "license": self.license_id,
            "url": self.url,
            "copyright": self.copyright,
            "icon": self.icon_name,
            "licenseText": self.license(),
        })
    }
}

impl fmt::Debug for PackageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageInfo")
            .field("name", &self.name)
            .field("vendor", &self.vendor)
            .field("license_id", &self.license_id)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Load every well-formed package from a JSON array file; malformed entries
/// are skipped. A missing file yields no packages.
///
/// # Errors
///
/// Returns an error if the file exists but is not readable JSON.
pub fn load_packages(path: &Path, access: &Arc<dyn LicenseAccess>) -> Result<Vec<PackageInfo>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    let Value::Array(items) = value else {
        warn!("{} does not hold a package list", path.display());
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter_map(|item| PackageInfo::from_json(item, Arc::clone(access)))
        .collect())
}
