//! Scan configuration, loaded from YAML.

use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/scanner.yaml";

/// Which export pages are turned into page records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Titles starting with any of these are skipped as special pages.
    pub special_page_prefixes: Vec<String>,
    pub skip_redirects: bool,
    /// Skip pages whose `<ns>` is present and not `0`.
    pub main_namespace_only: bool,
    /// Pages whose normalized lead text is shorter than this (in
    /// characters, after trimming) are skipped. `0` keeps everything.
    pub min_lead_chars: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            special_page_prefixes: [
                "Wikipedia:",
                "MediaWiki:",
                "Module:",
                "Help:",
                "Template:",
                "Portal:",
                "Draft:",
                "File:",
                "Category:",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            skip_redirects: true,
            main_namespace_only: true,
            min_lead_chars: 0,
        }
    }
}

impl ScanConfig {
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        Self::from_yaml(&contents)
    }

    /// Load `path` if given, else the default location if it exists, else
    /// built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            log::debug!("Using scan config {}", default.display());
            Self::load(&default)
        } else {
            Ok(Self::default())
        }
    }

    pub fn is_special_title(&self, title: &str) -> bool {
        self.special_page_prefixes
            .iter()
            .any(|prefix| title.starts_with(prefix.as_str()))
    }
}
