// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration of the asset manager.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for an [`AssetManager`](crate::AssetManager).
///
/// Missing fields in a RON document take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManagerConfig {
    /// Directory that asset locations are relative to.
    pub asset_root: PathBuf,
    /// Extension (without the dot) of bulk archive files.
    pub archive_extension: String,
    /// Number of background loader threads. Values below one are treated as one.
    pub worker_threads: usize,
}

impl Default for AssetManagerConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            archive_extension: "gcag".to_string(),
            worker_threads: 2,
        }
    }
}

impl AssetManagerConfig {
    /// Parses a configuration from a RON document.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).context("Failed to parse asset manager configuration")
    }

    /// Reads a configuration from a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_ron_str(&source)
    }

    /// Resolves a location path against the asset root.
    ///
    /// Falls back to the path as given when the joined path does not exist.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let joined = self.asset_root.join(path);
        if joined.exists() {
            joined
        } else {
            path.to_path_buf()
        }
    }

    /// Returns `true` if `extension` names a bulk archive.
    pub fn is_archive_extension(&self, extension: &str) -> bool {
        extension
            .trim_start_matches('.')
            .eq_ignore_ascii_case(&self.archive_extension)
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.worker_threads.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = AssetManagerConfig::from_ron_str("(worker_threads: 4)").unwrap();
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.asset_root, PathBuf::from("assets"));
        assert_eq!(config.archive_extension, "gcag");
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        assert!(AssetManagerConfig::from_ron_str("(worker_threads: \"many\")").is_err());
    }

    #[test]
    fn test_archive_extension_matching() {
        let config = AssetManagerConfig::default();
        assert!(config.is_archive_extension("GCAG"));
        assert!(config.is_archive_extension(".gcag"));
        assert!(!config.is_archive_extension("gmat"));
    }

    #[test]
    fn test_worker_count_has_a_floor() {
        let config = AssetManagerConfig {
            worker_threads: 0,
            ..AssetManagerConfig::default()
        };
        assert_eq!(config.worker_count(), 1);
    }

    #[test]
    fn test_resolve_falls_back_to_raw_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.gmat"), b"").unwrap();
        let config = AssetManagerConfig {
            asset_root: dir.path().to_path_buf(),
            ..AssetManagerConfig::default()
        };
        assert_eq!(config.resolve(Path::new("a.gmat")), dir.path().join("a.gmat"));
        assert_eq!(config.resolve(Path::new("b.gmat")), PathBuf::from("b.gmat"));
    }
}
