// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! VNF Package Loader
//!
//! Reads an extracted VNF package directory into a [`Vnfd`].
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse package files → Domain `Vnfd`
//! - **Anti-Corruption:** The rest of the engine never touches the filesystem
//!
//! # Package Layout
//!
//! ```text
//! <csar_root>/<vnfd_id>/
//! ├── TOSCA-Metadata/TOSCA.meta
//! ├── Definitions/*.yaml
//! └── BaseHOT/<flavour_id>/
//!     ├── <top>.yaml
//!     └── nested/*.yaml
//! ```
//!
//! A flavour directory holding several top-level YAML files uses the first
//! one in name order.

use crate::domain::template::{BaseHot, HotTemplate};
use crate::domain::vnfd::{Vnfd, VnfdError, VnfdRepository};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const TOSCA_META: &str = "TOSCA-Metadata/TOSCA.meta";
const DEFINITIONS_DIR: &str = "Definitions";
const BASE_HOT_DIR: &str = "BaseHOT";
const NESTED_DIR: &str = "nested";

fn io_error(path: &Path, error: std::io::Error) -> VnfdError {
    VnfdError::IoError {
        path: path.display().to_string(),
        error: error.to_string(),
    }
}

fn is_yaml(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        )
}

fn read_yaml(path: &Path) -> Result<Value, VnfdError> {
    let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    serde_yaml::from_str(&content).map_err(|e| VnfdError::YamlError {
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

/// YAML files directly under `dir`, sorted by file name
fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>, VnfdError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let path = entry.map_err(|e| io_error(dir, e))?.path();
        if is_yaml(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Package directory reader (Infrastructure service)
pub struct VnfdLoader;

impl VnfdLoader {
    /// Load the package extracted at `dir`
    pub fn load_dir(vnfd_id: &str, dir: impl AsRef<Path>) -> Result<Vnfd, VnfdError> {
        let dir = dir.as_ref();

        let meta_path = dir.join(TOSCA_META);
        if !meta_path.is_file() {
            return Err(VnfdError::InvalidFormat(format!(
                "{} not found",
                meta_path.display()
            )));
        }
        let definitions_dir = dir.join(DEFINITIONS_DIR);
        if !definitions_dir.is_dir() {
            return Err(VnfdError::InvalidFormat(format!(
                "{} not found",
                definitions_dir.display()
            )));
        }

        let mut vnfd = Vnfd::new(vnfd_id);
        vnfd.tosca_meta = read_yaml(&meta_path)?;
        for path in yaml_files(&definitions_dir)? {
            vnfd.definitions.insert(file_name(&path), read_yaml(&path)?);
        }
        vnfd.base_hots = Self::load_base_hots(&dir.join(BASE_HOT_DIR))?;

        debug!(
            vnfd_id,
            definitions = vnfd.definitions.len(),
            flavours = ?vnfd.base_hots.keys().collect::<Vec<_>>(),
            "Loaded VNF package"
        );
        Ok(vnfd)
    }

    /// Base templates by flavour; flavours without a top-level YAML file are
    /// left out
    fn load_base_hots(base_dir: &Path) -> Result<BTreeMap<String, BaseHot>, VnfdError> {
        let mut base_hots = BTreeMap::new();
        if !base_dir.is_dir() {
            return Ok(base_hots);
        }

        for entry in fs::read_dir(base_dir).map_err(|e| io_error(base_dir, e))? {
            let flavour_dir = entry.map_err(|e| io_error(base_dir, e))?.path();
            if !flavour_dir.is_dir() {
                continue;
            }
            let Some(top) = yaml_files(&flavour_dir)?.into_iter().next() else {
                continue;
            };
            let template = HotTemplate::from_value(read_yaml(&top)?)?;

            let mut files = BTreeMap::new();
            let nested_dir = flavour_dir.join(NESTED_DIR);
            if nested_dir.is_dir() {
                for path in yaml_files(&nested_dir)? {
                    files.insert(file_name(&path), read_yaml(&path)?);
                }
            }

            base_hots.insert(file_name(&flavour_dir), BaseHot { template, files });
        }
        Ok(base_hots)
    }
}

/// Packages extracted under one root directory, one subdirectory per vnfd id
#[derive(Debug, Clone)]
pub struct CsarDirectoryRepository {
    csar_root: PathBuf,
}

impl CsarDirectoryRepository {
    pub fn new(csar_root: impl Into<PathBuf>) -> Self {
        Self {
            csar_root: csar_root.into(),
        }
    }

    pub fn package_dir(&self, vnfd_id: &str) -> PathBuf {
        self.csar_root.join(vnfd_id)
    }
}

impl VnfdRepository for CsarDirectoryRepository {
    fn load(&self, vnfd_id: &str) -> Result<Vnfd, VnfdError> {
        let dir = self.package_dir(vnfd_id);
        if !dir.is_dir() {
            return Err(VnfdError::PackageNotFound(vnfd_id.to_string()));
        }
        VnfdLoader::load_dir(vnfd_id, dir)
    }
}

/// Already-loaded packages held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryVnfdRepository {
    packages: HashMap<String, Vnfd>,
}

impl InMemoryVnfdRepository {
    pub fn with(mut self, vnfd: Vnfd) -> Self {
        self.insert(vnfd);
        self
    }

    pub fn insert(&mut self, vnfd: Vnfd) {
        self.packages.insert(vnfd.vnfd_id.clone(), vnfd);
    }
}

impl VnfdRepository for InMemoryVnfdRepository {
    fn load(&self, vnfd_id: &str) -> Result<Vnfd, VnfdError> {
        self.packages
            .get(vnfd_id)
            .cloned()
            .ok_or_else(|| VnfdError::PackageNotFound(vnfd_id.to_string()))
    }
}
