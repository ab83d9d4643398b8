use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::ground::{GroundPoint, GroundPointError};
use crate::orbit::OrbitModel;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TLE directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid TLE in {file}: {message}")]
    InvalidTle { file: String, message: String },
    #[error("invalid station file {file}: {message}")]
    InvalidStation { file: String, message: String },
    #[error(transparent)]
    GroundPoint(#[from] GroundPointError),
}

/// The set of tracked objects, one immutable OrbitModel per NORAD id.
/// Re-supplying an element set replaces the model wholesale; nothing is
/// patched in place.
pub struct Catalog {
    tle_dir: PathBuf,
    objects: HashMap<u32, Arc<OrbitModel>>,
}

impl Catalog {
    pub fn new(tle_dir: PathBuf) -> Self {
        Self {
            tle_dir,
            objects: HashMap::new(),
        }
    }

    /// Load every `.tle`/`.txt` file under the directory. A file that fails
    /// to parse is logged and skipped; it never takes the rest of the
    /// catalog down with it.
    pub fn load_all(&mut self) -> Result<(), CatalogError> {
        if !self.tle_dir.exists() {
            return Err(CatalogError::DirectoryNotFound(
                self.tle_dir.display().to_string(),
            ));
        }

        self.objects.clear();

        for entry in fs::read_dir(&self.tle_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_tle = path
                .extension()
                .map(|ext| ext == "tle" || ext == "txt")
                .unwrap_or(false);
            if !is_tle {
                continue;
            }

            match self.load_file(&path) {
                Ok(count) => {
                    log::debug!("loaded {count} objects from {}", path.display());
                }
                Err(e) => {
                    log::warn!("skipping TLE file {}: {e}", path.display());
                }
            }
        }

        Ok(())
    }

    fn load_file(&mut self, path: &Path) -> Result<usize, CatalogError> {
        let content = fs::read_to_string(path)?;
        let file = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let mut count = 0;
        for (name, line1, line2) in split_tle_groups(&content) {
            let model = OrbitModel::from_tle(name, &line1, &line2).map_err(|e| {
                CatalogError::InvalidTle {
                    file: file.clone(),
                    message: e.to_string(),
                }
            })?;
            self.objects.insert(model.norad_id(), Arc::new(model));
            count += 1;
        }

        Ok(count)
    }

    pub fn objects(&self) -> impl Iterator<Item = &Arc<OrbitModel>> {
        self.objects.values()
    }

    pub fn get(&self, norad_id: u32) -> Option<&Arc<OrbitModel>> {
        self.objects.get(&norad_id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Split raw TLE text into (name, line1, line2) groups. Handles both the
/// 2-line and named 3-line forms, multiple objects per file, and stray blank
/// lines.
fn split_tle_groups(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut groups = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let is_pair = |a: usize, b: usize| {
            b < lines.len() && lines[a].starts_with("1 ") && lines[b].starts_with("2 ")
        };

        if is_pair(i, i + 1) {
            groups.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len() && is_pair(i + 1, i + 2) {
            groups.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    groups
}

#[derive(Debug, Deserialize)]
struct StationFile {
    name: Option<String>,
    latitude_deg: f64,
    longitude_deg: f64,
    #[serde(default)]
    height_m: f64,
}

/// Load a ground point from a YAML station file.
pub fn load_station(path: &Path) -> Result<GroundPoint, CatalogError> {
    let content = fs::read_to_string(path)?;
    let station: StationFile =
        serde_yaml::from_str(&content).map_err(|e| CatalogError::InvalidStation {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;

    Ok(GroundPoint::new(
        station.latitude_deg,
        station.longitude_deg,
        station.height_m,
        station.name,
    )?)
}
