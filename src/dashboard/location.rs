//! Where the dashboard looks: command line, saved location, or the default

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::gtfs::Coordinates;

/// Times Sq - 42 St.
pub const DEFAULT_COORDINATES: Coordinates = Coordinates {
    lat: 40.7589545,
    lon: -73.9849801,
};

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("failed to write location file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid coordinates {lat}, {lon}")]
    Invalid { lat: f64, lon: f64 },
}

/// Last known coordinates, persisted as a small JSON file
#[derive(Debug, Clone)]
pub struct LocationStore {
    path: PathBuf,
}

impl LocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved coordinates. Missing or unreadable files count as unset.
    pub fn load(&self) -> Option<Coordinates> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Coordinates>(&contents) {
            Ok(coordinates) if is_valid(coordinates) => Some(coordinates),
            Ok(_) => None,
            Err(e) => {
                debug!("Ignoring location file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, coordinates: Coordinates) -> Result<(), LocationError> {
        if !is_valid(coordinates) {
            return Err(LocationError::Invalid {
                lat: coordinates.lat,
                lon: coordinates.lon,
            });
        }

        let write_error = |source| LocationError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let json = serde_json::to_string(&coordinates)
            .map_err(|e| write_error(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        fs::write(&self.path, json).map_err(write_error)
    }
}

/// Pick the coordinates to show. Command-line coordinates win and are
/// remembered for the next run.
pub fn resolve(cli: Option<Coordinates>, store: &LocationStore) -> Result<Coordinates, LocationError> {
    match cli {
        Some(coordinates) => {
            store.save(coordinates)?;
            Ok(coordinates)
        }
        None => Ok(store.load().unwrap_or(DEFAULT_COORDINATES)),
    }
}

fn is_valid(coordinates: Coordinates) -> bool {
    (-90.0..=90.0).contains(&coordinates.lat) && (-180.0..=180.0).contains(&coordinates.lon)
}
