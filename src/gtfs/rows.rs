//! Raw GTFS static rows

use std::{fs::File, path::Path};

use serde::{de::DeserializeOwned, Deserialize};

use crate::error::{Error, Result};

#[derive(Deserialize, Debug, Clone)]
pub struct StopRow {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    #[serde(default)]
    pub location_type: Option<u8>,
    #[serde(default)]
    pub parent_station: Option<String>,
}

impl StopRow {
    /// Directional platforms (`635N`) point at their parent; only parents
    /// are kept.
    pub fn is_parent(&self) -> bool {
        self.parent_station.as_deref().map_or(true, str::is_empty)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TransferRow {
    pub from_stop_id: String,
    pub to_stop_id: String,
    #[serde(default)]
    pub transfer_type: Option<u8>,
    #[serde(default)]
    pub min_transfer_time: Option<u32>,
}

/// Read every row of a GTFS CSV file.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;

    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file)
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|source| Error::Csv {
            path: path.to_path_buf(),
            source,
        })
}
