//! Line-by-line service status from the MTA status XML

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_SERVICE_STATUS_URL: &str = "http://web.mta.info/status/serviceStatus.txt";

/// `<timestamp>` layout, in New York local time.
const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

#[derive(Deserialize, Debug)]
struct StatusDocument {
    timestamp: String,
    #[serde(default)]
    subway: SubwayLines,
}

#[derive(Deserialize, Debug, Default)]
struct SubwayLines {
    #[serde(rename = "line", default)]
    lines: Vec<SubwayLine>,
}

#[derive(Deserialize, Debug)]
struct SubwayLine {
    name: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStatus {
    #[serde(rename = "Line")]
    pub line: String,
    #[serde(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "Updated")]
    pub updated: DateTime<Utc>,
    #[serde(rename = "Status")]
    pub status: Vec<LineStatus>,
}

/// Parse a `serviceStatus.txt` document. Only the subway lines are read.
pub fn parse_service_status(xml: &str) -> Result<Service> {
    let document: StatusDocument = quick_xml::de::from_str(xml).map_err(Error::StatusDecode)?;
    let updated = parse_timestamp(&document.timestamp)?;

    let status = document
        .subway
        .lines
        .into_iter()
        .map(|line| LineStatus {
            line: line.name.trim().to_string(),
            status: title_case(&line.status),
        })
        .collect();

    Ok(Service { updated, status })
}

/// `10/16/2026 3:04:05 PM` in New York, as UTC.
pub fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>> {
    let invalid = || Error::StatusTimestamp(timestamp.to_string());
    let local = NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| invalid())?;
    New_York
        .from_local_datetime(&local)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// `GOOD SERVICE` -> `Good Service`
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct ServiceStatusClient {
    http: reqwest::Client,
    url: String,
}

impl ServiceStatusClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<Service> {
        let body = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(Error::StatusRequest)?
            .text()
            .await
            .map_err(Error::StatusRequest)?;

        debug!("Service status: received {} bytes", body.len());
        parse_service_status(&body)
    }
}
