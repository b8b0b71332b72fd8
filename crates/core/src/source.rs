//! Record sources for the pull trigger.
//!
//! The remote store answers with one JSON object keyed by patient name; the configured
//! key selects the record to fill. A selected member may be a bare record or a
//! `{"data": ...}` envelope like the one the push endpoint receives.

use crate::config::FillerConfig;
use crate::error::{FillError, FillResult};
use crate::record::PatientRecord;
use reqwest::blocking::Client;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Somewhere a single patient record can be fetched from.
pub trait RecordSource: Send + Sync {
    fn fetch(&self) -> FillResult<PatientRecord>;
}

/// Pick the record out of a source document.
pub fn select_record(document: Value, key: Option<&str>) -> FillResult<PatientRecord> {
    let selected = match key {
        Some(key) => match document {
            Value::Object(mut members) => members
                .remove(key)
                .filter(|v| !v.is_null())
                .ok_or_else(|| FillError::RecordNotFound(key.to_owned()))?,
            _ => return Err(FillError::RecordNotFound(key.to_owned())),
        },
        None => document,
    };

    match selected {
        Value::Object(ref members) if members.len() == 1 && members.contains_key("data") => {
            PatientRecord::from_envelope(&selected)
        }
        other => PatientRecord::from_value(other),
    }
}

/// Fetches records with a plain GET, e.g. a Realtime Database REST endpoint ending in
/// `.json`.
pub struct HttpRecordSource {
    client: Client,
    url: String,
    key: Option<String>,
}

impl HttpRecordSource {
    pub fn new(client: Client, url: impl Into<String>, key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            key,
        }
    }

    /// Build a source from the configured URL and key.
    pub fn from_config(cfg: &FillerConfig) -> FillResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs()))
            .build()
            .map_err(FillError::RecordRequest)?;
        Ok(Self::new(
            client,
            cfg.record_source_url()?,
            cfg.record_key().map(str::to_owned),
        ))
    }
}

impl RecordSource for HttpRecordSource {
    fn fetch(&self) -> FillResult<PatientRecord> {
        tracing::info!("fetching record from {}", self.url);
        let res = self
            .client
            .get(&self.url)
            .send()
            .map_err(FillError::RecordRequest)?;

        let status = res.status();
        if !status.is_success() {
            return Err(FillError::RecordStatus {
                status: status.as_u16(),
                body: res.text().unwrap_or_default(),
            });
        }

        let body = res.text().map_err(FillError::RecordRequest)?;
        let document: Value =
            serde_json::from_str(&body).map_err(|source| FillError::RecordDecode {
                path: ".".into(),
                source,
            })?;
        select_record(document, self.key.as_deref())
    }
}

/// Reads a record from a JSON file on disk.
pub struct FileRecordSource {
    path: PathBuf,
    key: Option<String>,
}

impl FileRecordSource {
    pub fn new(path: impl Into<PathBuf>, key: Option<String>) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }
}

impl RecordSource for FileRecordSource {
    fn fetch(&self) -> FillResult<PatientRecord> {
        let contents = std::fs::read_to_string(&self.path).map_err(FillError::FileRead)?;
        let document: Value =
            serde_json::from_str(&contents).map_err(|source| FillError::RecordDecode {
                path: ".".into(),
                source,
            })?;
        select_record(document, self.key.as_deref())
    }
}
