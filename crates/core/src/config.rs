//! Runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the filler,
//! the record sources and the document stores. Nothing below the binaries reads process
//! environment variables; [`FillerConfig::from_lookup`] takes the lookup as a closure so
//! the parsing rules can be exercised with a plain map in tests.

use crate::constants::{
    DEFAULT_DRIVE_API_BASE, DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_SLIDES_API_BASE,
};
use crate::error::{FillError, FillResult};
use filler_types::{DocumentId, NonEmptyText};

pub const ENV_TEMPLATE_ID: &str = "SLIDES_TEMPLATE_ID";
pub const ENV_RECORD_SOURCE_URL: &str = "RECORD_SOURCE_URL";
pub const ENV_RECORD_KEY: &str = "RECORD_KEY";
pub const ENV_GOOGLE_ACCESS_TOKEN: &str = "GOOGLE_ACCESS_TOKEN";
pub const ENV_DRIVE_FOLDER_ID: &str = "DRIVE_FOLDER_ID";
pub const ENV_DRIVE_API_BASE: &str = "DRIVE_API_BASE";
pub const ENV_SLIDES_API_BASE: &str = "SLIDES_API_BASE";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ENV_GEMINI_API_BASE: &str = "GEMINI_API_BASE";
pub const ENV_FILLER_API_KEY: &str = "FILLER_API_KEY";

/// Configuration resolved at startup.
///
/// Values only some commands need (the record URL for pulls, the Gemini key for
/// extraction) are optional here and checked by their accessors.
#[derive(Clone, Debug)]
pub struct FillerConfig {
    template_id: Option<DocumentId>,
    record_source_url: Option<NonEmptyText>,
    record_key: Option<NonEmptyText>,
    google_access_token: Option<NonEmptyText>,
    drive_folder_id: Option<NonEmptyText>,
    drive_api_base: String,
    slides_api_base: String,
    http_timeout_secs: u64,
    gemini_api_key: Option<NonEmptyText>,
    gemini_model: String,
    gemini_api_base: String,
    api_key: Option<NonEmptyText>,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            template_id: None,
            record_source_url: None,
            record_key: None,
            google_access_token: None,
            drive_folder_id: None,
            drive_api_base: DEFAULT_DRIVE_API_BASE.into(),
            slides_api_base: DEFAULT_SLIDES_API_BASE.into(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.into(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.into(),
            api_key: None,
        }
    }
}

/// Treat unset and blank values the same way.
fn optional_text(value: Option<String>) -> Option<NonEmptyText> {
    value.and_then(|v| NonEmptyText::new(v).ok())
}

impl FillerConfig {
    /// Resolve configuration through `lookup`, usually `|k| std::env::var(k).ok()`.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `HTTP_TIMEOUT_SECS` is not a positive integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FillResult<Self> {
        let defaults = Self::default();

        let http_timeout_secs = match optional_text(lookup(ENV_HTTP_TIMEOUT_SECS)) {
            Some(raw) => raw
                .as_str()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    FillError::InvalidInput(format!(
                        "{ENV_HTTP_TIMEOUT_SECS} must be a positive integer, got {raw}"
                    ))
                })?,
            None => defaults.http_timeout_secs,
        };

        Ok(Self {
            template_id: optional_text(lookup(ENV_TEMPLATE_ID))
                .map(DocumentId::new)
                .transpose()?,
            record_source_url: optional_text(lookup(ENV_RECORD_SOURCE_URL)),
            record_key: optional_text(lookup(ENV_RECORD_KEY)),
            google_access_token: optional_text(lookup(ENV_GOOGLE_ACCESS_TOKEN)),
            drive_folder_id: optional_text(lookup(ENV_DRIVE_FOLDER_ID)),
            drive_api_base: optional_text(lookup(ENV_DRIVE_API_BASE))
                .map(|v| v.as_str().to_owned())
                .unwrap_or(defaults.drive_api_base),
            slides_api_base: optional_text(lookup(ENV_SLIDES_API_BASE))
                .map(|v| v.as_str().to_owned())
                .unwrap_or(defaults.slides_api_base),
            http_timeout_secs,
            gemini_api_key: optional_text(lookup(ENV_GEMINI_API_KEY)),
            gemini_model: optional_text(lookup(ENV_GEMINI_MODEL))
                .map(|v| v.as_str().to_owned())
                .unwrap_or(defaults.gemini_model),
            gemini_api_base: optional_text(lookup(ENV_GEMINI_API_BASE))
                .map(|v| v.as_str().to_owned())
                .unwrap_or(defaults.gemini_api_base),
            api_key: optional_text(lookup(ENV_FILLER_API_KEY)),
        })
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> FillResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Override the template id, e.g. from a command-line flag.
    pub fn with_template_id(mut self, template_id: DocumentId) -> Self {
        self.template_id = Some(template_id);
        self
    }

    pub fn template_id(&self) -> FillResult<&DocumentId> {
        self.template_id
            .as_ref()
            .ok_or_else(|| missing(ENV_TEMPLATE_ID))
    }

    pub fn record_source_url(&self) -> FillResult<&str> {
        self.record_source_url
            .as_ref()
            .map(NonEmptyText::as_str)
            .ok_or_else(|| missing(ENV_RECORD_SOURCE_URL))
    }

    pub fn record_key(&self) -> Option<&str> {
        self.record_key.as_ref().map(NonEmptyText::as_str)
    }

    pub fn google_access_token(&self) -> FillResult<&str> {
        self.google_access_token
            .as_ref()
            .map(NonEmptyText::as_str)
            .ok_or_else(|| missing(ENV_GOOGLE_ACCESS_TOKEN))
    }

    pub fn drive_folder_id(&self) -> Option<&str> {
        self.drive_folder_id.as_ref().map(NonEmptyText::as_str)
    }

    pub fn drive_api_base(&self) -> &str {
        &self.drive_api_base
    }

    pub fn slides_api_base(&self) -> &str {
        &self.slides_api_base
    }

    pub fn http_timeout_secs(&self) -> u64 {
        self.http_timeout_secs
    }

    pub fn gemini_api_key(&self) -> FillResult<&str> {
        self.gemini_api_key
            .as_ref()
            .map(NonEmptyText::as_str)
            .ok_or_else(|| missing(ENV_GEMINI_API_KEY))
    }

    pub fn gemini_model(&self) -> &str {
        &self.gemini_model
    }

    pub fn gemini_api_base(&self) -> &str {
        &self.gemini_api_base
    }

    /// Shared secret required on pushed fills, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(NonEmptyText::as_str)
    }
}

fn missing(var: &str) -> FillError {
    FillError::InvalidInput(format!("{var} is not set"))
}
