//! # Filler Core
//!
//! Core logic for turning a patient record into a filled slide deck.
//!
//! This crate contains the record schema and the template-filling operation:
//! - Typed patient records with per-field fallbacks
//! - Next-visit date and BMI calculation
//! - The placeholder mapping table and exam-slide expansion
//! - Document store and record source adapters (Google Slides, HTTP, files, memory)
//! - Free-text history extraction into a record envelope
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest`,
//! `api-shared` or the CLI.

pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod extraction;
pub mod filler;
pub mod measures;
pub mod record;
pub mod resolve;
pub mod source;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::FillerConfig;
pub use error::{FillError, FillResult};
pub use filler::{FilledDocument, TemplateFiller};
pub use filler_types::{DocumentId, NonEmptyText, Placeholder, SlideId, TextError};
pub use record::{ExamEntry, FieldValue, PatientRecord};
pub use source::{FileRecordSource, HttpRecordSource, RecordSource};
pub use store::google::GoogleSlidesStore;
pub use store::memory::MemoryDocumentStore;
pub use store::{Document, DocumentStore, Slide};

/// Today's date in the local time zone, the reference for next-visit dates.
pub fn local_today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
