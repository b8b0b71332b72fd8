//! Document store abstraction.
//!
//! The presentation platform owns the documents; the filler only asks it to copy a
//! template, read back the slide list, substitute text and duplicate or delete slides.
//! [`memory::MemoryDocumentStore`] backs tests and local previews,
//! [`google::GoogleSlidesStore`] talks to Google Drive and Google Slides.

pub mod google;
pub mod memory;

use crate::error::FillResult;
use crate::resolve::Replacement;
use filler_types::{DocumentId, SlideId};
use serde::{Deserialize, Serialize};

/// A slide and the plain text it currently shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub id: SlideId,
    #[serde(default)]
    pub text: String,
}

impl Slide {
    pub fn contains(&self, token: &str) -> bool {
        self.text.contains(token)
    }
}

/// A snapshot of a document as returned by [`DocumentStore::open_document`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl Document {
    /// First slide whose text contains `marker`.
    pub fn find_slide(&self, marker: &str) -> Option<&Slide> {
        self.slides.iter().find(|slide| slide.contains(marker))
    }
}

/// Operations the filler needs from a presentation platform.
///
/// All calls block until the platform has applied the change.
pub trait DocumentStore: Send + Sync {
    /// Copy `template` to a new document called `name` and return the copy's id.
    fn copy_document(&self, template: &DocumentId, name: &str) -> FillResult<DocumentId>;

    /// Read the current state of a document.
    fn open_document(&self, id: &DocumentId) -> FillResult<Document>;

    /// Replace every occurrence of each token across the whole document.
    fn replace_all_text(&self, id: &DocumentId, replacements: &[Replacement]) -> FillResult<()>;

    /// Replace tokens on a single slide only.
    fn replace_slide_text(
        &self,
        id: &DocumentId,
        slide: &SlideId,
        replacements: &[Replacement],
    ) -> FillResult<()>;

    /// Duplicate a slide. The copy is inserted immediately after `slide`.
    fn duplicate_slide(&self, id: &DocumentId, slide: &SlideId) -> FillResult<SlideId>;

    fn remove_slide(&self, id: &DocumentId, slide: &SlideId) -> FillResult<()>;
}
