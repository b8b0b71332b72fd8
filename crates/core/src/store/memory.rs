//! In-process document store.
//!
//! Documents live in a map behind a mutex. A document can be loaded from, and written
//! back to, a JSON "deck" file so a template can be previewed without a presentation
//! platform.

use super::{Document, DocumentStore, Slide};
use crate::error::{FillError, FillResult};
use crate::resolve::Replacement;
use filler_types::{DocumentId, SlideId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<DocumentId, Document>>,
}

fn fresh_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a document.
    pub fn insert(&self, document: Document) {
        self.lock().insert(document.id.clone(), document);
    }

    /// Load a deck file and add it to the store, returning its id.
    pub fn load_deck(&self, path: &Path) -> FillResult<DocumentId> {
        let contents = std::fs::read_to_string(path).map_err(FillError::FileRead)?;
        let mut de = serde_json::Deserializer::from_str(&contents);
        let document: Document =
            serde_path_to_error::deserialize(&mut de).map_err(|e| FillError::DeckDecode {
                path: e.path().to_string(),
                source: e.into_inner(),
            })?;
        let id = document.id.clone();
        self.insert(document);
        Ok(id)
    }

    /// Serialise a stored document as a pretty-printed deck.
    pub fn deck_json(&self, id: &DocumentId) -> FillResult<String> {
        let document = self.open_document(id)?;
        serde_json::to_string_pretty(&document).map_err(FillError::Serialization)
    }

    /// Number of documents held, templates included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DocumentId, Document>> {
        // A panic while holding the lock leaves the map itself consistent.
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_document<T>(
        &self,
        id: &DocumentId,
        f: impl FnOnce(&mut Document) -> FillResult<T>,
    ) -> FillResult<T> {
        let mut documents = self.lock();
        let document = documents
            .get_mut(id)
            .ok_or_else(|| FillError::DocumentNotFound(id.to_string()))?;
        f(document)
    }
}

fn slide_index(document: &Document, slide: &SlideId) -> FillResult<usize> {
    document
        .slides
        .iter()
        .position(|s| &s.id == slide)
        .ok_or_else(|| FillError::SlideNotFound {
            document: document.id.to_string(),
            slide: slide.to_string(),
        })
}

fn apply_all(text: &mut String, replacements: &[Replacement]) {
    for replacement in replacements {
        *text = replacement.apply(text);
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn copy_document(&self, template: &DocumentId, name: &str) -> FillResult<DocumentId> {
        let mut documents = self.lock();
        let source = documents
            .get(template)
            .ok_or_else(|| FillError::DocumentNotFound(template.to_string()))?;

        let id = DocumentId::new(fresh_id())?;
        let copy = Document {
            id: id.clone(),
            name: name.to_owned(),
            slides: source.slides.clone(),
        };
        documents.insert(id.clone(), copy);
        Ok(id)
    }

    fn open_document(&self, id: &DocumentId) -> FillResult<Document> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| FillError::DocumentNotFound(id.to_string()))
    }

    fn replace_all_text(&self, id: &DocumentId, replacements: &[Replacement]) -> FillResult<()> {
        self.with_document(id, |document| {
            for slide in &mut document.slides {
                apply_all(&mut slide.text, replacements);
            }
            Ok(())
        })
    }

    fn replace_slide_text(
        &self,
        id: &DocumentId,
        slide: &SlideId,
        replacements: &[Replacement],
    ) -> FillResult<()> {
        self.with_document(id, |document| {
            let index = slide_index(document, slide)?;
            apply_all(&mut document.slides[index].text, replacements);
            Ok(())
        })
    }

    fn duplicate_slide(&self, id: &DocumentId, slide: &SlideId) -> FillResult<SlideId> {
        self.with_document(id, |document| {
            let index = slide_index(document, slide)?;
            let copy = Slide {
                id: SlideId::new(fresh_id())?,
                text: document.slides[index].text.clone(),
            };
            let copy_id = copy.id.clone();
            document.slides.insert(index + 1, copy);
            Ok(copy_id)
        })
    }

    fn remove_slide(&self, id: &DocumentId, slide: &SlideId) -> FillResult<()> {
        self.with_document(id, |document| {
            let index = slide_index(document, slide)?;
            document.slides.remove(index);
            Ok(())
        })
    }
}
