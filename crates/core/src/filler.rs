//! Template filling.
//!
//! [`TemplateFiller::fill`] is the single operation behind both triggers: copy the
//! template, substitute every document-wide placeholder, then expand the prototype exam
//! slide into one slide per complementary exam and drop the prototype.

use crate::constants::EXAM_PROTOTYPE_MARKER;
use crate::error::{FillError, FillResult};
use crate::record::PatientRecord;
use crate::resolve::{display_name, exam_replacements, global_replacements};
use crate::store::DocumentStore;
use chrono::NaiveDate;
use filler_types::{DocumentId, SlideId};
use std::sync::Arc;

/// The outcome of a fill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilledDocument {
    /// Id of the new document.
    pub id: DocumentId,
    /// Name given to the copy.
    pub name: String,
    /// Exam slides in record order.
    pub exam_slides: Vec<SlideId>,
}

#[derive(Clone)]
pub struct TemplateFiller {
    store: Arc<dyn DocumentStore>,
}

impl TemplateFiller {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fill `template` with `record`, using `today` for the next-visit date.
    ///
    /// The replacement table is built before anything is copied, so a record missing a
    /// group fails without leaving a half-filled document behind.
    ///
    /// # Errors
    /// Returns a `FillError` if:
    /// - the record lacks a required group,
    /// - the template has no prototype exam slide but the record lists exams,
    /// - any document store call fails.
    pub fn fill(
        &self,
        record: &PatientRecord,
        template: &DocumentId,
        today: NaiveDate,
    ) -> FillResult<FilledDocument> {
        let replacements = global_replacements(record, today)?;
        let per_exam = record
            .exams()
            .iter()
            .map(exam_replacements)
            .collect::<FillResult<Vec<_>>>()?;
        let name = display_name(record);

        tracing::info!("filling template {} for {}", template, name);

        let id = self.store.copy_document(template, &name)?;
        let document = self.store.open_document(&id)?;
        self.store.replace_all_text(&id, &replacements)?;

        let prototype = document
            .find_slide(EXAM_PROTOTYPE_MARKER)
            .map(|slide| slide.id.clone());

        let exam_slides = match prototype {
            Some(prototype) => {
                // Each duplicate lands right after the prototype, so walking the exams
                // backwards leaves them in record order.
                let mut slides = Vec::with_capacity(per_exam.len());
                for exam in per_exam.iter().rev() {
                    let slide = self.store.duplicate_slide(&id, &prototype)?;
                    self.store.replace_slide_text(&id, &slide, exam)?;
                    slides.push(slide);
                }
                slides.reverse();
                self.store.remove_slide(&id, &prototype)?;
                slides
            }
            None if per_exam.is_empty() => Vec::new(),
            None => return Err(FillError::PrototypeSlideNotFound(EXAM_PROTOTYPE_MARKER)),
        };

        tracing::info!(
            "filled document {} ({}) with {} exam slide(s)",
            id,
            name,
            exam_slides.len()
        );

        Ok(FilledDocument {
            id,
            name,
            exam_slides,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryDocumentStore;
    use crate::store::{Document, Slide};
    use serde_json::json;

    const TEMPLATE: &str = "template";

    fn slide(id: &str, text: &str) -> Slide {
        Slide {
            id: SlideId::new(id).unwrap(),
            text: text.into(),
        }
    }

    fn template_slides() -> Vec<Slide> {
        vec![
            slide("capa", "Próxima visita: {{data_semana_que_vem}}"),
            slide("id", "{{nome}}, {{idade}} anos, {{sexo}}"),
            slide(
                "anamnese",
                "QP: {{queixa_principal}}\n{{retorno1_data}} {{retorno1_info}}",
            ),
            slide(
                "antecedentes",
                "Alergias: {{antecedentes_alergia}}\nMUC: {{antecedentes_muc}}",
            ),
            slide("fisico", "Peso {{peso}} Altura {{altura}} IMC {{imc}}"),
            slide("neuro", "{{exame_neuro_info1}}"),
            slide("exame", "{{exame_nome}} - {{exame_data}}\n{{exame_laudo}}"),
            slide("fim", "{{nome}}"),
        ]
    }

    fn store_with(slides: Vec<Slide>) -> Arc<MemoryDocumentStore> {
        let store = Arc::new(MemoryDocumentStore::new());
        store.insert(Document {
            id: DocumentId::new(TEMPLATE).unwrap(),
            name: "Modelo".into(),
            slides,
        });
        store
    }

    fn record(exams: serde_json::Value) -> PatientRecord {
        PatientRecord::from_value(json!({
            "nome do paciente": "Ana Silva",
            "idade": "34",
            "sexo": "F",
            "queixa principal": "cefaleia",
            "retorno1": {"data": "10/05/2025", "info": "melhora parcial"},
            "retorno2": {"data": ""},
            "retorno3": {},
            "antecedentes pessoais": {"alergias": ["dipirona", "iodo"]},
            "exame fisico geral": {"peso": 70, "altura": 1.75},
            "exame neurologico": {"info1": "Glasgow 15"},
            "exames complementares": exams
        }))
        .unwrap()
    }

    fn today() -> NaiveDate {
        // Tuesday
        NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
    }

    fn fill(
        store: &Arc<MemoryDocumentStore>,
        record: &PatientRecord,
    ) -> FillResult<FilledDocument> {
        let filler = TemplateFiller::new(store.clone());
        filler.fill(record, &DocumentId::new(TEMPLATE).unwrap(), today())
    }

    #[test]
    fn end_to_end_single_exam() {
        let store = store_with(template_slides());
        let record = record(json!([{"tipo": "Raio-X", "data": "01/06/2025", "laudo": "normal"}]));

        let filled = fill(&store, &record).unwrap();
        let doc = store.open_document(&filled.id).unwrap();

        assert_eq!(filled.name, "Ana Silva");
        assert_eq!(doc.name, "Ana Silva");
        assert_eq!(filled.exam_slides.len(), 1);
        assert!(doc.slides.iter().all(|s| s.id.as_str() != "exame"));
        assert!(doc.find_slide(EXAM_PROTOTYPE_MARKER).is_none());

        let exam = doc
            .slides
            .iter()
            .find(|s| s.id == filled.exam_slides[0])
            .unwrap();
        assert_eq!(exam.text, "Raio-X - 01/06/2025\nnormal");

        let texts: Vec<&str> = doc.slides.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts[0], "Próxima visita: 10/06/2025");
        assert_eq!(texts[1], "Ana Silva, 34 anos, F");
        assert_eq!(texts[2], "QP: cefaleia\nRetorno 10/05/2025 melhora parcial");
        assert_eq!(texts[3], "Alergias: dipirona / iodo\nMUC: Nega");
        assert_eq!(texts[4], "Peso 70 Altura 1.75 IMC 22.9");
        assert_eq!(texts[5], "Glasgow 15");
        assert_eq!(texts[7], "Ana Silva");
        assert!(!doc.slides.iter().any(|s| s.text.contains("{{")));
    }

    #[test]
    fn exam_slides_follow_record_order() {
        let store = store_with(template_slides());
        let record = record(json!([
            {"tipo": "Hemograma", "data": "01/05/2025", "laudo": "Hb 13"},
            {"tipo": "TC de crânio", "data": "02/05/2025"},
            {"tipo": "EEG", "laudo": "sem alterações"}
        ]));

        let filled = fill(&store, &record).unwrap();
        let doc = store.open_document(&filled.id).unwrap();

        let exam_texts: Vec<&str> = doc.slides[6..9].iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            exam_texts,
            vec![
                "Hemograma - 01/05/2025\nHb 13",
                "TC de crânio - 02/05/2025\n-",
                "EEG - -\nsem alterações",
            ]
        );
        let ids: Vec<&SlideId> = doc.slides[6..9].iter().map(|s| &s.id).collect();
        assert_eq!(ids, filled.exam_slides.iter().collect::<Vec<_>>());
        assert_eq!(doc.slides.len(), template_slides().len() - 1 + 3);
        assert_eq!(doc.slides[9].id.as_str(), "fim");
    }

    #[test]
    fn no_exams_removes_prototype() {
        let store = store_with(template_slides());
        let filled = fill(&store, &record(json!([]))).unwrap();
        let doc = store.open_document(&filled.id).unwrap();

        assert!(filled.exam_slides.is_empty());
        assert_eq!(doc.slides.len(), template_slides().len() - 1);
        assert!(doc.find_slide(EXAM_PROTOTYPE_MARKER).is_none());
    }

    #[test]
    fn prototype_is_found_wherever_it_sits() {
        let mut slides = template_slides();
        let prototype = slides.remove(6);
        slides.insert(1, prototype);
        let store = store_with(slides);

        let filled = fill(&store, &record(json!([{"tipo": "RM"}]))).unwrap();
        let doc = store.open_document(&filled.id).unwrap();

        assert_eq!(doc.slides[1].id, filled.exam_slides[0]);
        assert_eq!(doc.slides[1].text, "RM - -\n-");
    }

    #[test]
    fn template_without_prototype_is_fine_without_exams() {
        let mut slides = template_slides();
        slides.remove(6);
        let store = store_with(slides);

        assert!(fill(&store, &record(json!(null))).is_ok());
    }

    #[test]
    fn template_without_prototype_fails_with_exams() {
        let mut slides = template_slides();
        slides.remove(6);
        let store = store_with(slides);

        let err = fill(&store, &record(json!([{"tipo": "RM"}]))).unwrap_err();
        assert!(matches!(err, FillError::PrototypeSlideNotFound(_)));
    }

    #[test]
    fn missing_group_creates_no_copy() {
        let store = store_with(template_slides());
        let record = PatientRecord::from_value(json!({"nome do paciente": "Ana"})).unwrap();

        let err = fill(&store, &record).unwrap_err();
        assert!(matches!(err, FillError::MissingGroup("retorno1")));
        assert_eq!(store.len(), 1, "only the template should exist");
    }

    #[test]
    fn unknown_template_is_reported() {
        let store = Arc::new(MemoryDocumentStore::new());
        let err = fill(&store, &record(json!([]))).unwrap_err();
        assert!(matches!(err, FillError::DocumentNotFound(_)));
    }

    #[test]
    fn template_is_left_untouched() {
        let store = store_with(template_slides());
        fill(&store, &record(json!([{"tipo": "RM"}]))).unwrap();

        let template = store
            .open_document(&DocumentId::new(TEMPLATE).unwrap())
            .unwrap();
        assert_eq!(template.slides, template_slides());
    }
}
