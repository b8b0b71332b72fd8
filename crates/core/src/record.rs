//! Patient record schema.
//!
//! Records arrive as JSON whose keys are Portuguese phrases with spaces (`"nome do
//! paciente"`, `"antecedentes pessoais"`), either from the remote record store or from a
//! pushed `{"data": ...}` envelope. Leaf fields are loosely typed; nested groups are
//! optional at decode time and required at resolution time, so a record without one
//! fails with [`FillError::MissingGroup`] rather than a decode error.

use crate::error::{FillError, FillResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A loosely typed leaf value.
///
/// Record producers (people and the extraction model) write ages and weights as either
/// strings or numbers, and history items as either a single string or a list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    List(Vec<FieldValue>),
    /// Only reachable inside a list; a top-level `null` decodes as `None`.
    Null,
}

impl FieldValue {
    /// Parse the value as a number, accepting a decimal comma in text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => n.as_f64(),
            FieldValue::Text(s) => s.trim().replace(',', ".").parse().ok(),
            FieldValue::Bool(_) | FieldValue::List(_) | FieldValue::Null => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            // `70.0` shows as `70`, the way the record was typed.
            FieldValue::Number(n) if n.is_f64() => match n.as_f64() {
                Some(v) => write!(f, "{v}"),
                None => write!(f, "{n}"),
            },
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(crate::constants::LIST_SEPARATOR)?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            FieldValue::Null => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

/// A follow-up visit entry (`retornoN`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    #[serde(default)]
    pub data: Option<FieldValue>,
    #[serde(default)]
    pub info: Option<FieldValue>,
}

/// `antecedentes pessoais`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalHistory {
    #[serde(default)]
    pub alergias: Option<FieldValue>,
    #[serde(default)]
    pub comorbidades: Option<FieldValue>,
    #[serde(default, rename = "habitos e vicios")]
    pub habitos_e_vicios: Option<FieldValue>,
    #[serde(default, rename = "cirurgias previas")]
    pub cirurgias_previas: Option<FieldValue>,
    #[serde(default, rename = "medicamentos em uso continuo")]
    pub medicamentos_em_uso_continuo: Option<FieldValue>,
}

/// `exame fisico geral`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalExam {
    #[serde(default)]
    pub peso: Option<FieldValue>,
    #[serde(default)]
    pub altura: Option<FieldValue>,
    #[serde(default)]
    pub info1: Option<FieldValue>,
    #[serde(default)]
    pub info2: Option<FieldValue>,
}

/// `exame neurologico`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NeuroExam {
    #[serde(default)]
    pub info1: Option<FieldValue>,
    #[serde(default)]
    pub info2: Option<FieldValue>,
    #[serde(default)]
    pub info3: Option<FieldValue>,
    #[serde(default)]
    pub info4: Option<FieldValue>,
    #[serde(default)]
    pub info5: Option<FieldValue>,
}

impl NeuroExam {
    /// Notes in slot order, `info1` first.
    pub fn notes(&self) -> [&Option<FieldValue>; crate::constants::NEURO_EXAM_SLOTS] {
        [
            &self.info1,
            &self.info2,
            &self.info3,
            &self.info4,
            &self.info5,
        ]
    }
}

/// One complementary exam; each gets its own slide.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamEntry {
    #[serde(default)]
    pub tipo: Option<FieldValue>,
    #[serde(default)]
    pub data: Option<FieldValue>,
    #[serde(default)]
    pub laudo: Option<FieldValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default, rename = "nome do paciente")]
    pub nome: Option<FieldValue>,
    #[serde(default)]
    pub idade: Option<FieldValue>,
    #[serde(default)]
    pub sexo: Option<FieldValue>,
    #[serde(default)]
    pub etnia: Option<FieldValue>,
    #[serde(default)]
    pub procedente: Option<FieldValue>,
    #[serde(default, rename = "data de nascimento")]
    pub data_de_nascimento: Option<FieldValue>,
    #[serde(default)]
    pub prontuario: Option<FieldValue>,
    #[serde(default, rename = "prec-cp", alias = "prec cp")]
    pub prec_cp: Option<FieldValue>,
    #[serde(default)]
    pub contato: Option<FieldValue>,
    #[serde(default, rename = "posto e graduacao")]
    pub posto_e_graduacao: Option<FieldValue>,

    #[serde(default, rename = "queixa principal")]
    pub queixa_principal: Option<FieldValue>,
    #[serde(default)]
    pub hda: Option<FieldValue>,

    #[serde(default)]
    pub retorno1: Option<FollowUp>,
    #[serde(default)]
    pub retorno2: Option<FollowUp>,
    #[serde(default)]
    pub retorno3: Option<FollowUp>,

    #[serde(default, rename = "antecedentes pessoais")]
    pub antecedentes_pessoais: Option<PersonalHistory>,
    #[serde(default, rename = "exame fisico geral")]
    pub exame_fisico_geral: Option<PhysicalExam>,
    #[serde(default, rename = "exame neurologico")]
    pub exame_neurologico: Option<NeuroExam>,

    #[serde(default, rename = "exames complementares")]
    pub exames_complementares: Option<Vec<ExamEntry>>,
}

impl PatientRecord {
    /// Decode a record, reporting the JSON path of the first offending field.
    pub fn from_value(value: Value) -> FillResult<Self> {
        serde_path_to_error::deserialize(value).map_err(|e| FillError::RecordDecode {
            path: e.path().to_string(),
            source: e.into_inner(),
        })
    }

    pub fn from_json_str(json: &str) -> FillResult<Self> {
        let mut de = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(&mut de).map_err(|e| FillError::RecordDecode {
            path: e.path().to_string(),
            source: e.into_inner(),
        })
    }

    /// Decode the record carried in a `{"data": ...}` envelope.
    pub fn from_envelope(envelope: &Value) -> FillResult<Self> {
        let data = envelope.get("data").ok_or(FillError::MissingEnvelope)?;
        Self::from_value(data.clone())
    }

    /// Follow-up visits in slot order. Every slot must be present.
    pub fn follow_ups(&self) -> FillResult<[&FollowUp; crate::constants::FOLLOW_UP_SLOTS]> {
        Ok([
            self.retorno1
                .as_ref()
                .ok_or(FillError::MissingGroup("retorno1"))?,
            self.retorno2
                .as_ref()
                .ok_or(FillError::MissingGroup("retorno2"))?,
            self.retorno3
                .as_ref()
                .ok_or(FillError::MissingGroup("retorno3"))?,
        ])
    }

    pub fn personal_history(&self) -> FillResult<&PersonalHistory> {
        self.antecedentes_pessoais
            .as_ref()
            .ok_or(FillError::MissingGroup("antecedentes pessoais"))
    }

    pub fn physical_exam(&self) -> FillResult<&PhysicalExam> {
        self.exame_fisico_geral
            .as_ref()
            .ok_or(FillError::MissingGroup("exame fisico geral"))
    }

    pub fn neuro_exam(&self) -> FillResult<&NeuroExam> {
        self.exame_neurologico
            .as_ref()
            .ok_or(FillError::MissingGroup("exame neurologico"))
    }

    /// Complementary exams; an absent list means none.
    pub fn exams(&self) -> &[ExamEntry] {
        self.exames_complementares.as_deref().unwrap_or_default()
    }

    /// The `{"data": ...}` envelope with every known key present and empty.
    ///
    /// Used as the target shape when asking a model to structure free-text history.
    pub fn blank_template() -> Value {
        json!({
            "data": {
                "nome do paciente": "",
                "idade": "",
                "sexo": "",
                "etnia": "",
                "procedente": "",
                "data de nascimento": "",
                "prontuario": "",
                "prec cp": "",
                "contato": "",
                "posto e graduacao": "",
                "queixa principal": "",
                "hda": "",
                "retorno1": {"data": "", "info": ""},
                "retorno2": {"data": "", "info": ""},
                "retorno3": {"data": "", "info": ""},
                "antecedentes pessoais": {
                    "alergias": [],
                    "comorbidades": [],
                    "habitos e vicios": [],
                    "cirurgias previas": "",
                    "medicamentos em uso continuo": []
                },
                "exame fisico geral": {"peso": "", "altura": "", "info1": "", "info2": ""},
                "exame neurologico": {
                    "info1": "",
                    "info2": "",
                    "info3": "",
                    "info4": "",
                    "info5": ""
                },
                "exames complementares": [{"tipo": "", "data": "", "laudo": ""}]
            }
        })
    }
}
