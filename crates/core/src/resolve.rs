//! Field resolution and the placeholder mapping table.
//!
//! Each placeholder in the template maps to one record field and a fallback literal.
//! Resolution rules, in order:
//! 1. absent, null or empty text gives the fallback,
//! 2. lists are joined with `" / "`, every element kept (an empty list gives `""`),
//! 3. anything else renders as its string form.

use crate::constants::{DASH, DENIES, FOLLOW_UP_PREFIX, NEXT_VISIT_FALLBACK};
use crate::dates::{format_br, next_tuesday};
use crate::error::FillResult;
use crate::measures::bmi;
use crate::record::{ExamEntry, FieldValue, FollowUp, PatientRecord};
use chrono::NaiveDate;
use filler_types::Placeholder;

/// One token and the text that replaces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replacement {
    pub placeholder: Placeholder,
    pub value: String,
}

impl Replacement {
    pub fn new(name: &str, value: impl Into<String>) -> FillResult<Self> {
        Ok(Self {
            placeholder: Placeholder::new(name)?,
            value: value.into(),
        })
    }

    /// Apply this replacement to a block of text.
    pub fn apply(&self, text: &str) -> String {
        text.replace(self.placeholder.token(), &self.value)
    }
}

/// Render a field, substituting `fallback` when it is absent, null or empty text.
pub fn resolve(value: Option<&FieldValue>, fallback: &str) -> String {
    match value {
        None | Some(FieldValue::Null) => fallback.to_owned(),
        Some(FieldValue::Text(text)) if text.is_empty() => fallback.to_owned(),
        Some(value) => value.to_string(),
    }
}

/// Follow-up date with its `Retorno ` prefix, or nothing when there is no date.
pub fn follow_up_date(follow_up: &FollowUp) -> String {
    let date = resolve(follow_up.data.as_ref(), "");
    if date.is_empty() {
        date
    } else {
        format!("{FOLLOW_UP_PREFIX}{date}")
    }
}

/// Display name used for the copy and for `{{nome}}`.
pub fn display_name(record: &PatientRecord) -> String {
    resolve(record.nome.as_ref(), DASH)
}

/// Every document-wide replacement for `record`.
///
/// Fails with `MissingGroup` before producing anything if a nested group is absent.
pub fn global_replacements(
    record: &PatientRecord,
    today: NaiveDate,
) -> FillResult<Vec<Replacement>> {
    let follow_ups = record.follow_ups()?;
    let history = record.personal_history()?;
    let physical = record.physical_exam()?;
    let neuro = record.neuro_exam()?;

    let next_visit = next_tuesday(today)
        .map(format_br)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NEXT_VISIT_FALLBACK.to_owned());

    let mut out = vec![
        Replacement::new("data_semana_que_vem", next_visit)?,
        Replacement::new("nome", display_name(record))?,
        Replacement::new("idade", resolve(record.idade.as_ref(), DASH))?,
        Replacement::new("sexo", resolve(record.sexo.as_ref(), DASH))?,
        Replacement::new("etnia", resolve(record.etnia.as_ref(), DASH))?,
        Replacement::new("procedente", resolve(record.procedente.as_ref(), DASH))?,
        Replacement::new(
            "data_de_nascimento",
            resolve(record.data_de_nascimento.as_ref(), DASH),
        )?,
        Replacement::new("prontuario", resolve(record.prontuario.as_ref(), DASH))?,
        Replacement::new("prec_cp", resolve(record.prec_cp.as_ref(), DASH))?,
        Replacement::new("contato", resolve(record.contato.as_ref(), DASH))?,
        Replacement::new(
            "posto_e_graduacao",
            resolve(record.posto_e_graduacao.as_ref(), DASH),
        )?,
        Replacement::new(
            "queixa_principal",
            resolve(record.queixa_principal.as_ref(), DASH),
        )?,
        Replacement::new("historia", resolve(record.hda.as_ref(), DASH))?,
    ];

    for (slot, follow_up) in follow_ups.iter().enumerate() {
        let n = slot + 1;
        out.push(Replacement::new(
            &format!("retorno{n}_data"),
            follow_up_date(follow_up),
        )?);
        out.push(Replacement::new(
            &format!("retorno{n}_info"),
            resolve(follow_up.info.as_ref(), ""),
        )?);
    }

    out.extend([
        Replacement::new(
            "antecedentes_alergia",
            resolve(history.alergias.as_ref(), DENIES),
        )?,
        Replacement::new(
            "antecedentes_comorbidades",
            resolve(history.comorbidades.as_ref(), DENIES),
        )?,
        Replacement::new(
            "antecedentes_habitos_vicios",
            resolve(history.habitos_e_vicios.as_ref(), DENIES),
        )?,
        Replacement::new(
            "antecedentes_cirurgias",
            resolve(history.cirurgias_previas.as_ref(), DASH),
        )?,
        Replacement::new(
            "antecedentes_muc",
            resolve(history.medicamentos_em_uso_continuo.as_ref(), DENIES),
        )?,
        Replacement::new("peso", resolve(physical.peso.as_ref(), ""))?,
        Replacement::new("altura", resolve(physical.altura.as_ref(), ""))?,
        Replacement::new(
            "imc",
            bmi(physical.peso.as_ref(), physical.altura.as_ref()),
        )?,
        Replacement::new("exame_info1", resolve(physical.info1.as_ref(), DASH))?,
        Replacement::new("exame_info2", resolve(physical.info2.as_ref(), DASH))?,
    ]);

    for (slot, note) in neuro.notes().into_iter().enumerate() {
        out.push(Replacement::new(
            &format!("exame_neuro_info{}", slot + 1),
            resolve(note.as_ref(), ""),
        )?);
    }

    Ok(out)
}

/// Replacements scoped to one duplicated exam slide.
pub fn exam_replacements(exam: &ExamEntry) -> FillResult<Vec<Replacement>> {
    Ok(vec![
        Replacement::new("exame_nome", resolve(exam.tipo.as_ref(), DASH))?,
        Replacement::new("exame_data", resolve(exam.data.as_ref(), DASH))?,
        Replacement::new("exame_laudo", resolve(exam.laudo.as_ref(), DASH))?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FillError;
    use serde_json::json;

    fn today() -> NaiveDate {
        // Sunday
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn minimal_record() -> PatientRecord {
        PatientRecord::from_value(json!({
            "retorno1": {},
            "retorno2": {},
            "retorno3": {},
            "antecedentes pessoais": {},
            "exame fisico geral": {},
            "exame neurologico": {}
        }))
        .unwrap()
    }

    fn lookup<'a>(replacements: &'a [Replacement], name: &str) -> &'a str {
        replacements
            .iter()
            .find(|r| r.placeholder.name() == name)
            .map(|r| r.value.as_str())
            .unwrap_or_else(|| panic!("no replacement for {name}"))
    }

    #[test]
    fn empty_record_resolves_to_fallbacks() {
        let replacements = global_replacements(&minimal_record(), today()).unwrap();

        for name in [
            "nome",
            "idade",
            "sexo",
            "etnia",
            "procedente",
            "data_de_nascimento",
            "prontuario",
            "prec_cp",
            "contato",
            "posto_e_graduacao",
            "queixa_principal",
            "historia",
            "antecedentes_cirurgias",
            "exame_info1",
            "exame_info2",
        ] {
            assert_eq!(lookup(&replacements, name), "-", "{name}");
        }
        for name in [
            "antecedentes_alergia",
            "antecedentes_comorbidades",
            "antecedentes_habitos_vicios",
            "antecedentes_muc",
        ] {
            assert_eq!(lookup(&replacements, name), "Nega", "{name}");
        }
        for name in [
            "retorno1_data",
            "retorno2_info",
            "peso",
            "altura",
            "imc",
            "exame_neuro_info1",
            "exame_neuro_info5",
        ] {
            assert_eq!(lookup(&replacements, name), "", "{name}");
        }
        assert_eq!(lookup(&replacements, "data_semana_que_vem"), "03/06/2025");
    }

    #[test]
    fn null_and_empty_values_use_fallbacks() {
        let record = PatientRecord::from_value(json!({
            "idade": null,
            "sexo": "",
            "retorno1": {"data": null},
            "retorno2": {"data": ""},
            "retorno3": {},
            "antecedentes pessoais": {"alergias": [], "comorbidades": ""},
            "exame fisico geral": {"info1": null},
            "exame neurologico": {"info2": ""}
        }))
        .unwrap();
        let replacements = global_replacements(&record, today()).unwrap();

        assert_eq!(lookup(&replacements, "idade"), "-");
        assert_eq!(lookup(&replacements, "sexo"), "-");
        assert_eq!(lookup(&replacements, "retorno1_data"), "");
        assert_eq!(lookup(&replacements, "retorno2_data"), "");
        assert_eq!(lookup(&replacements, "antecedentes_alergia"), "");
        assert_eq!(lookup(&replacements, "antecedentes_comorbidades"), "Nega");
        assert_eq!(lookup(&replacements, "exame_info1"), "-");
        assert_eq!(lookup(&replacements, "exame_neuro_info2"), "");
    }

    #[test]
    fn list_fields_join_in_order() {
        let record = PatientRecord::from_value(json!({
            "retorno1": {}, "retorno2": {}, "retorno3": {},
            "antecedentes pessoais": {
                "alergias": ["penicilina", "dipirona"],
                "medicamentos em uso continuo": ["losartana 50mg", "metformina 850mg", "AAS"],
                "comorbidades": ["HAS", "", "DM2"],
                "cirurgias previas": "apendicectomia"
            },
            "exame fisico geral": {},
            "exame neurologico": {}
        }))
        .unwrap();
        let replacements = global_replacements(&record, today()).unwrap();

        assert_eq!(
            lookup(&replacements, "antecedentes_alergia"),
            "penicilina / dipirona"
        );
        assert_eq!(
            lookup(&replacements, "antecedentes_muc"),
            "losartana 50mg / metformina 850mg / AAS"
        );
        assert_eq!(
            lookup(&replacements, "antecedentes_comorbidades"),
            "HAS /  / DM2"
        );
        assert_eq!(lookup(&replacements, "antecedentes_cirurgias"), "apendicectomia");
    }

    #[test]
    fn empty_list_is_not_a_fallback() {
        let empty = FieldValue::List(vec![]);
        assert_eq!(resolve(Some(&empty), DENIES), "");
        assert_eq!(resolve(Some(&FieldValue::Null), DENIES), DENIES);
        assert_eq!(resolve(Some(&"".into()), DENIES), DENIES);
        assert_eq!(resolve(None, DASH), DASH);
        assert_eq!(resolve(Some(&" ".into()), DASH), " ");
    }

    #[test]
    fn follow_up_date_is_prefixed_only_when_present() {
        let with_date = FollowUp {
            data: Some("10/05/2025".into()),
            info: None,
        };
        assert_eq!(follow_up_date(&with_date), "Retorno 10/05/2025");
        assert_eq!(follow_up_date(&FollowUp::default()), "");
        let empty = FollowUp {
            data: Some("".into()),
            info: Some("sem queixas".into()),
        };
        assert_eq!(follow_up_date(&empty), "");
    }

    #[test]
    fn bmi_and_measures_are_resolved() {
        let record = PatientRecord::from_value(json!({
            "retorno1": {}, "retorno2": {}, "retorno3": {},
            "antecedentes pessoais": {},
            "exame fisico geral": {"peso": 70, "altura": "1.75"},
            "exame neurologico": {}
        }))
        .unwrap();
        let replacements = global_replacements(&record, today()).unwrap();

        assert_eq!(lookup(&replacements, "peso"), "70");
        assert_eq!(lookup(&replacements, "altura"), "1.75");
        assert_eq!(lookup(&replacements, "imc"), "22.9");
    }

    #[test]
    fn missing_group_fails_the_whole_table() {
        let record = PatientRecord::from_value(json!({
            "retorno1": {}, "retorno2": {}, "retorno3": {},
            "antecedentes pessoais": {},
            "exame neurologico": {}
        }))
        .unwrap();
        let err = global_replacements(&record, today()).unwrap_err();
        assert!(matches!(err, FillError::MissingGroup("exame fisico geral")));
    }

    #[test]
    fn exam_tokens_fall_back_to_dash() {
        let exam = ExamEntry {
            tipo: Some("Raio-X".into()),
            data: None,
            laudo: Some("".into()),
        };
        let replacements = exam_replacements(&exam).unwrap();
        assert_eq!(lookup(&replacements, "exame_nome"), "Raio-X");
        assert_eq!(lookup(&replacements, "exame_data"), "-");
        assert_eq!(lookup(&replacements, "exame_laudo"), "-");
    }

    #[test]
    fn replacement_applies_to_every_occurrence() {
        let r = Replacement::new("nome", "Ana").unwrap();
        assert_eq!(r.apply("{{nome}} / {{nome}} {{idade}}"), "Ana / Ana {{idade}}");
    }
}
