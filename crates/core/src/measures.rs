//! Derived body measures.

use crate::record::FieldValue;

/// Body mass index, `weight / height²`, to one decimal place.
///
/// Anything that does not produce a finite, non-zero index (missing or non-numeric
/// input, zero weight, zero height) renders as an empty string.
pub fn bmi(weight_kg: Option<&FieldValue>, height_m: Option<&FieldValue>) -> String {
    let (Some(weight), Some(height)) = (
        weight_kg.and_then(FieldValue::as_f64),
        height_m.and_then(FieldValue::as_f64),
    ) else {
        return String::new();
    };

    let index = weight / (height * height);
    if index.is_finite() && index != 0.0 {
        // `{:.1}` alone rounds exact ties to even; ties go up here.
        let rounded = (index * 10.0).round() / 10.0;
        format!("{rounded:.1}")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> FieldValue {
        FieldValue::Number(serde_json::Number::from_f64(v).unwrap())
    }

    #[test]
    fn computes_one_decimal_place() {
        assert_eq!(bmi(Some(&num(70.0)), Some(&num(1.75))), "22.9");
    }

    #[test]
    fn exact_ties_round_up() {
        assert_eq!(bmi(Some(&num(89.0)), Some(&num(2.0))), "22.3");
        assert_eq!(bmi(Some(&num(1.0)), Some(&num(2.0))), "0.3");
        assert_eq!(bmi(Some(&num(81.0)), Some(&num(2.0))), "20.3");
    }

    #[test]
    fn zero_weight_or_height_is_empty() {
        assert_eq!(bmi(Some(&num(0.0)), Some(&num(1.75))), "");
        assert_eq!(bmi(Some(&num(70.0)), Some(&num(0.0))), "");
    }

    #[test]
    fn accepts_numeric_text_with_decimal_comma() {
        assert_eq!(bmi(Some(&"70".into()), Some(&"1,75".into())), "22.9");
    }

    #[test]
    fn missing_or_non_numeric_is_empty() {
        assert_eq!(bmi(None, Some(&num(1.75))), "");
        assert_eq!(bmi(Some(&"setenta".into()), Some(&num(1.75))), "");
        assert_eq!(bmi(Some(&"".into()), Some(&"".into())), "");
    }
}
