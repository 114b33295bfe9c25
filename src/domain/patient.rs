//! Patient input for cardiovascular risk prediction.
//!
//! Categorical fields are kept as the raw strings the client sent. Mapping
//! them to codes happens in [`crate::domain::features`]; checking them
//! against their declared domains happens in [`PatientInput::validate`].

use serde::{Deserialize, Serialize};

/// Declared values for `gender`.
pub const GENDER_VALUES: [&str; 2] = ["male", "female"];

/// Declared values for `cholesterol` and `glucose` (1 = normal).
pub const LEVEL_VALUES: [&str; 3] = ["1", "2", "3"];

/// Declared values for the yes/no lifestyle fields.
pub const YES_NO_VALUES: [&str; 2] = ["yes", "no"];

/// Raw patient attributes as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    /// Age in years
    pub age: i64,

    /// "male" or "female"
    pub gender: String,

    /// Height in centimeters
    pub height: f64,

    /// Weight in kilograms
    pub weight: f64,

    /// Systolic blood pressure in mmHg
    #[serde(rename = "systolicBP", alias = "apHi")]
    pub systolic_bp: i64,

    /// Diastolic blood pressure in mmHg
    #[serde(rename = "diastolicBP", alias = "apLo")]
    pub diastolic_bp: i64,

    /// "1" (normal), "2" (above normal), "3" (well above normal)
    pub cholesterol: String,

    /// "1" (normal), "2" (above normal), "3" (well above normal)
    pub glucose: String,

    /// "yes" or "no"
    #[serde(alias = "smoke")]
    pub smoker: String,

    /// "yes" or "no"
    #[serde(alias = "alcohol")]
    pub drinks_alcohol: String,

    /// "yes" or "no"
    #[serde(alias = "active")]
    pub physically_active: String,

    /// Display label requested by the client. Never changes which model runs.
    #[serde(default, alias = "model")]
    pub model_choice: String,
}

impl PatientInput {
    /// Check numeric ranges and categorical domains.
    ///
    /// All violations are collected so the caller can report them at once.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(1..=130).contains(&self.age) {
            errors.push(format!("age {} out of range (0, 130]", self.age));
        }
        check_positive(&mut errors, "height", self.height, 300.0);
        check_positive(&mut errors, "weight", self.weight, 500.0);
        if !(1..=400).contains(&self.systolic_bp) {
            errors.push(format!(
                "systolicBP {} out of range (0, 400]",
                self.systolic_bp
            ));
        }
        if !(1..=400).contains(&self.diastolic_bp) {
            errors.push(format!(
                "diastolicBP {} out of range (0, 400]",
                self.diastolic_bp
            ));
        }

        check_member(&mut errors, "gender", &self.gender, &GENDER_VALUES);
        check_member(&mut errors, "cholesterol", &self.cholesterol, &LEVEL_VALUES);
        check_member(&mut errors, "glucose", &self.glucose, &LEVEL_VALUES);
        check_member(&mut errors, "smoker", &self.smoker, &YES_NO_VALUES);
        check_member(&mut errors, "drinksAlcohol", &self.drinks_alcohol, &YES_NO_VALUES);
        check_member(
            &mut errors,
            "physicallyActive",
            &self.physically_active,
            &YES_NO_VALUES,
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_positive(errors: &mut Vec<String>, field: &str, value: f64, max: f64) {
    if !value.is_finite() || value <= 0.0 || value > max {
        errors.push(format!("{field} {value} out of range (0, {max}]"));
    }
}

fn check_member(errors: &mut Vec<String>, field: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        errors.push(format!(
            "{field} {value:?} must be one of {}",
            allowed.join(", ")
        ));
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "age": 52, "gender": "male", "height": 180.0, "weight": 82.5,
            "systolicBP": 130, "diastolicBP": 85, "cholesterol": "2", "glucose": "1",
            "smoker": "no", "drinksAlcohol": "yes", "physicallyActive": "yes",
            "modelChoice": "decision_tree"
        }"#;
        let input: PatientInput = serde_json::from_str(json).expect("Should parse");
        assert_eq!(input.systolic_bp, 130);
        assert_eq!(input.drinks_alcohol, "yes");
        assert_eq!(input.model_choice, "decision_tree");
    }

    #[test]
    fn test_deserialize_legacy_keys() {
        let json = r#"{
            "age": 52, "gender": "female", "height": 165, "weight": 60,
            "apHi": 118, "apLo": 76, "cholesterol": "1", "glucose": "3",
            "smoke": "yes", "alcohol": "no", "active": "no", "model": "xgboost"
        }"#;
        let input: PatientInput = serde_json::from_str(json).expect("Should parse");
        assert_eq!(input.systolic_bp, 118);
        assert_eq!(input.diastolic_bp, 76);
        assert_eq!(input.smoker, "yes");
        assert_eq!(input.physically_active, "no");
        assert_eq!(input.model_choice, "xgboost");
    }

    #[test]
    fn test_model_choice_is_optional() {
        let mut value = serde_json::to_value(baseline_patient()).expect("serialize");
        value
            .as_object_mut()
            .expect("object")
            .remove("modelChoice");
        let input: PatientInput = serde_json::from_value(value).expect("Should parse");
        assert!(input.model_choice.is_empty());
    }

    #[test]
    fn test_validation() {
        assert!(baseline_patient().validate().is_ok());
        assert!(high_risk_patient().validate().is_ok());

        let invalid = PatientInput {
            age: 0,
            height: 0.0,
            gender: "other".into(),
            cholesterol: "4".into(),
            smoker: "sometimes".into(),
            ..baseline_patient()
        };
        let errors = invalid.validate().expect_err("Should reject");
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| e.starts_with("gender")));
    }

    #[test]
    fn test_validation_rejects_non_finite() {
        let invalid = PatientInput {
            weight: f64::NAN,
            ..baseline_patient()
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_model_choice_not_validated() {
        let input = PatientInput {
            model_choice: "anything at all".into(),
            ..baseline_patient()
        };
        assert!(input.validate().is_ok());
    }
}
