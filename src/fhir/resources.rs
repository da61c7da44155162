//! Narrow, typed extraction over the FHIR R4 resource JSON the Gateway
//! returns. Rather than modeling each resource's full schema, every
//! Leaf Evaluator works off the same [`ResourceFacts`] shape — the
//! coded values, display text, status, date, and optional numeric
//! value a leaf might need to compare against (spec.md §4.4 step 2).

use serde::Serialize;
use serde_json::Value;

use crate::schema::{Coding, FhirResource};

/// The handful of fields every Leaf Evaluator reads off a resource,
/// regardless of which FHIR resource kind it came from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceFacts {
    pub id: String,
    pub codings: Vec<Coding>,
    pub text: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub numeric_value: Option<f64>,
    pub unit: Option<String>,
}

fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str)
}

fn extract_codings(coding_array: Option<&Value>) -> Vec<Coding> {
    coding_array
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let system = str_field(entry, "system")?.to_string();
                    let code = str_field(entry, "code")?.to_string();
                    let display = str_field(entry, "display").unwrap_or("").to_string();
                    Some(Coding {
                        system,
                        code,
                        display,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn codeable_concept_codings(v: &Value, key: &str) -> Vec<Coding> {
    extract_codings(v.get(key).and_then(|cc| cc.get("coding")))
}

fn codeable_concept_text(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|cc| str_field(cc, "text"))
        .map(str::to_string)
}

fn quantity_value_and_unit(v: &Value, key: &str) -> (Option<f64>, Option<String>) {
    let Some(q) = v.get(key) else {
        return (None, None);
    };
    let value = q.get("value").and_then(Value::as_f64);
    let unit = str_field(q, "unit")
        .or_else(|| str_field(q, "code"))
        .map(str::to_string);
    (value, unit)
}

/// Extracts the common facts from a resource's raw JSON, dispatching on
/// which FHIR resource kind it is.
pub fn extract_facts(resource_type: FhirResource, value: &Value) -> ResourceFacts {
    let id = str_field(value, "id").unwrap_or_default().to_string();

    match resource_type {
        FhirResource::Patient => ResourceFacts {
            id,
            date: str_field(value, "birthDate").map(str::to_string),
            ..Default::default()
        },
        FhirResource::Condition => {
            let codings = codeable_concept_codings(value, "code");
            let text = codeable_concept_text(value, "code");
            let status = str_field(value, "clinicalStatus")
                .map(str::to_string)
                .or_else(|| {
                    value
                        .get("clinicalStatus")
                        .and_then(|cs| cs.get("coding"))
                        .and_then(Value::as_array)
                        .and_then(|arr| arr.first())
                        .and_then(|c| str_field(c, "code"))
                        .map(str::to_string)
                });
            let date = str_field(value, "onsetDateTime")
                .or_else(|| str_field(value, "recordedDate"))
                .map(str::to_string);
            ResourceFacts {
                id,
                codings,
                text,
                status,
                date,
                ..Default::default()
            }
        }
        FhirResource::Observation => {
            let codings = codeable_concept_codings(value, "code");
            let text = codeable_concept_text(value, "code");
            let (numeric_value, unit) = quantity_value_and_unit(value, "valueQuantity");
            let status = str_field(value, "status").map(str::to_string);
            let date = str_field(value, "effectiveDateTime").map(str::to_string);
            ResourceFacts {
                id,
                codings,
                text,
                status,
                date,
                numeric_value,
                unit,
            }
        }
        FhirResource::MedicationStatement => {
            let codings = codeable_concept_codings(value, "medicationCodeableConcept");
            let text = codeable_concept_text(value, "medicationCodeableConcept");
            let status = str_field(value, "status").map(str::to_string);
            let date = str_field(value, "effectiveDateTime").map(str::to_string);
            ResourceFacts {
                id,
                codings,
                text,
                status,
                date,
                ..Default::default()
            }
        }
        FhirResource::MedicationRequest => {
            let codings = codeable_concept_codings(value, "medicationCodeableConcept");
            let text = codeable_concept_text(value, "medicationCodeableConcept");
            let status = str_field(value, "status").map(str::to_string);
            let date = str_field(value, "authoredOn").map(str::to_string);
            ResourceFacts {
                id,
                codings,
                text,
                status,
                date,
                ..Default::default()
            }
        }
        FhirResource::AllergyIntolerance => {
            let codings = codeable_concept_codings(value, "code");
            let text = codeable_concept_text(value, "code");
            let status = value
                .get("clinicalStatus")
                .and_then(|cs| cs.get("coding"))
                .and_then(Value::as_array)
                .and_then(|arr| arr.first())
                .and_then(|c| str_field(c, "code"))
                .map(str::to_string);
            let date = str_field(value, "recordedDate").map(str::to_string);
            ResourceFacts {
                id,
                codings,
                text,
                status,
                date,
                ..Default::default()
            }
        }
        FhirResource::Procedure => {
            let codings = codeable_concept_codings(value, "code");
            let text = codeable_concept_text(value, "code");
            let status = str_field(value, "status").map(str::to_string);
            let date = str_field(value, "performedDateTime").map(str::to_string);
            ResourceFacts {
                id,
                codings,
                text,
                status,
                date,
                ..Default::default()
            }
        }
        FhirResource::DiagnosticReport => {
            let codings = codeable_concept_codings(value, "code");
            let mut text = codeable_concept_text(value, "code");
            if let Some(conclusion) = str_field(value, "conclusion") {
                text = Some(match text {
                    Some(existing) => format!("{existing} {conclusion}"),
                    None => conclusion.to_string(),
                });
            }
            let status = str_field(value, "status").map(str::to_string);
            let date = str_field(value, "effectiveDateTime").map(str::to_string);
            ResourceFacts {
                id,
                codings,
                text,
                status,
                date,
                ..Default::default()
            }
        }
        FhirResource::Immunization => {
            let codings = codeable_concept_codings(value, "vaccineCode");
            let text = codeable_concept_text(value, "vaccineCode");
            let status = str_field(value, "status").map(str::to_string);
            let date = str_field(value, "occurrenceDateTime").map(str::to_string);
            ResourceFacts {
                id,
                codings,
                text,
                status,
                date,
                ..Default::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_observation_numeric_value_and_coding() {
        let json = serde_json::json!({
            "id": "obs-1",
            "status": "final",
            "code": {
                "coding": [{"system": "http://loinc.org", "code": "4548-4", "display": "HbA1c"}],
                "text": "Hemoglobin A1c"
            },
            "valueQuantity": {"value": 8.2, "unit": "%"},
            "effectiveDateTime": "2024-01-15"
        });
        let facts = extract_facts(FhirResource::Observation, &json);
        assert_eq!(facts.id, "obs-1");
        assert_eq!(facts.numeric_value, Some(8.2));
        assert_eq!(facts.unit.as_deref(), Some("%"));
        assert_eq!(facts.codings[0].code, "4548-4");
        assert_eq!(facts.date.as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn extracts_medication_statement_text_fallback() {
        let json = serde_json::json!({
            "id": "med-1",
            "status": "active",
            "medicationCodeableConcept": {"text": "Atorvastatin 40 mg"}
        });
        let facts = extract_facts(FhirResource::MedicationStatement, &json);
        assert!(facts.codings.is_empty());
        assert_eq!(facts.text.as_deref(), Some("Atorvastatin 40 mg"));
        assert_eq!(facts.status.as_deref(), Some("active"));
    }

    #[test]
    fn extracts_diagnostic_report_conclusion_text() {
        let json = serde_json::json!({
            "id": "dr-1",
            "status": "final",
            "code": {"text": "CT Chest"},
            "conclusion": "No evidence of progression."
        });
        let facts = extract_facts(FhirResource::DiagnosticReport, &json);
        assert!(facts.text.as_deref().unwrap().contains("CT Chest"));
        assert!(
            facts
                .text
                .as_deref()
                .unwrap()
                .contains("No evidence of progression.")
        );
    }

    #[test]
    fn extracts_patient_birth_date() {
        let json = serde_json::json!({"id": "pt-1", "birthDate": "1979-05-15"});
        let facts = extract_facts(FhirResource::Patient, &json);
        assert_eq!(facts.date.as_deref(), Some("1979-05-15"));
    }
}
