//! Prompt assembly (spec.md §4.6 step 2): the schema description,
//! closed-vocabulary enums, curated few-shot examples, and the
//! `criteria_text` to compile, rendered via `minijinja`.

use minijinja::{Environment, context};
use regex::Regex;
use std::sync::OnceLock;

/// Matches a standalone "Exclusion Criteria:" (optionally "Key Exclusion
/// Criteria:") header line, the common way trial protocols separate
/// inclusion text from exclusion text without any other structural markup.
fn exclusion_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?mi)^\s*(?:Key\s+)?Exclusion\s+Criteria\s*:?\s*$")
            .expect("exclusion header pattern is a fixed constant")
    })
}

/// Inserts an explicit `[INCLUSION SECTION]` / `[EXCLUSION SECTION]`
/// marker at the point an "Exclusion Criteria:" header is found, so the
/// model doesn't have to infer the inclusion/exclusion boundary itself
/// when the source text already signals it structurally. Text with no
/// such header is left untouched and tagged entirely as inclusion.
fn annotate_sections(criteria_text: &str) -> String {
    let trimmed = criteria_text.trim();
    match exclusion_header_re().find(trimmed) {
        Some(header) => format!(
            "[INCLUSION SECTION]\n{}\n[EXCLUSION SECTION]\n{}",
            trimmed[..header.start()].trim(),
            trimmed[header.end()..].trim()
        ),
        None => format!("[INCLUSION SECTION]\n{trimmed}"),
    }
}

const DRAFT_TEMPLATE: &str = r#"You convert free-text clinical-trial eligibility criteria into a JSON
array of structured criterion nodes. Emit ONLY the JSON array, no prose.

SCHEMA:
A leaf node: {"type": "inclusion"|"exclusion", "category": ..., "attribute": string,
"operator": ..., "value": number|[low,high]|string, "unit": string?,
"fhir_resource": ..., "coding": {"system","code","display"}?,
"status_filter": string?, "temporal_constraint": {"value","unit","direction"}?}
A group node: {"logic_operator": "AND"|"OR"|"NOT", "type": "inclusion"|"exclusion"?,
"criteria": [node, ...]}

CLOSED VOCABULARIES (use exactly these values, never invent new ones):
type: inclusion, exclusion
category: demographics, condition, observation, medication, medication_request,
  allergy, procedure, diagnostic_report, immunization, performance_status
operator: equals, between, greater_than, greater_than_or_equal, less_than,
  less_than_or_equal, contains, not_contains, exists, not_exists
logic_operator: AND, OR, NOT
fhir_resource: Patient, Condition, Observation, MedicationStatement,
  MedicationRequest, AllergyIntolerance, Procedure, DiagnosticReport, Immunization

RULES:
- A NOT group has exactly one child.
- Top-level output is always a JSON array of nodes, each tagged "type".
- Every leaf has "category" and "fhir_resource".

{% for example in examples %}
EXAMPLE — "{{ example.text }}"
{{ example.json }}
{% endfor %}

CRITERIA TEXT TO COMPILE:
{{ criteria_text }}
"#;

const REPAIR_TEMPLATE: &str = r#"The JSON you returned for the criteria below failed validation.

VALIDATION ERROR:
{{ error }}

YOUR PREVIOUS OUTPUT:
{{ failing_json }}

Correct the JSON so it satisfies the schema and closed vocabularies described
previously, and emit ONLY the corrected JSON array, no prose.

ORIGINAL CRITERIA TEXT:
{{ criteria_text }}
"#;

struct FewShotExample {
    text: &'static str,
    json: &'static str,
}

/// Few-shot examples spanning every category and operator, including
/// nested `(A OR B) AND NOT C` logic and coding-rich labs/medications
/// (spec.md §4.6 step 2).
const FEW_SHOT_EXAMPLES: &[FewShotExample] = &[
    FewShotExample {
        text: "Inclusion: Age 18 to 65.",
        json: r#"[{"type":"inclusion","category":"demographics","description":"Age 18-65","attribute":"age","operator":"between","value":[18,65],"fhir_resource":"Patient"}]"#,
    },
    FewShotExample {
        text: "Inclusion: HbA1c between 7 and 10 %.",
        json: r#"[{"type":"inclusion","category":"observation","description":"HbA1c 7-10 %","attribute":"hba1c","operator":"between","value":[7,10],"unit":"%","fhir_resource":"Observation","coding":{"system":"http://loinc.org","code":"4548-4","display":"HbA1c"}}]"#,
    },
    FewShotExample {
        text: "Inclusion: (Type 2 diabetes OR pre-diabetes) AND ECOG 0-1. Exclusion: currently on insulin.",
        json: r#"[{"type":"inclusion","logic_operator":"AND","criteria":[{"logic_operator":"OR","criteria":[{"category":"condition","attribute":"diagnosis","operator":"contains","value":"type 2 diabetes","fhir_resource":"Condition","coding":{"system":"http://hl7.org/fhir/sid/icd-10-cm","code":"E11","display":"Type 2 diabetes mellitus"}},{"category":"condition","attribute":"diagnosis","operator":"contains","value":"pre-diabetes","fhir_resource":"Condition","coding":{"system":"http://hl7.org/fhir/sid/icd-10-cm","code":"R73.03","display":"Prediabetes"}}]},{"category":"performance_status","attribute":"ecog","operator":"between","value":[0,1],"fhir_resource":"Observation","coding":{"system":"http://loinc.org","code":"89247-1","display":"ECOG Performance Status"}}]},{"type":"exclusion","category":"medication","attribute":"medication","operator":"contains","value":"insulin","fhir_resource":"MedicationStatement"}]"#,
    },
    FewShotExample {
        text: "Inclusion: stable statin therapy.",
        json: r#"[{"type":"inclusion","category":"medication","attribute":"medication","operator":"contains","value":"statin","fhir_resource":"MedicationStatement","status_filter":"active"}]"#,
    },
    FewShotExample {
        text: "Exclusion: allergy to penicillin.",
        json: r#"[{"type":"exclusion","category":"allergy","attribute":"allergen","operator":"contains","value":"penicillin","fhir_resource":"AllergyIntolerance","coding":{"system":"http://snomed.info/sct","code":"91936005","display":"Penicillin allergy"}}]"#,
    },
    FewShotExample {
        text: "Exclusion: prior CABG surgery.",
        json: r#"[{"type":"exclusion","category":"procedure","attribute":"procedure","operator":"exists","value":"cabg","fhir_resource":"Procedure","status_filter":"completed","coding":{"system":"http://www.ama-assn.org/go/cpt","code":"33533","display":"CABG"}}]"#,
    },
    FewShotExample {
        text: "Exclusion: NOT (pregnant OR breastfeeding).",
        json: r#"[{"type":"exclusion","logic_operator":"NOT","criteria":[{"logic_operator":"OR","criteria":[{"category":"condition","attribute":"pregnancy_status","operator":"exists","value":"pregnant","fhir_resource":"Condition"},{"category":"condition","attribute":"breastfeeding_status","operator":"exists","value":"breastfeeding","fhir_resource":"Condition"}]}]}]"#,
    },
    FewShotExample {
        text: "Inclusion: up to date on influenza vaccination within the last year. Inclusion: recent CT chest with no progression.",
        json: r#"[{"type":"inclusion","category":"immunization","attribute":"vaccine_type","operator":"exists","value":"influenza","fhir_resource":"Immunization","status_filter":"completed","temporal_constraint":{"value":1,"unit":"years","direction":"within"},"coding":{"system":"http://hl7.org/fhir/sid/cvx","code":"88","display":"influenza virus vaccine"}},{"type":"inclusion","category":"diagnostic_report","attribute":"conclusion","operator":"contains","value":"no progression","fhir_resource":"DiagnosticReport","status_filter":"final","coding":{"system":"http://loinc.org","code":"24627-2","display":"CT Chest"}}]"#,
    },
];

fn environment() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.add_template("draft", DRAFT_TEMPLATE)
            .expect("draft prompt template is a fixed constant");
        env.add_template("repair", REPAIR_TEMPLATE)
            .expect("repair prompt template is a fixed constant");
        env
    })
}

/// Builds the draft compilation prompt (spec.md §4.6 step 2).
pub fn draft_prompt(criteria_text: &str) -> String {
    let examples: Vec<_> = FEW_SHOT_EXAMPLES
        .iter()
        .map(|e| context! { text => e.text, json => e.json })
        .collect();
    let annotated = annotate_sections(criteria_text);
    environment()
        .get_template("draft")
        .expect("registered above")
        .render(context! { examples, criteria_text => annotated })
        .expect("template context matches template variables")
}

/// Builds the single repair re-prompt (spec.md §4.6 step 7): the
/// validation error plus the failing JSON, asking for a correction.
pub fn repair_prompt(criteria_text: &str, failing_json: &str, error: &str) -> String {
    environment()
        .get_template("repair")
        .expect("registered above")
        .render(context! { criteria_text, failing_json, error })
        .expect("template context matches template variables")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_prompt_embeds_criteria_text_and_examples() {
        let prompt = draft_prompt("Inclusion: Age >= 18.");
        assert!(prompt.contains("Inclusion: Age >= 18."));
        assert!(prompt.contains("HbA1c between 7 and 10"));
        assert!(prompt.contains("logic_operator"));
    }

    #[test]
    fn annotate_sections_splits_on_exclusion_header() {
        let annotated = annotate_sections("Age 18-65.\nExclusion Criteria:\nPregnant.");
        assert!(annotated.contains("[INCLUSION SECTION]\nAge 18-65."));
        assert!(annotated.contains("[EXCLUSION SECTION]\nPregnant."));
    }

    #[test]
    fn annotate_sections_tags_headerless_text_as_inclusion_only() {
        let annotated = annotate_sections("Age 18-65 and HbA1c >= 7.");
        assert_eq!(annotated, "[INCLUSION SECTION]\nAge 18-65 and HbA1c >= 7.");
    }

    #[test]
    fn repair_prompt_embeds_error_and_failing_json() {
        let prompt = repair_prompt("Inclusion: Age >= 18.", "[{\"bad\": true}]", "schema_invalid: missing category");
        assert!(prompt.contains("schema_invalid: missing category"));
        assert!(prompt.contains(r#"[{"bad": true}]"#));
    }
}
