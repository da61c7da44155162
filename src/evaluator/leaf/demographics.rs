//! Demographics Leaf Evaluator (spec.md §4.4): `age` and `sex`/`gender`
//! read directly off the patient's own `Patient` resource.

use time::OffsetDateTime;

use crate::evaluator::leaf::common::{Evidence, EvidenceMatch, LeafOutcome};
use crate::evaluator::leaf::matching::{compare_numeric, compute_age};
use crate::fhir::{FhirGateway, extract_facts};
use crate::schema::{Category, Criterion};

pub async fn evaluate(
    leaf: &Criterion,
    patient_id: &str,
    gateway: &dyn FhirGateway,
) -> LeafOutcome {
    let params = vec![("_id".to_string(), patient_id.to_string())];
    let resources = match gateway
        .search(crate::schema::FhirResource::Patient, &params)
        .await
    {
        Ok(r) => r,
        Err(e) => return LeafOutcome::query_failed(&e),
    };

    let Some(patient) = resources.first() else {
        return LeafOutcome::new(false, "no matching patient resource", Evidence::default());
    };

    match leaf.attribute.to_ascii_lowercase().as_str() {
        "age" => evaluate_age(leaf, patient),
        "sex" | "gender" => evaluate_sex(leaf, patient),
        other => LeafOutcome::evaluator_error(
            Category::Demographics,
            format!("unsupported demographics attribute: {other}"),
        ),
    }
}

fn evaluate_age(leaf: &Criterion, patient: &serde_json::Value) -> LeafOutcome {
    let facts = extract_facts(crate::schema::FhirResource::Patient, patient);
    let Some(birth_date) = facts.date.as_deref() else {
        return LeafOutcome::new(false, "patient has no birthDate on record", Evidence::default());
    };
    let today = OffsetDateTime::now_utc().date();
    let Some(age) = compute_age(birth_date, today) else {
        return LeafOutcome::evaluator_error(
            Category::Demographics,
            format!("unparsable birthDate: {birth_date}"),
        );
    };
    let Some(value) = &leaf.value else {
        return LeafOutcome::evaluator_error(Category::Demographics, "age leaf has no value");
    };
    let met = compare_numeric(leaf.operator, value, age).unwrap_or(false);
    let evidence = Evidence {
        matches: vec![EvidenceMatch {
            resource_id: facts.id,
            date: Some(birth_date.to_string()),
            code: None,
            numeric_value: Some(age),
        }],
    };
    LeafOutcome::new(
        met,
        format!("patient age {age} years computed from birthDate {birth_date}"),
        evidence,
    )
}

fn evaluate_sex(leaf: &Criterion, patient: &serde_json::Value) -> LeafOutcome {
    let gender = patient.get("gender").and_then(|v| v.as_str());
    let Some(expected) = leaf.value.as_ref().and_then(|v| v.as_text()) else {
        return LeafOutcome::evaluator_error(Category::Demographics, "sex leaf has no text value");
    };
    let met = gender.is_some_and(|g| g.eq_ignore_ascii_case(expected));
    let id = patient.get("id").and_then(|v| v.as_str()).unwrap_or_default();
    let evidence = Evidence {
        matches: vec![EvidenceMatch {
            resource_id: id.to_string(),
            date: None,
            code: gender.map(str::to_string),
            numeric_value: None,
        }],
    };
    LeafOutcome::new(
        met,
        format!("patient gender is {}", gender.unwrap_or("unknown")),
        evidence,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhir::FakeFhirGateway;
    use crate::schema::{CriterionValue, FhirResource, Operator};

    fn age_leaf(operator: Operator, value: CriterionValue) -> Criterion {
        Criterion {
            type_: None,
            category: Category::Demographics,
            description: None,
            attribute: "age".into(),
            operator,
            value: Some(value),
            unit: Some("years".into()),
            fhir_resource: FhirResource::Patient,
            coding: None,
            status_filter: None,
            temporal_constraint: None,
        }
    }

    #[tokio::test]
    async fn age_between_18_and_65_is_met() {
        let gateway = FakeFhirGateway::new().with(
            FhirResource::Patient,
            vec![serde_json::json!({"id": "p1", "birthDate": "1979-05-15"})],
        );
        let leaf = age_leaf(Operator::Between, CriterionValue::Range(18.0, 65.0));
        let outcome = evaluate(&leaf, "p1", &gateway).await;
        assert!(outcome.met);
    }

    #[tokio::test]
    async fn missing_patient_is_unmet_not_error() {
        let gateway = FakeFhirGateway::new();
        let leaf = age_leaf(Operator::Between, CriterionValue::Range(18.0, 65.0));
        let outcome = evaluate(&leaf, "missing", &gateway).await;
        assert!(!outcome.met);
        assert!(outcome.reason.contains("no matching patient"));
    }

    #[tokio::test]
    async fn sex_equals_female_checks_gender_field() {
        let gateway = FakeFhirGateway::new().with(
            FhirResource::Patient,
            vec![serde_json::json!({"id": "p1", "gender": "female", "birthDate": "1979-05-15"})],
        );
        let leaf = Criterion {
            type_: None,
            category: Category::Demographics,
            description: None,
            attribute: "sex".into(),
            operator: Operator::Equals,
            value: Some(CriterionValue::Text("female".into())),
            unit: None,
            fhir_resource: FhirResource::Patient,
            coding: None,
            status_filter: None,
            temporal_constraint: None,
        };
        let outcome = evaluate(&leaf, "p1", &gateway).await;
        assert!(outcome.met);
    }
}
