//! Medication (current use) Leaf Evaluator (spec.md §4.4):
//! `GET MedicationStatement?subject=Patient/{id}&status=active`.

use crate::evaluator::leaf::common::{LeafOutcome, evaluate_existence};
use crate::fhir::FhirGateway;
use crate::schema::{Criterion, FhirResource};

pub async fn evaluate(
    leaf: &Criterion,
    patient_id: &str,
    gateway: &dyn FhirGateway,
) -> LeafOutcome {
    let mut params = vec![("subject".to_string(), format!("Patient/{patient_id}"))];
    let status = leaf.status_filter.as_deref().unwrap_or("active");
    params.push(("status".to_string(), status.to_string()));
    evaluate_existence(leaf, FhirResource::MedicationStatement, params, gateway).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhir::FakeFhirGateway;
    use crate::schema::{Category, CriterionValue, Operator};

    #[tokio::test]
    async fn statin_matches_atorvastatin_statement() {
        let gateway = FakeFhirGateway::new().with(
            FhirResource::MedicationStatement,
            vec![serde_json::json!({
                "id": "m1",
                "status": "active",
                "medicationCodeableConcept": {"text": "Atorvastatin 40 mg"},
                "effectiveDateTime": "2024-06-01"
            })],
        );
        let leaf = Criterion {
            type_: None,
            category: Category::Medication,
            description: None,
            attribute: "medication".into(),
            operator: Operator::Contains,
            value: Some(CriterionValue::Text("statin".into())),
            unit: None,
            fhir_resource: FhirResource::MedicationStatement,
            coding: None,
            status_filter: None,
            temporal_constraint: None,
        };
        let outcome = evaluate(&leaf, "p1", &gateway).await;
        assert!(outcome.met);
    }
}
