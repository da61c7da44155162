//! MedicationRequest (prescribed/ordered) Leaf Evaluator (spec.md §4.4):
//! `GET MedicationRequest?subject=Patient/{id}&status=active&intent=order`.

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
    params.push(("intent".to_string(), "order".to_string()));
    evaluate_existence(leaf, FhirResource::MedicationRequest, params, gateway).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhir::FakeFhirGateway;
    use crate::schema::{Category, CriterionValue, Operator};

    #[tokio::test]
    async fn insulin_prescription_found() {
        let gateway = FakeFhirGateway::new().with(
            FhirResource::MedicationRequest,
            vec![serde_json::json!({
                "id": "mr1",
                "status": "active",
                "medicationCodeableConcept": {"text": "Insulin glargine"},
                "authoredOn": "2024-06-01"
            })],
        );
        let leaf = Criterion {
            type_: None,
            category: Category::MedicationRequest,
            description: None,
            attribute: "medication".into(),
            operator: Operator::Contains,
            value: Some(CriterionValue::Text("insulin".into())),
            unit: None,
            fhir_resource: FhirResource::MedicationRequest,
            coding: None,
            status_filter: None,
            temporal_constraint: None,
        };
        let outcome = evaluate(&leaf, "p1", &gateway).await;
        assert!(outcome.met);
    }
}
