//! Immunization Leaf Evaluator (spec.md §4.4): `GET
//! Immunization?patient={id}&status=completed`.

use crate::evaluator::leaf::common::{LeafOutcome, evaluate_existence};
use crate::fhir::FhirGateway;
use crate::schema::{Criterion, FhirResource};

pub async fn evaluate(
    leaf: &Criterion,
    patient_id: &str,
    gateway: &dyn FhirGateway,
) -> LeafOutcome {
    let mut params = vec![("patient".to_string(), patient_id.to_string())];
    let status = leaf.status_filter.as_deref().unwrap_or("completed");
    params.push(("status".to_string(), status.to_string()));
    evaluate_existence(leaf, FhirResource::Immunization, params, gateway).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhir::FakeFhirGateway;
    use crate::schema::{Category, Coding, CriterionValue, Operator};

    #[tokio::test]
    async fn influenza_vaccine_matches_by_cvx_code() {
        let gateway = FakeFhirGateway::new().with(
            FhirResource::Immunization,
            vec![serde_json::json!({
                "id": "imm-1",
                "status": "completed",
                "vaccineCode": {"coding": [{"system": "http://hl7.org/fhir/sid/cvx", "code": "88"}]},
                "occurrenceDateTime": "2024-10-01"
            })],
        );
        let leaf = Criterion {
            type_: None,
            category: Category::Immunization,
            description: Some("seasonal influenza vaccine".into()),
            attribute: "vaccine_type".into(),
            operator: Operator::Exists,
            value: Some(CriterionValue::Text("influenza".into())),
            unit: None,
            fhir_resource: FhirResource::Immunization,
            coding: Some(Coding {
                system: "http://hl7.org/fhir/sid/cvx".into(),
                code: "88".into(),
                display: "influenza virus vaccine".into(),
            }),
            status_filter: None,
            temporal_constraint: None,
        };
        let outcome = evaluate(&leaf, "p1", &gateway).await;
        assert!(outcome.met);
    }
}
