//! Procedure Leaf Evaluator (spec.md §4.4): `GET Procedure?subject=Patient/{id}&status=completed`.

use crate::evaluator::leaf::common::{LeafOutcome, evaluate_existence};
use crate::fhir::FhirGateway;
use crate::schema::{Criterion, FhirResource};

pub async fn evaluate(
    leaf: &Criterion,
    patient_id: &str,
    gateway: &dyn FhirGateway,
) -> LeafOutcome {
    let mut params = vec![("subject".to_string(), format!("Patient/{patient_id}"))];
    let status = leaf.status_filter.as_deref().unwrap_or("completed");
    params.push(("status".to_string(), status.to_string()));
    evaluate_existence(leaf, FhirResource::Procedure, params, gateway).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhir::FakeFhirGateway;
    use crate::schema::{Category, Coding, CriterionValue, Operator};

    #[tokio::test]
    async fn prior_cabg_found_by_cpt_code() {
        let gateway = FakeFhirGateway::new().with(
            FhirResource::Procedure,
            vec![serde_json::json!({
                "id": "proc-1",
                "status": "completed",
                "code": {"coding": [{"system": "http://www.ama-assn.org/go/cpt", "code": "33533"}]},
                "performedDateTime": "2020-05-01"
            })],
        );
        let leaf = Criterion {
            type_: None,
            category: Category::Procedure,
            description: Some("prior CABG".into()),
            attribute: "procedure".into(),
            operator: Operator::NotExists,
            value: Some(CriterionValue::Text("cabg".into())),
            unit: None,
            fhir_resource: FhirResource::Procedure,
            coding: Some(Coding {
                system: "http://www.ama-assn.org/go/cpt".into(),
                code: "33533".into(),
                display: "CABG".into(),
            }),
            status_filter: None,
            temporal_constraint: None,
        };
        let outcome = evaluate(&leaf, "p1", &gateway).await;
        assert!(!outcome.met, "exclusion should be violated: prior CABG exists");
    }
}
