//! Condition Leaf Evaluator (spec.md §4.4): `GET Condition?subject=Patient/{id}&clinical-status=active`.

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
    params.push(("clinical-status".to_string(), status.to_string()));
    evaluate_existence(leaf, FhirResource::Condition, params, gateway).await
}
