//! Allergy Leaf Evaluator (spec.md §4.4): `GET AllergyIntolerance?patient={id}`.

use crate::evaluator::leaf::common::{LeafOutcome, evaluate_existence};
use crate::fhir::FhirGateway;
use crate::schema::{Criterion, FhirResource};

pub async fn evaluate(
    leaf: &Criterion,
    patient_id: &str,
    gateway: &dyn FhirGateway,
) -> LeafOutcome {
    let mut params = vec![("patient".to_string(), patient_id.to_string())];
    if let Some(status) = &leaf.status_filter {
        params.push(("clinical-status".to_string(), status.clone()));
    }
    evaluate_existence(leaf, FhirResource::AllergyIntolerance, params, gateway).await
}
