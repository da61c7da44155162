//! DiagnosticReport Leaf Evaluator (spec.md §4.4): `GET
//! DiagnosticReport?subject=Patient/{id}&status=final`. Matching also
//! considers the report's free-text `conclusion` (folded into
//! [`crate::fhir::ResourceFacts::text`] by `extract_facts`).

use crate::evaluator::leaf::common::{LeafOutcome, evaluate_existence};
use crate::fhir::FhirGateway;
use crate::schema::{Criterion, FhirResource};

pub async fn evaluate(
    leaf: &Criterion,
    patient_id: &str,
    gateway: &dyn FhirGateway,
) -> LeafOutcome {
    let mut params = vec![("subject".to_string(), format!("Patient/{patient_id}"))];
    let status = leaf.status_filter.as_deref().unwrap_or("final");
    params.push(("status".to_string(), status.to_string()));
    evaluate_existence(leaf, FhirResource::DiagnosticReport, params, gateway).await
}
