//! Observation / performance-status Leaf Evaluator (spec.md §4.4): labs,
//! vitals, and the ECOG/Karnofsky functional-status scales, all carried
//! on FHIR `Observation` resources and compared numerically.
//!
//! `category = "performance_status"` unifies ECOG and Karnofsky under
//! one dispatch path rather than duplicating it under `observation`
//! (DESIGN.md's resolution of the spec.md §9 Open Question); both
//! categories share this evaluator because both query `Observation` and
//! compare a `valueQuantity` against a threshold.

use time::OffsetDateTime;

use crate::evaluator::leaf::common::{
    Evidence, EvidenceMatch, LeafOutcome, category_slug, existence_verdict, identifies_resource,
    within_temporal_window,
};
use crate::evaluator::leaf::matching::compare_numeric;
use crate::fhir::{FhirGateway, ResourceFacts, extract_facts};
use crate::schema::{Category, Criterion, FhirResource, Operator};

pub async fn evaluate(
    leaf: &Criterion,
    patient_id: &str,
    gateway: &dyn FhirGateway,
) -> LeafOutcome {
    let mut params = vec![("subject".to_string(), format!("Patient/{patient_id}"))];
    if let Some(coding) = &leaf.coding {
        params.push(("code".to_string(), format!("{}|{}", coding.system, coding.code)));
    }

    let resources = match gateway.search(FhirResource::Observation, &params).await {
        Ok(r) => r,
        Err(e) => return LeafOutcome::query_failed(&e),
    };

    let now = OffsetDateTime::now_utc();
    let candidates: Vec<ResourceFacts> = resources
        .iter()
        .map(|r| extract_facts(FhirResource::Observation, r))
        .filter(|facts| identifies_resource(leaf, facts))
        .filter(|facts| within_temporal_window(leaf, facts.date.as_deref(), now))
        .collect();

    if leaf.operator.requires_value()
        && !matches!(leaf.operator, Operator::Contains | Operator::NotContains)
    {
        return evaluate_numeric(leaf, &candidates);
    }
    evaluate_existence_style(leaf, &candidates)
}

/// Numeric threshold comparison (`between`, `greater_than`, …): take the
/// most recent matching observation carrying a `valueQuantity` and
/// compare it against the leaf's value (spec.md §4.4 step 4).
fn evaluate_numeric(leaf: &Criterion, candidates: &[ResourceFacts]) -> LeafOutcome {
    let Some(value) = &leaf.value else {
        return LeafOutcome::evaluator_error(leaf.category, "numeric leaf has no value");
    };

    let mut with_value: Vec<&ResourceFacts> = candidates
        .iter()
        .filter(|f| f.numeric_value.is_some())
        .collect();
    with_value.sort_by(|a, b| b.date.cmp(&a.date));

    let Some(latest) = with_value.first() else {
        return LeafOutcome::new(
            false,
            format!("no matching {} observation with a numeric value found", category_slug(leaf.category)),
            Evidence::default(),
        );
    };

    let observed = latest.numeric_value.expect("filtered for Some above");
    let met = compare_numeric(leaf.operator, value, observed).unwrap_or(false);
    let unit = latest.unit.clone().or_else(|| leaf.unit.clone()).unwrap_or_default();
    let reason = format!(
        "{} {observed} {unit} observed{}",
        leaf.attribute,
        latest
            .date
            .as_deref()
            .map(|d| format!(" on {d}"))
            .unwrap_or_default()
    );
    LeafOutcome::new(
        met,
        reason,
        Evidence {
            matches: vec![EvidenceMatch::from_facts(latest)],
        },
    )
}

/// `exists`/`not_exists`/`contains`/`not_contains` over performance-status
/// or observation leaves that don't carry a numeric comparison.
fn evaluate_existence_style(leaf: &Criterion, candidates: &[ResourceFacts]) -> LeafOutcome {
    let met = existence_verdict(leaf.operator, !candidates.is_empty());
    let slug = category_slug(leaf.category);
    let reason = if candidates.is_empty() {
        format!("no matching {slug} resource found")
    } else {
        format!("{} matching {slug} resource(s) found", candidates.len())
    };
    LeafOutcome::new(
        met,
        reason,
        Evidence {
            matches: candidates.iter().map(EvidenceMatch::from_facts).collect(),
        },
    )
}
