//! Helpers shared by every existence-style Leaf Evaluator (condition,
//! medication, medication_request, allergy, procedure,
//! diagnostic_report, immunization): matching a leaf against candidate
//! resources, the `exists`/`contains` operator family, and evidence
//! assembly (spec.md §4.4 steps 2–5).

use serde::Serialize;
use time::OffsetDateTime;

use crate::error::EngineError;
use crate::evaluator::leaf::matching::bidirectional_match;
use crate::fhir::{FhirGateway, ResourceFacts, extract_facts};
use crate::schema::{Category, Criterion, FhirResource, Operator};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Evidence {
    pub matches: Vec<EvidenceMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvidenceMatch {
    pub resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
}

impl EvidenceMatch {
    pub fn from_facts(facts: &ResourceFacts) -> Self {
        Self {
            resource_id: facts.id.clone(),
            date: facts.date.clone(),
            code: facts.codings.first().map(|c| c.code.clone()),
            numeric_value: facts.numeric_value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeafOutcome {
    pub met: bool,
    pub reason: String,
    pub evidence: Evidence,
}

impl LeafOutcome {
    pub fn new(met: bool, reason: impl Into<String>, evidence: Evidence) -> Self {
        Self {
            met,
            reason: reason.into(),
            evidence,
        }
    }

    /// A hard FHIR query failure (spec.md §4.3): `met: false`, reason
    /// carries the stable `query_failed:<kind>` identifier verbatim.
    pub fn query_failed(error: &EngineError) -> Self {
        Self {
            met: false,
            reason: error.to_string(),
            evidence: Evidence::default(),
        }
    }

    /// An unexpected internal failure inside a leaf evaluator (spec.md
    /// §4.4 "Failure semantics"): does not abort the tree walk.
    pub fn evaluator_error(category: Category, detail: impl std::fmt::Display) -> Self {
        let slug = category_slug(category);
        Self {
            met: false,
            reason: format!("evaluator_error:{slug}: {detail}"),
            evidence: Evidence::default(),
        }
    }
}

pub fn category_slug(category: Category) -> &'static str {
    match category {
        Category::Demographics => "demographics",
        Category::Condition => "condition",
        Category::Observation => "observation",
        Category::Medication => "medication",
        Category::MedicationRequest => "medication_request",
        Category::Allergy => "allergy",
        Category::Procedure => "procedure",
        Category::DiagnosticReport => "diagnostic_report",
        Category::Immunization => "immunization",
        Category::PerformanceStatus => "performance_status",
    }
}

/// Value-based candidate match (spec.md §4.4 step 3): a resource
/// "matches" the leaf if it carries the leaf's exact coding, or — when
/// the leaf has no coding — if the leaf's text `value` and the
/// resource's text fields overlap bidirectionally.
pub fn resource_matches(leaf: &Criterion, facts: &ResourceFacts) -> bool {
    if let Some(coding) = &leaf.coding {
        return facts
            .codings
            .iter()
            .any(|c| c.system == coding.system && c.code == coding.code);
    }
    let Some(needle) = leaf.value.as_ref().and_then(|v| v.as_text()) else {
        return false;
    };
    facts
        .text
        .as_deref()
        .is_some_and(|text| bidirectional_match(needle, text))
        || facts
            .codings
            .iter()
            .any(|c| bidirectional_match(needle, &c.display))
}

/// Attribute-based candidate identification, used by Observation and
/// PerformanceStatus leaves where `value` is the clinical threshold to
/// compare against, not a search term: a resource is a candidate if it
/// carries the leaf's coding, or its text overlaps the leaf's
/// `attribute`/`description`.
pub fn identifies_resource(leaf: &Criterion, facts: &ResourceFacts) -> bool {
    if let Some(coding) = &leaf.coding {
        return facts
            .codings
            .iter()
            .any(|c| c.system == coding.system && c.code == coding.code);
    }
    let candidates: Vec<&str> = std::iter::once(leaf.attribute.as_str())
        .chain(leaf.description.as_deref())
        .filter(|s| !s.trim().is_empty())
        .collect();

    candidates.into_iter().any(|needle| {
        facts
            .text
            .as_deref()
            .is_some_and(|text| bidirectional_match(needle, text))
            || facts
                .codings
                .iter()
                .any(|c| bidirectional_match(needle, &c.display))
    })
}

/// Applies the `exists`/`contains`/`not_exists`/`not_contains` family
/// (spec.md §4.4 step 4) given whether any candidate resource matched.
pub fn existence_verdict(operator: Operator, any_match: bool) -> bool {
    match operator {
        Operator::Exists | Operator::Contains => any_match,
        Operator::NotExists | Operator::NotContains => !any_match,
        _ => any_match,
    }
}

/// Best-effort temporal window filter (spec.md §3 `temporal_constraint`,
/// §9 Open Question): a resource without a parseable date is excluded
/// from consideration when the leaf specifies a window, rather than
/// guessed into or out of it.
pub fn within_temporal_window(
    leaf: &Criterion,
    date: Option<&str>,
    now: OffsetDateTime,
) -> bool {
    let Some(constraint) = &leaf.temporal_constraint else {
        return true;
    };
    let Some(date) = date else {
        return false;
    };
    let format = time::macros::format_description!("[year]-[month]-[day]");
    let Ok(parsed) = time::Date::parse(date.trim().get(..10).unwrap_or(date.trim()), &format)
    else {
        return false;
    };
    let parsed_dt = parsed
        .with_hms(0, 0, 0)
        .expect("0:00:00 is always a valid time")
        .assume_utc();
    let days_elapsed = (now - parsed_dt).whole_days() as f64;
    let window_days = match constraint.unit.to_ascii_lowercase().as_str() {
        "day" | "days" => constraint.value,
        "week" | "weeks" => constraint.value * 7.0,
        "month" | "months" => constraint.value * 30.44,
        "year" | "years" => constraint.value * 365.25,
        _ => return false,
    };

    use crate::schema::TemporalDirection;
    match constraint.direction {
        TemporalDirection::Within => days_elapsed <= window_days,
        TemporalDirection::AtLeastAgo => days_elapsed >= window_days,
    }
}

/// Shared body for every existence-style category (condition,
/// medication, medication_request, allergy, procedure,
/// diagnostic_report, immunization): search, filter candidates down to
/// the ones that match the leaf and fall inside its temporal window,
/// then apply the exists/contains operator family.
pub async fn evaluate_existence(
    leaf: &Criterion,
    resource_type: FhirResource,
    params: Vec<(String, String)>,
    gateway: &dyn FhirGateway,
) -> LeafOutcome {
    let resources = match gateway.search(resource_type, &params).await {
        Ok(r) => r,
        Err(e) => return LeafOutcome::query_failed(&e),
    };

    let now = OffsetDateTime::now_utc();
    let matched: Vec<ResourceFacts> = resources
        .iter()
        .map(|r| extract_facts(resource_type, r))
        .filter(|facts| resource_matches(leaf, facts))
        .filter(|facts| within_temporal_window(leaf, facts.date.as_deref(), now))
        .collect();

    let met = existence_verdict(leaf.operator, !matched.is_empty());
    let slug = category_slug(leaf.category);
    let reason = match matched.first() {
        None => format!("no matching {slug} resource found"),
        Some(first) => describe_match(first, matched.len()),
    };
    let evidence = Evidence {
        matches: matched.iter().map(EvidenceMatch::from_facts).collect(),
    };
    LeafOutcome::new(met, reason, evidence)
}

/// Names the matched resource in the reason (spec.md §4.4 step 5, e.g.
/// `"metformin active on 2024-01-15"`), preferring its text over its
/// coding's display, and appending the date when known.
fn describe_match(first: &ResourceFacts, total: usize) -> String {
    let label = first
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| first.codings.first().map(|c| c.display.as_str()))
        .unwrap_or("matching record");
    let date_suffix = first
        .date
        .as_deref()
        .map(|d| format!(" on {d}"))
        .unwrap_or_default();
    if total > 1 {
        format!("{label} found{date_suffix} ({total} matching resources)")
    } else {
        format!("{label} found{date_suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Coding, FhirResource};

    fn leaf_with_value(value: &str, coding: Option<Coding>) -> Criterion {
        Criterion {
            type_: None,
            category: Category::Medication,
            description: None,
            attribute: "medication".into(),
            operator: Operator::Contains,
            value: Some(crate::schema::CriterionValue::Text(value.into())),
            unit: None,
            fhir_resource: FhirResource::MedicationStatement,
            coding,
            status_filter: None,
            temporal_constraint: None,
        }
    }

    #[test]
    fn resource_matches_prefers_exact_coding() {
        let leaf = leaf_with_value(
            "metformin",
            Some(Coding {
                system: "rxnorm".into(),
                code: "6809".into(),
                display: "metformin".into(),
            }),
        );
        let facts = ResourceFacts {
            id: "m1".into(),
            codings: vec![Coding {
                system: "rxnorm".into(),
                code: "6809".into(),
                display: "metformin".into(),
            }],
            text: None,
            ..Default::default()
        };
        assert!(resource_matches(&leaf, &facts));
    }

    #[test]
    fn resource_matches_falls_back_to_text() {
        let leaf = leaf_with_value("statin", None);
        let facts = ResourceFacts {
            id: "m2".into(),
            text: Some("Atorvastatin 40 mg".into()),
            ..Default::default()
        };
        assert!(resource_matches(&leaf, &facts));
    }

    #[test]
    fn existence_verdict_inverts_for_negative_operators() {
        assert!(existence_verdict(Operator::NotExists, false));
        assert!(!existence_verdict(Operator::NotExists, true));
        assert!(existence_verdict(Operator::Exists, true));
    }

    #[test]
    fn describe_match_cites_text_and_date() {
        let facts = ResourceFacts {
            id: "m1".into(),
            text: Some("Atorvastatin 40 mg".into()),
            date: Some("2024-01-15".into()),
            ..Default::default()
        };
        let reason = describe_match(&facts, 1);
        assert_eq!(reason, "Atorvastatin 40 mg found on 2024-01-15");
    }

    #[test]
    fn describe_match_falls_back_to_coding_display_without_text() {
        let facts = ResourceFacts {
            id: "m1".into(),
            codings: vec![Coding {
                system: "rxnorm".into(),
                code: "6809".into(),
                display: "Metformin".into(),
            }],
            text: None,
            ..Default::default()
        };
        let reason = describe_match(&facts, 2);
        assert_eq!(reason, "Metformin found (2 matching resources)");
    }

    #[tokio::test]
    async fn evaluate_existence_reason_names_the_matched_resource() {
        let leaf = leaf_with_value("statin", None);
        let gateway = crate::fhir::FakeFhirGateway::new().with(
            FhirResource::MedicationStatement,
            vec![serde_json::json!({
                "id": "m1",
                "status": "active",
                "medicationCodeableConcept": {"text": "Atorvastatin 40 mg"},
                "effectiveDateTime": "2024-01-15"
            })],
        );
        let outcome = evaluate_existence(
            &leaf,
            FhirResource::MedicationStatement,
            vec![("subject".into(), "Patient/p1".into())],
            &gateway,
        )
        .await;
        assert!(outcome.met);
        assert!(outcome.reason.to_ascii_lowercase().contains("atorvastatin"));
        assert!(outcome.reason.contains("2024-01-15"));
    }
}
