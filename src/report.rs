//! `EligibilityReport` (spec.md §3, §6.2): the orchestrator's final
//! output, assembled from the top-level `ResultNode`s produced by the
//! Criterion Tree Evaluator.

use serde::Serialize;

use crate::evaluator::ResultNode;
use crate::schema::CriterionType;

/// Counts backing the report's headline numbers (spec.md §6.2
/// `summary`).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Summary {
    pub inclusion_met: usize,
    pub inclusion_total: usize,
    pub exclusion_violated: usize,
    pub exclusion_total: usize,
    /// Not in the wire shape literally spelled out in spec.md §6.2, but
    /// required by spec.md §7's propagation policy ("flagged in the
    /// report's summary so reviewers can re-run") for criteria whose
    /// result came back in an error state rather than a true verdict.
    pub errored: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timings {
    pub compile_ms: u64,
    pub evaluate_ms: u64,
}

/// The evaluator's output (spec.md §3 `EligibilityReport`, §6.2 wire
/// shape).
#[derive(Debug, Clone, Serialize)]
pub struct EligibilityReport {
    pub patient_id: String,
    pub trial_id: String,
    pub eligible: bool,
    pub confidence: u8,
    pub summary: Summary,
    pub results: Vec<ResultNode>,
    pub cache_hit: bool,
    pub timings: Timings,
}

/// Computes the top-level verdict (spec.md §4.5, §8 P8):
/// `eligible = (all inclusion criteria met) AND (no exclusion criterion
/// met)`. `confidence` is the fraction of inclusion criteria met, times
/// 100 — a transparent ratio, not a probability (spec.md §9 Open
/// Question, resolved in DESIGN.md: no probabilistic scoring).
///
/// A fully-errored inclusion criterion counts as unmet (conservative);
/// a fully-errored exclusion criterion counts as not-violated, but is
/// tallied into `summary.errored` so reviewers can re-run (spec.md §7).
pub fn summarize(
    patient_id: impl Into<String>,
    trial_id: impl Into<String>,
    results: Vec<ResultNode>,
    cache_hit: bool,
    timings: Timings,
) -> EligibilityReport {
    let mut summary = Summary::default();

    for node in &results {
        match node.type_ {
            Some(CriterionType::Inclusion) => {
                summary.inclusion_total += 1;
                if node.met {
                    summary.inclusion_met += 1;
                }
                if is_errored(node) {
                    summary.errored += 1;
                }
            }
            Some(CriterionType::Exclusion) => {
                summary.exclusion_total += 1;
                if node.met {
                    summary.exclusion_violated += 1;
                }
                if is_errored(node) {
                    summary.errored += 1;
                }
            }
            None => {}
        }
    }

    let eligible =
        summary.inclusion_met == summary.inclusion_total && summary.exclusion_violated == 0;
    let confidence = if summary.inclusion_total == 0 {
        100
    } else {
        ((summary.inclusion_met as f64 / summary.inclusion_total as f64) * 100.0).round() as u8
    };

    EligibilityReport {
        patient_id: patient_id.into(),
        trial_id: trial_id.into(),
        eligible,
        confidence,
        summary,
        results,
        cache_hit,
        timings,
    }
}

fn is_errored(node: &ResultNode) -> bool {
    matches!(node.state, crate::evaluator::NodeState::Error)
        || node
            .sub_results
            .as_ref()
            .is_some_and(|subs| subs.iter().any(is_errored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{CriterionSummary, NodeState};
    use crate::schema::{Category, Criterion, FhirResource, Operator};

    fn leaf_result(type_: CriterionType, met: bool, state: NodeState) -> ResultNode {
        ResultNode {
            criterion: CriterionSummary::Leaf(Criterion {
                type_: Some(type_),
                category: Category::Condition,
                description: None,
                attribute: "diagnosis".into(),
                operator: Operator::Exists,
                value: None,
                unit: None,
                fhir_resource: FhirResource::Condition,
                coding: None,
                status_filter: None,
                temporal_constraint: None,
            }),
            type_: Some(type_),
            state,
            met,
            reason: "test".into(),
            evidence: None,
            sub_results: None,
        }
    }

    #[test]
    fn eligible_when_all_inclusion_met_and_no_exclusion_violated() {
        let results = vec![
            leaf_result(CriterionType::Inclusion, true, NodeState::Met),
            leaf_result(CriterionType::Exclusion, false, NodeState::Unmet),
        ];
        let report = summarize(
            "p1",
            "t1",
            results,
            false,
            Timings {
                compile_ms: 1,
                evaluate_ms: 1,
            },
        );
        assert!(report.eligible);
        assert_eq!(report.confidence, 100);
    }

    #[test]
    fn not_eligible_when_exclusion_violated() {
        let results = vec![
            leaf_result(CriterionType::Inclusion, true, NodeState::Met),
            leaf_result(CriterionType::Exclusion, true, NodeState::Met),
        ];
        let report = summarize(
            "p1",
            "t1",
            results,
            false,
            Timings {
                compile_ms: 1,
                evaluate_ms: 1,
            },
        );
        assert!(!report.eligible);
        assert_eq!(report.summary.exclusion_violated, 1);
    }

    #[test]
    fn confidence_is_fraction_of_inclusion_met() {
        let results = vec![
            leaf_result(CriterionType::Inclusion, true, NodeState::Met),
            leaf_result(CriterionType::Inclusion, false, NodeState::Unmet),
        ];
        let report = summarize(
            "p1",
            "t1",
            results,
            false,
            Timings {
                compile_ms: 1,
                evaluate_ms: 1,
            },
        );
        assert_eq!(report.confidence, 50);
        assert!(!report.eligible);
    }

    #[test]
    fn errored_inclusion_counts_as_unmet_and_is_flagged() {
        let results = vec![leaf_result(CriterionType::Inclusion, false, NodeState::Error)];
        let report = summarize(
            "p1",
            "t1",
            results,
            false,
            Timings {
                compile_ms: 1,
                evaluate_ms: 1,
            },
        );
        assert!(!report.eligible);
        assert_eq!(report.summary.errored, 1);
    }
}
