//! Criterion Tree Evaluator (spec.md §4.5): reduces a validated tree to
//! a single verdict by walking leaves through `leaf::dispatch` and
//! combining children under AND/OR/NOT with short-circuiting.

pub mod leaf;

use futures::StreamExt;
use futures::future::BoxFuture;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fhir::FhirGateway;
use crate::schema::{Criterion, CriterionGroup, CriterionNode, CriterionType, LogicOperator};

pub use leaf::{Evidence, LeafOutcome};

/// Per-node lifecycle (spec.md §4.5: `PENDING -> EVALUATING -> {MET,
/// UNMET, ERROR}`). Only the terminal variant is ever observed on a
/// [`ResultNode`]; the transient states exist so the state machine is a
/// named type rather than an implementation detail, per SPEC_FULL.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Met,
    Unmet,
    Error,
}

impl NodeState {
    fn from_met(met: bool, is_error: bool) -> Self {
        if is_error {
            Self::Error
        } else if met {
            Self::Met
        } else {
            Self::Unmet
        }
    }
}

/// A leaf's own shape, or a group's combinator without its children
/// (the children are already reachable via `sub_results`, so embedding
/// them again under `criterion` would duplicate the whole subtree).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CriterionSummary {
    Leaf(Criterion),
    Group {
        logic_operator: LogicOperator,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        type_: Option<CriterionType>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl From<&CriterionNode> for CriterionSummary {
    fn from(node: &CriterionNode) -> Self {
        match node {
            CriterionNode::Leaf(c) => Self::Leaf(c.clone()),
            CriterionNode::Group(g) => Self::Group {
                logic_operator: g.logic_operator,
                type_: g.type_,
                description: g.description.clone(),
            },
        }
    }
}

/// One node of the report's `results[]` tree (spec.md §6.2
/// `ResultNode`): a leaf or a group, each carrying `met`/`reason`, and
/// for groups a `sub_results[]` of the children actually evaluated
/// before short-circuiting.
#[derive(Debug, Clone, Serialize)]
pub struct ResultNode {
    pub criterion: CriterionSummary,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CriterionType>,
    pub state: NodeState,
    pub met: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_results: Option<Vec<ResultNode>>,
}

impl ResultNode {
    fn leaf(node: &CriterionNode, type_: Option<CriterionType>, outcome: LeafOutcome) -> Self {
        let is_error = outcome.reason.starts_with("query_failed")
            || outcome.reason.starts_with("evaluator_error");
        Self {
            criterion: node.into(),
            type_,
            state: NodeState::from_met(outcome.met, is_error),
            met: outcome.met,
            reason: outcome.reason,
            evidence: Some(outcome.evidence),
            sub_results: None,
        }
    }

    fn group(
        node: &CriterionNode,
        type_: Option<CriterionType>,
        met: bool,
        reason: String,
        sub_results: Vec<ResultNode>,
    ) -> Self {
        Self {
            criterion: node.into(),
            type_,
            state: NodeState::from_met(met, false),
            met,
            reason,
            evidence: None,
            sub_results: Some(sub_results),
        }
    }
}

/// Walks `node` against `patient_id`, dispatching leaves to
/// `crate::evaluator::leaf::dispatch` and combining group children
/// under AND/OR/NOT (spec.md §4.5). Errors only on `depth_exceeded`
/// (spec.md §8 P5); every other failure is captured as an `ERROR`-state
/// leaf result and does not abort the walk (P6).
pub fn evaluate_tree<'a>(
    node: &'a CriterionNode,
    patient_id: &'a str,
    gateway: &'a dyn FhirGateway,
    config: &'a EngineConfig,
) -> BoxFuture<'a, Result<ResultNode, EngineError>> {
    Box::pin(evaluate_at_depth(node, None, patient_id, gateway, config, 1))
}

async fn evaluate_at_depth<'a>(
    node: &'a CriterionNode,
    inherited_type: Option<CriterionType>,
    patient_id: &'a str,
    gateway: &'a dyn FhirGateway,
    config: &'a EngineConfig,
    depth: usize,
) -> Result<ResultNode, EngineError> {
    if depth > config.max_criteria_depth {
        return Err(EngineError::DepthExceeded {
            depth,
            limit: config.max_criteria_depth,
        });
    }

    match node {
        CriterionNode::Leaf(leaf) => {
            let effective_type = leaf.type_.or(inherited_type);
            let outcome = leaf::dispatch(leaf, patient_id, gateway).await;
            Ok(ResultNode::leaf(node, effective_type, outcome))
        }
        CriterionNode::Group(group) => {
            let effective_type = group.type_.or(inherited_type);
            evaluate_group(node, group, effective_type, patient_id, gateway, config, depth).await
        }
    }
}

async fn evaluate_group<'a>(
    node: &'a CriterionNode,
    group: &'a CriterionGroup,
    effective_type: Option<CriterionType>,
    patient_id: &'a str,
    gateway: &'a dyn FhirGateway,
    config: &'a EngineConfig,
    depth: usize,
) -> Result<ResultNode, EngineError> {
    let children = match (group.logic_operator, config.leaf_concurrency) {
        (LogicOperator::Not, _) => {
            let only = &group.criteria[0];
            vec![evaluate_at_depth(only, effective_type, patient_id, gateway, config, depth + 1).await?]
        }
        (_, Some(concurrency)) if all_leaves(&group.criteria) => {
            // Bounded-concurrency dispatch (SPEC_FULL.md §4.5): every
            // child is independently evaluated and all results are
            // collected, so the group's verdict is unaffected by
            // dispatch order (P4) even though true short-circuiting is
            // given up in this mode.
            let results: Vec<Result<ResultNode, EngineError>> = futures::stream::iter(
                group.criteria.iter().map(|child| {
                    evaluate_at_depth(child, effective_type, patient_id, gateway, config, depth + 1)
                }),
            )
            .buffered(concurrency.max(1))
            .collect()
            .await;
            results.into_iter().collect::<Result<Vec<_>, _>>()?
        }
        _ => {
            let mut evaluated = Vec::with_capacity(group.criteria.len());
            for child in &group.criteria {
                let result =
                    evaluate_at_depth(child, effective_type, patient_id, gateway, config, depth + 1)
                        .await?;
                let stop = match group.logic_operator {
                    LogicOperator::And => !result.met,
                    LogicOperator::Or => result.met,
                    LogicOperator::Not => unreachable!("NOT handled above"),
                };
                evaluated.push(result);
                if stop {
                    break;
                }
            }
            evaluated
        }
    };

    let (met, reason) = combine(group.logic_operator, &children);
    Ok(ResultNode::group(node, effective_type, met, reason, children))
}

fn all_leaves(nodes: &[CriterionNode]) -> bool {
    nodes.iter().all(CriterionNode::is_leaf)
}

/// Applies AND/OR/NOT to already-evaluated children (spec.md §4.5): AND
/// is met iff every child is met, OR iff any child is met, NOT inverts
/// its single child. `reason` is a short human summary, not part of the
/// stable error-identifier surface.
fn combine(operator: LogicOperator, children: &[ResultNode]) -> (bool, String) {
    match operator {
        LogicOperator::And => {
            let met = children.iter().all(|c| c.met);
            let reason = if met {
                format!("all {} child criteria met", children.len())
            } else {
                let unmet = children.iter().filter(|c| !c.met).count();
                format!("{unmet} of {} child criteria unmet", children.len())
            };
            (met, reason)
        }
        LogicOperator::Or => {
            let met = children.iter().any(|c| c.met);
            let reason = if met {
                "at least one child criterion met".to_string()
            } else {
                format!("none of {} child criteria met", children.len())
            };
            (met, reason)
        }
        LogicOperator::Not => {
            let child = &children[0];
            (!child.met, format!("negation of: {}", child.reason))
        }
    }
}
