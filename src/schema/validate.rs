//! The single validity gate between the Compiler and the Evaluator
//! (spec.md §4.2). Anything the Evaluator receives has passed `validate`.

use super::{CriterionNode, LogicOperator, Operator};
use crate::error::EngineError;

/// Recursively validates a tree against the invariants in spec.md §3:
/// `NOT` has exactly one child, groups are non-empty, every leaf has a
/// `type` (inherited or explicit) and a value where its operator
/// requires one, and depth never exceeds `max_depth`.
pub fn validate(node: &CriterionNode, max_depth: usize) -> Result<(), EngineError> {
    validate_at_depth(node, 1, max_depth)
}

fn validate_at_depth(node: &CriterionNode, depth: usize, max_depth: usize) -> Result<(), EngineError> {
    if depth > max_depth {
        return Err(EngineError::DepthExceeded {
            depth,
            limit: max_depth,
        });
    }

    match node {
        CriterionNode::Leaf(leaf) => {
            if leaf.type_.is_none() {
                return Err(EngineError::SchemaInvalid(format!(
                    "leaf with attribute '{}' is missing 'type' (inclusion/exclusion)",
                    leaf.attribute
                )));
            }
            if leaf.operator.requires_value() && leaf.value.is_none() {
                return Err(EngineError::SchemaInvalid(format!(
                    "leaf with attribute '{}' and operator {:?} requires a value",
                    leaf.attribute, leaf.operator
                )));
            }
            if matches!(leaf.operator, Operator::Between) && leaf.value.as_ref().is_some_and(|v| v.as_range().is_none())
            {
                return Err(EngineError::SchemaInvalid(format!(
                    "leaf with attribute '{}' uses 'between' but value is not a [low, high] pair",
                    leaf.attribute
                )));
            }
            Ok(())
        }
        CriterionNode::Group(group) => {
            if group.criteria.is_empty() {
                return Err(EngineError::SchemaInvalid(
                    "group has no child criteria".to_string(),
                ));
            }
            if matches!(group.logic_operator, LogicOperator::Not) && group.criteria.len() != 1 {
                return Err(EngineError::SchemaInvalid(format!(
                    "NOT group must have exactly one child, found {}",
                    group.criteria.len()
                )));
            }
            if group.type_.is_none() && depth == 1 {
                return Err(EngineError::SchemaInvalid(
                    "top-level group is missing 'type' (inclusion/exclusion)".to_string(),
                ));
            }
            for child in &group.criteria {
                validate_at_depth(child, depth + 1, max_depth)?;
            }
            Ok(())
        }
    }
}

/// Generic post-order traversal utility used by the Evaluator: visits
/// every descendant of `node` before `node` itself.
pub fn walk<'a>(node: &'a CriterionNode, visitor: &mut impl FnMut(&'a CriterionNode, usize)) {
    walk_at_depth(node, 1, visitor);
}

fn walk_at_depth<'a>(
    node: &'a CriterionNode,
    depth: usize,
    visitor: &mut impl FnMut(&'a CriterionNode, usize),
) {
    if let CriterionNode::Group(group) = node {
        for child in &group.criteria {
            walk_at_depth(child, depth + 1, visitor);
        }
    }
    visitor(node, depth);
}
