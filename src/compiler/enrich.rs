//! Coding post-enrichment (spec.md §4.6 step 6): a pure function over
//! the compiled tree that augments leaves lacking a `coding` with a
//! Registry lookup. Never overwrites a coding the model (or a prior
//! enrichment pass) already supplied (spec.md §8 P7).

use crate::registry;
use crate::schema::{CriterionNode, CriterionTree};

/// Walks every leaf in `tree` and fills in `coding` where absent.
/// Candidates are tried in order of specificity: the leaf's `value`
/// (the actual term a human or the model used), then `attribute`, then
/// `description`, so a leaf like `{attribute: "hba1c", value: [7,10]}`
/// still resolves via `attribute` when `value` isn't textual.
pub fn enrich(tree: &mut CriterionTree) {
    for node in tree {
        enrich_node(node);
    }
}

fn enrich_node(node: &mut CriterionNode) {
    match node {
        CriterionNode::Leaf(leaf) => {
            if leaf.coding.is_some() {
                return;
            }
            let value_text = leaf.value.as_ref().and_then(|v| v.as_text());
            let candidates: Vec<&str> = [value_text, Some(leaf.attribute.as_str()), leaf.description.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            leaf.coding = registry::lookup_any(leaf.category, &candidates);
        }
        CriterionNode::Group(group) => {
            for child in &mut group.criteria {
                enrich_node(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Category, Coding, Criterion, CriterionType, CriterionValue, FhirResource, Operator};

    fn hba1c_leaf(coding: Option<Coding>) -> CriterionNode {
        CriterionNode::Leaf(Criterion {
            type_: Some(CriterionType::Inclusion),
            category: Category::Observation,
            description: Some("HbA1c 7-10 %".into()),
            attribute: "hba1c".into(),
            operator: Operator::Between,
            value: Some(CriterionValue::Range(7.0, 10.0)),
            unit: Some("%".into()),
            fhir_resource: FhirResource::Observation,
            coding,
            status_filter: None,
            temporal_constraint: None,
        })
    }

    #[test]
    fn fills_missing_coding_from_attribute() {
        let mut tree = vec![hba1c_leaf(None)];
        enrich(&mut tree);
        let CriterionNode::Leaf(leaf) = &tree[0] else { unreachable!() };
        assert_eq!(leaf.coding.as_ref().unwrap().code, "4548-4");
    }

    #[test]
    fn never_overwrites_existing_coding() {
        let existing = Coding {
            system: "http://loinc.org".into(),
            code: "CUSTOM".into(),
            display: "custom".into(),
        };
        let mut tree = vec![hba1c_leaf(Some(existing.clone()))];
        enrich(&mut tree);
        let CriterionNode::Leaf(leaf) = &tree[0] else { unreachable!() };
        assert_eq!(leaf.coding.as_ref().unwrap().code, existing.code);
    }

    #[test]
    fn leaves_coding_none_on_registry_miss() {
        let mut leaf = hba1c_leaf(None);
        if let CriterionNode::Leaf(c) = &mut leaf {
            c.attribute = "some entirely novel lab test".into();
            c.description = None;
            c.value = Some(CriterionValue::Range(1.0, 2.0));
        }
        let mut tree = vec![leaf];
        enrich(&mut tree);
        let CriterionNode::Leaf(leaf) = &tree[0] else { unreachable!() };
        assert!(leaf.coding.is_none());
    }
}
