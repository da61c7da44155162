//! Criterion Schema & Validator (spec.md §3, §4.2): the in-memory
//! criterion-tree data model and the single gate between the Compiler
//! and the Evaluator.

mod validate;
mod value;

pub use validate::{validate, walk};
pub use value::CriterionValue;

use serde::{Deserialize, Serialize};

/// `spec.md` §3: inclusion/exclusion, inherited from the enclosing
/// group when a leaf or sub-group omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionType {
    Inclusion,
    Exclusion,
}

/// `spec.md` §3 closed category set. `PerformanceStatus` unifies ECOG
/// and Karnofsky (see DESIGN.md's resolution of the Open Question in
/// spec.md §9); `Observation` is still used for ordinary labs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Demographics,
    Condition,
    Observation,
    Medication,
    MedicationRequest,
    Allergy,
    Procedure,
    DiagnosticReport,
    Immunization,
    PerformanceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    Between,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    NotContains,
    Exists,
    NotExists,
}

impl Operator {
    /// `exists`/`not_exists` leaves carry no `value`; every other
    /// operator requires one.
    pub fn requires_value(self) -> bool {
        !matches!(self, Self::Exists | Self::NotExists)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "NOT")]
    Not,
}

/// The FHIR R4 resource kind a leaf's query targets; dictates which
/// Leaf Evaluator runs (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FhirResource {
    Patient,
    Condition,
    Observation,
    MedicationStatement,
    MedicationRequest,
    AllergyIntolerance,
    Procedure,
    DiagnosticReport,
    Immunization,
}

/// `{system, code, display}` triple injected by the Compiler's
/// post-enrichment pass, or supplied directly by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalDirection {
    Within,
    AtLeastAgo,
}

/// `{value, unit, direction}` best-effort temporal window (spec.md §3,
/// §9 Open Question — resolved as a client-side filter in DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalConstraint {
    pub value: f64,
    pub unit: String,
    pub direction: TemporalDirection,
}

/// A leaf node: one atomic, FHIR-targeted check (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub type_: Option<CriterionType>,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    pub attribute: String,
    pub operator: Operator,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<CriterionValue>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unit: Option<String>,
    pub fhir_resource: FhirResource,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub coding: Option<Coding>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temporal_constraint: Option<TemporalConstraint>,
}

/// An internal node combining children under AND/OR/NOT (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionGroup {
    pub logic_operator: LogicOperator,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub type_: Option<CriterionType>,
    pub criteria: Vec<CriterionNode>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// A node is a leaf iff it has no `criteria` array; no node is both
/// (spec.md §3 invariant). `serde(untagged)` reflects the wire form
/// exactly: there is no explicit discriminator field, only the
/// presence or absence of `criteria`/`logic_operator`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriterionNode {
    Group(CriterionGroup),
    Leaf(Criterion),
}

/// A compiled protocol: an ordered list of top-level nodes, each tagged
/// `inclusion`/`exclusion` (spec.md §4.6 step 5, "ensure top-level
/// form"). This is what the Compiler produces, the Cache stores, and
/// the Evaluator walks one top-level node at a time.
pub type CriterionTree = Vec<CriterionNode>;

/// Validates every top-level node of a tree (spec.md §4.2: "the only
/// gate between the Compiler and the Evaluator").
pub fn validate_tree(tree: &CriterionTree, max_depth: usize) -> Result<(), crate::error::EngineError> {
    for node in tree {
        validate(node, max_depth)?;
    }
    Ok(())
}

impl CriterionNode {
    pub fn type_of(&self) -> Option<CriterionType> {
        match self {
            Self::Leaf(c) => c.type_,
            Self::Group(g) => g.type_,
        }
    }

    pub fn set_type(&mut self, t: CriterionType) {
        match self {
            Self::Leaf(c) => c.type_ = Some(t),
            Self::Group(g) => g.type_ = Some(t),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Leaf(c) => c.description.as_deref(),
            Self::Group(g) => g.description.as_deref(),
        }
    }
}
