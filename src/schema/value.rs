//! `Criterion::value`'s three observed wire shapes (spec.md §3): a
//! scalar number, a `[low, high]` pair for `between`, or free text for
//! string matches.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriterionValue {
    Range(f64, f64),
    Number(f64),
    Text(String),
}

impl CriterionValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            Self::Range(lo, hi) => Some((*lo, *hi)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_range_pair() {
        let v: CriterionValue = serde_json::from_value(serde_json::json!([7, 10])).unwrap();
        assert_eq!(v.as_range(), Some((7.0, 10.0)));
    }

    #[test]
    fn deserializes_scalar_number() {
        let v: CriterionValue = serde_json::from_value(serde_json::json!(65)).unwrap();
        assert_eq!(v.as_number(), Some(65.0));
    }

    #[test]
    fn deserializes_text() {
        let v: CriterionValue = serde_json::from_value(serde_json::json!("insulin")).unwrap();
        assert_eq!(v.as_text(), Some("insulin"));
    }
}
