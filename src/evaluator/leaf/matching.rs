//! Shared matching and comparison policy used by every Leaf Evaluator
//! (spec.md §4.4 step 3–4): bidirectional substring matching for text,
//! numeric operator application, and age computation.

use time::Date;

use crate::schema::{CriterionValue, Operator};

/// Below this length, a candidate string is too short to match by
/// substring alone (spec.md §9: `"met"` must not match `"metformin"`,
/// but `"statin"` — length 6 — must still match `"atorvastatin"`).
const MIN_SUBSTRING_LEN: usize = 4;

/// Bidirectional, whole-phrase, case-insensitive substring match: true
/// iff either string contains the other. Intentionally permissive for
/// generic-to-brand matching (`"statin"` ⊂ `"atorvastatin"`), guarded
/// against very short terms by [`MIN_SUBSTRING_LEN`].
pub fn bidirectional_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_ascii_lowercase();
    let b = b.trim().to_ascii_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a.len() < MIN_SUBSTRING_LEN || b.len() < MIN_SUBSTRING_LEN {
        return a == b;
    }
    a.contains(&b) || b.contains(&a)
}

/// Applies a numeric operator (spec.md §4.4 step 4) to an observed
/// value. Returns `None` when the operator isn't a numeric comparison
/// (`contains`/`exists`/etc. are handled by the caller directly).
pub fn compare_numeric(operator: Operator, value: &CriterionValue, observed: f64) -> Option<bool> {
    match operator {
        Operator::Equals => value.as_number().map(|expected| {
            const EPSILON: f64 = 1e-9;
            (observed - expected).abs() < EPSILON
        }),
        Operator::Between => value
            .as_range()
            .map(|(low, high)| observed >= low && observed <= high),
        Operator::GreaterThan => value.as_number().map(|expected| observed > expected),
        Operator::GreaterThanOrEqual => value.as_number().map(|expected| observed >= expected),
        Operator::LessThan => value.as_number().map(|expected| observed < expected),
        Operator::LessThanOrEqual => value.as_number().map(|expected| observed <= expected),
        Operator::Contains
        | Operator::NotContains
        | Operator::Exists
        | Operator::NotExists => None,
    }
}

/// Computes age in whole years as `floor((today - birth_date) / 365.25)`
/// (spec.md §4.4 demographics row). `birth_date` is an ISO-8601 date
/// (`YYYY-MM-DD`); returns `None` if it can't be parsed.
pub fn compute_age(birth_date: &str, today: Date) -> Option<f64> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    let birth = Date::parse(birth_date.trim(), &format).ok()?;
    let days = (today - birth).whole_days() as f64;
    Some((days / 365.25).floor())
}
