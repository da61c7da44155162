//! Coding-System Registry (spec.md §4.1): pure, static keyword → coding
//! lookup across LOINC, ICD-10-CM, SNOMED CT, RxNorm, CPT, and CVX.
//! No I/O, no mutable state; a miss returns `None` and callers fall
//! back to text-only matching.

mod seeds;

use crate::schema::{Category, Coding};

/// One entry in a category's keyword table: a lowercase alias and the
/// coding it resolves to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CodingSeed {
    pub keyword: &'static str,
    pub system: &'static str,
    pub code: &'static str,
    pub display: &'static str,
}

/// Looks up the best coding match for free text within a category.
///
/// Matching is case-insensitive and whitespace-normalized substring
/// matching over the category's curated keyword table. When multiple
/// keywords match, the longest keyword wins; ties break by table order
/// (earlier entries are considered more specific/canonical).
pub fn lookup(category: Category, text: &str) -> Option<Coding> {
    let haystack = normalize(text);
    if haystack.is_empty() {
        return None;
    }

    let table = seeds::table_for(category);
    pick_best(table.iter().filter(|seed| haystack.contains(seed.keyword))).map(|seed| Coding {
        system: seed.system.to_string(),
        code: seed.code.to_string(),
        display: seed.display.to_string(),
    })
}

/// Resolves a set of matching seeds to the one the lookup should return:
/// the longest keyword wins; a tie keeps whichever candidate was seen
/// first, i.e. table order (spec.md §4.1 "longest keyword, then by
/// registry order").
fn pick_best<'a>(candidates: impl Iterator<Item = &'a CodingSeed>) -> Option<&'a CodingSeed> {
    candidates.fold(None, |best, seed| match best {
        Some(current) if seed.keyword.len() <= current.keyword.len() => Some(current),
        _ => Some(seed),
    })
}

/// Looks up using the first haystack (in priority order) that yields a
/// match. Used by the compiler's post-enrichment step, which has
/// several candidate text fields (`attribute`, `value`, `description`)
/// to try for a leaf.
pub fn lookup_any(category: Category, candidates: &[&str]) -> Option<Coding> {
    candidates.iter().find_map(|text| lookup(category, text))
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_loinc_hba1c() {
        let coding = lookup(Category::Observation, "HbA1c level").unwrap();
        assert_eq!(coding.system, "http://loinc.org");
        assert_eq!(coding.code, "4548-4");
    }

    #[test]
    fn looks_up_icd10_type2_diabetes() {
        let coding = lookup(Category::Condition, "Type 2 diabetes mellitus").unwrap();
        assert_eq!(coding.system, "http://hl7.org/fhir/sid/icd-10-cm");
        assert_eq!(coding.code, "E11");
    }

    #[test]
    fn looks_up_rxnorm_metformin() {
        let coding = lookup(Category::Medication, "stable dose of metformin").unwrap();
        assert_eq!(coding.system, "http://www.nlm.nih.gov/research/umls/rxnorm");
        assert_eq!(coding.code, "6809");
    }

    #[test]
    fn looks_up_cvx_influenza_vaccine() {
        let coding = lookup(Category::Immunization, "influenza vaccine, seasonal").unwrap();
        assert_eq!(coding.system, "http://hl7.org/fhir/sid/cvx");
        assert_eq!(coding.code, "88");
    }

    #[test]
    fn looks_up_cpt_cabg() {
        let coding = lookup(Category::Procedure, "prior CABG surgery").unwrap();
        assert_eq!(coding.system, "http://www.ama-assn.org/go/cpt");
        assert_eq!(coding.code, "33533");
    }

    #[test]
    fn miss_returns_none_without_error() {
        assert!(lookup(Category::Condition, "an entirely made-up condition").is_none());
    }

    #[test]
    fn longest_keyword_wins_on_overlap() {
        // "ecog" alone maps to the performance-status scale generically,
        // but the fuller phrase should resolve to the same LOINC code
        // without ambiguity; this guards the longest-match tie-break.
        let coding = lookup(Category::PerformanceStatus, "ECOG performance status 0-1").unwrap();
        assert_eq!(coding.code, "89247-1");
    }

    #[test]
    fn lookup_any_tries_candidates_in_order() {
        let coding =
            lookup_any(Category::Condition, &["not a real diagnosis", "hypertension"]).unwrap();
        assert_eq!(coding.code, "I10");
    }

    #[test]
    fn equal_length_keywords_tie_break_to_the_earlier_entry() {
        let first = CodingSeed {
            keyword: "abcd",
            system: "sys-a",
            code: "A",
            display: "first",
        };
        let second = CodingSeed {
            keyword: "abcd",
            system: "sys-b",
            code: "B",
            display: "second",
        };
        let best = pick_best([&first, &second].into_iter()).unwrap();
        assert_eq!(best.code, "A", "a tie must resolve to the first-seen entry");
    }
}
