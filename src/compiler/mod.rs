//! Criteria Compiler (spec.md §4.6): converts free-text eligibility
//! criteria into a validated [`CriterionTree`] by invoking an LLM to
//! draft structure, then post-processing: JSON extraction, structural
//! normalization, coding post-enrichment, and validation with one
//! model-repair round on failure.

pub mod enrich;
pub mod extract;
pub mod llm;
pub mod normalize;
pub mod prompt;

use std::time::{Duration, SystemTime};

use serde_json::Value;
use tracing::{info, warn};

use crate::cache::{Cache, CacheEntry, fingerprint};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::schema::{CriterionNode, CriterionTree, validate_tree};
use llm::LlmClient;

/// Compiles `criteria_text` for `trial_id` into a validated tree
/// (spec.md §4.6 steps 1–8). Cache-first: identical `(trial_id,
/// criteria_text)` within the cache's TTL returns a byte-identical tree
/// without re-invoking the model (spec.md §8 P2).
pub async fn compile(
    trial_id: &str,
    criteria_text: &str,
    llm: &dyn LlmClient,
    cache: &dyn Cache,
    config: &EngineConfig,
) -> Result<(CriterionTree, bool), EngineError> {
    let fp = fingerprint(trial_id, criteria_text);

    if let Some(entry) = cache.get(&fp).await? {
        info!(trial_id, fingerprint = %fp, "compiler cache hit");
        return Ok((entry.compiled_tree, true));
    }

    let draft = prompt::draft_prompt(criteria_text);
    let raw_response = llm.complete(&draft).await?;

    match build_tree(&raw_response) {
        Ok(tree) => {
            write_cache(cache, &fp, trial_id, criteria_text, &tree, config).await?;
            Ok((tree, false))
        }
        Err(first_error) => {
            warn!(trial_id, error = %first_error, "compiled tree failed validation, attempting repair");
            let repair = prompt::repair_prompt(criteria_text, &raw_response, &first_error.to_string());
            let repaired_response = llm.complete(&repair).await?;

            match build_tree(&repaired_response) {
                Ok(tree) => {
                    write_cache(cache, &fp, trial_id, criteria_text, &tree, config).await?;
                    Ok((tree, false))
                }
                Err(second_error) => Err(EngineError::SchemaInvalid(format!(
                    "compilation failed after repair attempt: {second_error}"
                ))),
            }
        }
    }
}

/// Runs extraction -> normalization -> typed parse -> enrichment ->
/// validation (spec.md §4.6 steps 4–7) over one model response.
fn build_tree(raw_response: &str) -> Result<CriterionTree, EngineError> {
    let extracted = extract::extract_json(raw_response)?;
    let normalized = normalize::normalize(extracted);
    let mut tree = parse_nodes(normalized)?;
    enrich::enrich(&mut tree);
    validate_tree(&tree, MAX_DEPTH_GUARD)?;
    Ok(tree)
}

/// Guard depth used during compile-time validation; the caller's
/// `EngineConfig::max_criteria_depth` governs evaluate-time depth
/// checking (spec.md §3: "Tree depth <= `MAX_CRITERIA_DEPTH` (default
/// 10; configurable)"). Compilation uses the same default so a
/// pathologically nested model response is rejected before it is ever
/// cached.
const MAX_DEPTH_GUARD: usize = 10;

fn parse_nodes(values: Vec<Value>) -> Result<CriterionTree, EngineError> {
    values
        .into_iter()
        .map(|v| {
            serde_json::from_value::<CriterionNode>(v.clone()).map_err(|e| {
                EngineError::SchemaInvalid(format!(
                    "node does not match the criterion schema: {e} (node: {v})"
                ))
            })
        })
        .collect()
}

async fn write_cache(
    cache: &dyn Cache,
    fp: &str,
    trial_id: &str,
    criteria_text: &str,
    tree: &CriterionTree,
    config: &EngineConfig,
) -> Result<(), EngineError> {
    cache
        .put(CacheEntry {
            fingerprint: fp.to_string(),
            trial_id: trial_id.to_string(),
            criteria_text: criteria_text.to_string(),
            compiled_tree: tree.clone(),
            created_at: SystemTime::now(),
            ttl: Duration::from_secs(config.cache_ttl_days * 24 * 60 * 60),
        })
        .await
}
