//! Orchestrator (spec.md §4.8): the end-to-end entry point wiring
//! Compiler + Evaluator + Cache into `evaluate(trial_id, criteria_text,
//! patient_id) -> EligibilityReport`.

use std::sync::Arc;
use std::time::Instant;

use crate::cache::Cache;
use crate::compiler;
use crate::compiler::llm::LlmClient;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::evaluator::{self, ResultNode};
use crate::fhir::FhirGateway;
use crate::report::{self, EligibilityReport, Timings};

/// Holds the collaborators an evaluation run needs. Constructed once
/// per process (or per tenant) and shared across invocations — the
/// cache and gateway are both designed for concurrent access (spec.md
/// §5).
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    cache: Arc<dyn Cache>,
    gateway: Arc<dyn FhirGateway>,
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        cache: Arc<dyn Cache>,
        gateway: Arc<dyn FhirGateway>,
        config: EngineConfig,
    ) -> Self {
        Self {
            llm,
            cache,
            gateway,
            config,
        }
    }

    /// Compiles (cache-first), evaluates, and assembles the
    /// [`EligibilityReport`] for one `(trial_id, criteria_text,
    /// patient_id)` invocation (spec.md §4.8 steps 1–4).
    pub async fn evaluate(
        &self,
        trial_id: &str,
        criteria_text: &str,
        patient_id: &str,
    ) -> Result<EligibilityReport, EngineError> {
        let compile_start = Instant::now();
        let (tree, cache_hit) = compiler::compile(
            trial_id,
            criteria_text,
            self.llm.as_ref(),
            self.cache.as_ref(),
            &self.config,
        )
        .await?;
        let compile_ms = compile_start.elapsed().as_millis() as u64;

        let evaluate_start = Instant::now();
        let mut results: Vec<ResultNode> = Vec::with_capacity(tree.len());
        for node in &tree {
            let result =
                evaluator::evaluate_tree(node, patient_id, self.gateway.as_ref(), &self.config)
                    .await?;
            results.push(result);
        }
        let evaluate_ms = evaluate_start.elapsed().as_millis() as u64;

        Ok(report::summarize(
            patient_id,
            trial_id,
            results,
            cache_hit,
            Timings {
                compile_ms,
                evaluate_ms,
            },
        ))
    }

    /// Compiles without evaluating, for callers that only want the tree
    /// (spec.md §6.1 `compile_request`).
    pub async fn compile(
        &self,
        trial_id: &str,
        criteria_text: &str,
    ) -> Result<crate::schema::CriterionTree, EngineError> {
        let (tree, _) = compiler::compile(
            trial_id,
            criteria_text,
            self.llm.as_ref(),
            self.cache.as_ref(),
            &self.config,
        )
        .await?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::compiler::llm::FakeLlmClient;
    use crate::fhir::FakeFhirGateway;
    use crate::schema::FhirResource;

    fn orchestrator(llm_response: &str, gateway: FakeFhirGateway) -> Orchestrator {
        Orchestrator::new(
            Arc::new(FakeLlmClient::new([llm_response.to_string()])),
            Arc::new(InMemoryCache::new()),
            Arc::new(gateway),
            EngineConfig::default(),
        )
    }

    // Scenario S1 (spec.md §8): simple age range.
    #[tokio::test]
    async fn scenario_s1_simple_age_range() {
        let response = r#"[{"type":"inclusion","category":"demographics","attribute":"age","operator":"between","value":[18,65],"fhir_resource":"Patient"}]"#;
        let gateway = FakeFhirGateway::new().with(
            FhirResource::Patient,
            vec![serde_json::json!({"id": "pt-1", "birthDate": "1979-05-15"})],
        );
        let orch = orchestrator(response, gateway);
        let report = orch.evaluate("trial-1", "Inclusion: Age 18-65.", "pt-1").await.unwrap();
        assert!(report.eligible);
        assert_eq!(report.results.len(), 1);
        assert!(report.results[0].reason.contains("age"));
    }

    // Scenario S3 (spec.md §8): nested AND/OR with exclusion.
    #[tokio::test]
    async fn scenario_s3_nested_and_or_with_exclusion() {
        let response = r#"[
            {"type":"inclusion","logic_operator":"AND","criteria":[
                {"logic_operator":"OR","criteria":[
                    {"category":"condition","attribute":"diagnosis","operator":"contains","value":"type 2 diabetes","fhir_resource":"Condition","coding":{"system":"http://hl7.org/fhir/sid/icd-10-cm","code":"E11","display":"Type 2 diabetes mellitus"}},
                    {"category":"condition","attribute":"diagnosis","operator":"contains","value":"pre-diabetes","fhir_resource":"Condition"}
                ]},
                {"category":"performance_status","attribute":"ecog","operator":"between","value":[0,1],"fhir_resource":"Observation","coding":{"system":"http://loinc.org","code":"89247-1","display":"ECOG"}}
            ]},
            {"type":"exclusion","category":"medication","attribute":"medication","operator":"contains","value":"insulin","fhir_resource":"MedicationStatement"}
        ]"#;
        let gateway = FakeFhirGateway::new()
            .with(
                FhirResource::Condition,
                vec![serde_json::json!({
                    "id": "c1",
                    "clinicalStatus": {"coding": [{"code": "active"}]},
                    "code": {"coding": [{"system": "http://hl7.org/fhir/sid/icd-10-cm", "code": "E11"}], "text": "Type 2 diabetes"}
                })],
            )
            .with(
                FhirResource::Observation,
                vec![serde_json::json!({
                    "id": "obs-1",
                    "code": {"coding": [{"system": "http://loinc.org", "code": "89247-1"}]},
                    "valueQuantity": {"value": 1}
                })],
            );
        let orch = orchestrator(response, gateway);
        let report = orch
            .evaluate("trial-3", "Inclusion: (T2D OR pre-diabetes) AND ECOG 0-1. Exclusion: insulin.", "pt-1")
            .await
            .unwrap();
        assert!(report.eligible);
        assert_eq!(report.summary.inclusion_met, 1);
        assert_eq!(report.summary.exclusion_violated, 0);
    }

    #[tokio::test]
    async fn cache_hit_flag_is_set_on_second_invocation() {
        let response = r#"[{"type":"inclusion","category":"demographics","attribute":"age","operator":"greater_than_or_equal","value":18,"fhir_resource":"Patient"}]"#;
        let gateway = FakeFhirGateway::new().with(
            FhirResource::Patient,
            vec![serde_json::json!({"id": "pt-1", "birthDate": "1979-05-15"})],
        );
        let cache = Arc::new(InMemoryCache::new());
        let orch = Orchestrator::new(
            Arc::new(FakeLlmClient::new([response.to_string()])),
            cache.clone(),
            Arc::new(gateway),
            EngineConfig::default(),
        );
        let first = orch.evaluate("trial-1", "Inclusion: Age >= 18.", "pt-1").await.unwrap();
        assert!(!first.cache_hit);

        let orch_second = Orchestrator::new(
            Arc::new(FakeLlmClient::new(Vec::<String>::new())),
            cache,
            Arc::new(FakeFhirGateway::new().with(
                FhirResource::Patient,
                vec![serde_json::json!({"id": "pt-1", "birthDate": "1979-05-15"})],
            )),
            EngineConfig::default(),
        );
        let second = orch_second.evaluate("trial-1", "Inclusion: Age >= 18.", "pt-1").await.unwrap();
        assert!(second.cache_hit);
    }
}
