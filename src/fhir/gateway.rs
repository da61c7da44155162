//! FHIR Gateway (spec.md §4.3): a signed-request client to the FHIR R4
//! datastore. Issues resource-typed searches, pages transparently, and
//! returns normalized bundles (a flat `Vec<serde_json::Value>` of the
//! matching resources).

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, QueryFailureKind};
use crate::net;
use crate::schema::FhirResource;

/// Safety cap on the number of pages a single search follows.
const MAX_PAGES: usize = 20;

fn resource_path(resource_type: FhirResource) -> &'static str {
    match resource_type {
        FhirResource::Patient => "Patient",
        FhirResource::Condition => "Condition",
        FhirResource::Observation => "Observation",
        FhirResource::MedicationStatement => "MedicationStatement",
        FhirResource::MedicationRequest => "MedicationRequest",
        FhirResource::AllergyIntolerance => "AllergyIntolerance",
        FhirResource::Procedure => "Procedure",
        FhirResource::DiagnosticReport => "DiagnosticReport",
        FhirResource::Immunization => "Immunization",
    }
}

/// `search(resource_type, params) -> [resource...]` (spec.md §4.3).
/// Implementations must not silently convert a hard failure into an
/// empty result: on transport/HTTP failure they return
/// `EngineError::QueryFailed`, which leaf evaluators convert to
/// `met: false, reason: "query_failed:<detail>"` — a genuinely empty
/// result set (zero matching resources) is `Ok(vec![])`.
#[async_trait]
pub trait FhirGateway: Send + Sync {
    async fn search(
        &self,
        resource_type: FhirResource,
        params: &[(String, String)],
    ) -> Result<Vec<Value>, EngineError>;
}

/// Production `FhirGateway` over `reqwest-middleware`, with bounded
/// retries and a per-call timeout sourced from `EngineConfig`.
pub struct HttpFhirGateway {
    client: ClientWithMiddleware,
    base: String,
}

impl HttpFhirGateway {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = net::retrying_client(config.fhir_timeout, config.fhir_max_retries)?;
        Ok(Self {
            client,
            base: config.fhir_endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, resource_type: FhirResource) -> String {
        format!("{}/{}", self.base, resource_path(resource_type))
    }
}

#[async_trait]
impl FhirGateway for HttpFhirGateway {
    async fn search(
        &self,
        resource_type: FhirResource,
        params: &[(String, String)],
    ) -> Result<Vec<Value>, EngineError> {
        let mut resources = Vec::new();
        let mut url = self.endpoint(resource_type);
        let mut query = params.to_vec();
        query.push(("_count".to_string(), "50".to_string()));

        for page in 0..MAX_PAGES {
            let req = if page == 0 {
                self.client.get(&url).query(&query)
            } else {
                self.client.get(&url)
            };

            debug!(resource = resource_path(resource_type), page, "fhir search");
            let resp = req.send().await.map_err(|e| {
                let kind = if e.to_string().to_ascii_lowercase().contains("timed out") {
                    QueryFailureKind::Timeout
                } else {
                    QueryFailureKind::Network
                };
                EngineError::QueryFailed {
                    kind,
                    detail: format!("{}: {e}", resource_path(resource_type)),
                }
            })?;

            let (status, bytes) = net::read_body_capped(resp, resource_path(resource_type)).await?;
            if !status.is_success() {
                return Err(EngineError::QueryFailed {
                    kind: net::classify_status(status),
                    detail: format!(
                        "{}: HTTP {status}: {}",
                        resource_path(resource_type),
                        net::body_excerpt(&bytes)
                    ),
                });
            }

            let bundle: Value = serde_json::from_slice(&bytes).map_err(|e| {
                warn!(error = %e, "fhir bundle failed to parse as json");
                EngineError::QueryFailed {
                    kind: QueryFailureKind::Network,
                    detail: format!(
                        "{}: invalid JSON response: {}",
                        resource_path(resource_type),
                        net::body_excerpt(&bytes)
                    ),
                }
            })?;

            if let Some(entries) = bundle.get("entry").and_then(Value::as_array) {
                for entry in entries {
                    if let Some(resource) = entry.get("resource") {
                        resources.push(resource.clone());
                    }
                }
            }

            let next = bundle
                .get("link")
                .and_then(Value::as_array)
                .and_then(|links| {
                    links.iter().find(|l| {
                        l.get("relation").and_then(Value::as_str) == Some("next")
                    })
                })
                .and_then(|l| l.get("url"))
                .and_then(Value::as_str)
                .map(str::to_string);

            match next {
                Some(next_url) => url = next_url,
                None => break,
            }
        }

        Ok(resources)
    }
}
