//! An in-memory [`FhirGateway`] for tests: deterministic FHIR fixtures
//! with no network dependency, so gateway-dependent code can be exercised
//! with fixture-driven async tests and no live FHIR server.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::EngineError;
use crate::fhir::gateway::FhirGateway;
use crate::schema::FhirResource;

/// Holds canned resources keyed by FHIR resource type. `search` ignores
/// query parameters entirely and returns every fixture registered under
/// the requested resource type — callers scope fixtures per test.
#[derive(Default)]
pub struct FakeFhirGateway {
    resources: Mutex<HashMap<FhirResource, Vec<Value>>>,
}

impl FakeFhirGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource_type: FhirResource, resources: Vec<Value>) -> Self {
        self.resources
            .get_mut()
            .expect("fixture mutex poisoned")
            .insert(resource_type, resources);
        self
    }

    pub fn push(&self, resource_type: FhirResource, resource: Value) {
        self.resources
            .lock()
            .expect("fixture mutex poisoned")
            .entry(resource_type)
            .or_default()
            .push(resource);
    }
}

#[async_trait]
impl FhirGateway for FakeFhirGateway {
    async fn search(
        &self,
        resource_type: FhirResource,
        _params: &[(String, String)],
    ) -> Result<Vec<Value>, EngineError> {
        Ok(self
            .resources
            .lock()
            .expect("fixture mutex poisoned")
            .get(&resource_type)
            .cloned()
            .unwrap_or_default())
    }
}
