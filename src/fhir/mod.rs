//! FHIR Gateway (spec.md §4.3) and the narrow resource-fact extraction
//! the Leaf Evaluators build on (spec.md §4.4 step 2).

pub mod fake;
pub mod gateway;
pub mod resources;

pub use fake::FakeFhirGateway;
pub use gateway::{FhirGateway, HttpFhirGateway};
pub use resources::{ResourceFacts, extract_facts};
