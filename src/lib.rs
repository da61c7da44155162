//! Clinical-trial patient-eligibility engine: an LLM-assisted Criteria
//! Compiler and a FHIR R4 Criterion Evaluator, wired together by a
//! thin Orchestrator (spec.md §2).
//!
//! This crate implements *only* the eligibility engine. Protocol
//! ingestion (OCR, NER, section classification), the web/API layer,
//! dashboards, and deployment are external collaborators whose wire
//! shapes are specified in `spec.md` §6 but whose implementations live
//! elsewhere.

pub mod cache;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod fhir;
pub mod net;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod schema;

pub use config::EngineConfig;
pub use error::EngineError;
pub use orchestrator::Orchestrator;
pub use report::EligibilityReport;
