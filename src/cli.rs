//! Developer-facing CLI (SPEC_FULL.md §2 item 12): exercises the
//! library end-to-end for manual testing and demos. This is explicitly
//! *not* the production ingress — spec.md §6.1 defines that as a JSON
//! request/response contract consumed by an external web/API layer.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::cache::InMemoryCache;
use crate::compiler::llm::HttpLlmClient;
use crate::config::EngineConfig;
use crate::fhir::HttpFhirGateway;
use crate::orchestrator::Orchestrator;
use crate::schema::validate_tree;

#[derive(Debug, Parser)]
#[command(name = "eligibility-cli", about = "Clinical-trial eligibility engine CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile free-text criteria into a validated criterion tree.
    Compile {
        /// Opaque trial identifier, used as half of the cache fingerprint.
        #[arg(long)]
        trial_id: String,
        /// Free-text eligibility criteria to compile.
        #[arg(long)]
        criteria_text: String,
    },
    /// Compile and evaluate criteria against one patient, producing an
    /// EligibilityReport.
    Evaluate {
        #[arg(long)]
        trial_id: String,
        #[arg(long)]
        criteria_text: String,
        #[arg(long)]
        patient_id: String,
    },
    /// Validate a criterion tree read from a JSON file (an array of
    /// top-level nodes, per spec.md §6.3).
    Validate {
        /// Path to a JSON file containing the criterion tree.
        #[arg(long)]
        file: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = EngineConfig::from_env();

    match cli.command {
        Command::Compile {
            trial_id,
            criteria_text,
        } => {
            let orchestrator = build_orchestrator(&config)?;
            let tree = orchestrator.compile(&trial_id, &criteria_text).await?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Command::Evaluate {
            trial_id,
            criteria_text,
            patient_id,
        } => {
            let orchestrator = build_orchestrator(&config)?;
            let report = orchestrator
                .evaluate(&trial_id, &criteria_text, &patient_id)
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Validate { file } => {
            let contents = std::fs::read_to_string(&file)?;
            let tree: crate::schema::CriterionTree = serde_json::from_str(&contents)?;
            validate_tree(&tree, config.max_criteria_depth)?;
            println!("valid: {} top-level criteria", tree.len());
        }
    }

    Ok(())
}

fn build_orchestrator(config: &EngineConfig) -> anyhow::Result<Orchestrator> {
    let llm = HttpLlmClient::new(config)?;
    let gateway = HttpFhirGateway::new(config)?;
    Ok(Orchestrator::new(
        Arc::new(llm),
        Arc::new(InMemoryCache::new()),
        Arc::new(gateway),
        config.clone(),
    ))
}
