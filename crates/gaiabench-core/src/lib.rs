//! gaiabench-core: review workflow for the GAIA benchmark dataset.
//! Catalog → model query → substring comparison → manual outcome, plus the
//! dataset ingestion pipeline. The interactive surface lives in
//! `gaiabench-cli`.

pub mod catalog;
pub mod compare;
pub mod config;
pub mod ingest;
pub mod llm;
pub mod orchestrator;
pub mod report;
pub mod session;
pub mod summary;

pub use catalog::{fetch_attachment, Catalog, CatalogSource, JsonlFileSource, StoreCatalogSource};
pub use compare::is_correct;
pub use config::AppConfig;
pub use ingest::{IngestConfig, IngestReport};
pub use llm::{LlmClient, LlmConfig, ModelEndpoint};
pub use orchestrator::{build_prompt, Orchestrator, Reviewed, MODERATION_REJECTION, SYSTEM_PROMPT};
pub use session::Session;
