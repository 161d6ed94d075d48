pub mod aggregator;
pub mod classifier;
pub mod extractor;
pub mod handlers;
pub mod matcher;
pub mod orchestrator;
pub mod prompts;
