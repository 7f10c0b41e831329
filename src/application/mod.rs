pub mod aggregator;
pub mod estimator;
pub mod file_processor;
pub mod orchestrator;
pub mod reporter;
pub mod retry;
