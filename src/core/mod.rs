pub mod cache;
pub mod orchestrator;
pub mod periods;
pub mod timeseries;
