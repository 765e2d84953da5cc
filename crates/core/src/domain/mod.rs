pub mod candidate;
pub mod exchange;
pub mod metrics;
pub mod query;
