pub mod aggregator;
pub mod message_selector;
pub mod probability_engine;
pub mod query_processor;

pub use aggregator::Aggregator;
pub use message_selector::{Bucket, MessageSelector};
pub use probability_engine::ProbabilityEngine;
pub use query_processor::QueryProcessor;
