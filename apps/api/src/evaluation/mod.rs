pub mod comparison;
pub mod handlers;
pub mod metrics;
pub mod reconciler;
pub mod report;
pub mod survey;
