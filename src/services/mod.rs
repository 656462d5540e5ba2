pub mod destinations;
pub mod extractor;
pub mod naming;
pub mod notifier;
pub mod pipeline;
