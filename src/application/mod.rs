pub mod annotate;
pub mod batching;
