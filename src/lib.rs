pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::annotate::use_case::{AnnotationOrchestrator, OrchestratorState, Submission};
pub use domain::errors::{Requirement, VisionError, VisionResult};
