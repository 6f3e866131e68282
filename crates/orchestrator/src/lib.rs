//! The build pipeline: generate a site with a language model, publish it,
//! wait for it to come up and report back to the evaluator.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod generator;
pub mod notifier;
pub mod pipeline;
pub mod state_machine;

pub use config::{NotifierConfig, PipelineConfig};
pub use dispatcher::{TaskDispatcher, TaskLocks};
pub use error::{OrchestratorError, Result};
pub use generator::SiteGenerator;
pub use notifier::EvaluationNotifier;
pub use pipeline::{PipelineOutcome, TaskPipeline};
pub use state_machine::StageMachine;
