pub mod config;
pub mod domain;
pub mod metrics;
pub mod services;

pub use config::EngineConfig;
pub use domain::console::{ConsoleAction, ConsoleStore};
pub use domain::workflow::{WorkflowController, WorkflowError, WorkflowIntent};
pub use metrics::Metrics;
