//! Integration layer wiring storage, speech engines and the interpreter
//! into one event loop.

pub mod config;
pub mod console;
pub mod orchestrator;

pub use config::{AppConfig, ChatConfig, StorageConfig, CONFIG_ENV_VAR};
pub use console::TypedInput;
pub use orchestrator::{
    Orchestrator, OrchestratorBuilder, OrchestratorCommand, OrchestratorEvent, OrchestratorHandle,
};
