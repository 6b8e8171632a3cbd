//! Voice command interpretation
//!
//! This module provides:
//! - Ordered keyword rules resolving a transcript to a `Command`
//! - `CommandInterpreter`, which applies a command to the listing store

pub mod interpreter;
pub mod rules;

pub use interpreter::{CommandInterpreter, Effect, Outcome};
pub use rules::{interpret, Command, ServiceCategory, SERVICE_CATEGORIES};
