//! Git plumbing for the migration: typed commands and the executor seam.

pub mod command;
pub mod executor;

pub use command::{GitCommand, LogField, SvnInitOptions, SvnLayout};
pub use executor::{CommandOutput, GitExecutor, ProcessExecutor};
