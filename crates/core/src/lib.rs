//! svn2git core library.
//!
//! Turns a repository fetched through git-svn into a plain git layout: bridged
//! tag refs become annotated tags, bridged branches become local branches and
//! trunk becomes the default branch. An existing conversion can be resynced
//! against new Subversion revisions.
//!
//! Every repository operation goes through a [`git::GitExecutor`]; the
//! [`Migration`] pipeline owns no global state.

pub mod config;
pub mod errors;
pub mod exclusion;
pub mod git;
pub mod migration;
pub mod refs;
pub mod revision;

#[cfg(test)]
mod testing;

// Re-exports for convenience.
pub use config::MigrationConfig;
pub use errors::MigrateError;
pub use git::ProcessExecutor;
pub use migration::{Migration, MigrationReport, TrunkOutcome};
pub use refs::RepositoryState;
