//! Error types for the svn2git core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and the
//! top-level [`MigrateError`] enum unifies them for the pipeline stages.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Error returned by every migration stage.
///
/// The pipeline stops at the first error; nothing already applied to the
/// repository is rolled back.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Revision(#[from] RevisionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A `git log` field query did not produce exactly one usable line.
    #[error("unexpected output for {field} of '{reference}': {detail}")]
    UnexpectedLogOutput {
        reference: String,
        field: String,
        detail: String,
    },

    /// Resync requires a working tree without pending changes.
    #[error("the working tree has pending changes and must be clean to continue:\n{0}")]
    DirtyWorkingTree(String),
}

// ---------------------------------------------------------------------------
// Git executor errors
// ---------------------------------------------------------------------------

/// Errors from invoking `git` subprocesses.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// A `git` command exited with a non-zero status.
    #[error("git command failed (exit {exit_code}): {command}\n{output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    /// A command builder rejected one of its inputs.
    #[error("invalid argument for git {operation}: {detail}")]
    InvalidArgument {
        operation: &'static str,
        detail: String,
    },

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Revision range errors
// ---------------------------------------------------------------------------

/// Errors from parsing the `--revision` argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevisionError {
    /// A single-token range with nothing in it.
    #[error("invalid empty argument to '--revision'")]
    EmptyRevisionStart,

    /// More than one `:` separator.
    #[error("invalid argument to '--revision' ({0:?})")]
    MalformedRevisionRange(String),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A fresh conversion needs an SVN URL.
    #[error("missing SVN_URL parameter")]
    MissingUrl,

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
