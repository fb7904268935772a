//! TOML-based configuration for a migration run.
//!
//! A [`MigrationConfig`] starts from built-in defaults, is optionally loaded
//! from a TOML file, gets command-line overrides applied by the binary, and
//! is finally normalized with [`MigrationConfig::resolve`]. After that it is
//! treated as immutable by every pipeline stage.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::revision::RevisionRange;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything a migration run needs to know.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Subversion repository URL. Required for a fresh conversion.
    #[serde(default)]
    pub url: String,

    /// Username for transports that need it (http(s), svn).
    #[serde(default)]
    pub username: Option<String>,

    /// Resync an existing conversion instead of cloning a new one.
    #[serde(default)]
    pub rebase: bool,

    /// Pass child process stdio through to the terminal.
    #[serde(default)]
    pub verbose: bool,

    /// Subversion directory layout.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Initial fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Target repository naming.
    #[serde(default)]
    pub git: GitConfig,
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Subversion layout: where trunk, branches and tags live below the URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Subpath to trunk. Default `trunk`.
    #[serde(default = "default_trunk")]
    pub trunk: String,

    /// Subpath to branches. Default `branches`.
    #[serde(default = "default_branches")]
    pub branches: String,

    /// Subpath to tags. Default `tags`.
    #[serde(default = "default_tags")]
    pub tags: String,

    /// The repository root is trunk; there are no branches or tags.
    #[serde(default)]
    pub root_is_trunk: bool,

    #[serde(default)]
    pub no_trunk: bool,

    #[serde(default)]
    pub no_branches: bool,

    #[serde(default)]
    pub no_tags: bool,
}

fn default_trunk() -> String {
    "trunk".into()
}
fn default_branches() -> String {
    "branches".into()
}
fn default_tags() -> String {
    "tags".into()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            trunk: default_trunk(),
            branches: default_branches(),
            tags: default_tags(),
            root_is_trunk: false,
            no_trunk: false,
            no_branches: false,
            no_tags: false,
        }
    }
}

impl LayoutConfig {
    /// Clear the subpaths disabled by the layout flags.
    ///
    /// `root_is_trunk` clears all three; each `no_*` flag clears its own.
    pub fn apply_flags(&mut self) {
        if self.root_is_trunk {
            self.trunk.clear();
            self.branches.clear();
            self.tags.clear();
        }
        if self.no_trunk {
            self.trunk.clear();
        }
        if self.no_branches {
            self.branches.clear();
        }
        if self.no_tags {
            self.tags.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Settings for `git svn init` / `git svn fetch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// `START[:END]` revision restriction; empty means everything.
    #[serde(default)]
    pub revision: String,

    /// Regular expression of paths to skip while fetching.
    #[serde(default)]
    pub exclude: String,

    /// svn-to-git authors mapping file.
    #[serde(default = "default_authors")]
    pub authors: Option<PathBuf>,

    /// Keep `git-svn-id:` lines in commit messages.
    #[serde(default)]
    pub metadata: bool,

    /// Accept URLs as-is without connecting to a higher level directory.
    #[serde(default)]
    pub no_minimize_url: bool,
}

fn default_authors() -> Option<PathBuf> {
    Some(PathBuf::from("~/.config/svn2git/authors"))
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            revision: String::new(),
            exclude: String::new(),
            authors: default_authors(),
            metadata: false,
            no_minimize_url: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Git naming
// ---------------------------------------------------------------------------

/// Naming of bridged refs and the default branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Ref namespace git-svn creates remote refs under. Default `svn/`.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Branch that receives trunk. Default `master`.
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_prefix() -> String {
    "svn/".into()
}
fn default_branch() -> String {
    "master".into()
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            default_branch: default_branch(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl MigrationConfig {
    /// Load a [`MigrationConfig`] from a TOML file at the given path.
    ///
    /// This does **not** normalize anything -- call
    /// [`resolve`](Self::resolve) once all overrides are applied.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: MigrationConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Apply the layout flags, expand the authors path and validate.
    pub fn resolve(&mut self) -> Result<(), ConfigError> {
        self.layout.apply_flags();
        self.resolve_authors();
        self.validate()
    }

    /// Expand `~` and environment variables in the authors path. A path
    /// that does not exist is dropped, leaving author mapping unset.
    pub fn resolve_authors(&mut self) {
        let Some(raw) = self.fetch.authors.take() else {
            return;
        };
        let raw = raw.to_string_lossy();
        if raw.is_empty() {
            return;
        }

        let expanded = PathBuf::from(expand_path(&raw));
        if expanded.exists() {
            debug!(path = %expanded.display(), "using authors file");
            self.fetch.authors = Some(expanded);
        } else {
            warn!(path = %expanded.display(), "authors file not found, author mapping disabled");
        }
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rebase && self.url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        if self.git.prefix.is_empty() || !self.git.prefix.ends_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "git.prefix".into(),
                detail: format!("prefix must be non-empty and end with '/' (got {:?})", self.git.prefix),
            });
        }
        if self.git.prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                field: "git.prefix".into(),
                detail: "prefix must not contain whitespace".into(),
            });
        }
        if self.git.default_branch.is_empty() || self.git.default_branch.starts_with('-') {
            return Err(ConfigError::InvalidValue {
                field: "git.default_branch".into(),
                detail: format!("invalid branch name {:?}", self.git.default_branch),
            });
        }
        // Surface range errors before anything touches the repository.
        self.revision_range().map_err(|e| ConfigError::InvalidValue {
            field: "fetch.revision".into(),
            detail: e.to_string(),
        })?;
        Ok(())
    }

    /// Parsed `fetch.revision`.
    pub fn revision_range(&self) -> Result<Option<RevisionRange>, crate::errors::RevisionError> {
        RevisionRange::parse(&self.fetch.revision)
    }

    /// Remote-listing prefix of tag refs, e.g. `svn/tags/`.
    pub fn tags_prefix(&self) -> String {
        format!("{}tags/", self.git.prefix)
    }

    /// Remote-listing name of the trunk ref, e.g. `svn/trunk`.
    pub fn trunk_ref(&self) -> String {
        format!("{}trunk", self.git.prefix)
    }

    /// Fully spelled remote ref for a short branch name, e.g.
    /// `remotes/svn/feature`.
    pub fn remote_ref(&self, branch: &str) -> String {
        format!("remotes/{}{}", self.git.prefix, branch)
    }

    /// Log the resolved settings, one field per line.
    pub fn log_summary(&self) {
        info!(
            rebase = self.rebase,
            url = %self.url,
            username = ?self.username,
            trunk = ?self.layout.trunk,
            branches = ?self.layout.branches,
            tags = ?self.layout.tags,
            authors = ?self.fetch.authors,
            root_is_trunk = self.layout.root_is_trunk,
            exclude = ?self.fetch.exclude,
            revision = ?self.fetch.revision,
            prefix = %self.git.prefix,
            default_branch = %self.git.default_branch,
            "svn2git configuration"
        );
    }
}

/// Expand a leading `~/` and `$VAR` / `${VAR}` references. Unset variables
/// expand to nothing.
pub fn expand_path(raw: &str) -> String {
    let mut input = raw.to_string();
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            input = format!("{}/{}", home.display(), rest);
        }
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let name: String = if chars.peek() == Some(&'{') {
            chars.next();
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            name
        } else {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            name
        };
        if name.is_empty() {
            out.push('$');
        } else {
            out.push_str(&std::env::var(&name).unwrap_or_default());
        }
    }
    out
}
