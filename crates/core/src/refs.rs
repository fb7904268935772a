//! Discovery of local branches, bridged remote refs and SVN tags.

use tracing::{debug, instrument};

use crate::config::MigrationConfig;
use crate::errors::MigrateError;
use crate::git::{GitCommand, GitExecutor};

/// Refs observed in the target repository, populated once per run.
///
/// `tags` is always a subset of `remote_branches`; both keep the full
/// namespaced name (`svn/tags/v1.0`), short names are derived at the point
/// of use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryState {
    pub local_branches: Vec<String>,
    pub remote_branches: Vec<String>,
    pub tags: Vec<String>,
}

impl RepositoryState {
    /// Build the state from raw `git branch -l` / `git branch -r` output.
    pub fn from_listings(local: &str, remote: &str, tags_prefix: &str) -> Self {
        let local_branches: Vec<String> = local.lines().filter_map(normalize_ref_line).collect();
        let remote_branches: Vec<String> = remote.lines().filter_map(normalize_ref_line).collect();
        let tags = remote_branches
            .iter()
            .filter(|r| r.starts_with(tags_prefix))
            .cloned()
            .collect();

        Self {
            local_branches,
            remote_branches,
            tags,
        }
    }

    pub fn has_local_branch(&self, name: &str) -> bool {
        self.local_branches.iter().any(|b| b == name)
    }

    pub fn has_remote_branch(&self, name: &str) -> bool {
        self.remote_branches.iter().any(|b| b == name)
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t == name)
    }
}

/// Strip the current-branch (`*`) or other-worktree (`+`) marker and
/// surrounding whitespace from one listing line. Blank lines yield `None`.
pub fn normalize_ref_line(line: &str) -> Option<String> {
    let line = line.trim_start_matches([' ', '\t']);
    let line = line
        .strip_prefix('*')
        .or_else(|| line.strip_prefix('+'))
        .unwrap_or(line);
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// Query the repository for its local and remote branches and classify the
/// bridged tags.
#[instrument(skip_all)]
pub async fn list_refs<E: GitExecutor>(
    executor: &E,
    config: &MigrationConfig,
) -> Result<RepositoryState, MigrateError> {
    debug!("building list of local branches");
    let local = executor.run(&GitCommand::list_local_branches()).await?;

    debug!("building list of remote branches");
    let remote = executor.run(&GitCommand::list_remote_branches()).await?;

    let state = RepositoryState::from_listings(&local.stdout, &remote.stdout, &config.tags_prefix());
    for tag in &state.tags {
        debug!(%tag, "found svn tag");
    }
    debug!(
        local = state.local_branches.len(),
        remote = state.remote_branches.len(),
        tags = state.tags.len(),
        "repository state populated"
    );
    Ok(state)
}
