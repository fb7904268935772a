//! Conversion of bridged branch refs into local tracking branches.

use tracing::{debug, info, instrument, warn};

use super::Migration;
use crate::config::MigrationConfig;
use crate::errors::{GitError, MigrateError};
use crate::git::{GitCommand, GitExecutor};
use crate::refs::RepositoryState;

/// Short name git-svn gives the trunk ref.
pub const TRUNK_BRANCH: &str = "trunk";

/// Short names of the bridged refs that are not tags, in listing order.
pub fn candidate_branches(state: &RepositoryState, config: &MigrationConfig) -> Vec<String> {
    let prefix = &config.git.prefix;
    state
        .remote_branches
        .iter()
        .filter(|r| !state.is_tag(r))
        .filter_map(|r| r.strip_prefix(prefix.as_str()))
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

impl<E: GitExecutor> Migration<'_, E> {
    /// Create a local tracking branch for every bridged branch, or in resync
    /// mode rebase the ones that already exist.
    ///
    /// Returns the created and the rebased branch names.
    #[instrument(skip_all, fields(rebase = self.config.rebase))]
    pub async fn materialize_branches(
        &self,
        state: &RepositoryState,
    ) -> Result<(Vec<String>, Vec<String>), MigrateError> {
        if self.config.rebase {
            info!("fetching new svn revisions");
            self.executor.run(&GitCommand::svn_fetch(None, None)).await?;
        }
        self.reconcile_branches(state).await
    }

    /// The per-branch half of [`Self::materialize_branches`], against refs
    /// that are already up to date.
    pub async fn reconcile_branches(
        &self,
        state: &RepositoryState,
    ) -> Result<(Vec<String>, Vec<String>), MigrateError> {
        let config = self.config;
        let default_branch = config.git.default_branch.as_str();
        let mut created = Vec::new();
        let mut rebased = Vec::new();

        for branch in candidate_branches(state, config) {
            let is_trunk = branch == TRUNK_BRANCH;

            if config.rebase && (is_trunk || state.has_local_branch(&branch)) {
                let local = if is_trunk { default_branch } else { branch.as_str() };
                info!(branch = %branch, local, "rebasing onto svn");
                self.executor.run(&GitCommand::force_checkout(local)?).await?;
                self.executor
                    .run(&GitCommand::rebase(&config.remote_ref(&branch))?)
                    .await?;
                rebased.push(branch);
                continue;
            }

            if is_trunk || state.has_local_branch(&branch) {
                debug!(branch = %branch, "skipping");
                continue;
            }
            if branch == default_branch {
                warn!(branch = %branch, "svn branch has the default branch name, skipping");
                continue;
            }
            info!(branch = %branch, "creating tracking branch");
            self.track(&branch).await?;
            created.push(branch);
        }

        Ok((created, rebased))
    }

    /// Create `branch` tracking its bridged ref and check it out.
    ///
    /// Newer git refuses `--track` when no configured remote fetches the
    /// start point, which is always the case for git-svn refs. In that case
    /// the branch is created from the ref without upstream information.
    async fn track(&self, branch: &str) -> Result<(), MigrateError> {
        let remote_ref = self.config.remote_ref(branch);
        let command = GitCommand::track_branch(branch, &remote_ref)?;
        let output = self.executor.execute(&command).await?;

        if output.success() {
            self.executor.run(&GitCommand::checkout(branch)?).await?;
            return Ok(());
        }

        let message = output.combined();
        if !message.to_ascii_lowercase().contains("tracking information") {
            return Err(GitError::CommandFailed {
                command: command.to_string(),
                exit_code: output.exit_code.unwrap_or(-1),
                output: message,
            }
            .into());
        }

        debug!(branch, "upstream tracking refused, creating branch from ref");
        self.executor
            .run(&GitCommand::checkout_new_branch(branch, Some(&remote_ref))?)
            .await?;
        Ok(())
    }
}
