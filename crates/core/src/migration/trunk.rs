//! Pointing the default branch at trunk.

use tracing::{info, instrument};

use super::{Migration, TrunkOutcome};
use crate::errors::MigrateError;
use crate::git::{GitCommand, GitExecutor};
use crate::refs::RepositoryState;

impl<E: GitExecutor> Migration<'_, E> {
    /// On a fresh clone with a bridged trunk, recreate the default branch
    /// from it. Otherwise just check the default branch out.
    #[instrument(skip_all)]
    pub async fn finalize_trunk(&self, state: &RepositoryState) -> Result<TrunkOutcome, MigrateError> {
        let default_branch = &self.config.git.default_branch;
        let trunk_ref = self.config.trunk_ref();

        if self.config.rebase || !state.has_remote_branch(&trunk_ref) {
            info!(branch = %default_branch, "keeping default branch");
            self.executor
                .run(&GitCommand::force_checkout(default_branch)?)
                .await?;
            return Ok(TrunkOutcome::Kept);
        }

        info!(branch = %default_branch, trunk = %trunk_ref, "resetting default branch to trunk");
        self.executor.run(&GitCommand::checkout(&trunk_ref)?).await?;
        if state.has_local_branch(default_branch) {
            self.executor
                .run(&GitCommand::force_delete_branch(default_branch)?)
                .await?;
        }
        self.executor
            .run(&GitCommand::checkout_new_branch(default_branch, None)?)
            .await?;
        Ok(TrunkOutcome::Reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MigrationConfig;
    use crate::testing::ScriptedExecutor;

    fn state(local: &str, remote: &str) -> RepositoryState {
        RepositoryState::from_listings(local, remote, "svn/tags/")
    }

    #[tokio::test]
    async fn test_fresh_clone_resets_default_branch() {
        let exec = ScriptedExecutor::new();
        let config = MigrationConfig::default();
        let outcome = Migration::new(&exec, &config)
            .finalize_trunk(&state("* master\n", "  svn/trunk\n"))
            .await
            .unwrap();
        assert_eq!(outcome, TrunkOutcome::Reset);
        assert_eq!(
            exec.calls(),
            ["checkout svn/trunk", "branch -D master", "checkout -f -b master"]
        );
    }

    #[tokio::test]
    async fn test_missing_default_branch_is_not_deleted() {
        let exec = ScriptedExecutor::new();
        let mut config = MigrationConfig::default();
        config.git.default_branch = "main".into();
        Migration::new(&exec, &config)
            .finalize_trunk(&state("", "  svn/trunk\n"))
            .await
            .unwrap();
        assert_eq!(exec.calls(), ["checkout svn/trunk", "checkout -f -b main"]);
    }

    #[tokio::test]
    async fn test_custom_prefix_trunk_detection() {
        let exec = ScriptedExecutor::new();
        let mut config = MigrationConfig::default();
        config.git.prefix = "upstream/".into();

        // A bare `trunk` ref is not the bridged trunk under this prefix.
        let outcome = Migration::new(&exec, &config)
            .finalize_trunk(&state("* master\n", "  trunk\n"))
            .await
            .unwrap();
        assert_eq!(outcome, TrunkOutcome::Kept);
        assert_eq!(exec.calls(), ["checkout -f master"]);
    }

    #[tokio::test]
    async fn test_resync_keeps_default_branch() {
        let exec = ScriptedExecutor::new();
        let config = MigrationConfig {
            rebase: true,
            ..MigrationConfig::default()
        };
        let outcome = Migration::new(&exec, &config)
            .finalize_trunk(&state("* master\n", "  svn/trunk\n"))
            .await
            .unwrap();
        assert_eq!(outcome, TrunkOutcome::Kept);
        assert_eq!(exec.calls(), ["checkout -f master"]);
    }
}
