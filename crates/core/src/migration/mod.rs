//! The migration pipeline.
//!
//! A run is a strictly sequential chain of stages, each of which returns
//! before the next starts and aborts the chain on failure:
//!
//! 1. initial fetch (fresh clone) or ref listing (resync),
//! 2. tag materialization,
//! 3. branch materialization,
//! 4. trunk finalization,
//! 5. repository optimization.
//!
//! Nothing is rolled back when a stage fails part way; see
//! [`Migration::materialize_tags`] for what that means for tags.

mod branches;
mod fetch;
mod optimize;
mod tags;
mod trunk;

use tracing::{info, instrument};

use crate::config::MigrationConfig;
use crate::errors::MigrateError;
use crate::git::{GitCommand, GitExecutor};
use crate::refs::{list_refs, RepositoryState};

pub use branches::{candidate_branches, TRUNK_BRANCH};
pub use tags::{read_single_line, TagInfo, IDENTITY_KEYS};

/// What the trunk finalizer did with the default branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrunkOutcome {
    /// The default branch was recreated from the fetched trunk ref.
    Reset,
    /// The existing default branch was checked out as-is.
    Kept,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub tags_created: Vec<String>,
    pub branches_created: Vec<String>,
    pub branches_rebased: Vec<String>,
    pub trunk: TrunkOutcome,
}

/// Context shared by every stage of one run.
pub struct Migration<'a, E> {
    executor: &'a E,
    config: &'a MigrationConfig,
}

impl<'a, E: GitExecutor> Migration<'a, E> {
    pub fn new(executor: &'a E, config: &'a MigrationConfig) -> Self {
        Self { executor, config }
    }

    /// Run the whole pipeline.
    #[instrument(skip_all, fields(rebase = self.config.rebase))]
    pub async fn run(&self) -> Result<MigrationReport, MigrateError> {
        let state = if self.config.rebase {
            self.ensure_clean_working_tree().await?;
            list_refs(self.executor, self.config).await?
        } else {
            self.initial_fetch().await?
        };
        self.materialize(&state).await
    }

    /// Run every stage that follows ref discovery against `state`.
    pub async fn materialize(&self, state: &RepositoryState) -> Result<MigrationReport, MigrateError> {
        let tags_created = self.materialize_tags(state).await?;
        let (branches_created, branches_rebased) = self.materialize_branches(state).await?;
        let trunk = self.finalize_trunk(state).await?;
        self.optimize().await?;

        let report = MigrationReport {
            tags_created,
            branches_created,
            branches_rebased,
            trunk,
        };
        info!(
            tags = report.tags_created.len(),
            branches = report.branches_created.len(),
            rebased = report.branches_rebased.len(),
            trunk = ?report.trunk,
            "migration complete"
        );
        Ok(report)
    }

    /// Refuse to resync on top of uncommitted changes to tracked files.
    pub async fn ensure_clean_working_tree(&self) -> Result<(), MigrateError> {
        let output = self.executor.run(&GitCommand::status_porcelain()).await?;
        let pending = output.stdout.trim_end();
        if !pending.is_empty() {
            return Err(MigrateError::DirtyWorkingTree(pending.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::CommandOutput;
    use crate::testing::ScriptedExecutor;

    fn fresh_config() -> MigrationConfig {
        let mut config = MigrationConfig {
            url: "https://svn.example.com/repo".into(),
            ..MigrationConfig::default()
        };
        config.fetch.authors = None;
        config
    }

    fn script_listings(exec: &ScriptedExecutor, local: &str, remote: &str) {
        exec.respond("branch -l --no-color", CommandOutput::ok(local));
        exec.respond("branch -r --no-color", CommandOutput::ok(remote));
    }

    fn script_tag(exec: &ScriptedExecutor, reference: &str, subject: &str, date: &str, name: &str, email: &str) {
        exec.respond(&format!("log -1 --pretty=format:%s {reference}"), CommandOutput::ok(subject));
        exec.respond(&format!("log -1 --pretty=format:%ci {reference}"), CommandOutput::ok(date));
        exec.respond(&format!("log -1 --pretty=format:%an {reference}"), CommandOutput::ok(name));
        exec.respond(&format!("log -1 --pretty=format:%ae {reference}"), CommandOutput::ok(email));
    }

    #[tokio::test]
    async fn test_fresh_clone_end_to_end() {
        let exec = ScriptedExecutor::new();
        script_listings(&exec, "* master\n", "  svn/feature\n  svn/tags/v1\n  svn/trunk\n");
        script_tag(&exec, "svn/tags/v1", "Tag v1", "2020-01-02 03:04:05 +0000", "Alice", "alice@example.com");

        let config = fresh_config();
        let report = Migration::new(&exec, &config).run().await.unwrap();

        assert_eq!(report.tags_created, ["v1"]);
        assert_eq!(report.branches_created, ["feature"]);
        assert!(report.branches_rebased.is_empty());
        assert_eq!(report.trunk, TrunkOutcome::Reset);

        let calls = exec.calls();
        let pos = |c: &str| {
            calls
                .iter()
                .position(|x| x == c)
                .unwrap_or_else(|| panic!("missing call {c:?} in {calls:#?}"))
        };
        assert_eq!(
            calls[0],
            "svn init --prefix=svn/ --no-metadata --trunk=trunk --tags=tags --branches=branches https://svn.example.com/repo"
        );
        assert_eq!(calls[1], "svn fetch");
        assert!(pos("tag -a -m Tag v1 v1 svn/tags/v1") < pos("branch -d -r svn/tags/v1"));
        assert!(pos("branch -d -r svn/tags/v1") < pos("branch --track feature remotes/svn/feature"));
        assert!(pos("checkout feature") < pos("checkout svn/trunk"));
        assert!(pos("branch -D master") < pos("checkout -f -b master"));
        assert_eq!(calls.last().map(String::as_str), Some("gc"));
        assert!(!calls.iter().any(|c| c.contains("--track trunk")));
    }

    #[tokio::test]
    async fn test_resync_rebases_existing_branches() {
        let exec = ScriptedExecutor::new();
        exec.respond("status --porcelain --untracked-files=no", CommandOutput::ok(""));
        script_listings(&exec, "  feature\n* master\n", "  svn/feature\n  svn/newbranch\n  svn/trunk\n");

        let config = MigrationConfig {
            rebase: true,
            ..MigrationConfig::default()
        };
        let report = Migration::new(&exec, &config).run().await.unwrap();

        assert_eq!(report.branches_rebased, ["feature", "trunk"]);
        assert_eq!(report.branches_created, ["newbranch"]);
        assert_eq!(report.trunk, TrunkOutcome::Kept);

        let calls = exec.calls();
        assert!(!calls.iter().any(|c| c.starts_with("svn init")));
        assert!(calls.contains(&"svn fetch".to_string()));
        assert!(calls.contains(&"rebase remotes/svn/trunk".to_string()));
        assert!(calls.contains(&"checkout -f master".to_string()));
        assert!(!calls.iter().any(|c| c.starts_with("branch -D")));
    }

    #[tokio::test]
    async fn test_resync_refuses_dirty_tree() {
        let exec = ScriptedExecutor::new();
        exec.respond(
            "status --porcelain --untracked-files=no",
            CommandOutput::ok(" M src/lib.rs\n"),
        );

        let config = MigrationConfig {
            rebase: true,
            ..MigrationConfig::default()
        };
        let err = Migration::new(&exec, &config).run().await.unwrap_err();
        assert!(matches!(err, MigrateError::DirtyWorkingTree(ref s) if s == " M src/lib.rs"));
        assert_eq!(exec.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_tag_stage_stops_the_pipeline() {
        let exec = ScriptedExecutor::new();
        script_listings(&exec, "* master\n", "  svn/feature\n  svn/tags/v1\n  svn/trunk\n");
        script_tag(&exec, "svn/tags/v1", "Tag v1", "2020-01-02 03:04:05 +0000", "Alice", "alice@example.com");
        exec.respond(
            "tag -a -m Tag v1 v1 svn/tags/v1",
            CommandOutput::failed(128, "fatal: tag 'v1' already exists"),
        );

        let config = fresh_config();
        let err = Migration::new(&exec, &config).run().await.unwrap_err();
        assert!(matches!(err, MigrateError::Git(_)));

        let calls = exec.calls();
        assert!(!calls.iter().any(|c| c.starts_with("branch --track")));
        assert!(!calls.iter().any(|c| c == "gc"));
    }
}
