//! Conversion of bridged tag refs into annotated tags.

use chrono::DateTime;
use tracing::{debug, info, instrument, warn};

use super::Migration;
use crate::errors::{GitError, MigrateError};
use crate::git::{GitCommand, GitExecutor, LogField};
use crate::refs::RepositoryState;

/// Repository-local identity keys overridden while tags are created.
pub const IDENTITY_KEYS: [&str; 2] = ["user.name", "user.email"];

/// Format of `%ci`, also accepted by `GIT_COMMITTER_DATE`.
const COMMIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Metadata of the newest commit on a bridged tag ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    /// Full bridged ref, e.g. `svn/tags/v1.0`.
    pub reference: String,
    /// Short tag name, e.g. `v1.0`.
    pub name: String,
    pub subject: String,
    pub date: String,
    pub author_name: String,
    pub author_email: String,
}

/// Saved value of one identity key; `None` when it was unset.
type SavedIdentity = Vec<(&'static str, Option<String>)>;

/// Return the only line of a log field query.
///
/// One trailing newline is dropped first. Empty output has no lines; anything
/// other than exactly one line is an error.
pub fn read_single_line(reference: &str, field: LogField, output: &str) -> Result<String, MigrateError> {
    let body = output.strip_suffix('\n').unwrap_or(output);
    let lines: Vec<&str> = if body.is_empty() {
        Vec::new()
    } else {
        body.split('\n').collect()
    };
    if lines.len() != 1 {
        return Err(MigrateError::UnexpectedLogOutput {
            reference: reference.to_string(),
            field: field.to_string(),
            detail: format!("expected exactly one line, got {}", lines.len()),
        });
    }
    Ok(lines[0].trim_end_matches('\r').to_string())
}

impl<E: GitExecutor> Migration<'_, E> {
    /// Turn every bridged tag ref into an annotated tag named after it and
    /// delete the ref.
    ///
    /// The tagger identity and date are taken from the tag's newest commit.
    /// The identity is written to the repository-local config for each tag
    /// and the values present beforehand are put back once the loop ends,
    /// whether it succeeded or not. Tags are not created atomically: when a
    /// tag fails, the ones before it stay converted and the rest keep their
    /// bridged refs.
    #[instrument(skip_all, fields(count = state.tags.len()))]
    pub async fn materialize_tags(&self, state: &RepositoryState) -> Result<Vec<String>, MigrateError> {
        if state.tags.is_empty() {
            debug!("no svn tags to convert");
            return Ok(Vec::new());
        }

        let saved = self.save_identity().await?;
        let mut created = Vec::with_capacity(state.tags.len());
        let result = self.create_tags(state, &mut created).await;
        self.restore_identity(&saved).await;

        result.map(|()| created)
    }

    async fn create_tags(&self, state: &RepositoryState, created: &mut Vec<String>) -> Result<(), MigrateError> {
        let tags_prefix = self.config.tags_prefix();
        for reference in &state.tags {
            let name = reference.strip_prefix(&tags_prefix).unwrap_or(reference);
            let info = self.read_tag_info(reference, name).await?;

            info!(
                tag = %info.name,
                author = %info.author_name,
                date = %info.date,
                "creating annotated tag"
            );
            self.set_config(IDENTITY_KEYS[0], &info.author_name).await?;
            self.set_config(IDENTITY_KEYS[1], &info.author_email).await?;

            let tag = GitCommand::annotated_tag(&info.name, &info.reference, &info.subject, &info.date)?;
            self.executor.run(&tag).await?;
            self.executor
                .run(&GitCommand::delete_remote_branch(&info.reference)?)
                .await?;

            created.push(info.name);
        }
        Ok(())
    }

    /// Read the subject, date and author of the newest commit on `reference`.
    pub async fn read_tag_info(&self, reference: &str, name: &str) -> Result<TagInfo, MigrateError> {
        let subject = self.read_log_field(reference, LogField::Subject).await?;
        let raw_date = self.read_log_field(reference, LogField::CommitDate).await?;
        let author_name = self.read_log_field(reference, LogField::AuthorName).await?;
        let author_email = self.read_log_field(reference, LogField::AuthorEmail).await?;

        let date = DateTime::parse_from_str(raw_date.trim(), COMMIT_DATE_FORMAT)
            .map_err(|e| MigrateError::UnexpectedLogOutput {
                reference: reference.to_string(),
                field: LogField::CommitDate.to_string(),
                detail: format!("cannot parse {raw_date:?}: {e}"),
            })?
            .format(COMMIT_DATE_FORMAT)
            .to_string();

        Ok(TagInfo {
            reference: reference.to_string(),
            name: name.to_string(),
            subject,
            date,
            author_name,
            author_email,
        })
    }

    async fn read_log_field(&self, reference: &str, field: LogField) -> Result<String, MigrateError> {
        let output = self.executor.run(&GitCommand::log_field(reference, field)?).await?;
        read_single_line(reference, field, &output.stdout)
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), MigrateError> {
        self.executor.run(&GitCommand::config_set(key, value)?).await?;
        Ok(())
    }

    /// Capture the local identity. `git config --get` exits 1 for an unset key.
    async fn save_identity(&self) -> Result<SavedIdentity, MigrateError> {
        let mut saved = Vec::with_capacity(IDENTITY_KEYS.len());
        for key in IDENTITY_KEYS {
            let command = GitCommand::config_get(key)?;
            let output = self.executor.execute(&command).await?;
            let value = match output.exit_code {
                Some(0) => Some(output.stdout.trim_end_matches(['\r', '\n']).to_string()),
                Some(1) => None,
                code => {
                    return Err(GitError::CommandFailed {
                        command: command.to_string(),
                        exit_code: code.unwrap_or(-1),
                        output: output.combined(),
                    }
                    .into())
                }
            };
            debug!(key, value = ?value, "saved identity");
            saved.push((key, value));
        }
        Ok(saved)
    }

    /// Put the captured identity back. Failures are logged and ignored.
    async fn restore_identity(&self, saved: &SavedIdentity) {
        for (key, value) in saved {
            let command = match value {
                Some(value) => GitCommand::config_set(key, value),
                None => GitCommand::config_unset(key),
            };
            let result = match command {
                Ok(command) => self.executor.run(&command).await.map(drop),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!(key, error = %e, "failed to restore identity configuration");
            }
        }
    }
}
