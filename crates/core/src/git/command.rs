//! Typed builders for every git invocation the migration issues.
//!
//! Each constructor validates its own inputs and returns a [`GitCommand`]
//! that an executor can run. Nothing here touches the filesystem.

use std::fmt;

use crate::errors::GitError;
use crate::revision::RevisionRange;

/// Environment variable git reads the committer (and tagger) date from.
pub const COMMITTER_DATE_ENV: &str = "GIT_COMMITTER_DATE";

/// A single `git` invocation: arguments, environment overrides and whether
/// it may take over the terminal in passthrough mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    args: Vec<String>,
    env: Vec<(String, String)>,
    passthrough: bool,
}

/// A field of the most recent commit on a ref, queried with `git log -1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogField {
    Subject,
    CommitDate,
    AuthorName,
    AuthorEmail,
}

impl LogField {
    /// `--pretty` placeholder for this field.
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Subject => "%s",
            Self::CommitDate => "%ci",
            Self::AuthorName => "%an",
            Self::AuthorEmail => "%ae",
        }
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject => write!(f, "subject"),
            Self::CommitDate => write!(f, "commit date"),
            Self::AuthorName => write!(f, "author name"),
            Self::AuthorEmail => write!(f, "author email"),
        }
    }
}

/// How `git svn init` maps the Subversion tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvnLayout {
    /// The URL itself is trunk.
    RootIsTrunk { url: String },
    /// trunk/tags/branches subpaths below `url`; empty subpaths are omitted.
    Standard {
        url: String,
        trunk: String,
        tags: String,
        branches: String,
    },
}

/// Parameters of `git svn init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvnInitOptions {
    pub prefix: String,
    pub username: Option<String>,
    pub metadata: bool,
    pub no_minimize_url: bool,
    pub layout: SvnLayout,
}

impl GitCommand {
    fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
            passthrough: false,
        }
    }

    fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    fn with_env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Whether the command may inherit the terminal in verbose mode.
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    // -- listing -------------------------------------------------------------

    /// `git branch -l --no-color`
    pub fn list_local_branches() -> Self {
        Self::new(["branch", "-l", "--no-color"])
    }

    /// `git branch -r --no-color`
    pub fn list_remote_branches() -> Self {
        Self::new(["branch", "-r", "--no-color"])
    }

    /// `git status --porcelain --untracked-files=no`
    pub fn status_porcelain() -> Self {
        Self::new(["status", "--porcelain", "--untracked-files=no"])
    }

    // -- bridge --------------------------------------------------------------

    /// `git svn init --prefix=<prefix> ...`
    pub fn svn_init(options: &SvnInitOptions) -> Result<Self, GitError> {
        if options.prefix.is_empty() {
            return Err(invalid("svn init", "ref namespace prefix is empty"));
        }

        let mut args = vec![
            "svn".to_string(),
            "init".to_string(),
            format!("--prefix={}", options.prefix),
        ];
        if let Some(username) = options.username.as_deref().filter(|u| !u.is_empty()) {
            args.push(format!("--username={username}"));
        }
        if !options.metadata {
            args.push("--no-metadata".into());
        }
        if options.no_minimize_url {
            args.push("--no-minimize-url".into());
        }

        match &options.layout {
            SvnLayout::RootIsTrunk { url } => {
                if url.is_empty() {
                    return Err(invalid("svn init", "repository URL is empty"));
                }
                args.push(format!("--trunk={url}"));
            }
            SvnLayout::Standard {
                url,
                trunk,
                tags,
                branches,
            } => {
                if url.is_empty() {
                    return Err(invalid("svn init", "repository URL is empty"));
                }
                if !trunk.is_empty() {
                    args.push(format!("--trunk={trunk}"));
                }
                if !tags.is_empty() {
                    args.push(format!("--tags={tags}"));
                }
                if !branches.is_empty() {
                    args.push(format!("--branches={branches}"));
                }
                args.push(url.clone());
            }
        }
        Ok(Self::new(args).passthrough())
    }

    /// `git svn fetch [-r START:END] [--ignore-paths=<pattern>]`
    pub fn svn_fetch(revision: Option<&RevisionRange>, ignore_paths: Option<&str>) -> Self {
        let mut args = vec!["svn".to_string(), "fetch".to_string()];
        if let Some(range) = revision {
            args.push("-r".into());
            args.push(range.to_string());
        }
        if let Some(pattern) = ignore_paths {
            args.push(format!("--ignore-paths={pattern}"));
        }
        Self::new(args).passthrough()
    }

    // -- inspection ----------------------------------------------------------

    /// `git log -1 --pretty=format:<placeholder> <reference>`
    pub fn log_field(reference: &str, field: LogField) -> Result<Self, GitError> {
        check_ref("log", reference)?;
        Ok(Self::new([
            "log".to_string(),
            "-1".to_string(),
            format!("--pretty=format:{}", field.placeholder()),
            reference.to_string(),
        ]))
    }

    // -- configuration -------------------------------------------------------

    /// `git config --local --get <key>`
    pub fn config_get(key: &str) -> Result<Self, GitError> {
        check_key(key)?;
        Ok(Self::new(["config", "--local", "--get", key]))
    }

    /// `git config --local <key> <value>`
    pub fn config_set(key: &str, value: &str) -> Result<Self, GitError> {
        check_key(key)?;
        Ok(Self::new(["config", "--local", key, value]))
    }

    /// `git config --local --unset <key>`
    pub fn config_unset(key: &str) -> Result<Self, GitError> {
        check_key(key)?;
        Ok(Self::new(["config", "--local", "--unset", key]))
    }

    // -- refs ----------------------------------------------------------------

    /// `git tag -a -m <message> <name> <target>` with the tagger date taken
    /// from `committer_date`.
    pub fn annotated_tag(
        name: &str,
        target: &str,
        message: &str,
        committer_date: &str,
    ) -> Result<Self, GitError> {
        check_ref("tag", name)?;
        check_ref("tag", target)?;
        Ok(Self::new(["tag", "-a", "-m", message, name, target])
            .with_env(COMMITTER_DATE_ENV, committer_date))
    }

    /// `git branch -d -r <remote_branch>`
    pub fn delete_remote_branch(remote_branch: &str) -> Result<Self, GitError> {
        check_ref("branch", remote_branch)?;
        Ok(Self::new(["branch", "-d", "-r", remote_branch]))
    }

    /// `git branch -D <branch>`
    pub fn force_delete_branch(branch: &str) -> Result<Self, GitError> {
        check_ref("branch", branch)?;
        Ok(Self::new(["branch", "-D", branch]).passthrough())
    }

    /// `git branch --track <branch> <start_point>`
    pub fn track_branch(branch: &str, start_point: &str) -> Result<Self, GitError> {
        check_ref("branch", branch)?;
        check_ref("branch", start_point)?;
        Ok(Self::new(["branch", "--track", branch, start_point]))
    }

    // -- working tree --------------------------------------------------------

    /// `git checkout <target>`
    pub fn checkout(target: &str) -> Result<Self, GitError> {
        check_ref("checkout", target)?;
        Ok(Self::new(["checkout", target]).passthrough())
    }

    /// `git checkout -f <target>`
    pub fn force_checkout(target: &str) -> Result<Self, GitError> {
        check_ref("checkout", target)?;
        Ok(Self::new(["checkout", "-f", target]).passthrough())
    }

    /// `git checkout -f -b <branch> [<start_point>]`
    pub fn checkout_new_branch(branch: &str, start_point: Option<&str>) -> Result<Self, GitError> {
        check_ref("checkout", branch)?;
        let mut args = vec!["checkout", "-f", "-b", branch];
        if let Some(start) = start_point {
            check_ref("checkout", start)?;
            args.push(start);
        }
        Ok(Self::new(args).passthrough())
    }

    /// `git rebase <upstream>`
    pub fn rebase(upstream: &str) -> Result<Self, GitError> {
        check_ref("rebase", upstream)?;
        Ok(Self::new(["rebase", upstream]).passthrough())
    }

    // -- housekeeping --------------------------------------------------------

    /// `git gc`
    pub fn gc() -> Self {
        Self::new(["gc"]).passthrough()
    }
}

impl fmt::Display for GitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value:?} ")?;
        }
        write!(f, "git")?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

fn invalid(operation: &'static str, detail: impl Into<String>) -> GitError {
    GitError::InvalidArgument {
        operation,
        detail: detail.into(),
    }
}

/// Reject names git would misread as options or split on whitespace.
fn check_ref(operation: &'static str, name: &str) -> Result<(), GitError> {
    if name.is_empty() {
        return Err(invalid(operation, "ref name is empty"));
    }
    if name.starts_with('-') {
        return Err(invalid(operation, format!("ref name {name:?} starts with '-'")));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(
            operation,
            format!("ref name {name:?} contains whitespace or control characters"),
        ));
    }
    Ok(())
}

fn check_key(key: &str) -> Result<(), GitError> {
    if key.is_empty() || key.starts_with('-') || !key.contains('.') {
        return Err(invalid("config", format!("invalid config key {key:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard(url: &str) -> SvnInitOptions {
        SvnInitOptions {
            prefix: "svn/".into(),
            username: None,
            metadata: false,
            no_minimize_url: false,
            layout: SvnLayout::Standard {
                url: url.into(),
                trunk: "trunk".into(),
                tags: "tags".into(),
                branches: "branches".into(),
            },
        }
    }

    #[test]
    fn test_svn_init_standard_layout() {
        let cmd = GitCommand::svn_init(&standard("https://svn.example.com/repo")).unwrap();
        assert_eq!(
            cmd.args(),
            [
                "svn",
                "init",
                "--prefix=svn/",
                "--no-metadata",
                "--trunk=trunk",
                "--tags=tags",
                "--branches=branches",
                "https://svn.example.com/repo"
            ]
        );
        assert!(cmd.is_passthrough());
    }

    #[test]
    fn test_svn_init_root_is_trunk_with_options() {
        let options = SvnInitOptions {
            username: Some("jdoe".into()),
            metadata: true,
            no_minimize_url: true,
            layout: SvnLayout::RootIsTrunk {
                url: "svn://host/proj".into(),
            },
            ..standard("")
        };
        let cmd = GitCommand::svn_init(&options).unwrap();
        assert_eq!(
            cmd.args(),
            [
                "svn",
                "init",
                "--prefix=svn/",
                "--username=jdoe",
                "--no-minimize-url",
                "--trunk=svn://host/proj"
            ]
        );
    }

    #[test]
    fn test_svn_init_skips_empty_subpaths() {
        let mut options = standard("file:///r");
        options.layout = SvnLayout::Standard {
            url: "file:///r".into(),
            trunk: "trunk".into(),
            tags: String::new(),
            branches: String::new(),
        };
        let cmd = GitCommand::svn_init(&options).unwrap();
        assert_eq!(cmd.args().last().map(String::as_str), Some("file:///r"));
        assert!(!cmd.args().iter().any(|a| a.starts_with("--tags")));
        assert!(!cmd.args().iter().any(|a| a.starts_with("--branches")));
    }

    #[test]
    fn test_svn_init_rejects_empty_url() {
        assert!(matches!(
            GitCommand::svn_init(&standard("")),
            Err(GitError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_svn_fetch_arguments() {
        assert_eq!(GitCommand::svn_fetch(None, None).args(), ["svn", "fetch"]);

        let range = RevisionRange::parse("5:").unwrap();
        let cmd = GitCommand::svn_fetch(range.as_ref(), Some("^(?:)(?:foo)"));
        assert_eq!(
            cmd.args(),
            ["svn", "fetch", "-r", "5:HEAD", "--ignore-paths=^(?:)(?:foo)"]
        );
    }

    #[test]
    fn test_annotated_tag_sets_committer_date() {
        let cmd = GitCommand::annotated_tag(
            "v1.0",
            "svn/tags/v1.0",
            "Release 1.0",
            "2020-01-02 03:04:05 +0000",
        )
        .unwrap();
        assert_eq!(cmd.args(), ["tag", "-a", "-m", "Release 1.0", "v1.0", "svn/tags/v1.0"]);
        assert_eq!(
            cmd.env(),
            [(
                COMMITTER_DATE_ENV.to_string(),
                "2020-01-02 03:04:05 +0000".to_string()
            )]
        );
    }

    #[test]
    fn test_ref_validation() {
        assert!(GitCommand::checkout("").is_err());
        assert!(GitCommand::checkout("--orphan").is_err());
        assert!(GitCommand::rebase("remotes/svn/my branch").is_err());
        assert!(GitCommand::rebase("remotes/svn/feature").is_ok());
        assert!(GitCommand::config_get("user").is_err());
        assert!(GitCommand::config_get("user.name").is_ok());
    }

    #[test]
    fn test_log_field_query() {
        let cmd = GitCommand::log_field("svn/tags/v1", LogField::AuthorEmail).unwrap();
        assert_eq!(cmd.args(), ["log", "-1", "--pretty=format:%ae", "svn/tags/v1"]);
        assert!(!cmd.is_passthrough());
    }

    #[test]
    fn test_display_quotes_whitespace() {
        let cmd = GitCommand::annotated_tag("v1", "svn/tags/v1", "two words", "2020-01-01 00:00:00 +0000")
            .unwrap();
        assert_eq!(
            cmd.to_string(),
            "GIT_COMMITTER_DATE=\"2020-01-01 00:00:00 +0000\" git tag -a -m \"two words\" v1 svn/tags/v1"
        );
    }
}
