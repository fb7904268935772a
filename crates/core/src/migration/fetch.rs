//! Initial bridge setup and history import.

use tracing::{info, instrument};

use super::Migration;
use crate::errors::MigrateError;
use crate::exclusion::build_ignore_paths;
use crate::git::{GitCommand, GitExecutor, SvnInitOptions, SvnLayout};
use crate::refs::{list_refs, RepositoryState};

/// Config key git-svn reads the authors mapping from.
const AUTHORS_FILE_KEY: &str = "svn.authorsfile";

impl<E: GitExecutor> Migration<'_, E> {
    /// Initialize the bridge, import history and report the refs it created.
    #[instrument(skip_all, fields(url = %self.config.url))]
    pub async fn initial_fetch(&self) -> Result<RepositoryState, MigrateError> {
        let config = self.config;
        let layout = &config.layout;

        let svn_layout = if layout.root_is_trunk {
            SvnLayout::RootIsTrunk {
                url: config.url.clone(),
            }
        } else {
            SvnLayout::Standard {
                url: config.url.clone(),
                trunk: layout.trunk.clone(),
                tags: layout.tags.clone(),
                branches: layout.branches.clone(),
            }
        };
        let options = SvnInitOptions {
            prefix: config.git.prefix.clone(),
            username: config.username.clone(),
            metadata: config.fetch.metadata,
            no_minimize_url: config.fetch.no_minimize_url,
            layout: svn_layout,
        };

        info!("initializing git-svn bridge");
        self.executor.run(&GitCommand::svn_init(&options)?).await?;

        if let Some(authors) = &config.fetch.authors {
            let path = authors.to_string_lossy();
            info!(path = %path, "using authors file");
            self.executor
                .run(&GitCommand::config_set(AUTHORS_FILE_KEY, &path)?)
                .await?;
        }

        let range = config.revision_range()?;
        let ignore_paths = build_ignore_paths(&config.fetch.exclude, layout);

        info!(revision = ?range.as_ref().map(ToString::to_string), "fetching svn history");
        self.executor
            .run(&GitCommand::svn_fetch(range.as_ref(), ignore_paths.as_deref()))
            .await?;

        list_refs(self.executor, config).await
    }
}
