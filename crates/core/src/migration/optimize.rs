//! Repository housekeeping after the layout is in place.

use tracing::info;

use super::Migration;
use crate::errors::MigrateError;
use crate::git::{GitCommand, GitExecutor};

impl<E: GitExecutor> Migration<'_, E> {
    /// Compact the object store.
    pub async fn optimize(&self) -> Result<(), MigrateError> {
        info!("optimizing repository");
        self.executor.run(&GitCommand::gc()).await?;
        Ok(())
    }
}
