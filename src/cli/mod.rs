mod backup;
mod commands;
mod init;

pub use backup::run_backup;
pub use commands::AdminCommands;
pub use init::{SeedOutcome, SuperadminSeed, run_init, seed};

use std::path::Path;

use crate::config::Integrations;
use crate::store::SqliteStore;

/// Opens the store for `data_dir`, checking the database exists
pub fn init_store(data_dir: &Path, integrations: &Integrations) -> anyhow::Result<SqliteStore> {
    let db_path = integrations.database_path(data_dir);

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'agenda admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}
