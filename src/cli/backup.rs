use std::path::PathBuf;

use crate::backup::{backups_dir, create_backup};
use crate::config::Integrations;

use super::init_store;

pub fn run_backup(data_dir: String, integrations: &Integrations) -> anyhow::Result<()> {
    let data_path = PathBuf::from(data_dir);
    let store = init_store(&data_path, integrations)?;

    let path = create_backup(&store, &backups_dir(&data_path))?;
    println!("Backup written to: {}", path.display());

    Ok(())
}
