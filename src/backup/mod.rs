//! Database snapshots written to and restored from `<data_dir>/backups`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::store::Store;

pub const BACKUP_PREFIX: &str = "backup_sqlite_";

#[derive(Debug, Clone, Serialize)]
pub struct BackupFile {
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

#[must_use]
pub fn backups_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("backups")
}

/// Writes a snapshot named `backup_sqlite_<YYYYmmdd_HHMMSS>.db` and returns its path.
pub fn create_backup(store: &dyn Store, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let name = format!("{BACKUP_PREFIX}{}.db", Utc::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(name);
    store.backup_to(&path)?;
    info!(path = %path.display(), "database backup created");
    Ok(path)
}

/// Snapshot files in `dir`, newest first. A missing directory has none.
pub fn list_backups(dir: &Path) -> Result<Vec<BackupFile>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(BACKUP_PREFIX) {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        files.push(BackupFile {
            name,
            size_bytes: metadata.len(),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
        });
    }

    // Names embed the timestamp
    files.sort_by(|a, b| b.name.cmp(&a.name));
    Ok(files)
}

/// Restores `path` into the live database on a blocking worker, then removes the file.
pub fn schedule_restore(store: Arc<dyn Store>, path: PathBuf) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        info!(path = %path.display(), "database restore started");
        match store.restore_from(&path) {
            Ok(()) => info!(path = %path.display(), "database restore finished"),
            Err(e) => error!(path = %path.display(), error = %e, "database restore failed"),
        }
        if let Err(e) = std::fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "failed to remove restore upload");
        } else {
            info!(path = %path.display(), "restore upload removed");
        }
    })
}

/// Reduces an uploaded filename to a safe ASCII basename.
///
/// Returns an empty string when nothing usable is left.
#[must_use]
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    cleaned.trim_start_matches(['.', '_']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("backup.db"), "backup.db");
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename("C:\\Users\\x\\meu backup.db"), "meu_backup.db");
        assert_eq!(secure_filename("..hidden"), "hidden");
        assert_eq!(secure_filename("foto perfil ç.png"), "foto_perfil_.png");
        assert_eq!(secure_filename("/"), "");
    }

    #[test]
    fn test_list_backups_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(list_backups(&temp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_create_and_list_backup() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let dir = backups_dir(temp.path());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let path = create_backup(&store, &dir).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("backup_sqlite_"));
        assert!(name.ends_with(".db"));

        let listed = list_backups(&dir).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, name);
        assert!(listed[0].size_bytes > 0);
    }

    #[tokio::test]
    async fn test_schedule_restore_removes_upload() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let store: Arc<dyn Store> = Arc::new(store);

        let snapshot = create_backup(store.as_ref(), &backups_dir(temp.path())).unwrap();
        let upload = temp.path().join("upload.db");
        std::fs::copy(&snapshot, &upload).unwrap();

        schedule_restore(store.clone(), upload.clone()).await.unwrap();
        assert!(!upload.exists());
        assert!(store.list_planos().unwrap().is_empty());
    }
}
