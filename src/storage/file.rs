use crate::errors::StoreError;
use crate::models::{EventRow, NewEvent};
use std::{path::Path, path::PathBuf, sync::Arc};
use tokio::{fs, sync::Mutex};
use tracing::debug;

/// Append-only event table kept as a JSON array on local disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(StoreError::unavailable)?;
        }

        Ok(Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub async fn fetch_rows(&self) -> Result<Vec<EventRow>, StoreError> {
        load_rows(&self.path).await
    }

    pub async fn insert(&self, event: &NewEvent) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        // A table we cannot read is never rewritten.
        let mut rows = load_rows(&self.path).await?;
        let next_id = rows.iter().filter_map(|row| row.id).max().unwrap_or(0) + 1;
        rows.push(event.clone().into_row(next_id));
        persist_rows(&self.path, &rows).await?;
        debug!(id = next_id, path = %self.path.display(), "appended event row");
        Ok(())
    }
}

async fn load_rows(path: &Path) -> Result<Vec<EventRow>, StoreError> {
    match fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|err| StoreError::Unavailable(format!("failed to parse {}: {err}", path.display()))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(StoreError::Unavailable(format!(
            "failed to read {}: {err}",
            path.display()
        ))),
    }
}

async fn persist_rows(path: &Path, rows: &[EventRow]) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(rows).map_err(StoreError::unavailable)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, payload).await.map_err(StoreError::unavailable)?;
    fs::rename(&staging, path).await.map_err(StoreError::unavailable)?;
    Ok(())
}
