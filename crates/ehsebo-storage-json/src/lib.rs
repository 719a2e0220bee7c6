//! ehsebo-storage-json
//!
//! Filesystem-backed [`KeyValueStorage`]: every key is one `<key>.json` file
//! under a root directory, replaced atomically by writing a temporary file and
//! renaming it over the original.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use ehsebo_core::{CoreError, KeyValueStorage};
use tokio::{fs, io::AsyncWriteExt};

const FILE_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// Distinguishes temp files of concurrent writers within this process.
static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    /// Opens (and creates if needed) the storage directory.
    pub async fn open(root: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", canonical_name(key), FILE_EXTENSION))
    }

    /// Keys currently present on disk, sorted.
    pub async fn keys(&self) -> Result<Vec<String>, CoreError> {
        let mut names = Vec::new();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(names),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl KeyValueStorage for JsonFileStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let path = self.path_for(key);
        let tmp = tmp_path(&path, TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed));
        let staged = match write_file(&tmp, value).await {
            Ok(()) => fs::rename(&tmp, &path).await.map_err(CoreError::from),
            Err(err) => Err(err),
        };
        if staged.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        staged
    }

    async fn remove(&self, key: &str) -> Result<(), CoreError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn canonical_name(key: &str) -> String {
    let sanitized: String = key
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "entry".into()
    } else {
        sanitized
    }
}

/// `<file>.<pid>-<seq>.tmp` next to `path`, unique per writer.
fn tmp_path(path: &Path, seq: u64) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("entry");
    path.with_file_name(format!(
        "{}.{}-{}.{}",
        name,
        std::process::id(),
        seq,
        TMP_SUFFIX
    ))
}

async fn write_file(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut file = fs::File::create(path).await?;
    file.write_all(data.as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
