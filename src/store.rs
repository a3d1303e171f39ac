//! Document Store
//!
//! Every manager persists its entities as individual JSON documents addressed
//! by a slash-separated key such as `definitions/orders.json`. The store is the
//! only durable interface; managers never touch paths directly.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{ArchError, Result};

/// Key/value document persistence with list-by-directory semantics
pub trait DocumentStore: Send + Sync {
    /// Read a document, `None` when absent
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a document
    fn write(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Append bytes to a document, creating it if needed
    fn append(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Check whether a document exists
    fn exists(&self, key: &str) -> bool;

    /// Remove a document, returning whether it existed
    fn remove(&self, key: &str) -> Result<bool>;

    /// List keys directly under `dir` whose names end with `suffix`, sorted
    fn list(&self, dir: &str, suffix: &str) -> Result<Vec<String>>;
}

/// Typed JSON helpers over any [`DocumentStore`]
pub trait JsonStoreExt: DocumentStore {
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let content = serde_json::to_vec_pretty(value)?;
        self.write(key, &content)
    }

    /// Append one compact JSON line
    fn append_json_line<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');
        self.append(key, &line)
    }

    /// Load every JSON document under `dir`, skipping ones that fail to parse
    fn load_all<T: DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for key in self.list(dir, ".json")? {
            match self.read_json::<T>(&key) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => tracing::error!(key = %key, error = %e, "Skipping unreadable document"),
            }
        }
        Ok(items)
    }
}

impl<S: DocumentStore + ?Sized> JsonStoreExt for S {}

/// Join key segments with `/`
pub fn key(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|segment| segment.is_empty() || segment == "..")
    {
        return Err(ArchError::InvalidInput(format!("invalid document key: {key:?}")));
    }
    Ok(())
}

/// Filesystem-backed store rooted at a directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store, creating the root directory if needed
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

impl DocumentStore for FsStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Readers never observe a partially written document
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, data)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn append(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(data)?;
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.path_for(key).map(|p| p.is_file()).unwrap_or(false)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, dir: &str, suffix: &str) -> Result<Vec<String>> {
        let base = if dir.is_empty() { self.root.clone() } else { self.path_for(dir)? };
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys: Vec<String> = WalkDir::new(&base)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|name| name.ends_with(suffix))
            .map(|name| key(dir, &name))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// In-memory store, mainly for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn docs(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.docs
            .lock()
            .map_err(|_| ArchError::Internal("memory store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        check_key(key)?;
        Ok(self.docs()?.get(key).cloned())
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        check_key(key)?;
        self.docs()?.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn append(&self, key: &str, data: &[u8]) -> Result<()> {
        check_key(key)?;
        self.docs()?.entry(key.to_string()).or_default().extend_from_slice(data);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.docs().map(|d| d.contains_key(key)).unwrap_or(false)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        Ok(self.docs()?.remove(key).is_some())
    }

    fn list(&self, dir: &str, suffix: &str) -> Result<Vec<String>> {
        let prefix = if dir.is_empty() { String::new() } else { format!("{}/", dir.trim_end_matches('/')) };
        Ok(self
            .docs()?
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .filter(|k| {
                let rest = &k[prefix.len()..];
                !rest.contains('/') && rest.ends_with(suffix)
            })
            .cloned()
            .collect())
    }
}
