//! File-backed save store.
//!
//! The engine hands the presentation two opaque serialized blobs; this
//! store keeps them under their fixed keys in a single JSON file next to
//! the story. A save only counts as present when both blobs are there.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use dd_runtime::{MODEL_KEY, PUBLIC_KEY};

/// A one-slot key-value store on disk.
pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write both blobs, replacing any previous save.
    pub fn write(&self, public_json: &str, model_json: &str) -> Result<(), String> {
        let mut map = Map::new();
        map.insert(PUBLIC_KEY.into(), Value::String(public_json.to_string()));
        map.insert(MODEL_KEY.into(), Value::String(model_json.to_string()));

        let text =
            serde_json::to_string_pretty(&Value::Object(map)).map_err(|e| e.to_string())?;
        fs::write(&self.path, text)
            .map_err(|e| format!("cannot write {}: {e}", self.path.display()))
    }

    fn read_map(&self) -> Option<Map<String, Value>> {
        let text = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&text).ok()? {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// True if the file exists and holds both blobs.
    pub fn exists(&self) -> bool {
        self.read_map()
            .is_some_and(|map| map.contains_key(PUBLIC_KEY) && map.contains_key(MODEL_KEY))
    }

    /// Read back `(public, model)`, or `None` if either blob is missing
    /// or the file is unreadable.
    pub fn read(&self) -> Option<(String, String)> {
        let map = self.read_map()?;
        let public = map.get(PUBLIC_KEY)?.as_str()?.to_string();
        let model = map.get(MODEL_KEY)?.as_str()?.to_string();
        Some((public, model))
    }
}
