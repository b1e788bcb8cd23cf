//! Structural snapshots for undo and save/restore.
//!
//! Snapshots are plain data — the model holds no function-valued fields,
//! so a clone (for undo) or a JSON round trip (for save) captures
//! everything. On restore, the saved JSON is deep-merged over a freshly
//! re-parsed model so fields added since the save keep their defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::public::PublicState;
use dd_core::StoryModel;

/// Fixed key under which the public story blob is persisted.
pub const PUBLIC_KEY: &str = "story";

/// Fixed key under which the internal story blob is persisted.
pub const MODEL_KEY: &str = "story_internal";

/// A point-in-time copy of the running story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Author script variables.
    pub public: PublicState,
    /// The internal story model.
    pub model: StoryModel,
}

/// Deep-merge `overlay` into `base`. Objects merge key by key; anything
/// else (scalars, arrays, nulls) is replaced by the overlay.
pub fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge_values(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}
