//! Persistent set of channels the bot auto-replies in.
//!
//! Backed by a flat JSON array of channel ids (e.g. `[123, 456]`). The file is
//! rewritten wholesale on every mutation via a temp file + rename, and the
//! in-memory set is only changed once the write has succeeded.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Channel ids for which every message triggers a reply
pub struct ActivationStore {
    path: PathBuf,
    // Held across check + write so concurrent toggles are serialized.
    channels: Mutex<HashSet<u64>>,
}

impl ActivationStore {
    /// Load the store from `path`.
    ///
    /// A missing file is a normal empty state. An unreadable or corrupt file is
    /// logged and also treated as empty; this never fails.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let channels = match std::fs::read_to_string(&path) {
            Ok(content) => match parse_channel_list(&content) {
                Ok(channels) => channels,
                Err(e) => {
                    log::warn!(
                        "[ActivationStore] Failed to parse {}: {} — starting empty",
                        path.display(),
                        e
                    );
                    HashSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[ActivationStore] {} not found, starting empty", path.display());
                HashSet::new()
            }
            Err(e) => {
                log::warn!(
                    "[ActivationStore] Could not read {}: {} — starting empty",
                    path.display(),
                    e
                );
                HashSet::new()
            }
        };

        Self {
            path,
            channels: Mutex::new(channels),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, channel_id: u64) -> bool {
        self.channels.lock().contains(&channel_id)
    }

    /// Activate a channel. Returns `Ok(false)` if it was already active.
    pub fn add(&self, channel_id: u64) -> Result<bool, String> {
        let mut channels = self.channels.lock();
        if channels.contains(&channel_id) {
            return Ok(false);
        }

        let mut next = channels.clone();
        next.insert(channel_id);
        write_channel_list(&self.path, &next)?;
        *channels = next;

        log::info!("[ActivationStore] Activated channel {}", channel_id);
        Ok(true)
    }

    /// Deactivate a channel. Returns `Ok(false)` if it was not active.
    pub fn remove(&self, channel_id: u64) -> Result<bool, String> {
        let mut channels = self.channels.lock();
        if !channels.contains(&channel_id) {
            return Ok(false);
        }

        let mut next = channels.clone();
        next.remove(&channel_id);
        write_channel_list(&self.path, &next)?;
        *channels = next;

        log::info!("[ActivationStore] Deactivated channel {}", channel_id);
        Ok(true)
    }

    /// Snapshot of the active channels, ascending.
    pub fn list(&self) -> Vec<u64> {
        sorted(&self.channels.lock())
    }

    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }
}

fn sorted(channels: &HashSet<u64>) -> Vec<u64> {
    let mut list: Vec<u64> = channels.iter().copied().collect();
    list.sort_unstable();
    list
}

/// Parse the persisted list. Entries may be JSON numbers or numeric strings;
/// anything else is skipped.
fn parse_channel_list(content: &str) -> Result<HashSet<u64>, String> {
    if content.trim().is_empty() {
        return Ok(HashSet::new());
    }

    let entries: Vec<Value> =
        serde_json::from_str(content).map_err(|e| format!("Invalid channel list: {}", e))?;

    let mut channels = HashSet::with_capacity(entries.len());
    for entry in entries {
        let id = match &entry {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        match id {
            Some(id) => {
                channels.insert(id);
            }
            None => log::warn!("[ActivationStore] Skipping invalid channel entry: {}", entry),
        }
    }
    Ok(channels)
}

fn write_channel_list(path: &Path, channels: &HashSet<u64>) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
    }

    let content = serde_json::to_string(&sorted(channels))
        .map_err(|e| format!("Failed to serialize channel list: {}", e))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, content)
        .map_err(|e| format!("Failed to write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        format!("Failed to replace {}: {}", path.display(), e)
    })
}
