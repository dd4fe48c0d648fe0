use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Transient alarm run state, mirrored to disk so a restarted process does
/// not start a second ringing session on top of a live one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RunState {
    #[serde(default)]
    pub running: bool,

    #[serde(default)]
    pub active_keyword: Option<String>,
}

impl RunState {
    pub fn ringing(keyword: &str) -> Self {
        Self {
            running: true,
            active_keyword: Some(keyword.to_string()),
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }
}

/// Persistence port for the run guard.
pub trait StateStore: Send {
    fn load(&self) -> Result<RunState>;
    fn save(&self, state: &RunState) -> Result<()>;
}

/// JSON-file adapter, written to the XDG state directory.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new() -> Result<Self> {
        let state_dir = if let Ok(dir) = std::env::var("XDG_STATE_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".local").join("state")
        };

        Ok(Self {
            path: state_dir.join("keybell").join("state.json"),
        })
    }

    #[cfg(test)]
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<RunState> {
        if !self.path.exists() {
            return Ok(RunState::idle());
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {:?}", self.path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse state file: {:?}", self.path))
    }

    fn save(&self, state: &RunState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(state).context("Failed to serialize state")?;

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write state file: {:?}", self.path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_as_idle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::at(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), RunState::idle());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::at(dir.path().join("nested").join("state.json"));

        store.save(&RunState::ringing("urgent")).unwrap();
        let loaded = store.load().unwrap();
        assert!(loaded.running);
        assert_eq!(loaded.active_keyword.as_deref(), Some("urgent"));

        store.save(&RunState::idle()).unwrap();
        assert_eq!(store.load().unwrap(), RunState::idle());
    }
}
