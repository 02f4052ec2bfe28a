use std::{fmt, io::Error, path::PathBuf};

use crate::config;

/// Artists whose status may be displayed.
pub const STATE_TYPE_SCANNED: &str = "state_scanned_artists";
/// Media files found without lyrics by the last missing-lyrics scan.
pub const STATE_TYPE_MISSING: &str = "state_missing";

#[derive(Debug)]
pub enum StateError {
    IoError(Error),
    SerdeError(serde_json::Error),
}

impl From<Error> for StateError {
    fn from(err: Error) -> Self {
        StateError::IoError(err)
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::SerdeError(err)
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::IoError(e) => write!(f, "state file error: {}", e),
            StateError::SerdeError(e) => write!(f, "state file is corrupt: {}", e),
        }
    }
}

impl std::error::Error for StateError {}

/// A list of strings persisted as JSON under the local data directory.
pub struct StateManager {
    state_type: String,
    dir: PathBuf,
    state: Vec<String>,
}

impl StateManager {
    pub fn new(state_type: &str) -> Self {
        Self::in_dir(state_type, config::data_dir().join("state"))
    }

    /// Keeps the state file in `dir` instead of the data directory.
    pub fn in_dir(state_type: &str, dir: PathBuf) -> Self {
        Self {
            state_type: state_type.to_string(),
            dir,
            state: Vec::new(),
        }
    }

    pub fn add(&mut self, item: String) {
        if !self.state.contains(&item) {
            self.state.push(item);
        }
    }

    pub fn replace<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.state.clear();
        for item in items {
            self.add(item);
        }
    }

    pub fn get_state(&self) -> &[String] {
        &self.state
    }

    pub fn has(&self, item: &str) -> bool {
        self.state.iter().any(|s| s == item)
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub async fn persist(&self) -> Result<(), StateError> {
        let path = self.get_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.state)?;
        async_fs::write(path, json).await?;
        Ok(())
    }

    /// Loads the persisted list. A state that was never written is empty.
    pub async fn load(&mut self) -> Result<(), StateError> {
        let path = self.get_path();
        if !path.is_file() {
            self.state.clear();
            return Ok(());
        }

        let json = async_fs::read_to_string(path).await?;
        self.state = serde_json::from_str(&json)?;
        Ok(())
    }

    pub async fn clear(&mut self) -> Result<(), StateError> {
        let path = self.get_path();
        self.state.clear();
        match async_fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateError::IoError(e)),
        }
    }

    fn get_path(&self) -> PathBuf {
        self.dir.join(format!("{state}.json", state = self.state_type))
    }
}
