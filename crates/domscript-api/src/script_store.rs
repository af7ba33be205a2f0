use domscript_core::Result;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

const UNKNOWN: &str = "unknown";

/// A script as persisted in the scripts file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedScript {
    pub id: u64,
    pub prompt: String,
    pub code: String,
    #[serde(default = "unknown")]
    pub source: String,
    #[serde(default)]
    pub success: Option<bool>,
    /// Client-supplied, kept verbatim
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default = "unknown")]
    pub url: String,
    #[serde(default = "unknown")]
    pub platform: String,
}

/// Body of a save request
#[derive(Debug, Clone, Deserialize)]
pub struct NewScript {
    pub prompt: String,
    pub code: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// JSON-file backed list of saved scripts.
///
/// The whole file is rewritten on every save; writes are serialized by a lock.
#[derive(Debug)]
pub struct ScriptStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ScriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved scripts; a missing file is an empty list
    pub async fn list(&self) -> Result<Vec<SavedScript>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, id: u64) -> Result<Option<SavedScript>> {
        Ok(self.list().await?.into_iter().find(|script| script.id == id))
    }

    /// Append `script` with the next id and the host platform
    pub async fn save(&self, script: NewScript) -> Result<SavedScript> {
        let _guard = self.write_lock.lock().await;

        let mut scripts = self.list().await?;
        let entry = SavedScript {
            id: scripts.len() as u64 + 1,
            prompt: script.prompt,
            code: script.code,
            source: script.source.unwrap_or_else(unknown),
            success: script.success,
            timestamp: script.timestamp,
            url: script.url.unwrap_or_else(unknown),
            platform: std::env::consts::OS.to_string(),
        };
        scripts.push(entry.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&scripts)?;
        tokio::fs::write(&self.path, json).await?;

        info!("Saved script #{}: {}", entry.id, entry.prompt);
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_script(prompt: &str) -> NewScript {
        NewScript {
            prompt: prompt.to_string(),
            code: "document.body.style.color = 'red';".to_string(),
            source: None,
            success: Some(true),
            timestamp: None,
            url: None,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ScriptStore::new(dir.path().join("scripts.json"));
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let store = ScriptStore::new(dir.path().join("nested").join("scripts.json"));

        let first = store.save(new_script("make text red")).await.unwrap();
        let second = store.save(new_script("hide images")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.source, "unknown");
        assert_eq!(first.url, "unknown");
        assert_eq!(first.platform, std::env::consts::OS);

        let saved = store.list().await.unwrap();
        assert_eq!(saved, vec![first, second.clone()]);
        assert_eq!(store.get(2).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_file_is_pretty_utf8_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scripts.json");
        let store = ScriptStore::new(&path);
        store.save(new_script("farbe ändern ✓")).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("farbe ändern ✓"));
        assert!(content.contains("\n  {"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scripts.json");
        std::fs::write(&path, "not json").unwrap();

        let store = ScriptStore::new(&path);
        assert!(store.list().await.is_err());
        assert!(store.save(new_script("x")).await.is_err());
    }
}
