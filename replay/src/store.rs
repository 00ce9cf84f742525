/*!
On-disk session library.

Each session lives in `<dir>/<safe-name>.json`. The store is the only reader
and writer of its directory; everything it has loaded or written is kept in
memory as `Arc<ReplaySession>` so the player can hold a session while the
library changes.
*/

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ReplayError;
use crate::session::ReplaySession;

const FILE_EXTENSION: &str = "json";

/// Replaces characters that are invalid in file names with `_`.
pub fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
    sessions: Vec<Arc<ReplaySession>>,
}

impl SessionStore {
    /// Opens `dir`, creating it if needed, and loads every session file in it.
    /// Files that cannot be read or parsed are logged and skipped.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ReplayError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ReplayError::io(&dir, e))?;

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(|e| ReplayError::io(&dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == FILE_EXTENSION))
            .collect();
        paths.sort();

        let mut sessions = Vec::with_capacity(paths.len());
        for path in paths {
            match read_session(&path) {
                Ok(session) => sessions.push(Arc::new(session)),
                Err(e) => log::error!("Error loading replay session: {e}"),
            }
        }
        log::info!("Loaded {} replay sessions from {}", sessions.len(), dir.display());

        Ok(Self { dir, sessions })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a session with this name is stored in.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{FILE_EXTENSION}", safe_file_name(name)))
    }

    /// Writes `session` to disk and adds it, replacing any session with the
    /// same name. Nothing changes in memory if the write fails.
    pub fn add(&mut self, session: ReplaySession) -> Result<Arc<ReplaySession>, ReplayError> {
        let path = self.path_for(&session.name);
        let json =
            serde_json::to_string_pretty(&session).map_err(|e| ReplayError::json(&path, e))?;
        fs::write(&path, json).map_err(|e| ReplayError::io(&path, e))?;

        let session = Arc::new(session);
        if let Some(existing) = self.sessions.iter_mut().find(|s| s.name == session.name) {
            log::warn!("Replacing existing replay session {}", session.name);
            *existing = Arc::clone(&session);
        } else {
            self.sessions.push(Arc::clone(&session));
        }
        Ok(session)
    }

    /// Removes the named session and its file. Returns the removed session.
    pub fn remove(&mut self, name: &str) -> Result<Option<Arc<ReplaySession>>, ReplayError> {
        let Some(index) = self.sessions.iter().position(|s| s.name == name) else {
            return Ok(None);
        };
        self.delete_files(name)?;
        Ok(Some(self.sessions.remove(index)))
    }

    /// Removes every session and its file.
    pub fn clear(&mut self) -> Result<(), ReplayError> {
        while let Some(session) = self.sessions.last() {
            let name = session.name.clone();
            self.delete_files(&name)?;
            self.sessions.pop();
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<ReplaySession>> {
        self.sessions.iter().find(|s| s.name == name).cloned()
    }

    pub fn sessions(&self) -> &[Arc<ReplaySession>] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn delete_files(&self, name: &str) -> Result<(), ReplayError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path).map_err(|e| ReplayError::io(&path, e))?;

        let mut meta = path.into_os_string();
        meta.push(".meta");
        let meta = PathBuf::from(meta);
        if meta.exists() {
            fs::remove_file(&meta).map_err(|e| ReplayError::io(&meta, e))?;
        }
        Ok(())
    }
}

fn read_session(path: &Path) -> Result<ReplaySession, ReplayError> {
    let json = fs::read_to_string(path).map_err(|e| ReplayError::io(path, e))?;
    serde_json::from_str(&json).map_err(|e| ReplayError::json(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session(name: &str, duration: f32) -> ReplaySession {
        ReplaySession {
            name: name.to_owned(),
            duration,
            created_at: Utc::now(),
            recorded_objects: Vec::new(),
        }
    }

    #[test]
    fn safe_names_replace_reserved_characters() {
        assert_eq!(safe_file_name("a/b:c*d?"), "a_b_c_d_");
        assert_eq!(safe_file_name("tab\there"), "tab_here");
        assert_eq!(safe_file_name("Replay_12_00_00"), "Replay_12_00_00");
    }

    #[test]
    fn adding_same_name_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::open(dir.path()).unwrap();
        store.add(session("run", 1.0)).unwrap();
        store.add(session("run", 2.0)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("run").unwrap().duration, 2.0);
    }

    #[test]
    fn remove_deletes_file_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::open(dir.path()).unwrap();
        store.add(session("run", 1.0)).unwrap();
        let path = store.path_for("run");
        let meta = dir.path().join("run.json.meta");
        fs::write(&meta, "").unwrap();

        assert!(store.remove("run").unwrap().is_some());
        assert!(!path.exists());
        assert!(!meta.exists());
        assert!(store.remove("run").unwrap().is_none());
    }

    #[test]
    fn corrupt_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        {
            let mut store = SessionStore::open(dir.path()).unwrap();
            store.add(session("good", 1.5)).unwrap();
        }

        let store = SessionStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.sessions()[0].name, "good");
    }

    #[test]
    fn clear_empties_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::open(dir.path()).unwrap();
        store.add(session("a", 1.0)).unwrap();
        store.add(session("b", 1.0)).unwrap();
        store.clear().unwrap();

        assert!(store.is_empty());
        assert!(SessionStore::open(dir.path()).unwrap().is_empty());
    }
}
