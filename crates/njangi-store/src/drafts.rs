//! Draft persistence for in-progress form data.
//!
//! File-per-key JSON under a caller-chosen directory. The contract is
//! the autosave one: written on every change, loaded on mount, cleared
//! on successful submit. Entity caches never go through here; they are
//! memory-only and re-fetched each session.

use njangi_backend::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    /// Open (and create if needed) the draft directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Persist a draft under the given key, overwriting any previous one.
    pub fn save<T: Serialize>(&self, key: &str, draft: &T) -> Result<()> {
        let json = serde_json::to_vec_pretty(draft)?;
        fs::write(self.path(key), json)?;
        Ok(())
    }

    /// Load a draft, if one exists.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Drop a draft after a successful submit. Missing drafts are fine.
    pub fn clear(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(key)))
    }
}

/// Keys come from callers; keep only filename-safe characters.
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct MemberForm {
        first_name: String,
        email: String,
    }

    #[test]
    fn save_load_clear_roundtrip() {
        let dir = tempdir().unwrap();
        let drafts = DraftStore::open(dir.path()).unwrap();

        let form = MemberForm { first_name: "Jean".into(), email: "jean@example.com".into() };
        drafts.save("member-form", &form).unwrap();

        let loaded: Option<MemberForm> = drafts.load("member-form").unwrap();
        assert_eq!(loaded, Some(form));

        drafts.clear("member-form").unwrap();
        let gone: Option<MemberForm> = drafts.load("member-form").unwrap();
        assert_eq!(gone, None);
    }

    #[test]
    fn missing_draft_is_none_and_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let drafts = DraftStore::open(dir.path()).unwrap();

        let loaded: Option<MemberForm> = drafts.load("nothing").unwrap();
        assert_eq!(loaded, None);
        drafts.clear("nothing").unwrap();
    }

    #[test]
    fn keys_are_sanitized() {
        let dir = tempdir().unwrap();
        let drafts = DraftStore::open(dir.path()).unwrap();

        drafts.save("session/close ../../escape", &42u32).unwrap();
        let loaded: Option<u32> = drafts.load("session/close ../../escape").unwrap();
        assert_eq!(loaded, Some(42));

        // Everything stays inside the draft directory.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
