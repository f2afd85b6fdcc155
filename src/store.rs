// src/store.rs
//! Flat-file JSON persistence.
//!
//! Each entity type lives in its own document under a data directory:
//!
//! - `player.json`
//! - `tasks.json`
//! - `sparks/<slug>.json`
//! - `review-evidence/<slug>.reviews.json`
//!
//! Reads are fresh per operation. Writes stage to a temp file and rename into
//! place, so a crash never leaves a half-written document. The player/tasks
//! pair goes through [`JsonStore::write_pair`], which stages both documents
//! before renaming either — they land together or not at all.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};

pub const DEFAULT_DATA_DIR: &str = "lib/data";
pub const ENV_DATA_DIR: &str = "DATA_DIR";

pub const PLAYER_DOC: &str = "player.json";
pub const TASKS_DOC: &str = "tasks.json";

pub fn spark_doc(slug: &str) -> String {
    format!("sparks/{slug}.json")
}

pub fn evidence_doc(slug: &str) -> String {
    format!("review-evidence/{slug}.reviews.json")
}

pub fn manual_input_doc(slug: &str) -> String {
    format!("review-evidence/{slug}-input.json")
}

/// Slugs become path segments, so only allow a conservative charset.
pub fn validate_slug(slug: &str) -> Result<()> {
    let ok = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(EngineError::Validation(format!("invalid slug: {slug:?}")))
    }
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data directory from `DATA_DIR`, falling back to `lib/data`.
    pub fn from_env() -> Self {
        let root = std::env::var(ENV_DATA_DIR).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, doc: &str) -> PathBuf {
        self.root.join(doc)
    }

    pub fn exists(&self, doc: &str) -> bool {
        self.path(doc).is_file()
    }

    pub fn read<T: DeserializeOwned>(&self, doc: &str) -> Result<T> {
        let path = self.path(doc);
        let raw = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::NotFound(format!("{doc} is missing"))
            } else {
                EngineError::Io(e)
            }
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| EngineError::Validation(format!("malformed json in {doc}: {e}")))
    }

    /// Like [`read`](Self::read), but an absent document is `Ok(None)`.
    /// Malformed content is still an error.
    pub fn read_optional<T: DeserializeOwned>(&self, doc: &str) -> Result<Option<T>> {
        match self.read(doc) {
            Ok(v) => Ok(Some(v)),
            Err(EngineError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn write<T: Serialize>(&self, doc: &str, value: &T) -> Result<()> {
        self.stage(doc, value)?.commit()
    }

    /// Write two documents together. Both are staged before either rename;
    /// a failure while staging leaves both originals untouched.
    pub fn write_pair<A: Serialize, B: Serialize>(
        &self,
        (doc_a, a): (&str, &A),
        (doc_b, b): (&str, &B),
    ) -> Result<()> {
        let staged_a = self.stage(doc_a, a)?;
        let staged_b = self.stage(doc_b, b)?;
        staged_a.commit()?;
        staged_b.commit()
    }

    fn stage<T: Serialize>(&self, doc: &str, value: &T) -> Result<Staged> {
        let dest = self.path(doc);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| EngineError::Validation(format!("cannot serialize {doc}: {e}")))?;
        let tmp = dest.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        Ok(Staged {
            tmp,
            dest,
            committed: false,
        })
    }
}

struct Staged {
    tmp: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl Staged {
    fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.dest)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        n: u32,
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let err = store.read::<Doc>("nope.json").unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
        assert_eq!(store.read_optional::<Doc>("nope.json").unwrap(), None);
    }

    #[test]
    fn write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store.write("sparks/x.json", &Doc { n: 7 }).unwrap();
        assert_eq!(store.read::<Doc>("sparks/x.json").unwrap(), Doc { n: 7 });
    }

    #[test]
    fn malformed_json_is_validation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let store = JsonStore::new(dir.path());
        let err = store.read::<Doc>("bad.json").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store
            .write_pair(("a.json", &Doc { n: 1 }), ("b.json", &Doc { n: 2 }))
            .unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn slug_validation_rejects_path_tricks() {
        assert!(validate_slug("greenwood-apts").is_ok());
        assert!(validate_slug("../player").is_err());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("a/b").is_err());
    }
}
