use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PrefsError;

/// How many recently opened files are remembered.
pub const RECENT_CAPACITY: usize = 5;

const APP_DIR: &str = "datplot";
const FILE_NAME: &str = "recent_history.toml";

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpg,
    Svg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Png, ExportFormat::Jpg, ExportFormat::Svg];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

/// Where and how exports are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTarget {
    pub directory: PathBuf,
    #[serde(default)]
    pub format: ExportFormat,
}

impl Default for ExportTarget {
    fn default() -> Self {
        let directory = dirs::picture_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            directory,
            format: ExportFormat::Png,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Recents {
    #[serde(default)]
    files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    recents: Recents,
    #[serde(default)]
    export: ExportTarget,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Recently opened files and export settings, saved after every change.
///
/// A failed save is returned to the caller but the in-memory state is kept,
/// so the session carries on with the updated values.
#[derive(Debug)]
pub struct PreferencesStore {
    path: Option<PathBuf>,
    doc: Document,
}

impl PreferencesStore {
    /// Load from the per-user config directory.
    pub fn open_default() -> Self {
        match dirs::config_dir() {
            Some(dir) => Self::open(dir.join(APP_DIR).join(FILE_NAME)),
            None => {
                log::warn!("no config directory; preferences will not be saved");
                Self {
                    path: None,
                    doc: Document::default(),
                }
            }
        }
    }

    /// Load from `path`. A missing document yields defaults; an unreadable or
    /// corrupt one yields defaults with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Document>(&content) {
                Ok(mut doc) => {
                    doc.recents.files.truncate(RECENT_CAPACITY);
                    doc
                }
                Err(e) => {
                    log::warn!("ignoring corrupt preferences {}: {e}", path.display());
                    Document::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Document::default(),
            Err(e) => {
                log::warn!("cannot read preferences {}: {e}", path.display());
                Document::default()
            }
        };
        Self {
            path: Some(path),
            doc,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Most recent first, at most [`RECENT_CAPACITY`] entries.
    pub fn recents(&self) -> &[PathBuf] {
        &self.doc.recents.files
    }

    /// Move `path` to the front of the recents and save.
    pub fn record_opened(&mut self, path: &Path) -> Result<(), PrefsError> {
        let files = &mut self.doc.recents.files;
        files.retain(|p| p != path);
        files.insert(0, path.to_path_buf());
        files.truncate(RECENT_CAPACITY);
        log::info!("recent files: {}", files.len());
        self.save()
    }

    pub fn export_target(&self) -> &ExportTarget {
        &self.doc.export
    }

    pub fn set_export_target(
        &mut self,
        directory: PathBuf,
        format: ExportFormat,
    ) -> Result<(), PrefsError> {
        self.doc.export = ExportTarget { directory, format };
        self.save()
    }

    fn save(&self) -> Result<(), PrefsError> {
        let path = self.path.as_ref().ok_or(PrefsError::NoLocation)?;
        let content = toml::to_string_pretty(&self.doc)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PrefsError::Write {
                path: path.clone(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| PrefsError::Write {
            path: path.clone(),
            source,
        })?;
        log::debug!("preferences saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, PreferencesStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferencesStore::open(dir.path().join("nested").join(FILE_NAME));
        (dir, store)
    }

    #[test]
    fn reopening_the_same_file_does_not_duplicate() {
        let (_dir, mut store) = store();
        store.record_opened(Path::new("/data/a.dat")).unwrap();
        store.record_opened(Path::new("/data/b.dat")).unwrap();
        store.record_opened(Path::new("/data/a.dat")).unwrap();
        assert_eq!(
            store.recents(),
            &[PathBuf::from("/data/a.dat"), PathBuf::from("/data/b.dat")]
        );
    }

    #[test]
    fn keeps_only_the_five_most_recent() {
        let (_dir, mut store) = store();
        for i in 1..=6 {
            store.record_opened(&PathBuf::from(format!("/data/{i}.dat"))).unwrap();
        }
        let expected: Vec<PathBuf> = (2..=6)
            .rev()
            .map(|i| PathBuf::from(format!("/data/{i}.dat")))
            .collect();
        assert_eq!(store.recents(), expected.as_slice());
    }

    #[test]
    fn survives_a_restart() {
        let (dir, mut store) = store();
        store.record_opened(Path::new("/data/run1.dat")).unwrap();
        store
            .set_export_target(dir.path().to_path_buf(), ExportFormat::Svg)
            .unwrap();

        let text = std::fs::read_to_string(store.path().unwrap()).unwrap();
        assert!(text.contains("[recents]"));
        assert!(text.contains("format = \"svg\""));

        let reopened = PreferencesStore::open(store.path().unwrap());
        assert_eq!(reopened.recents(), &[PathBuf::from("/data/run1.dat")]);
        assert_eq!(reopened.export_target().format, ExportFormat::Svg);
        assert_eq!(reopened.export_target().directory, dir.path());
    }

    #[test]
    fn corrupt_document_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, "recents = [[[ not toml").unwrap();
        let store = PreferencesStore::open(&path);
        assert!(store.recents().is_empty());
        assert_eq!(store.export_target().format, ExportFormat::Png);
    }

    #[test]
    fn failed_save_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut store = PreferencesStore::open(blocker.join("sub").join(FILE_NAME));

        let err = store.record_opened(Path::new("/data/x.dat")).unwrap_err();
        assert!(matches!(err, PrefsError::Write { .. }));
        assert_eq!(store.recents(), &[PathBuf::from("/data/x.dat")]);
    }
}
