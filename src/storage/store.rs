use anyhow::{Context, Result};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::Ledger;
use crate::io::{TripSnapshot, import_full_json};

/// File-backed trip store. The file holds a [`TripSnapshot`]; loading replays
/// its event log, saving rewrites the whole snapshot.
#[derive(Debug, Clone)]
pub struct TripStore {
    path: PathBuf,
}

/// A ledger read back from disk.
#[derive(Debug)]
pub struct LoadedTrip {
    pub ledger: Ledger,
    /// False when the stored summary no longer matches the replayed log
    pub summary_matches: bool,
}

impl TripStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read and replay the trip file.
    pub fn load(&self) -> Result<LoadedTrip> {
        let file = fs::File::open(&self.path)
            .with_context(|| format!("Failed to open trip file {}", self.path.display()))?;
        let imported = import_full_json(BufReader::new(file))
            .with_context(|| format!("Failed to load trip file {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            members = imported.ledger.members().len(),
            events = imported.ledger.events().len(),
            "trip loaded"
        );

        Ok(LoadedTrip {
            ledger: imported.ledger,
            summary_matches: imported.summary_matches,
        })
    }

    /// Write the trip snapshot. The new content goes to a sibling temp file
    /// first and is renamed over the old one, so a failed write never leaves
    /// a truncated trip behind.
    pub fn save(&self, ledger: &Ledger) -> Result<TripSnapshot> {
        let snapshot = TripSnapshot::capture(ledger)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = self.tmp_path();
        {
            let file = fs::File::create(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &snapshot)
                .context("Failed to serialize trip snapshot")?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            events = snapshot.events.len(),
            "trip saved"
        );
        Ok(snapshot)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = TripStore::new(dir.path().join("trip.json"));

        let mut ledger = Ledger::new("Hampi", "Rs.");
        ledger.add_member("Anu").unwrap();
        ledger.add_member("Bala").unwrap();
        ledger
            .record_expense("Anu", 60000, vec!["Anu".into(), "Bala".into()], "Bikes")
            .unwrap();

        assert!(!store.exists());
        store.save(&ledger).unwrap();
        assert!(store.exists());
        assert!(!dir.path().join("trip.json.tmp").exists());

        let loaded = store.load().unwrap();
        assert!(loaded.summary_matches);
        assert_eq!(loaded.ledger, ledger);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = TripStore::new(dir.path().join("trips").join("hampi.json"));

        store.save(&Ledger::new("Hampi", "Rs.")).unwrap();
        assert!(store.exists());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let store = TripStore::new(dir.path().join("missing.json"));
        assert!(store.load().is_err());
    }
}
