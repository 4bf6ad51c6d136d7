//! Append-only corpus log holding every indexed document.
//!
//! Each entry is written as: [length: u32][crc32: u32][payload: bincode(LogEntry)]
//! Records are immutable once inserted; model reconciliation appends
//! `Revector` entries instead of rewriting `Insert` entries in place.
//! Replay stops at the first truncated or corrupted entry.

use crate::error::{EngineError, Result};
use crate::store::{from_bincode, to_bincode};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// A stored document: text plus its vector under some model version.
///
/// `id`, `name` and `raw_text` never change after insertion. `vector` and
/// `model_version` are refreshed together when the model is refitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: u64,
    pub name: String,
    pub raw_text: String,
    pub vector: Vector,
    pub model_version: u64,
}

/// A single log entry.
#[derive(Debug, Serialize, Deserialize)]
enum LogEntry {
    Insert {
        id: u64,
        name: String,
        text: String,
        vector: Vector,
        model_version: u64,
    },
    Revector {
        id: u64,
        vector: Vector,
        model_version: u64,
    },
}

/// Durable table of document records, backed by an append-only log file.
pub struct CorpusLog {
    path: PathBuf,
    file: File,
    /// Records in insertion order.
    records: Vec<DocumentRecord>,
    /// id -> position in `records`
    positions: HashMap<u64, usize>,
    next_id: u64,
    entry_count: usize,
}

impl CorpusLog {
    /// Open (or create) a corpus log at the given path and replay it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut log = Self {
            path,
            file,
            records: Vec::new(),
            positions: HashMap::new(),
            next_id: 1,
            entry_count: 0,
        };
        log.replay()?;
        Ok(log)
    }

    /// Replay all valid entries from the log.
    /// Stops at the first corrupted or incomplete entry (crash tolerance).
    fn replay(&mut self) -> Result<()> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);

        loop {
            let mut len_buf = [0u8; 4];
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(EngineError::Persistence(e)),
            }
            let len = u32::from_le_bytes(len_buf) as usize;

            let mut crc_buf = [0u8; 4];
            if reader.read_exact(&mut crc_buf).is_err() {
                break; // Truncated — stop
            }
            let expected_crc = u32::from_le_bytes(crc_buf);

            let mut payload = vec![0u8; len];
            if reader.read_exact(&mut payload).is_err() {
                break; // Truncated — stop
            }

            if crc32fast::hash(&payload) != expected_crc {
                break; // Corrupted — stop
            }

            match from_bincode::<LogEntry>(&payload) {
                Ok(entry) => self.apply(entry),
                Err(_) => break, // Corrupted — stop
            }
            self.entry_count += 1;
        }

        Ok(())
    }

    fn apply(&mut self, entry: LogEntry) {
        match entry {
            LogEntry::Insert {
                id,
                name,
                text,
                vector,
                model_version,
            } => {
                self.next_id = self.next_id.max(id + 1);
                self.positions.insert(id, self.records.len());
                self.records.push(DocumentRecord {
                    id,
                    name,
                    raw_text: text,
                    vector,
                    model_version,
                });
            }
            LogEntry::Revector {
                id,
                vector,
                model_version,
            } => {
                if let Some(&pos) = self.positions.get(&id) {
                    self.records[pos].vector = vector;
                    self.records[pos].model_version = model_version;
                }
            }
        }
    }

    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let payload = to_bincode(entry)?;
        let crc = crc32fast::hash(&payload);
        let len = payload.len() as u32;

        self.file.write_all(&len.to_le_bytes())?;
        self.file.write_all(&crc.to_le_bytes())?;
        self.file.write_all(&payload)?;
        self.entry_count += 1;
        Ok(())
    }

    /// Fsync the log file.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Append a new immutable record and fsync. Returns the assigned id.
    pub fn insert(
        &mut self,
        name: &str,
        text: &str,
        vector: Vector,
        model_version: u64,
    ) -> Result<u64> {
        let id = self.next_id;
        let entry = LogEntry::Insert {
            id,
            name: name.to_string(),
            text: text.to_string(),
            vector,
            model_version,
        };
        self.append(&entry)?;
        self.sync()?;
        self.apply(entry);
        Ok(id)
    }

    /// Refresh a record's vector and model version during reconciliation.
    ///
    /// Not fsynced on its own: reconciliation batches many of these and the
    /// caller's closing `insert` syncs the whole batch.
    pub fn revector(&mut self, id: u64, vector: Vector, model_version: u64) -> Result<()> {
        let entry = LogEntry::Revector {
            id,
            vector,
            model_version,
        };
        self.append(&entry)?;
        self.apply(entry);
        Ok(())
    }

    /// Iterate over all records in insertion order. Restartable.
    pub fn scan_all(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.records.iter()
    }

    /// Iterate over all stored raw texts in insertion order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.raw_text.as_str())
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total log entries on disk, including superseded `Revector` entries.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Rewrite the log with one `Insert` entry per live record, dropping
    /// superseded `Revector` entries. Atomic via tmp-file rename.
    pub fn compact(&mut self) -> Result<()> {
        let tmp_path = self.path.with_extension("log.tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            for record in &self.records {
                let entry = LogEntry::Insert {
                    id: record.id,
                    name: record.name.clone(),
                    text: record.raw_text.clone(),
                    vector: record.vector.clone(),
                    model_version: record.model_version,
                };
                let payload = to_bincode(&entry)?;
                let crc = crc32fast::hash(&payload);
                tmp.write_all(&(payload.len() as u32).to_le_bytes())?;
                tmp.write_all(&crc.to_le_bytes())?;
                tmp.write_all(&payload)?;
            }
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.entry_count = self.records.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vec2(a: f32, b: f32) -> Vector {
        Vector::new(vec![a, b])
    }

    #[test]
    fn test_insert_and_replay() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.log");

        {
            let mut log = CorpusLog::open(&path).unwrap();
            let id1 = log.insert("alice", "rust systems", vec2(1.0, 0.0), 1).unwrap();
            let id2 = log.insert("bob", "python data", vec2(0.0, 1.0), 1).unwrap();
            assert_eq!(id1, 1);
            assert_eq!(id2, 2);
        }

        let log = CorpusLog::open(&path).unwrap();
        assert_eq!(log.len(), 2);
        let records: Vec<_> = log.scan_all().collect();
        assert_eq!(records[0].name, "alice");
        assert_eq!(records[1].name, "bob");
        assert_eq!(records[1].vector, vec2(0.0, 1.0));
    }

    #[test]
    fn test_ids_stable_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.log");

        {
            let mut log = CorpusLog::open(&path).unwrap();
            log.insert("a", "text a", vec2(1.0, 0.0), 1).unwrap();
        }
        {
            let mut log = CorpusLog::open(&path).unwrap();
            let id = log.insert("b", "text b", vec2(0.0, 1.0), 1).unwrap();
            assert_eq!(id, 2);
        }
    }

    #[test]
    fn test_revector_replaces_vector_and_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.log");

        {
            let mut log = CorpusLog::open(&path).unwrap();
            let id = log.insert("alice", "rust systems", vec2(1.0, 0.0), 1).unwrap();
            log.revector(id, Vector::new(vec![0.5, 0.5, 0.5]), 2).unwrap();
            log.sync().unwrap();
        }

        let log = CorpusLog::open(&path).unwrap();
        let record = log.scan_all().next().unwrap();
        assert_eq!(record.model_version, 2);
        assert_eq!(record.vector.dimension(), 3);
        assert_eq!(record.raw_text, "rust systems");
    }

    #[test]
    fn test_truncated_tail_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.log");

        {
            let mut log = CorpusLog::open(&path).unwrap();
            log.insert("alice", "rust", vec2(1.0, 0.0), 1).unwrap();
        }

        // Append garbage (simulates a crash mid-write)
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[0xFF, 0xFF, 0xFF]).unwrap();
        }

        let log = CorpusLog::open(&path).unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_compact_drops_superseded_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.log");

        let mut log = CorpusLog::open(&path).unwrap();
        let id = log.insert("alice", "rust", vec2(1.0, 0.0), 1).unwrap();
        for version in 2..10 {
            log.revector(id, vec2(0.0, 1.0), version).unwrap();
        }
        log.sync().unwrap();
        assert_eq!(log.entry_count(), 9);

        log.compact().unwrap();
        assert_eq!(log.entry_count(), 1);
        assert_eq!(log.len(), 1);

        // Compacted state survives reopen
        drop(log);
        let log = CorpusLog::open(&path).unwrap();
        assert_eq!(log.len(), 1);
        let record = log.scan_all().next().unwrap();
        assert_eq!(record.model_version, 9);
        assert_eq!(record.vector, vec2(0.0, 1.0));
    }
}
