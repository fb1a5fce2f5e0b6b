//! Perceptual-hash duplicate index.
//!
//! Append-only store of `(hash, owner)` pairs persisted as JSON. A check
//! compares the submitted image against stored hashes in insertion order and
//! the first one within the Hamming threshold wins; on a miss the new hash
//! is registered. Compare-and-register runs under a single lock so two
//! concurrent submissions of the same image cannot both pass as new.

use crate::phash::PerceptualHash;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Default maximum Hamming distance still considered the same document
pub const DEFAULT_DISTANCE_THRESHOLD: u32 = 5;

/// One persisted entry of the hash log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateRecord {
    pub hash: String,
    pub owner: String,
}

/// Outcome of a duplicate check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    /// Hamming distance to the match; 0 when no match was found
    pub distance: u32,
    pub matched_with: Option<String>,
    pub hash: String,
}

pub struct DuplicateIndex {
    entries: Mutex<Vec<DuplicateRecord>>,
    store_path: Option<PathBuf>,
    threshold: u32,
}

impl DuplicateIndex {
    /// In-memory index without persistence (tests, dry runs)
    pub fn in_memory(threshold: u32) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            store_path: None,
            threshold,
        }
    }

    /// Open an index backed by a JSON log, loading any prior entries.
    /// A missing file starts an empty index; a corrupt one is an error.
    pub fn open(store_path: impl Into<PathBuf>, threshold: u32) -> Result<Self> {
        let store_path = store_path.into();
        let entries = if store_path.exists() {
            let raw = std::fs::read_to_string(&store_path)
                .with_context(|| format!("failed to read hash log {}", store_path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("corrupt hash log {}", store_path.display()))?
        } else {
            Vec::new()
        };

        debug!(
            path = %store_path.display(),
            entries = entries.len(),
            "duplicate index opened"
        );

        Ok(Self {
            entries: Mutex::new(entries),
            store_path: Some(store_path),
            threshold,
        })
    }

    /// Hash the image and atomically check-then-register it.
    pub fn check_and_register(&self, image_path: &Path, owner: &str) -> Result<DuplicateCheck> {
        let hash = PerceptualHash::from_file(image_path)?;
        Ok(self.check_and_register_hash(hash, owner))
    }

    /// Same as [`check_and_register`](Self::check_and_register) for an
    /// already-computed hash. The lock spans compare and append.
    pub fn check_and_register_hash(&self, hash: PerceptualHash, owner: &str) -> DuplicateCheck {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        // Insertion order, first match wins
        for record in entries.iter() {
            let stored = match PerceptualHash::from_hex(&record.hash) {
                Ok(h) => h,
                Err(e) => {
                    warn!(owner = %record.owner, error = %e, "skipping unparseable stored hash");
                    continue;
                }
            };
            let distance = hash.distance(stored);
            if distance < self.threshold {
                return DuplicateCheck {
                    is_duplicate: true,
                    distance,
                    matched_with: Some(record.owner.clone()),
                    hash: hash.to_hex(),
                };
            }
        }

        entries.push(DuplicateRecord {
            hash: hash.to_hex(),
            owner: owner.to_string(),
        });
        self.persist(&entries);

        DuplicateCheck {
            is_duplicate: false,
            distance: 0,
            matched_with: None,
            hash: hash.to_hex(),
        }
    }

    /// Best-effort rewrite of the log; a write failure loses durability,
    /// not correctness, so it is logged and swallowed.
    fn persist(&self, entries: &[DuplicateRecord]) {
        let Some(path) = &self.store_path else {
            return;
        };
        match serde_json::to_vec(entries) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(path, bytes) {
                    warn!(path = %path.display(), error = %e, "failed to persist hash log");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize hash log"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn hash(bits: u64) -> PerceptualHash {
        PerceptualHash(bits)
    }

    #[test]
    fn first_check_registers_second_detects() {
        let index = DuplicateIndex::in_memory(DEFAULT_DISTANCE_THRESHOLD);

        let first = index.check_and_register_hash(hash(0xdead_beef), "INV-1");
        assert!(!first.is_duplicate);

        let second = index.check_and_register_hash(hash(0xdead_beef), "INV-2");
        assert!(second.is_duplicate);
        assert_eq!(second.distance, 0);
        assert_eq!(second.matched_with.as_deref(), Some("INV-1"));
    }

    #[test]
    fn near_duplicate_within_threshold_matches() {
        let index = DuplicateIndex::in_memory(5);
        index.check_and_register_hash(hash(0b1111_0000), "INV-1");

        // 2 bits flipped: distance 2 < 5
        let check = index.check_and_register_hash(hash(0b1111_0011), "INV-2");
        assert!(check.is_duplicate);
        assert_eq!(check.distance, 2);
    }

    #[test]
    fn distance_at_threshold_is_not_a_match() {
        let index = DuplicateIndex::in_memory(5);
        index.check_and_register_hash(hash(0), "INV-1");

        // Exactly 5 bits differ; threshold is strict
        let check = index.check_and_register_hash(hash(0b1_1111), "INV-2");
        assert!(!check.is_duplicate);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn first_match_wins_in_insertion_order() {
        let index = DuplicateIndex::in_memory(5);
        // 6 bits apart, so both get registered
        index.check_and_register_hash(hash(0b00_0000), "older");
        let second = index.check_and_register_hash(hash(0b11_1111), "newer");
        assert!(!second.is_duplicate);

        // Third hash is 3 bits from each; the earlier entry must win
        let check = index.check_and_register_hash(hash(0b00_0111), "third");
        assert!(check.is_duplicate);
        assert_eq!(check.matched_with.as_deref(), Some("older"));
    }

    #[test]
    fn concurrent_identical_submissions_race_has_one_winner() {
        let index = Arc::new(DuplicateIndex::in_memory(5));
        let mut handles = Vec::new();

        for i in 0..8 {
            let index = Arc::clone(&index);
            handles.push(std::thread::spawn(move || {
                index.check_and_register_hash(hash(0xfeed_f00d), &format!("INV-{i}"))
            }));
        }

        let results: Vec<DuplicateCheck> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        let fresh = results.iter().filter(|r| !r.is_duplicate).count();
        assert_eq!(fresh, 1, "exactly one submission may observe not-a-duplicate");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn persisted_log_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashes.json");

        {
            let index = DuplicateIndex::open(&path, 5).unwrap();
            index.check_and_register_hash(hash(0xabcd), "INV-1");
        }

        let reopened = DuplicateIndex::open(&path, 5).unwrap();
        assert_eq!(reopened.len(), 1);
        let check = reopened.check_and_register_hash(hash(0xabcd), "INV-2");
        assert!(check.is_duplicate);
        assert_eq!(check.matched_with.as_deref(), Some("INV-1"));
    }

    #[test]
    fn unreadable_image_is_an_error_not_a_panic() {
        let index = DuplicateIndex::in_memory(5);
        let result = index.check_and_register(Path::new("/nonexistent/image.png"), "INV-1");
        assert!(result.is_err());
        assert!(index.is_empty());
    }
}
