//! Long-term memory: interaction logs that outlive the session.
//!
//! Records are appended to a single file as postcard frames and ranked at
//! recall time by plain token overlap with the query. Nothing here blocks
//! a turn: a memory that fails to load starts empty rather than wedging
//! the session.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub timestamp: String,
    pub text: String,
}

/// Append-only store of past interactions.
pub struct MemoryBank {
    path: PathBuf,
    records: Vec<MemoryRecord>,
}

impl MemoryBank {
    /// Open (or create) the bank at `path`, decoding whatever frames are
    /// already there.
    pub fn open(path: PathBuf) -> Result<Self> {
        let records = match std::fs::read(&path) {
            Ok(bytes) => decode_frames(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(eyre!("memory: cannot read {}: {e}", path.display())),
        };
        Ok(Self { path, records })
    }

    /// A bank with nothing in it yet, for when the store cannot be read.
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            records: Vec::new(),
        }
    }

    /// Persist one log line with a timestamp and keep it recallable.
    pub fn add_log(&mut self, text: &str) -> Result<()> {
        let record = MemoryRecord {
            timestamp: now_stamp(),
            text: text.to_string(),
        };
        let frame = postcard::to_allocvec(&record).map_err(|e| eyre!(e))?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&frame)?;
        self.records.push(record);
        Ok(())
    }

    /// The `n` most relevant past logs for `query`, most relevant first.
    /// Relevance is the count of distinct query tokens a record shares.
    pub fn recall(&self, query: &str, n: usize) -> Vec<String> {
        let wanted = tokenize(query);
        if wanted.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(usize, &MemoryRecord)> = self
            .records
            .iter()
            .filter_map(|record| {
                let have = tokenize(&record.text);
                let score = wanted.iter().filter(|t| have.contains(*t)).count();
                (score > 0).then_some((score, record))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(n)
            .map(|(_, record)| record.text.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Decode back-to-back postcard frames from the store, buffering semantics
/// included: a truncated trailing frame (an interrupted write) is dropped
/// rather than poisoning the whole bank.
fn decode_frames(bytes: &[u8]) -> Vec<MemoryRecord> {
    let mut rest = bytes;
    let mut out = Vec::new();
    while !rest.is_empty() {
        match postcard::take_from_bytes::<MemoryRecord>(rest) {
            Ok((record, remainder)) => {
                out.push(record);
                rest = remainder;
            }
            Err(postcard::Error::DeserializeUnexpectedEnd) => break,
            Err(e) => {
                tracing::warn!("memory: undecodable frame, dropping the tail: {e}");
                break;
            }
        }
    }
    out
}

fn now_stamp() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Lowercased alphanumeric words of three or more characters.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3)
        .map(|w| w.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gofer-memory-{tag}-{}", std::process::id()))
    }

    #[test]
    fn empty_bank_recalls_nothing() {
        let path = scratch_path("empty");
        let _ = std::fs::remove_file(&path);
        let bank = MemoryBank::open(path).unwrap();
        assert!(bank.is_empty());
        assert!(bank.recall("anything", 2).is_empty());
    }

    #[test]
    fn recall_ranks_by_shared_tokens() {
        let path = scratch_path("rank");
        let _ = std::fs::remove_file(&path);
        let mut bank = MemoryBank::open(path.clone()).unwrap();
        bank.add_log("User: remind me about the bitcoin price\nAssistant: it was high")
            .unwrap();
        bank.add_log("User: write a poem about autumn\nAssistant: done")
            .unwrap();
        bank.add_log("User: what is the bitcoin price today\nAssistant: looked it up")
            .unwrap();

        let recalled = bank.recall("bitcoin price", 2);
        assert_eq!(recalled.len(), 2);
        assert!(recalled.iter().all(|r| r.contains("bitcoin")));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn records_survive_a_reopen() {
        let path = scratch_path("reopen");
        let _ = std::fs::remove_file(&path);
        {
            let mut bank = MemoryBank::open(path.clone()).unwrap();
            bank.add_log("the sky was green that day").unwrap();
            bank.add_log("the deploy finished at noon").unwrap();
        }
        let bank = MemoryBank::open(path.clone()).unwrap();
        assert_eq!(bank.len(), 2);
        let recalled = bank.recall("green sky", 1);
        assert_eq!(recalled.len(), 1);
        assert!(recalled[0].contains("green"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn truncated_tail_is_dropped_not_fatal() {
        let record = MemoryRecord {
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            text: "a complete record".to_string(),
        };
        let mut bytes = postcard::to_allocvec(&record).unwrap();
        let full_len = bytes.len();
        bytes.extend_from_slice(&postcard::to_allocvec(&record).unwrap()[..full_len / 2]);

        let decoded = decode_frames(&bytes);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].text, "a complete record");
    }

    #[test]
    fn short_noise_words_do_not_match() {
        let path = scratch_path("noise");
        let _ = std::fs::remove_file(&path);
        let mut bank = MemoryBank::open(path.clone()).unwrap();
        bank.add_log("it is an od to be").unwrap();
        assert!(bank.recall("it is to be", 3).is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
