//! 💾 Append-only JSONL audit trail
//!
//! One file per record kind under the audit directory (`batch.jsonl`,
//! `classification.jsonl`, `research.jsonl`). Every line is a JSON object
//! stamped with the capture time in epoch millis.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use entity_memory::ids::now_millis;
use log::{debug, info};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    Batch,
    Classification,
    Research,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::Batch => "batch",
            AuditKind::Classification => "classification",
            AuditKind::Research => "research",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.jsonl", self.as_str())
    }
}

pub struct AuditLogger {
    dir: PathBuf,
    write_lock: Mutex<u64>,
}

impl AuditLogger {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create audit directory {:?}", dir))?;
        info!("💾 Audit log directory: {:?}", dir);
        Ok(Self {
            dir,
            write_lock: Mutex::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: AuditKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Appends `{timestamp, ...payload}`. The payload must serialize to a
    /// JSON object.
    pub fn record<T: Serialize>(&self, kind: AuditKind, payload: &T) -> Result<()> {
        let Value::Object(fields) = serde_json::to_value(payload).context("Failed to encode audit payload")? else {
            bail!("{} audit payload must be a JSON object", kind.as_str());
        };

        let mut line = json!({ "timestamp": now_millis() });
        if let Value::Object(record) = &mut line {
            record.extend(fields);
        }

        let path = self.path_for(kind);
        let mut entries = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open audit log {:?}", path))?;
        writeln!(file, "{}", line).context("Failed to write audit entry")?;
        file.flush()?;
        *entries += 1;

        debug!("💾 {} audit entry written", kind.as_str());
        Ok(())
    }

    pub fn entries_logged(&self) -> u64 {
        *self.write_lock.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_appends_one_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::new(dir.path().join("nested/audit")).unwrap();

        logger
            .record(AuditKind::Batch, &json!({ "batchId": 1, "summaries": ["a"] }))
            .unwrap();
        logger
            .record(AuditKind::Batch, &json!({ "batchId": 2, "summaries": [] }))
            .unwrap();
        logger
            .record(AuditKind::Research, &json!({ "batchId": 2, "results": [], "audit": [] }))
            .unwrap();

        let batches = read_lines(&logger.path_for(AuditKind::Batch));
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0]["batchId"], 1);
        assert_eq!(batches[0]["summaries"], json!(["a"]));
        assert!(batches[1]["timestamp"].as_i64().unwrap() > 0);

        assert_eq!(read_lines(&logger.path_for(AuditKind::Research)).len(), 1);
        assert!(!logger.path_for(AuditKind::Classification).exists());
        assert_eq!(logger.entries_logged(), 3);
    }

    #[test]
    fn test_rejects_non_object_payload() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::new(dir.path()).unwrap();
        assert!(logger.record(AuditKind::Batch, &vec![1, 2]).is_err());
        assert_eq!(logger.entries_logged(), 0);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(AuditKind::Classification.file_name(), "classification.jsonl");
        assert_eq!(AuditKind::Research.as_str(), "research");
    }
}
