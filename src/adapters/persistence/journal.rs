//! Submission Journal - Append-only JSONL Submission Records
//!
//! Persists every submission attempt to daily JSONL files named
//! `submissions/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON
//! record, so failed batches can be grepped and retried by hand.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{instrument, warn};

use crate::ports::journal::{SubmissionJournal, SubmissionRecord};

/// Append-only JSONL journal with daily file rotation.
#[derive(Debug, Clone)]
pub struct JsonlJournal {
    dir: PathBuf,
}

impl JsonlJournal {
    /// Create the journal under `data_dir/submissions`.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir).join("submissions");
        fs::create_dir_all(&dir)
            .await
            .context("Failed to create submissions directory")?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SubmissionJournal for JsonlJournal {
    #[instrument(skip(self, record), fields(pool = %record.pool_name, batch = record.batch_index))]
    async fn append(&self, record: &SubmissionRecord) -> Result<()> {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let path = self.dir.join(format!("{date}.jsonl"));

        let mut json = serde_json::to_string(record).context("Failed to serialize submission record")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open submission journal")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write submission record")?;
        file.flush().await.context("Failed to flush submission journal")?;

        Ok(())
    }

    async fn load(&self) -> Result<Vec<SubmissionRecord>> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "jsonl") {
                files.push(path);
            }
        }
        files.sort();

        let mut records: Vec<SubmissionRecord> = Vec::new();
        for path in files {
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            for (line_no, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str(line) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(file = %path.display(), line = line_no + 1, error = %e, "Skipping corrupt journal line");
                    }
                }
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(batch_index: usize, success: bool) -> SubmissionRecord {
        SubmissionRecord {
            run_id: "run".to_string(),
            timestamp_ms: 1,
            pool_name: "SUI_USDC".to_string(),
            pool_id: "0x1".to_string(),
            batch_index,
            order_ids: vec!["340282366920938463463374607431768211455".to_string()],
            digest: success.then(|| "D".to_string()),
            success,
            error: (!success).then(|| "gas".to_string()),
            net_rebate_mist: None,
        }
    }

    #[tokio::test]
    async fn test_append_and_load() {
        let dir = std::env::temp_dir().join(format!("sweeper-journal-{}", uuid::Uuid::new_v4()));
        let journal = JsonlJournal::new(dir.to_str().unwrap()).await.unwrap();

        journal.append(&record(0, true)).await.unwrap();
        journal.append(&record(1, false)).await.unwrap();

        let loaded = journal.load().await.unwrap();
        assert_eq!(loaded, vec![record(0, true), record(1, false)]);

        let _ = std::fs::remove_dir_all(dir);
    }
}
