//! JSONL session recorder — append-only record of application attempts.
//!
//! One line per terminal attempt. The engine only emits; consumption,
//! analysis, and retention policy belong to the caller. Files rotate at
//! `MAX_LOG_SIZE` (100MB), keeping up to 5 rotations named `.1`, `.2`, etc.

use crate::machine::ApplicationAttempt;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Maximum record file size before rotation (100 MB).
const MAX_LOG_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum number of rotated files to keep.
const MAX_ROTATIONS: u32 = 5;

/// Append-only JSONL recorder with automatic rotation.
pub struct SessionRecorder {
    file: File,
    path: PathBuf,
    /// Approximate current size (may drift slightly; re-checked on rotation).
    current_size: u64,
}

impl SessionRecorder {
    /// Open or create the record file.
    pub fn open(path: &PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open attempt record: {}", path.display()))?;

        let current_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            file,
            path: path.clone(),
            current_size,
        })
    }

    /// Open the default record at ~/.applyflow/attempts.jsonl.
    pub fn default_recorder() -> Result<Self> {
        let path = crate::config::data_dir().join("attempts.jsonl");
        Self::open(&path)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Record one terminal attempt.
    pub fn record(&mut self, attempt: &ApplicationAttempt) -> Result<()> {
        if self.current_size >= MAX_LOG_SIZE {
            self.rotate()?;
        }

        let json = serde_json::to_string(attempt)?;
        writeln!(self.file, "{json}")
            .with_context(|| format!("failed to append attempt record: {}", self.path.display()))?;
        self.current_size += json.len() as u64 + 1;
        Ok(())
    }

    /// Rotate files: attempts.jsonl → attempts.jsonl.1, .1 → .2, etc.
    fn rotate(&mut self) -> Result<()> {
        self.file.flush()?;

        for i in (1..MAX_ROTATIONS).rev() {
            let from = rotation_path(&self.path, i);
            let to = rotation_path(&self.path, i + 1);
            if from.exists() {
                let _ = std::fs::rename(&from, &to);
            }
        }

        let first_rotation = rotation_path(&self.path, 1);
        let _ = std::fs::rename(&self.path, &first_rotation);

        let oldest = rotation_path(&self.path, MAX_ROTATIONS);
        if oldest.exists() {
            let _ = std::fs::remove_file(&oldest);
        }

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| "failed to reopen attempt record after rotation")?;
        self.current_size = 0;

        Ok(())
    }
}

/// Build path for a rotated file: `attempts.jsonl.1`, `attempts.jsonl.2`, etc.
fn rotation_path(base: &std::path::Path, index: u32) -> PathBuf {
    let name = format!(
        "{}.{index}",
        base.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attempts.jsonl")
    );
    base.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{ApplicationAttempt, Outcome};
    use crate::variants::SystemVariant;

    #[test]
    fn test_one_line_per_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attempts.jsonl");
        let mut recorder = SessionRecorder::open(&path).unwrap();

        let mut attempt = ApplicationAttempt::new("job-1");
        attempt.variant = SystemVariant::GenericForm;
        attempt.outcome = Some(Outcome::Submitted);
        recorder.record(&attempt).unwrap();

        let mut second = ApplicationAttempt::new("job-2");
        second.outcome = Some(Outcome::Aborted("validation failed".into()));
        recorder.record(&second).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["job_id"], "job-1");
        assert_eq!(parsed["outcome"]["status"], "submitted");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_write_failure_surfaces_as_error() {
        // /dev/full accepts the open but fails every write with ENOSPC.
        let path = PathBuf::from("/dev/full");
        let mut recorder = SessionRecorder::open(&path).unwrap();

        let mut attempt = ApplicationAttempt::new("job-1");
        attempt.outcome = Some(Outcome::Submitted);
        let err = recorder.record(&attempt).unwrap_err();
        assert!(err.to_string().contains("failed to append attempt record"));
    }
}
