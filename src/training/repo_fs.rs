//! Filesystem-backed metric store: one JSON record per line, append-only.
//!
//! TODO: Keep a per-candidate offset index; `get` currently rescans the whole file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::common::config::AppCfg;
use crate::common::error::{LifecycleError, LifecycleResult};

use super::domain::{MetricRecord, MetricStore};

/// Metric log rooted at `cfg.data_root/metrics/<run>.jsonl`.
pub struct FsMetricStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FsMetricStore {
    pub fn new(cfg: &AppCfg, run: &str) -> Self {
        Self::at(
            PathBuf::from(&cfg.data_root)
                .join("metrics")
                .join(format!("{run}.jsonl")),
        )
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dirs(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(dir) => fs::create_dir_all(dir),
            None => Ok(()),
        }
    }
}

impl MetricStore for FsMetricStore {
    fn record(&self, record: MetricRecord) -> LifecycleResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| LifecycleError::poisoned("metric file"))?;
        self.ensure_dirs()?;
        let mut line = serde_json::to_vec(&record).map_err(io::Error::from)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }

    fn get(&self, candidate_id: &str) -> LifecycleResult<Option<MetricRecord>> {
        Ok(self
            .list()?
            .into_iter()
            .rev()
            .find(|r| r.candidate_id == candidate_id))
    }

    fn list(&self) -> LifecycleResult<Vec<MetricRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line).map_err(io::Error::from)?);
        }
        Ok(records)
    }
}
