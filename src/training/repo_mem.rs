//! In-memory metric store for single-process runs and tests.

use std::sync::Mutex;

use crate::common::error::{LifecycleError, LifecycleResult};

use super::domain::{MetricRecord, MetricStore};

#[derive(Debug, Default)]
pub struct InMemoryMetricStore {
    records: Mutex<Vec<MetricRecord>>,
}

impl MetricStore for InMemoryMetricStore {
    fn record(&self, record: MetricRecord) -> LifecycleResult<()> {
        self.records
            .lock()
            .map_err(|_| LifecycleError::poisoned("metric store"))?
            .push(record);
        Ok(())
    }

    fn get(&self, candidate_id: &str) -> LifecycleResult<Option<MetricRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| LifecycleError::poisoned("metric store"))?;
        Ok(records
            .iter()
            .rev()
            .find(|r| r.candidate_id == candidate_id)
            .cloned())
    }

    fn list(&self) -> LifecycleResult<Vec<MetricRecord>> {
        Ok(self
            .records
            .lock()
            .map_err(|_| LifecycleError::poisoned("metric store"))?
            .clone())
    }
}
