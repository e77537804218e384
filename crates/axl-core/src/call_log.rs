//! Append-only record of every remote call a client made
//!
//! Kept for performance analysis and debugging. The dispatcher only ever
//! appends; nothing in the crate reads the log back.

use parking_lot::Mutex;
use serde::Serialize;

use crate::value::AxlValue;

/// One remote invocation
#[derive(Debug, Clone, Serialize)]
pub struct CallRecord {
    /// Remote procedure name, e.g. `listPhone`
    pub procedure: String,
    /// Wall-clock seconds spent in the transport
    pub elapsed: f64,
    pub request: AxlValue,
    /// Decoded reply, when the call succeeded
    pub reply: Option<AxlValue>,
    /// Transport error text, when it did not
    pub error: Option<String>,
}

/// Instance-scoped call log
#[derive(Debug, Default)]
pub struct CallLog {
    records: Mutex<Vec<CallRecord>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return the new length
    pub(crate) fn append(&self, record: CallRecord) -> usize {
        let mut records = self.records.lock();
        records.push(record);
        records.len()
    }

    /// Snapshot of all records so far
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Procedure names in call order
    pub fn procedures(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.procedure.clone()).collect()
    }

    /// Total seconds spent waiting on the transport
    pub fn total_elapsed(&self) -> f64 {
        self.records.lock().iter().map(|r| r.elapsed).sum()
    }
}
