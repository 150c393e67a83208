//! In-memory store

use std::sync::Arc;

use tokio::sync::watch;

use super::TimerStore;
use crate::{error::Result, state::TimerRecord};

/// Store that keeps the record in a watch channel. Clones share the record.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tx: Arc<watch::Sender<TimerRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_record(TimerRecord::new())
    }

    pub fn with_record(record: TimerRecord) -> Self {
        let (tx, _) = watch::channel(record);
        Self {
            tx: Arc::new(tx),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerStore for MemoryStore {
    fn get(&self) -> Result<TimerRecord> {
        Ok(*self.tx.borrow())
    }

    fn set(&self, record: &TimerRecord) -> Result<()> {
        self.tx.send_replace(*record);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<TimerRecord> {
        self.tx.subscribe()
    }
}
