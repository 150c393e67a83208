//! Shared timer store
//!
//! The store is the only state all contexts share. Writers always replace
//! the whole record, computed from one fresh read.

pub mod file;
pub mod memory;

use tokio::sync::watch;

use crate::{
    error::Result,
    state::{TimerCommand, TimerRecord, TimerState},
};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Narrow get/set/subscribe surface over the persisted record
pub trait TimerStore: Send + Sync {
    /// Read the current record; a store that was never written returns the defaults
    fn get(&self) -> Result<TimerRecord>;

    /// Replace the record
    fn set(&self, record: &TimerRecord) -> Result<()>;

    /// Observe writes made through this handle's process
    fn subscribe(&self) -> watch::Receiver<TimerRecord>;
}

/// Read the record, apply one command and write the complete result back.
/// Returns the state that was read and the state that was written.
pub fn transition(
    store: &dyn TimerStore,
    command: TimerCommand,
    now: i64,
) -> Result<(TimerState, TimerState)> {
    let current = store.get()?.state();
    let next = current.apply(command, now)?;
    store.set(&TimerRecord::from(next))?;
    Ok((current, next))
}
