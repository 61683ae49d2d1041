//! Categorized diagnostic log book.
//!
//! Entities, components and states report what they do through a
//! [`Logbook`] that is handed to them at construction time instead of being
//! looked up globally. Every record is kept in a bounded ring buffer (so
//! tests and tools can inspect what happened) and is mirrored to `tracing`
//! under the target `kraken::<category>`.
//!
//! The handle is cheap to clone; all clones share the same storage. It uses
//! `Rc<RefCell<..>>` and is therefore `!Send`: the whole core assumes a single
//! update loop driving every entity in turn.
//!
//! # Example
//!
//! ```
//! use kraken_ecs::log::{LogCategory, Logbook};
//!
//! let log = Logbook::new();
//! log.warn("agent missing");
//! log.state("\"hero\" nil → idle");
//!
//! assert_eq!(log.len(), 2);
//! assert_eq!(log.count(LogCategory::Warnings), 1);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Default number of records retained before the oldest are dropped.
pub const DEFAULT_LOG_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// LogCategory
// ---------------------------------------------------------------------------

/// Which stream a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    /// Framework-level lifecycle notes (spawn, despawn, frame changes).
    Framework,
    /// Recoverable problems: missing dependencies, unconfigured hooks.
    Warnings,
    /// Problems that indicate a bug in the calling code.
    Errors,
    /// State machine transitions.
    States,
    /// Verbose tracing of component traffic.
    Debug,
}

impl LogCategory {
    /// Short lowercase name, used as the `tracing` target suffix.
    pub fn as_str(self) -> &'static str {
        match self {
            LogCategory::Framework => "framework",
            LogCategory::Warnings => "warnings",
            LogCategory::Errors => "errors",
            LogCategory::States => "states",
            LogCategory::Debug => "debug",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LogRecord
// ---------------------------------------------------------------------------

/// A single log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Monotonic sequence number across all categories.
    pub sequence: u64,
    /// Frame number current when the record was added.
    pub frame: u64,
    /// Stream the record belongs to.
    pub category: LogCategory,
    /// Human-readable text.
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>6} F{:<5} [{}] {}",
            self.sequence, self.frame, self.category, self.message
        )
    }
}

// ---------------------------------------------------------------------------
// Logbook
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct LogbookInner {
    records: VecDeque<LogRecord>,
    capacity: usize,
    next_sequence: u64,
    frame: u64,
}

/// Shared handle to a bounded, categorized record store.
#[derive(Debug, Clone)]
pub struct Logbook {
    inner: Rc<RefCell<LogbookInner>>,
}

impl Logbook {
    /// Create a log book holding up to [`DEFAULT_LOG_CAPACITY`] records.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Create a log book holding up to `capacity` records. A capacity of
    /// zero keeps nothing but still forwards every record to `tracing`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LogbookInner {
                records: VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY)),
                capacity,
                next_sequence: 0,
                frame: 0,
            })),
        }
    }

    /// Append a record and mirror it to `tracing`.
    pub fn add(&self, category: LogCategory, message: impl Into<String>) {
        let message = message.into();
        emit_tracing(category, &message);

        let mut inner = self.inner.borrow_mut();
        let record = LogRecord {
            sequence: inner.next_sequence,
            frame: inner.frame,
            category,
            message,
        };
        inner.next_sequence += 1;
        if inner.capacity == 0 {
            return;
        }
        if inner.records.len() == inner.capacity {
            inner.records.pop_front();
        }
        inner.records.push_back(record);
    }

    pub fn framework(&self, message: impl Into<String>) {
        self.add(LogCategory::Framework, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.add(LogCategory::Warnings, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.add(LogCategory::Errors, message);
    }

    pub fn state(&self, message: impl Into<String>) {
        self.add(LogCategory::States, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.add(LogCategory::Debug, message);
    }

    /// Stamp subsequent records with `frame`.
    pub fn set_frame(&self, frame: u64) {
        self.inner.borrow_mut().frame = frame;
    }

    /// The frame number new records are stamped with.
    pub fn frame(&self) -> u64 {
        self.inner.borrow().frame
    }

    /// Snapshot of all retained records, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.inner.borrow().records.iter().cloned().collect()
    }

    /// Snapshot of retained records in one category, oldest first.
    pub fn records_in(&self, category: LogCategory) -> Vec<LogRecord> {
        self.inner
            .borrow()
            .records
            .iter()
            .filter(|r| r.category == category)
            .cloned()
            .collect()
    }

    /// Messages of retained records in one category, oldest first.
    pub fn messages_in(&self, category: LogCategory) -> Vec<String> {
        self.inner
            .borrow()
            .records
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Number of retained records in one category.
    pub fn count(&self, category: LogCategory) -> usize {
        self.inner
            .borrow()
            .records
            .iter()
            .filter(|r| r.category == category)
            .count()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.inner.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().records.is_empty()
    }

    /// Drop all retained records. Sequence numbering continues.
    pub fn clear(&self) {
        self.inner.borrow_mut().records.clear();
    }

    /// Serialize the retained records as a JSON array for external sinks.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        let inner = self.inner.borrow();
        serde_json::to_string(&inner.records)
    }
}

impl Default for Logbook {
    fn default() -> Self {
        Self::new()
    }
}

fn emit_tracing(category: LogCategory, message: &str) {
    match category {
        LogCategory::Framework => tracing::info!(target: "kraken::framework", "{message}"),
        LogCategory::Warnings => tracing::warn!(target: "kraken::warnings", "{message}"),
        LogCategory::Errors => tracing::error!(target: "kraken::errors", "{message}"),
        LogCategory::States => tracing::info!(target: "kraken::states", "{message}"),
        LogCategory::Debug => tracing::debug!(target: "kraken::debug", "{message}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
