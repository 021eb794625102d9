//! Records the order in which threads get through a lock.

use std::sync::Mutex;

/// One entry of an [`AdmissionLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Reader with the given id got shared access
    Read(usize),
    /// Writer with the given id got exclusive access
    Write(usize),
}

impl Admission {
    /// True for [`Admission::Write`].
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write(_))
    }
}

/// Append-only, thread-safe admission order.
///
/// Threads record themselves right after acquiring the lock, while still
/// holding it, so the log order is the admission order for writers and for
/// any reader that was admitted after a writer released.
///
/// # Examples
///
/// ```
/// use foundation_testing::scenarios::{Admission, AdmissionLog};
///
/// let log = AdmissionLog::new();
/// log.record(Admission::Write(1));
/// log.record(Admission::Read(7));
/// log.record(Admission::Read(8));
/// log.record(Admission::Write(2));
///
/// assert_eq!(log.reader_runs(), vec![2]);
/// assert_eq!(log.leading_writes(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AdmissionLog {
    entries: Mutex<Vec<Admission>>,
}

impl AdmissionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `admission`. Call it while still holding the lock.
    pub fn record(&self, admission: Admission) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(admission),
            Err(poisoned) => poisoned.into_inner().push(admission),
        }
    }

    /// Copy of the log so far.
    #[must_use]
    pub fn entries(&self) -> Vec<Admission> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Writes admitted before the first read.
    #[must_use]
    pub fn leading_writes(&self) -> usize {
        self.entries().iter().take_while(|entry| entry.is_write()).count()
    }

    /// Lengths of the runs of reads that sit between two writes.
    ///
    /// Reads before the first write or after the last one are not counted.
    #[must_use]
    pub fn reader_runs(&self) -> Vec<usize> {
        let entries = self.entries();
        let Some(first) = entries.iter().position(Admission::is_write) else {
            return Vec::new();
        };

        let mut runs = Vec::new();
        let mut run = 0;
        for entry in &entries[first + 1..] {
            if entry.is_write() {
                runs.push(run);
                run = 0;
            } else {
                run += 1;
            }
        }
        runs
    }
}
