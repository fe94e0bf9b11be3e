//! Current study package slot
//!
//! Generation requests can overlap: a student may submit a topic, change
//! their mind and upload a file before the first answer arrives. Every
//! request takes a ticket from a monotonically increasing counter and its
//! result is only stored if no newer request has begun since.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::warn;

use crate::ai::StudyPackage;

/// Sequence number handed out by `StudySession::begin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// A stored package together with the request sequence that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPackage {
    pub sequence: u64,
    pub package: StudyPackage,
}

fn acquire_read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned: PoisonError<RwLockReadGuard<'_, T>>| {
        warn!("Session lock was poisoned on read, recovering inner value");
        poisoned.into_inner()
    })
}

fn acquire_write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned: PoisonError<RwLockWriteGuard<'_, T>>| {
        warn!("Session lock was poisoned on write, recovering inner value");
        poisoned.into_inner()
    })
}

#[derive(Debug, Default)]
pub struct StudySession {
    latest: AtomicU64,
    slot: RwLock<Option<CurrentPackage>>,
}

impl StudySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a generation request; later tickets supersede earlier ones
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Store `package` unless a newer request has begun. Returns whether it was stored.
    pub fn commit(&self, ticket: Ticket, package: StudyPackage) -> bool {
        let mut slot = acquire_write_lock(&self.slot);
        // Checked under the write lock so a concurrent commit can't interleave
        if ticket.0 != self.latest.load(Ordering::SeqCst) {
            tracing::info!(
                ticket = ticket.0,
                latest = self.latest.load(Ordering::SeqCst),
                "Discarding stale study package"
            );
            return false;
        }
        *slot = Some(CurrentPackage {
            sequence: ticket.0,
            package,
        });
        true
    }

    pub fn current(&self) -> Option<CurrentPackage> {
        acquire_read_lock(&self.slot).clone()
    }

    /// Drop the stored package and invalidate every outstanding ticket
    pub fn clear(&self) {
        let mut slot = acquire_write_lock(&self.slot);
        self.latest.fetch_add(1, Ordering::SeqCst);
        *slot = None;
    }
}
