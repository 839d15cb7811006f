//! Per-session holder of the notification log.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{evaluate, CycleStamp, NotificationLog};
use crate::model::Product;

/// Shown in place of the list when the log is empty.
pub const EMPTY_STATE: &str =
    "All Good! No notifications at this time. Your inventory is looking healthy.";

/// Outcome of one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub stamp: CycleStamp,
    /// Notifications derived from the snapshot, before deduplication.
    pub produced: usize,
    /// Entries actually added to the log.
    pub added: usize,
    /// Badge value published by this cycle.
    pub unread: usize,
}

/// Engine state for one session: the log, the unread badge and the cycle
/// clock.
///
/// The badge is refreshed from the log as it was *before* the cycle's batch
/// was merged, so it trails the log by one cycle. `NotificationLog::unread_count`
/// is always exact.
#[derive(Debug, Default)]
pub struct AlertCenter {
    log: NotificationLog,
    unread: usize,
    last_seq: Option<i64>,
}

impl AlertCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp for a cycle starting at `now`; `seq` never repeats even when the
    /// clock does not advance between cycles.
    pub fn next_stamp(&mut self, now: DateTime<Utc>) -> CycleStamp {
        let mut stamp = CycleStamp::from_time(now);
        if let Some(last) = self.last_seq {
            if stamp.seq <= last {
                stamp.seq = last + 1;
            }
        }
        self.last_seq = Some(stamp.seq);
        stamp
    }

    /// Evaluate a snapshot and fold the result into the log.
    pub fn observe(&mut self, products: &[Product], now: DateTime<Utc>) -> CycleReport {
        let stamp = self.next_stamp(now);
        let batch = evaluate(products, &stamp);
        let produced = batch.len();

        let unread = self.log.unread_count();
        let added = self.log.merge(batch);
        self.unread = unread;

        debug!(seq = stamp.seq, produced, added, unread, "cycle folded into log");
        CycleReport {
            stamp,
            produced,
            added,
            unread,
        }
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        let flipped = self.log.mark_read(id);
        if flipped {
            self.unread = self.unread.saturating_sub(1);
        }
        flipped
    }

    pub fn mark_all_read(&mut self) {
        self.log.mark_all_read();
        self.unread = 0;
    }

    pub fn unread_badge(&self) -> usize {
        self.unread
    }

    /// Badge text, hidden when nothing is unread.
    pub fn badge_label(&self) -> Option<String> {
        match self.unread {
            0 => None,
            n if n > 99 => Some("99+".to_string()),
            n => Some(n.to_string()),
        }
    }

    pub fn log(&self) -> &NotificationLog {
        &self.log
    }
}
