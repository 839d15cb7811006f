//! Stock alert engine: classification of product snapshots into
//! notifications and the bounded, deduplicated notification log.
//!
//! - `evaluate` is a pure function of the snapshot and the cycle stamp.
//! - `NotificationLog` owns the entries and their read state.
//! - `center::AlertCenter` ties both together for one session.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::model::{Category, Notification, Product};

pub mod center;

pub use center::{AlertCenter, CycleReport, EMPTY_STATE};

/// Maximum number of entries retained in the log.
pub const LOG_CAPACITY: usize = 50;

/// Identifies one evaluation cycle. `seq` is strictly increasing across the
/// cycles of one `AlertCenter` and feeds the `system-*` id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStamp {
    pub at: DateTime<Utc>,
    pub seq: i64,
}

impl CycleStamp {
    pub fn from_time(at: DateTime<Utc>) -> Self {
        Self {
            at,
            seq: at.timestamp_millis(),
        }
    }
}

/// Classify every product and return this cycle's notifications in
/// derivation order, followed by one summary entry when anything fired.
pub fn evaluate(products: &[Product], stamp: &CycleStamp) -> Vec<Notification> {
    let mut out = Vec::new();

    for product in products {
        let stock = product.stock();
        let threshold = product.threshold();

        if stock == 0 {
            // Out of stock does not get a reorder companion.
            out.push(notify(
                stamp,
                format!("out-of-stock-{}", product.id),
                Category::CriticalStock,
                "Out of Stock Alert",
                format!("{} is completely out of stock!", product.name),
                Some(&product.id),
            ));
        } else if stock <= threshold {
            // stock <= threshold * 0.5; floor division cannot overflow
            if stock <= threshold.div_euclid(2) {
                out.push(notify(
                    stamp,
                    format!("critical-stock-{}", product.id),
                    Category::CriticalStock,
                    "Critical Stock Level",
                    format!(
                        "{} has only {} units left (critical level)",
                        product.name, stock
                    ),
                    Some(&product.id),
                ));
            } else {
                out.push(notify(
                    stamp,
                    format!("low-stock-{}", product.id),
                    Category::LowStock,
                    "Low Stock Warning",
                    format!(
                        "{} is running low ({} units remaining)",
                        product.name, stock
                    ),
                    Some(&product.id),
                ));
            }

            out.push(notify(
                stamp,
                format!("reorder-{}", product.id),
                Category::ReorderNeeded,
                "Reorder Recommended",
                format!(
                    "Consider reordering {} (Lead time: {} days)",
                    product.name, product.lead_time_days
                ),
                Some(&product.id),
            ));
        }
    }

    if !out.is_empty() {
        let found = out.len();
        out.push(notify(
            stamp,
            format!("system-{}", stamp.seq),
            Category::System,
            "Inventory Check Complete",
            format!("Found {} items requiring attention", found),
            None,
        ));
    }

    out
}

fn notify(
    stamp: &CycleStamp,
    id: String,
    category: Category,
    title: &str,
    message: String,
    product_id: Option<&str>,
) -> Notification {
    Notification {
        id,
        category,
        title: title.to_string(),
        message,
        created_at: stamp.at,
        read: false,
        product_id: product_id.map(str::to_string),
    }
}

/// Most-recent-first log of at most `LOG_CAPACITY` notifications with
/// unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend the entries of `batch` whose id is not yet known and truncate
    /// to capacity. Existing entries are never overwritten. Returns how many
    /// entries were added.
    pub fn merge(&mut self, batch: Vec<Notification>) -> usize {
        let mut seen: HashSet<String> = self.entries.iter().map(|n| n.id.clone()).collect();
        let mut fresh: Vec<Notification> = batch
            .into_iter()
            .filter(|n| seen.insert(n.id.clone()))
            .collect();
        let added = fresh.len();

        fresh.append(&mut self.entries);
        fresh.truncate(LOG_CAPACITY);
        self.entries = fresh;
        added
    }

    /// Mark one entry read. Returns true only if an unread entry flipped;
    /// unknown ids leave the log untouched.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.read => {
                n.read = true;
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.entries {
            n.read = true;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.entries.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp(seq: i64) -> CycleStamp {
        CycleStamp {
            at: Utc.timestamp_millis_opt(seq).unwrap(),
            seq,
        }
    }

    fn product(id: &str, stock: Option<i64>, threshold: Option<i64>) -> Product {
        Product {
            id: id.into(),
            name: format!("Item {id}"),
            category: None,
            current_stock: stock,
            reorder_threshold: threshold,
            lead_time_days: 4,
        }
    }

    fn ids(batch: &[Notification]) -> Vec<&str> {
        batch.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn missing_stock_counts_as_out_of_stock() {
        let batch = evaluate(&[product("a", None, Some(3))], &stamp(1));
        assert_eq!(ids(&batch), vec!["out-of-stock-a", "system-1"]);
    }

    #[test]
    fn missing_threshold_counts_as_zero() {
        let batch = evaluate(&[product("a", Some(1), None)], &stamp(1));
        assert!(batch.is_empty());
    }

    #[test]
    fn exactly_half_threshold_is_critical() {
        let batch = evaluate(&[product("a", Some(5), Some(10))], &stamp(1));
        assert_eq!(ids(&batch), vec!["critical-stock-a", "reorder-a", "system-1"]);
    }

    #[test]
    fn odd_threshold_half_rounds_toward_low() {
        // half of 7 is 3.5
        let critical = evaluate(&[product("a", Some(3), Some(7))], &stamp(1));
        assert_eq!(critical[0].category, Category::CriticalStock);
        let low = evaluate(&[product("a", Some(4), Some(7))], &stamp(1));
        assert_eq!(low[0].category, Category::LowStock);
    }

    #[test]
    fn huge_stock_values_do_not_overflow() {
        let big = i64::MAX - 1;
        let low = evaluate(&[product("a", Some(big), Some(i64::MAX))], &stamp(1));
        assert_eq!(low[0].category, Category::LowStock);
        let critical = evaluate(&[product("b", Some(big / 2), Some(i64::MAX))], &stamp(1));
        assert_eq!(critical[0].category, Category::CriticalStock);
    }

    #[test]
    fn stock_equal_to_threshold_is_low() {
        let batch = evaluate(&[product("a", Some(10), Some(10))], &stamp(1));
        assert_eq!(ids(&batch), vec!["low-stock-a", "reorder-a", "system-1"]);
    }

    #[test]
    fn system_summary_counts_product_entries() {
        let batch = evaluate(
            &[
                product("a", Some(0), Some(5)),
                product("b", Some(2), Some(5)),
                product("c", Some(50), Some(5)),
            ],
            &stamp(9),
        );
        assert_eq!(
            ids(&batch),
            vec!["out-of-stock-a", "critical-stock-b", "reorder-b", "system-9"]
        );
        let system = batch.last().unwrap();
        assert_eq!(system.message, "Found 3 items requiring attention");
        assert!(system.product_id.is_none());
    }

    #[test]
    fn messages_carry_product_details() {
        let batch = evaluate(&[product("a", Some(4), Some(5))], &stamp(1));
        assert_eq!(batch[0].title, "Low Stock Warning");
        assert_eq!(batch[0].message, "Item a is running low (4 units remaining)");
        assert_eq!(
            batch[1].message,
            "Consider reordering Item a (Lead time: 4 days)"
        );
        assert_eq!(batch[1].product_id.as_deref(), Some("a"));
    }

    #[test]
    fn merge_prepends_and_drops_known_ids() {
        let mut log = NotificationLog::new();
        let first = evaluate(&[product("a", Some(4), Some(10))], &stamp(1));
        assert_eq!(log.merge(first), 3);

        log.mark_read("critical-stock-a");
        let second = evaluate(&[product("a", Some(4), Some(10))], &stamp(2));
        assert_eq!(log.merge(second), 1);

        assert_eq!(
            ids(log.entries()),
            vec!["system-2", "critical-stock-a", "reorder-a", "system-1"]
        );
        // the read entry is not resurrected as unread
        assert!(log.get("critical-stock-a").unwrap().read);
    }

    #[test]
    fn merge_drops_duplicates_within_a_batch() {
        let mut log = NotificationLog::new();
        let batch = evaluate(
            &[product("a", Some(0), Some(5)), product("a", Some(0), Some(5))],
            &stamp(1),
        );
        assert_eq!(log.merge(batch), 2);
        assert_eq!(ids(log.entries()), vec!["out-of-stock-a", "system-1"]);
    }

    #[test]
    fn merge_truncates_to_capacity_keeping_newest() {
        let mut log = NotificationLog::new();
        for seq in 0..40 {
            log.merge(evaluate(
                &[product(&format!("p{seq}"), Some(0), Some(1))],
                &stamp(seq),
            ));
        }
        assert_eq!(log.len(), LOG_CAPACITY);
        assert_eq!(log.entries()[0].id, "system-39");
        assert_eq!(log.entries()[1].id, "out-of-stock-p39");
        assert_eq!(log.entries()[49].id, "out-of-stock-p15");
    }

    #[test]
    fn mark_read_unknown_id_is_noop() {
        let mut log = NotificationLog::new();
        log.merge(evaluate(&[product("a", Some(1), Some(5))], &stamp(1)));
        let before = log.clone();
        assert!(!log.mark_read("nope"));
        assert_eq!(log, before);
    }

    #[test]
    fn mark_read_is_one_way() {
        let mut log = NotificationLog::new();
        log.merge(evaluate(&[product("a", Some(1), Some(5))], &stamp(1)));
        assert!(log.mark_read("reorder-a"));
        assert!(!log.mark_read("reorder-a"));
        assert_eq!(log.unread_count(), 2);
        log.mark_all_read();
        assert_eq!(log.unread_count(), 0);
        assert!(log.entries().iter().all(|n| n.read));
    }
}
