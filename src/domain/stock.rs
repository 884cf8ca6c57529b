//! Stock snapshots and cart/stock reconciliation.
//!
//! [`reconcile`] is the checkout gate's source of truth: it matches the
//! cart's lines against a point-in-time stock snapshot and flags lines that
//! are out of stock or ask for more than is available. The computation is
//! pure; calling it twice with the same inputs yields identical output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::aggregates::cart::CartLine;

/// Stock at or below this count is surfaced as "low stock" for display.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

pub fn is_low_stock(stock: u32) -> bool {
    stock > 0 && stock <= LOW_STOCK_THRESHOLD
}

/// Point-in-time product id -> current stock mapping.
///
/// A snapshot is replaced wholesale by each new fetch. There is no
/// field-by-field merge; a superseded snapshot is discarded entirely
/// (see [`StockSync`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockSnapshot {
    levels: BTreeMap<String, u32>,
}

impl StockSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, product_id: &str) -> Option<u32> {
        self.levels.get(product_id).copied()
    }

    pub fn insert(&mut self, product_id: impl Into<String>, stock: u32) {
        self.levels.insert(product_id.into(), stock);
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for StockSnapshot {
    fn from_iter<T: IntoIterator<Item = (K, u32)>>(iter: T) -> Self {
        Self { levels: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

/// Per-line verdict from [`reconcile`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    /// `None` when the snapshot does not cover the product: unknown is not
    /// an issue, it distinguishes "loading" from "confirmed problem".
    pub current_stock: Option<u32>,
    pub is_out_of_stock: bool,
    pub exceeds_stock: bool,
}

impl StockInfo {
    pub fn has_issue(&self) -> bool {
        self.is_out_of_stock || self.exceeds_stock
    }

    /// Display precedence: out-of-stock wins over exceeds-stock.
    pub fn issue(&self) -> Option<StockIssue> {
        if self.is_out_of_stock {
            Some(StockIssue::OutOfStock)
        } else if self.exceeds_stock {
            Some(StockIssue::ExceedsStock)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockIssue {
    OutOfStock,
    ExceedsStock,
}

/// Aggregate result of reconciling a cart against a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartStockReport {
    pub per_line: BTreeMap<String, StockInfo>,
    pub has_issues: bool,
}

impl CartStockReport {
    pub fn line(&self, product_id: &str) -> Option<&StockInfo> {
        self.per_line.get(product_id)
    }
}

/// Match cart lines against a stock snapshot.
///
/// - absent from snapshot: unknown, both flags false
/// - `is_out_of_stock`: snapshot present and zero
/// - `exceeds_stock`: stock positive and quantity above it
///
/// The two flags are mutually exclusive by construction.
pub fn reconcile(lines: &[CartLine], snapshot: &StockSnapshot) -> CartStockReport {
    let mut per_line = BTreeMap::new();
    let mut has_issues = false;
    for line in lines {
        let current_stock = snapshot.get(&line.product_id);
        let info = match current_stock {
            None => StockInfo::default(),
            Some(stock) => StockInfo {
                current_stock: Some(stock),
                is_out_of_stock: stock == 0,
                exceeds_stock: stock > 0 && line.quantity > stock,
            },
        };
        has_issues |= info.has_issue();
        per_line.insert(line.product_id.clone(), info);
    }
    CartStockReport { per_line, has_issues }
}

/// Fetch orchestration for a session's stock snapshot.
///
/// The cart owner refreshes the snapshot whenever cart contents change. If a
/// fetch is superseded before it resolves, its result must be discarded:
/// last-write-wins on the snapshot as a whole. `begin_fetch` hands out a
/// token and `complete` installs a snapshot only while its token is current.
#[derive(Clone, Debug, Default)]
pub struct StockSync {
    generation: u64,
    in_flight: bool,
    snapshot: Option<StockSnapshot>,
}

/// Claim ticket for one snapshot fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchToken(u64);

impl StockSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a fetch is outstanding. Callers must not treat
    /// absence-of-data as confirmed availability in this state.
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Latest fully installed snapshot, if any.
    pub fn snapshot(&self) -> Option<&StockSnapshot> {
        self.snapshot.as_ref()
    }

    /// Start a fetch, superseding any outstanding one.
    pub fn begin_fetch(&mut self) -> FetchToken {
        self.generation += 1;
        self.in_flight = true;
        FetchToken(self.generation)
    }

    /// Install the fetched snapshot. Returns `false` (and discards the
    /// snapshot) when a newer fetch has started since the token was issued.
    pub fn complete(&mut self, token: FetchToken, snapshot: StockSnapshot) -> bool {
        if token.0 != self.generation {
            return false;
        }
        self.snapshot = Some(snapshot);
        self.in_flight = false;
        true
    }

    /// Record a failed fetch so the session is no longer "loading"; the
    /// previous snapshot, if any, stays in place.
    pub fn fail(&mut self, token: FetchToken) {
        if token.0 == self.generation {
            self.in_flight = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Money;

    fn line(product_id: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: product_id.into(),
            name: product_id.into(),
            unit_price: Money::tzs(10_000),
            quantity,
            image: None,
        }
    }

    #[test]
    fn zero_stock_flags_out_of_stock() {
        let lines = vec![line("p1", 3)];
        let snapshot: StockSnapshot = [("p1", 0)].into_iter().collect();
        let report = reconcile(&lines, &snapshot);
        let info = report.line("p1").unwrap();
        assert!(info.is_out_of_stock);
        assert!(!info.exceeds_stock);
        assert!(report.has_issues);
        assert_eq!(info.issue(), Some(StockIssue::OutOfStock));
    }

    #[test]
    fn quantity_above_stock_flags_exceeds() {
        let lines = vec![line("p1", 5)];
        let snapshot: StockSnapshot = [("p1", 2)].into_iter().collect();
        let report = reconcile(&lines, &snapshot);
        let info = report.line("p1").unwrap();
        assert!(info.exceeds_stock);
        assert!(!info.is_out_of_stock);
        assert!(report.has_issues);
        assert_eq!(info.issue(), Some(StockIssue::ExceedsStock));
    }

    #[test]
    fn quantity_at_stock_is_fine() {
        let lines = vec![line("p1", 2)];
        let snapshot: StockSnapshot = [("p1", 2)].into_iter().collect();
        let report = reconcile(&lines, &snapshot);
        assert!(!report.has_issues);
        assert_eq!(report.line("p1").unwrap().issue(), None);
    }

    #[test]
    fn unknown_product_is_not_an_issue() {
        let lines = vec![line("p1", 4)];
        let snapshot = StockSnapshot::new();
        let report = reconcile(&lines, &snapshot);
        let info = report.line("p1").unwrap();
        assert_eq!(info.current_stock, None);
        assert!(!info.is_out_of_stock);
        assert!(!info.exceeds_stock);
        assert!(!report.has_issues);
    }

    #[test]
    fn has_issues_aggregates_across_lines() {
        let lines = vec![line("ok", 1), line("gone", 1)];
        let snapshot: StockSnapshot = [("ok", 9), ("gone", 0)].into_iter().collect();
        let report = reconcile(&lines, &snapshot);
        assert!(report.has_issues);
        assert!(!report.line("ok").unwrap().has_issue());
        assert!(report.line("gone").unwrap().has_issue());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let lines = vec![line("p1", 5), line("p2", 1), line("p3", 2)];
        let snapshot: StockSnapshot =
            [("p1", 2), ("p2", 0)].into_iter().collect();
        let first = reconcile(&lines, &snapshot);
        let second = reconcile(&lines, &snapshot);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_cart_has_no_issues() {
        let report = reconcile(&[], &[("p1", 0)].into_iter().collect());
        assert!(!report.has_issues);
        assert!(report.per_line.is_empty());
    }

    #[test]
    fn stale_fetch_result_is_discarded() {
        let mut sync = StockSync::new();
        let first = sync.begin_fetch();
        let second = sync.begin_fetch();

        let stale: StockSnapshot = [("p1", 1)].into_iter().collect();
        assert!(!sync.complete(first, stale));
        assert!(sync.snapshot().is_none());
        assert!(sync.is_loading());

        let fresh: StockSnapshot = [("p1", 7)].into_iter().collect();
        assert!(sync.complete(second, fresh.clone()));
        assert!(!sync.is_loading());
        assert_eq!(sync.snapshot(), Some(&fresh));
    }

    #[test]
    fn failed_fetch_clears_loading_but_keeps_last_snapshot() {
        let mut sync = StockSync::new();
        let token = sync.begin_fetch();
        let snapshot: StockSnapshot = [("p1", 3)].into_iter().collect();
        assert!(sync.complete(token, snapshot.clone()));

        let retry = sync.begin_fetch();
        assert!(sync.is_loading());
        sync.fail(retry);
        assert!(!sync.is_loading());
        assert_eq!(sync.snapshot(), Some(&snapshot));
    }

    #[test]
    fn low_stock_threshold() {
        assert!(!is_low_stock(0));
        assert!(is_low_stock(1));
        assert!(is_low_stock(LOW_STOCK_THRESHOLD));
        assert!(!is_low_stock(LOW_STOCK_THRESHOLD + 1));
    }
}
