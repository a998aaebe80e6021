//! Inventory rules
//!
//! Anodes and general stock items share one view so stock levels, filters and
//! replenishment can treat them alike. Persistence lives in [`crate::db`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Which table an inventory row comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ItemType {
    Anode,
    Item,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Anode => "anode",
            ItemType::Item => "item",
        }
    }
}

/// Stock level classification used for badges and replenishment priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    Out,
    Critical,
    Low,
    Adequate,
    Excess,
}

/// Replenishment urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Larger is more urgent
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 3,
            Priority::High => 2,
            Priority::Medium => 1,
            Priority::Low => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Replenishment row lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ReplenishmentStatus {
    Pending,
    Ordered,
    Received,
    Cancelled,
}

impl ReplenishmentStatus {
    /// Pending and ordered rows block another automatic request for the item
    pub fn is_open(&self) -> bool {
        matches!(self, ReplenishmentStatus::Pending | ReplenishmentStatus::Ordered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplenishmentStatus::Pending => "pending",
            ReplenishmentStatus::Ordered => "ordered",
            ReplenishmentStatus::Received => "received",
            ReplenishmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReplenishmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReplenishmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ReplenishmentStatus::Pending),
            "ordered" => Ok(ReplenishmentStatus::Ordered),
            "received" => Ok(ReplenishmentStatus::Received),
            "cancelled" => Ok(ReplenishmentStatus::Cancelled),
            other => Err(Error::InvalidInput(format!(
                "Unknown replenishment status: {}",
                other
            ))),
        }
    }
}

/// Unified inventory row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub id: String,
    pub sku: Option<String>,
    pub name: String,
    pub category: String,
    pub on_hand: i64,
    pub allocated: i64,
    pub available: i64,
    pub min_stock: i64,
    pub reorder_point: i64,
    pub reorder_qty: i64,
    pub location: Option<String>,
    pub unit_cost: f64,
}

impl InventoryItem {
    pub fn stock_level(&self) -> StockLevel {
        stock_level(self.available, self.min_stock, self.reorder_point)
    }

    pub fn needs_reorder(&self) -> bool {
        self.available <= self.reorder_point
    }

    pub fn value(&self) -> f64 {
        self.on_hand as f64 * self.unit_cost
    }
}

/// Classify available stock against the item's thresholds
pub fn stock_level(available: i64, min_stock: i64, reorder_point: i64) -> StockLevel {
    if available <= 0 {
        StockLevel::Out
    } else if available < min_stock {
        StockLevel::Critical
    } else if available <= reorder_point {
        StockLevel::Low
    } else if available > reorder_point.saturating_mul(3) {
        StockLevel::Excess
    } else {
        StockLevel::Adequate
    }
}

/// Query filters for the inventory listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    pub category: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
    #[serde(default)]
    pub critical: bool,
    pub search: Option<String>,
}

impl InventoryFilter {
    pub fn matches(&self, item: &InventoryItem) -> bool {
        if let Some(category) = &self.category {
            if &item.category != category {
                return false;
            }
        }
        if self.low_stock && !item.needs_reorder() {
            return false;
        }
        if self.critical && item.available >= item.min_stock {
            return false;
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let in_name = item.name.to_lowercase().contains(&needle);
            let in_sku = item
                .sku
                .as_deref()
                .is_some_and(|sku| sku.to_lowercase().contains(&needle));
            if !in_name && !in_sku {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, items: Vec<InventoryItem>) -> Vec<InventoryItem> {
        items.into_iter().filter(|i| self.matches(i)).collect()
    }
}

/// Dashboard counters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_items: usize,
    pub critical_count: usize,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    pub total_value: f64,
}

pub fn stats(items: &[InventoryItem]) -> InventoryStats {
    InventoryStats {
        total_items: items.len(),
        critical_count: items.iter().filter(|i| i.available < i.min_stock).count(),
        low_stock_count: items.iter().filter(|i| i.needs_reorder()).count(),
        out_of_stock_count: items.iter().filter(|i| i.available <= 0).count(),
        total_value: items.iter().map(InventoryItem::value).sum(),
    }
}

/// Replenishment row waiting to be inserted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReplenishment {
    pub item_type: ItemType,
    pub item_id: String,
    pub quantity_needed: i64,
    pub priority: Priority,
    pub source: &'static str,
}

/// Priority for an automatically generated request, if one is needed at all
pub fn reorder_priority(level: StockLevel) -> Option<Priority> {
    match level {
        StockLevel::Out => Some(Priority::Critical),
        StockLevel::Critical => Some(Priority::High),
        StockLevel::Low => Some(Priority::Medium),
        StockLevel::Adequate | StockLevel::Excess => None,
    }
}

/// Derive replenishment requests from stock thresholds
///
/// `open` holds the items that already have a pending or ordered row.
pub fn derive_replenishment(
    items: &[InventoryItem],
    open: &HashSet<(ItemType, String)>,
) -> Vec<NewReplenishment> {
    items
        .iter()
        .filter(|i| i.needs_reorder())
        .filter(|i| !open.contains(&(i.item_type, i.id.clone())))
        .map(|i| NewReplenishment {
            item_type: i.item_type,
            item_id: i.id.clone(),
            quantity_needed: i.reorder_qty.max(1),
            priority: reorder_priority(i.stock_level()).unwrap_or(Priority::Medium),
            source: "auto",
        })
        .collect()
}

/// Sort most urgent first; ties keep their existing order
pub fn sort_by_priority<T>(rows: &mut [T], priority: impl Fn(&T) -> Priority) {
    rows.sort_by(|a, b| priority(b).rank().cmp(&priority(a).rank()));
}

/// Purchase order line as submitted
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLine {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub id: String,
    pub quantity: i64,
    pub unit_cost: f64,
    pub replenishment_id: Option<String>,
}

impl PurchaseOrderLine {
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.unit_cost
    }
}

pub fn purchase_order_total(lines: &[PurchaseOrderLine]) -> f64 {
    lines.iter().map(PurchaseOrderLine::line_total).sum()
}

/// Apply a signed stock movement; stock on hand never goes below zero
pub fn apply_stock_change(on_hand: i64, change: i64) -> Result<i64> {
    let next = on_hand.checked_add(change).ok_or_else(|| {
        Error::InvalidInput(format!(
            "Stock change of {} is out of range for {} on hand",
            change, on_hand
        ))
    })?;
    if next < 0 {
        return Err(Error::InvalidInput(format!(
            "Insufficient stock: {} on hand, change of {}",
            on_hand, change
        )));
    }
    Ok(next)
}

/// Summary line for a customer charge
pub fn charge_message(charged: usize, requested: usize, customer: &str) -> String {
    format!("Charged {} of {} items to {}", charged, requested, customer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, available: i64, min_stock: i64, reorder_point: i64) -> InventoryItem {
        InventoryItem {
            item_type: ItemType::Anode,
            id: id.to_string(),
            sku: Some(format!("SKU-{}", id)),
            name: format!("Shaft zinc {}", id),
            category: "Anodes".to_string(),
            on_hand: available,
            allocated: 0,
            available,
            min_stock,
            reorder_point,
            reorder_qty: 10,
            location: None,
            unit_cost: 12.5,
        }
    }

    #[test]
    fn test_stock_level_thresholds() {
        assert_eq!(stock_level(0, 2, 5), StockLevel::Out);
        assert_eq!(stock_level(1, 2, 5), StockLevel::Critical);
        assert_eq!(stock_level(5, 2, 5), StockLevel::Low);
        assert_eq!(stock_level(16, 2, 5), StockLevel::Excess);
        assert_eq!(stock_level(15, 2, 5), StockLevel::Adequate);
        assert_eq!(stock_level(i64::MAX, 2, i64::MAX / 2), StockLevel::Adequate);
    }

    #[test]
    fn test_filter_search_matches_name_or_sku() {
        let items = vec![item("a", 3, 2, 5), item("b", 30, 2, 5)];

        let f = InventoryFilter {
            search: Some("sku-B".into()),
            ..Default::default()
        };
        let found = f.apply(items.clone());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");

        let low = InventoryFilter {
            low_stock: true,
            ..Default::default()
        };
        assert_eq!(low.apply(items.clone()).len(), 1);

        let other = InventoryFilter {
            category: Some("General".into()),
            ..Default::default()
        };
        assert!(other.apply(items).is_empty());
    }

    #[test]
    fn test_stats() {
        let items = vec![item("a", 0, 2, 5), item("b", 1, 2, 5), item("c", 4, 2, 5), item("d", 20, 2, 5)];
        let s = stats(&items);
        assert_eq!(s.total_items, 4);
        assert_eq!(s.critical_count, 2);
        assert_eq!(s.low_stock_count, 3);
        assert_eq!(s.out_of_stock_count, 1);
        assert!((s.total_value - 25.0 * 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_derive_skips_open_rows() {
        let items = vec![item("a", 0, 2, 5), item("b", 1, 2, 5), item("c", 4, 2, 5), item("d", 20, 2, 5)];
        let mut open = HashSet::new();
        open.insert((ItemType::Anode, "b".to_string()));

        let rows = derive_replenishment(&items, &open);
        let ids: Vec<_> = rows.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(rows[0].priority, Priority::Critical);
        assert_eq!(rows[1].priority, Priority::Medium);
        assert_eq!(rows[0].quantity_needed, 10);
        assert_eq!(rows[0].source, "auto");
    }

    #[test]
    fn test_sort_by_priority() {
        let mut rows = vec![Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
        sort_by_priority(&mut rows, |p| *p);
        assert_eq!(
            rows,
            vec![Priority::Critical, Priority::High, Priority::Medium, Priority::Low]
        );
    }

    #[test]
    fn test_purchase_order_total() {
        let lines = vec![
            PurchaseOrderLine {
                item_type: ItemType::Anode,
                id: "a".into(),
                quantity: 4,
                unit_cost: 10.0,
                replenishment_id: None,
            },
            PurchaseOrderLine {
                item_type: ItemType::Item,
                id: "b".into(),
                quantity: 2,
                unit_cost: 7.5,
                replenishment_id: Some("r1".into()),
            },
        ];
        assert_eq!(purchase_order_total(&lines), 55.0);
    }

    #[test]
    fn test_stock_never_negative() {
        assert_eq!(apply_stock_change(5, -5).unwrap(), 0);
        assert_eq!(apply_stock_change(5, 3).unwrap(), 8);
        assert!(matches!(apply_stock_change(5, i64::MAX), Err(Error::InvalidInput(_))));
        assert!(matches!(apply_stock_change(-1, i64::MIN), Err(Error::InvalidInput(_))));
        assert!(apply_stock_change(2, -3).is_err());
    }

    #[test]
    fn test_charge_message() {
        assert_eq!(charge_message(2, 3, "Jane Doe"), "Charged 2 of 3 items to Jane Doe");
    }
}
