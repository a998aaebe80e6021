//! Inventory persistence: stock, movements, replenishment and purchase orders

use super::models::{InventoryTransaction, PurchaseOrder, ReplenishmentRow, Supplier};
use crate::inventory::{
    apply_stock_change, derive_replenishment, sort_by_priority, InventoryFilter, InventoryItem, ItemType,
    Priority, PurchaseOrderLine, ReplenishmentStatus,
};
use crate::time::{epoch_millis, now_string};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Anodes with stock rows plus active general items, in one shape
const ITEMS_QUERY: &str = r#"
    SELECT * FROM (
        SELECT
            'anode' AS item_type,
            c.id AS id,
            COALESCE(c.sku, c.boatzincs_id) AS sku,
            c.name AS name,
            'Anodes' AS category,
            ai.quantity_on_hand AS on_hand,
            ai.quantity_allocated AS allocated,
            ai.quantity_on_hand - ai.quantity_allocated AS available,
            ai.reorder_point AS min_stock,
            ai.reorder_point AS reorder_point,
            ai.reorder_quantity AS reorder_qty,
            ai.primary_location AS location,
            CAST(COALESCE(c.list_price, ai.average_cost, 0) AS REAL) AS unit_cost
        FROM anode_inventory ai
        JOIN anodes_catalog c ON c.id = ai.anode_id
        UNION ALL
        SELECT
            'item',
            i.id,
            i.sku,
            i.name,
            COALESCE(ic.name, 'General'),
            i.quantity_on_hand,
            i.quantity_allocated,
            i.quantity_on_hand - i.quantity_allocated,
            i.minimum_stock_level,
            i.reorder_point,
            i.reorder_quantity,
            i.primary_location,
            CAST(COALESCE(i.unit_cost, 0) AS REAL)
        FROM inventory_items i
        LEFT JOIN item_categories ic ON ic.id = i.category_id
        WHERE i.is_active = 1
    )
"#;

const REPLENISHMENT_QUERY: &str = r#"
    SELECT
        r.*,
        COALESCE(c.name, i.name) AS item_name,
        COALESCE(c.sku, c.boatzincs_id, i.sku) AS item_sku,
        COALESCE(c.list_price, i.unit_cost) AS unit_cost
    FROM replenishment_list r
    LEFT JOIN anodes_catalog c ON c.id = r.anode_id
    LEFT JOIN inventory_items i ON i.id = r.item_id
"#;

/// Catalog entry for an anode product
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAnode {
    pub sku: Option<String>,
    pub boatzincs_id: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub list_price: Option<f64>,
}

/// Stock item as submitted by the inventory screen
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub anode_id: Option<String>,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub initial_quantity: Option<i64>,
    pub unit_cost: Option<f64>,
    pub min_stock: Option<i64>,
    pub reorder_point: Option<i64>,
    pub reorder_qty: Option<i64>,
    pub location: Option<String>,
    pub bin_number: Option<String>,
    pub notes: Option<String>,
}

/// Signed stock movement
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStockMovement {
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub item_type: ItemType,
    pub item_id: String,
    pub quantity: i64,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub performed_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeItem {
    pub anode_id: String,
    pub quantity: i64,
}

/// Anodes used on a customer's boat
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub customer: String,
    pub items: Vec<ChargeItem>,
    #[serde(default)]
    pub add_to_replenishment: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResult {
    pub anode_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplenishmentRequest {
    pub item_type: ItemType,
    pub item_id: String,
    pub quantity: i64,
    pub priority: Option<Priority>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplenishmentUpdate {
    pub quantity_to_order: Option<i64>,
    pub priority: Option<Priority>,
    pub status: Option<ReplenishmentStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchaseOrder {
    pub supplier_id: Option<String>,
    pub items: Vec<PurchaseOrderLine>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderCreated {
    pub po_id: String,
    pub po_number: String,
    pub item_count: usize,
}

/// Stock after a recorded movement
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub transaction: InventoryTransaction,
    pub on_hand: i64,
}

pub async fn insert_catalog_anode(pool: &SqlitePool, anode: &CatalogAnode) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO anodes_catalog (id, sku, boatzincs_id, name, category, list_price)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&anode.sku)
    .bind(&anode.boatzincs_id)
    .bind(&anode.name)
    .bind(&anode.category)
    .bind(anode.list_price)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn list_items(pool: &SqlitePool, filter: &InventoryFilter) -> Result<Vec<InventoryItem>> {
    let items = sqlx::query_as::<_, InventoryItem>(&format!("{} ORDER BY name", ITEMS_QUERY))
        .fetch_all(pool)
        .await?;
    Ok(filter.apply(items))
}

pub async fn get_item(pool: &SqlitePool, item_type: ItemType, id: &str) -> Result<InventoryItem> {
    sqlx::query_as::<_, InventoryItem>(&format!("{} WHERE item_type = ? AND id = ?", ITEMS_QUERY))
        .bind(item_type.as_str())
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Inventory {} {} not found", item_type.as_str(), id)))
}

/// Stock an anode from the catalog (upsert) or create a general item
///
/// Returns the id the new row is listed under.
pub async fn add_item(pool: &SqlitePool, item: &NewInventoryItem) -> Result<String> {
    let quantity = item.initial_quantity.unwrap_or(0);
    if quantity < 0 {
        return Err(Error::InvalidInput("initialQuantity must not be negative".into()));
    }

    match item.item_type {
        ItemType::Anode => {
            let anode_id = item
                .anode_id
                .as_deref()
                .ok_or_else(|| Error::InvalidInput("anodeId is required".into()))?;

            let exists: Option<String> = sqlx::query_scalar("SELECT id FROM anodes_catalog WHERE id = ?")
                .bind(anode_id)
                .fetch_optional(pool)
                .await?;
            if exists.is_none() {
                return Err(Error::NotFound(format!("Anode {} not in catalog", anode_id)));
            }

            sqlx::query(
                r#"
                INSERT INTO anode_inventory (
                    anode_id, quantity_on_hand, reorder_point, reorder_quantity,
                    primary_location, bin_number, average_cost
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(anode_id) DO UPDATE SET
                    quantity_on_hand = excluded.quantity_on_hand,
                    reorder_point = excluded.reorder_point,
                    reorder_quantity = excluded.reorder_quantity,
                    primary_location = excluded.primary_location,
                    bin_number = excluded.bin_number,
                    average_cost = excluded.average_cost
                "#,
            )
            .bind(anode_id)
            .bind(quantity)
            .bind(item.reorder_point.unwrap_or(5))
            .bind(item.reorder_qty.unwrap_or(10))
            .bind(&item.location)
            .bind(&item.bin_number)
            .bind(item.unit_cost)
            .execute(pool)
            .await?;

            info!(anode_id, quantity, "Anode stocked");
            Ok(anode_id.to_string())
        }
        ItemType::Item => {
            let name = item
                .name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .ok_or_else(|| Error::InvalidInput("name is required".into()))?;

            let id = Uuid::new_v4().to_string();
            let result = sqlx::query(
                r#"
                INSERT INTO inventory_items (
                    id, sku, name, category_id, description, quantity_on_hand, unit_cost,
                    minimum_stock_level, reorder_point, reorder_quantity,
                    primary_location, bin_number, notes, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&item.sku)
            .bind(name)
            .bind(&item.category_id)
            .bind(&item.description)
            .bind(quantity)
            .bind(item.unit_cost)
            .bind(item.min_stock.unwrap_or(0))
            .bind(item.reorder_point.unwrap_or(5))
            .bind(item.reorder_qty.unwrap_or(10))
            .bind(&item.location)
            .bind(&item.bin_number)
            .bind(&item.notes)
            .bind(now_string())
            .execute(pool)
            .await;

            match result {
                Ok(_) => {}
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    return Err(Error::Conflict(format!(
                        "SKU {} already exists",
                        item.sku.as_deref().unwrap_or_default()
                    )));
                }
                Err(e) => return Err(e.into()),
            }

            info!(item_id = %id, name, "Inventory item created");
            Ok(id)
        }
    }
}

async fn on_hand_in_tx(tx: &mut Transaction<'_, Sqlite>, item_type: ItemType, id: &str) -> Result<i64> {
    let sql = match item_type {
        ItemType::Anode => "SELECT quantity_on_hand FROM anode_inventory WHERE anode_id = ?",
        ItemType::Item => "SELECT quantity_on_hand FROM inventory_items WHERE id = ?",
    };
    let on_hand: Option<i64> = sqlx::query_scalar(sql).bind(id).fetch_optional(&mut **tx).await?;
    on_hand.ok_or_else(|| Error::NotFound(format!("Inventory {} {} not found", item_type.as_str(), id)))
}

/// Record a movement and adjust stock in one transaction
///
/// A movement that would take stock below zero is rejected and nothing is
/// written.
pub async fn record_movement(pool: &SqlitePool, movement: &NewStockMovement) -> Result<StockMovement> {
    if movement.transaction_type.trim().is_empty() {
        return Err(Error::InvalidInput("type is required".into()));
    }

    let mut tx = pool.begin().await?;

    let current = on_hand_in_tx(&mut tx, movement.item_type, &movement.item_id).await?;
    let on_hand = apply_stock_change(current, movement.quantity)?;

    let (anode_id, item_id) = match movement.item_type {
        ItemType::Anode => (Some(movement.item_id.as_str()), None),
        ItemType::Item => (None, Some(movement.item_id.as_str())),
    };

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO inventory_transactions (
            id, transaction_type, anode_id, item_id, quantity,
            reference_type, reference_id, notes, performed_by, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&movement.transaction_type)
    .bind(anode_id)
    .bind(item_id)
    .bind(movement.quantity)
    .bind(&movement.transaction_type)
    .bind(&movement.reference)
    .bind(&movement.notes)
    .bind(movement.performed_by.as_deref().unwrap_or("api_user"))
    .bind(now_string())
    .execute(&mut *tx)
    .await?;

    let update = match movement.item_type {
        ItemType::Anode => "UPDATE anode_inventory SET quantity_on_hand = ? WHERE anode_id = ?",
        ItemType::Item => "UPDATE inventory_items SET quantity_on_hand = ? WHERE id = ?",
    };
    sqlx::query(update)
        .bind(on_hand)
        .bind(&movement.item_id)
        .execute(&mut *tx)
        .await?;

    let transaction = sqlx::query_as::<_, InventoryTransaction>("SELECT * FROM inventory_transactions WHERE id = ?")
        .bind(&id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        item_type = movement.item_type.as_str(),
        item_id = %movement.item_id,
        change = movement.quantity,
        on_hand,
        "Stock movement recorded"
    );
    Ok(StockMovement { transaction, on_hand })
}

/// Take anodes out of stock for a customer
///
/// Items are processed independently; one failure does not undo the others.
pub async fn charge_customer(
    pool: &SqlitePool,
    request: &ChargeRequest,
    performed_by: &str,
) -> Result<Vec<ChargeResult>> {
    if request.customer.trim().is_empty() {
        return Err(Error::InvalidInput("customer is required".into()));
    }

    let mut results = Vec::with_capacity(request.items.len());
    for line in &request.items {
        let outcome = charge_line(pool, request, line, performed_by).await;
        match outcome {
            Ok(()) => results.push(ChargeResult {
                anode_id: line.anode_id.clone(),
                success: true,
                error: None,
            }),
            Err(e) => {
                warn!(anode_id = %line.anode_id, error = %e, "Charge failed");
                results.push(ChargeResult {
                    anode_id: line.anode_id.clone(),
                    success: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }
    Ok(results)
}

async fn charge_line(pool: &SqlitePool, request: &ChargeRequest, line: &ChargeItem, performed_by: &str) -> Result<()> {
    if line.quantity <= 0 {
        return Err(Error::InvalidInput("quantity must be positive".into()));
    }

    record_movement(
        pool,
        &NewStockMovement {
            transaction_type: "customer_charge".to_string(),
            item_type: ItemType::Anode,
            item_id: line.anode_id.clone(),
            quantity: -line.quantity,
            reference: Some(request.customer.clone()),
            notes: request.notes.clone(),
            performed_by: Some(performed_by.to_string()),
        },
    )
    .await?;

    if request.add_to_replenishment {
        let item = get_item(pool, ItemType::Anode, &line.anode_id).await?;
        let open = open_replenishment_keys(pool).await?;
        for req in derive_replenishment(std::slice::from_ref(&item), &open) {
            insert_replenishment(
                pool,
                req.item_type,
                &req.item_id,
                req.quantity_needed,
                req.priority,
                "customer_charge",
                performed_by,
                None,
            )
            .await?;
        }
    }
    Ok(())
}

async fn open_replenishment_keys(pool: &SqlitePool) -> Result<HashSet<(ItemType, String)>> {
    let rows: Vec<(Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT anode_id, item_id FROM replenishment_list WHERE status IN ('pending', 'ordered')",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(anode, item)| match (anode, item) {
            (Some(a), _) => Some((ItemType::Anode, a)),
            (None, Some(i)) => Some((ItemType::Item, i)),
            (None, None) => None,
        })
        .collect())
}

#[allow(clippy::too_many_arguments)]
async fn insert_replenishment(
    pool: &SqlitePool,
    item_type: ItemType,
    item_id: &str,
    quantity: i64,
    priority: Priority,
    source: &str,
    requested_by: &str,
    notes: Option<&str>,
) -> Result<String> {
    let (anode_id, plain_id) = match item_type {
        ItemType::Anode => (Some(item_id), None),
        ItemType::Item => (None, Some(item_id)),
    };
    let id = Uuid::new_v4().to_string();
    let now = now_string();
    sqlx::query(
        r#"
        INSERT INTO replenishment_list (
            id, anode_id, item_id, quantity_needed, priority, status, source,
            requested_by, notes, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(anode_id)
    .bind(plain_id)
    .bind(quantity)
    .bind(priority.as_str())
    .bind(source)
    .bind(requested_by)
    .bind(notes)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    info!(replenishment_id = %id, item_id, quantity, priority = priority.as_str(), source, "Replenishment queued");
    Ok(id)
}

/// Rows in one status, most urgent first
pub async fn list_replenishment(pool: &SqlitePool, status: ReplenishmentStatus) -> Result<Vec<ReplenishmentRow>> {
    let rows = sqlx::query_as::<_, ReplenishmentRow>(&format!(
        r#"{} WHERE r.status = ?
        ORDER BY CASE r.priority
            WHEN 'critical' THEN 0 WHEN 'high' THEN 1 WHEN 'medium' THEN 2 ELSE 3
        END, r.created_at"#,
        REPLENISHMENT_QUERY
    ))
    .bind(status.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_replenishment(pool: &SqlitePool, id: &str) -> Result<ReplenishmentRow> {
    sqlx::query_as::<_, ReplenishmentRow>(&format!("{} WHERE r.id = ?", REPLENISHMENT_QUERY))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Replenishment {} not found", id)))
}

/// Manual request from staff
pub async fn add_replenishment(
    pool: &SqlitePool,
    request: &ReplenishmentRequest,
    requested_by: &str,
) -> Result<ReplenishmentRow> {
    if request.quantity <= 0 {
        return Err(Error::InvalidInput("quantity must be positive".into()));
    }
    get_item(pool, request.item_type, &request.item_id).await?;

    let id = insert_replenishment(
        pool,
        request.item_type,
        &request.item_id,
        request.quantity,
        request.priority.unwrap_or(Priority::Medium),
        "manual",
        requested_by,
        request.notes.as_deref(),
    )
    .await?;
    get_replenishment(pool, &id).await
}

pub async fn update_replenishment(
    pool: &SqlitePool,
    id: &str,
    update: &ReplenishmentUpdate,
) -> Result<ReplenishmentRow> {
    if update.quantity_to_order.is_none() && update.priority.is_none() && update.status.is_none() {
        return Err(Error::InvalidInput("No valid update fields provided".into()));
    }
    if matches!(update.quantity_to_order, Some(q) if q < 0) {
        return Err(Error::InvalidInput("quantityToOrder must not be negative".into()));
    }

    let result = sqlx::query(
        r#"
        UPDATE replenishment_list SET
            quantity_to_order = COALESCE(?, quantity_to_order),
            priority = COALESCE(?, priority),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(update.quantity_to_order)
    .bind(update.priority.map(|p| p.as_str()))
    .bind(update.status.map(|s| s.as_str()))
    .bind(now_string())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Replenishment {} not found", id)));
    }
    get_replenishment(pool, id).await
}

/// Soft delete
pub async fn cancel_replenishment(pool: &SqlitePool, id: &str) -> Result<()> {
    update_replenishment(
        pool,
        id,
        &ReplenishmentUpdate {
            status: Some(ReplenishmentStatus::Cancelled),
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}

/// Queue every item at or below its reorder point that has no open request
///
/// Returns the new rows, most urgent first.
pub async fn generate_replenishment(pool: &SqlitePool) -> Result<Vec<ReplenishmentRow>> {
    let items = list_items(pool, &InventoryFilter::default()).await?;
    let open = open_replenishment_keys(pool).await?;

    let mut requests = derive_replenishment(&items, &open);
    sort_by_priority(&mut requests, |r| r.priority);

    let mut created = Vec::with_capacity(requests.len());
    for req in &requests {
        let id = insert_replenishment(
            pool,
            req.item_type,
            &req.item_id,
            req.quantity_needed,
            req.priority,
            req.source,
            "system",
            None,
        )
        .await?;
        created.push(get_replenishment(pool, &id).await?);
    }

    info!(count = created.len(), "Replenishment generated from stock levels");
    Ok(created)
}

/// Create a draft purchase order and mark its replenishment rows ordered
pub async fn create_purchase_order(
    pool: &SqlitePool,
    order: &NewPurchaseOrder,
    created_by: &str,
) -> Result<PurchaseOrderCreated> {
    if order.items.is_empty() {
        return Err(Error::InvalidInput("items must not be empty".into()));
    }
    if let Some(bad) = order.items.iter().find(|l| l.quantity <= 0 || l.unit_cost < 0.0) {
        return Err(Error::InvalidInput(format!(
            "Invalid quantity or unit cost for item {}",
            bad.id
        )));
    }

    let po_id = Uuid::new_v4().to_string();
    let po_number = format!("PO-{}", epoch_millis());
    let total = crate::inventory::purchase_order_total(&order.items);

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO purchase_orders (id, po_number, supplier_id, status, total_amount, internal_notes, created_by, created_at)
        VALUES (?, ?, ?, 'draft', ?, ?, ?, ?)
        "#,
    )
    .bind(&po_id)
    .bind(&po_number)
    .bind(&order.supplier_id)
    .bind(total)
    .bind(&order.notes)
    .bind(created_by)
    .bind(now_string())
    .execute(&mut *tx)
    .await;

    match inserted {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(Error::Conflict(format!("Purchase order {} already exists", po_number)));
        }
        Err(e) => return Err(e.into()),
    }

    for line in &order.items {
        let (anode_id, item_id) = match line.item_type {
            ItemType::Anode => (Some(line.id.as_str()), None),
            ItemType::Item => (None, Some(line.id.as_str())),
        };
        sqlx::query(
            r#"
            INSERT INTO purchase_order_items (id, po_id, anode_id, item_id, quantity_ordered, unit_cost, line_total)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&po_id)
        .bind(anode_id)
        .bind(item_id)
        .bind(line.quantity)
        .bind(line.unit_cost)
        .bind(line.line_total())
        .execute(&mut *tx)
        .await?;

        if let Some(replenishment_id) = &line.replenishment_id {
            sqlx::query(
                "UPDATE replenishment_list SET status = 'ordered', po_id = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&po_id)
            .bind(now_string())
            .bind(replenishment_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    info!(%po_number, items = order.items.len(), total, "Purchase order created");
    Ok(PurchaseOrderCreated {
        po_id,
        po_number,
        item_count: order.items.len(),
    })
}

pub async fn get_purchase_order(pool: &SqlitePool, id: &str) -> Result<PurchaseOrder> {
    sqlx::query_as::<_, PurchaseOrder>("SELECT * FROM purchase_orders WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Purchase order {} not found", id)))
}

/// Active suppliers by name
pub async fn list_suppliers(pool: &SqlitePool) -> Result<Vec<Supplier>> {
    let rows = sqlx::query_as::<_, Supplier>("SELECT * FROM inventory_suppliers WHERE is_active = 1 ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn insert_supplier(pool: &SqlitePool, name: &str, contact_email: Option<&str>) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO inventory_suppliers (id, name, contact_email) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(contact_email)
        .execute(pool)
        .await?;
    Ok(id)
}
