//! Inventory, replenishment and purchasing

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use sailor_common::db::inventory::{
    self as stock, ChargeRequest, NewInventoryItem, NewPurchaseOrder, NewStockMovement, ReplenishmentRequest,
    ReplenishmentUpdate,
};
use sailor_common::db::ReplenishmentRow;
use sailor_common::inventory::{self, charge_message, InventoryFilter, ItemType, ReplenishmentStatus};
use sailor_common::time::now;
use sailor_common::{EventBus, SailorEvent};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::auth::admin_email;
use crate::error::ApiResult;
use crate::AppState;

/// Recorded as the actor when no admin email is sent
const DEFAULT_ACTOR: &str = "api_user";

#[derive(Debug, Deserialize)]
pub struct ReplenishmentQuery {
    pub status: Option<ReplenishmentStatus>,
}

fn actor(headers: &HeaderMap) -> &str {
    admin_email(headers).unwrap_or(DEFAULT_ACTOR)
}

fn announce_replenishment(events: &EventBus, row: &ReplenishmentRow) {
    let (item_type, item_id) = match (&row.anode_id, &row.item_id) {
        (Some(anode_id), _) => (ItemType::Anode, anode_id.clone()),
        (None, Some(item_id)) => (ItemType::Item, item_id.clone()),
        (None, None) => return,
    };
    events.emit_lossy(SailorEvent::ReplenishmentQueued {
        item_type: item_type.as_str().to_string(),
        item_id,
        quantity: row.quantity_needed,
        priority: row.priority.clone(),
        source: row.source.clone(),
        timestamp: now(),
    });
}

/// GET /api/inventory
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(filter): Query<InventoryFilter>,
) -> ApiResult<Json<Value>> {
    let items = stock::list_items(&state.db, &filter).await?;
    Ok(Json(json!({ "success": true, "count": items.len(), "items": items })))
}

/// GET /api/inventory/stats
pub async fn inventory_stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let items = stock::list_items(&state.db, &InventoryFilter::default()).await?;
    Ok(Json(json!({ "success": true, "stats": inventory::stats(&items) })))
}

/// POST /api/inventory/items
pub async fn add_item(
    State(state): State<AppState>,
    Json(item): Json<NewInventoryItem>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = stock::add_item(&state.db, &item).await?;
    let created = stock::get_item(&state.db, item.item_type, &id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "item": created }))))
}

/// POST /api/inventory/transactions
pub async fn record_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut movement): Json<NewStockMovement>,
) -> ApiResult<Json<Value>> {
    if movement.performed_by.is_none() {
        movement.performed_by = Some(actor(&headers).to_string());
    }
    let recorded = stock::record_movement(&state.db, &movement).await?;

    state.events.emit_lossy(SailorEvent::StockChanged {
        item_type: movement.item_type.as_str().to_string(),
        item_id: movement.item_id.clone(),
        quantity_change: movement.quantity,
        on_hand: recorded.on_hand,
        timestamp: now(),
    });

    Ok(Json(json!({
        "success": true,
        "transaction": recorded.transaction,
        "onHand": recorded.on_hand,
    })))
}

/// POST /api/inventory/charge
///
/// Lines are charged independently; the response reports each one.
pub async fn charge_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChargeRequest>,
) -> ApiResult<Json<Value>> {
    let results = stock::charge_customer(&state.db, &request, actor(&headers)).await?;

    for (line, result) in request.items.iter().zip(&results) {
        if !result.success {
            continue;
        }
        let on_hand = stock::get_item(&state.db, ItemType::Anode, &line.anode_id)
            .await
            .map(|item| item.on_hand)
            .unwrap_or_default();
        state.events.emit_lossy(SailorEvent::StockChanged {
            item_type: ItemType::Anode.as_str().to_string(),
            item_id: line.anode_id.clone(),
            quantity_change: -line.quantity,
            on_hand,
            timestamp: now(),
        });
    }

    let charged = results.iter().filter(|r| r.success).count();
    let message = charge_message(charged, results.len(), &request.customer);
    info!(customer = %request.customer, charged, requested = results.len(), "Customer charge processed");

    Ok(Json(json!({ "success": true, "results": results, "message": message })))
}

/// GET /api/replenishment?status=pending
pub async fn list_replenishment(
    State(state): State<AppState>,
    Query(query): Query<ReplenishmentQuery>,
) -> ApiResult<Json<Value>> {
    let status = query.status.unwrap_or(ReplenishmentStatus::Pending);
    let rows = stock::list_replenishment(&state.db, status).await?;
    Ok(Json(json!({ "success": true, "items": rows })))
}

/// POST /api/replenishment
pub async fn add_replenishment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ReplenishmentRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let row = stock::add_replenishment(&state.db, &request, actor(&headers)).await?;
    announce_replenishment(&state.events, &row);
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "item": row }))))
}

/// PUT /api/replenishment/:id
pub async fn update_replenishment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ReplenishmentUpdate>,
) -> ApiResult<Json<Value>> {
    let row = stock::update_replenishment(&state.db, &id, &update).await?;
    Ok(Json(json!({ "success": true, "item": row })))
}

/// DELETE /api/replenishment/:id (soft cancel)
pub async fn cancel_replenishment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    stock::cancel_replenishment(&state.db, &id).await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/replenishment/generate
pub async fn generate_replenishment(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let created = stock::generate_replenishment(&state.db).await?;
    for row in &created {
        announce_replenishment(&state.events, row);
    }
    Ok(Json(json!({ "success": true, "created": created.len(), "items": created })))
}

/// POST /api/purchase-orders
pub async fn create_purchase_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(order): Json<NewPurchaseOrder>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let created = stock::create_purchase_order(&state.db, &order, actor(&headers)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "poId": created.po_id,
            "poNumber": created.po_number,
            "itemCount": created.item_count,
        })),
    ))
}

/// GET /api/suppliers
pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let suppliers = stock::list_suppliers(&state.db).await?;
    Ok(Json(json!({ "success": true, "suppliers": suppliers })))
}
