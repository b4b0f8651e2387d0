//! Stock/sold counters of catalog items.
//!
//! Both operations move units between `stock` and `sold` in a single
//! conditional update, so `stock + sold` never changes. They run after the
//! order-side write has committed; a miss is reported as drift instead of
//! failing the request.

use uuid::Uuid;

use crate::{audit::log_audit, store::OrderStore};

pub struct InventoryLedger<'a> {
    store: &'a dyn OrderStore,
}

impl<'a> InventoryLedger<'a> {
    pub fn new(store: &'a dyn OrderStore) -> Self {
        Self { store }
    }

    /// `stock -= qty, sold += qty`.
    pub async fn reserve(&self, item_id: Uuid, qty: i32) -> bool {
        self.apply(item_id, -qty, qty, "reserve").await
    }

    /// `stock += qty, sold -= qty`.
    pub async fn release(&self, item_id: Uuid, qty: i32) -> bool {
        self.apply(item_id, qty, -qty, "release").await
    }

    async fn apply(&self, item_id: Uuid, delta_stock: i32, delta_sold: i32, op: &str) -> bool {
        let detail = match self
            .store
            .update_item_counters(item_id, delta_stock, delta_sold)
            .await
        {
            Ok(rows) if rows > 0 => return true,
            Ok(_) => {
                tracing::warn!(%item_id, op, delta_stock, "inventory update affected no rows");
                "no rows affected".to_string()
            }
            Err(err) => {
                tracing::warn!(%item_id, op, error = %err, "inventory update failed");
                err.to_string()
            }
        };

        log_audit(
            self.store,
            None,
            "inventory_drift",
            Some("items"),
            Some(serde_json::json!({
                "item_id": item_id,
                "op": op,
                "delta_stock": delta_stock,
                "delta_sold": delta_sold,
                "detail": detail,
            })),
        )
        .await;
        false
    }
}
